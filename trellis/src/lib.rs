//! # Trellis
//!
//! A graph-based topic explorer engine. A user seeds a topic, a
//! text-generation backend expands it into structured branches (next steps,
//! final answers, clarifying questions), and the per-session directed graph
//! grows as the user answers clarifiers or drills into branches.
//!
//! ## Design principles
//!
//! - **Explicit handle**: all graph mutation goes through a [`SessionStore`]
//!   the caller holds; reads are cloned snapshots of a fully-formed graph.
//! - **Tolerant parsing**: the backend's tagged text is lexed with
//!   non-greedy, case-insensitive scans; [`parse_expansion`] never fails,
//!   degenerate output just yields empty branch lists.
//! - **Same path in mock and live mode**: [`MockGenerator`] emits the same
//!   tag vocabulary as the HTTP backend, so tests exercise the real parser
//!   and merge code.
//! - **Stale results are discarded**: each session carries a generation
//!   token; an expansion is applied only if the token is unchanged since the
//!   request was issued.
//!
//! ## Main modules
//!
//! - [`parse`]: tagged-response lexer — [`parse_expansion`], [`Branch`],
//!   [`ExpansionResult`].
//! - [`generate`]: [`TextGenerator`] trait, [`MockGenerator`],
//!   [`HttpGenerator`], [`Purpose`], tri-state [`GenerationOutcome`] and
//!   [`FallbackPolicy`].
//! - [`prompts`]: per-purpose system instructions, [`PromptContext`],
//!   [`PromptSet`] overrides.
//! - [`layout`]: row/column placement and one-shot overlap displacement.
//! - [`graph`]: [`Graph`], [`GraphNode`], [`GraphEdge`], [`NodeType`],
//!   [`LinkType`].
//! - [`session`]: [`SessionStore`] orchestration — create root, submit at a
//!   node, add nodes, snapshots.
//! - [`render`]: text and DOT rendering for CLI consumption.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trellis::{MockGenerator, SessionStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SessionStore::new(Arc::new(MockGenerator::new()));
//! let session = store.create_session("scratch");
//! store.create_root(&session.id, "Travel").await.unwrap();
//! println!("{}", trellis::render::render_text(&store.graph(&session.id).unwrap()));
//! # }
//! ```

pub mod error;
pub mod generate;
pub mod graph;
pub mod layout;
pub mod parse;
pub mod prompts;
pub mod render;
pub mod session;

pub use error::SessionError;
pub use generate::{
    canned_response, ChatMessage, FallbackPolicy, Generation, GenerationError, GenerationOutcome,
    GenerationRequest, HttpGenerator, MockGenerator, Purpose, TextGenerator,
};
pub use graph::{edge_id, Graph, GraphEdge, GraphNode, LinkType, NodeType, ROOT_ID};
pub use layout::Point;
pub use parse::{parse_expansion, Branch, ExpansionResult};
pub use prompts::{PromptContext, PromptSet};
pub use session::{ExpansionReport, Session, SessionStore, SubmitOutcome};
