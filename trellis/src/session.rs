//! Session graph store: the single authority mutating per-session graphs.
//!
//! Composes the parser, generation client, and layout engine into atomic
//! graph-evolution operations. Callers hold an explicit [`SessionStore`]
//! handle; there is no ambient global instance. Reads hand out cloned
//! snapshots, and every committed mutation replaces the affected session's
//! graph under one map guard, so a snapshot is always fully formed.
//!
//! Concurrency: each session carries a generation token. An expansion reads
//! the token when its request is issued and its result is applied only if
//! the token is unchanged at merge time; a completion that lost the race
//! returns [`SubmitOutcome::Stale`] and leaves the graph untouched. Map
//! guards are never held across the generation await.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::generate::{
    canned_response, FallbackPolicy, GenerationOutcome, GenerationRequest, Purpose, TextGenerator,
};
use crate::graph::{Graph, GraphNode, LinkType, NodeType, ROOT_ID};
use crate::layout::{
    branch_row_positions, clarifier_positions, displace_overlapping, Point, Region,
    BRANCH_ROW_OFFSET_Y, CLARIFY_COLUMN_OFFSET_X, CLARIFY_ROW_OFFSET_Y,
};
use crate::parse::{parse_expansion, Branch, ExpansionResult};
use crate::prompts::{messages_for, PromptContext, PromptSet};

/// Session metadata. Immutable once created; destroyed only by
/// [`SessionStore::reset`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

struct SessionEntry {
    session: Session,
    graph: Graph,
    /// Bumped on every committed structural mutation; guards stale merges.
    token: u64,
}

/// Branch lists actually materialized by one expansion (post-filtering),
/// plus the root title/content for root-level purposes.
#[derive(Clone, Debug, Default)]
pub struct ExpansionReport {
    pub title: Option<String>,
    pub content: Option<String>,
    pub steps: Vec<Branch>,
    pub answers: Vec<Branch>,
    pub clarifies: Vec<Branch>,
}

/// Result of a submit-driven operation.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// An expansion was committed.
    Expanded(ExpansionReport),
    /// Terminal node: the input was recorded, no generation.
    Saved,
    /// The session changed while the request was in flight; nothing applied.
    Stale,
}

/// Clears the in-flight indicator on every exit path.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The per-process session graph store.
///
/// **Interaction**: the CLI (and any other UI collaborator) drives all graph
/// mutation through this handle; `render` consumes the snapshots.
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    generator: Arc<dyn TextGenerator>,
    prompts: PromptSet,
    policy: FallbackPolicy,
    model: Option<String>,
    temperature: Option<f32>,
    prompt_loading: AtomicBool,
}

impl SessionStore {
    /// Store over the given generation backend, default prompts and policy.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            sessions: DashMap::new(),
            generator,
            prompts: PromptSet::default(),
            policy: FallbackPolicy::default(),
            model: None,
            temperature: None,
            prompt_loading: AtomicBool::new(false),
        }
    }

    /// Sets system-instruction overrides (builder).
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Sets the fallback policy (builder).
    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the model name forwarded in requests (builder).
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Sets the sampling temperature forwarded in requests (builder).
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Creates a session with an empty graph.
    pub fn create_session(&self, title: impl Into<String>) -> Session {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: Utc::now(),
        };
        self.sessions.insert(
            session.id.clone(),
            SessionEntry {
                session: session.clone(),
                graph: Graph::default(),
                token: 0,
            },
        );
        session
    }

    /// All sessions, newest last.
    pub fn sessions(&self) -> Vec<Session> {
        let mut out: Vec<Session> = self
            .sessions
            .iter()
            .map(|e| e.value().session.clone())
            .collect();
        out.sort_by_key(|s| s.created_at);
        out
    }

    /// Snapshot of a session's graph.
    pub fn graph(&self, session_id: &str) -> Option<Graph> {
        self.sessions.get(session_id).map(|e| e.graph.clone())
    }

    /// True while an expansion request is in flight.
    pub fn is_loading(&self) -> bool {
        self.prompt_loading.load(Ordering::SeqCst)
    }

    /// Drops all sessions (process-wide state reset).
    pub fn reset(&self) {
        self.sessions.clear();
    }

    /// Creates the root node synchronously, then runs an `init` expansion
    /// that additively populates the root's first round of children.
    pub async fn create_root(
        &self,
        session_id: &str,
        label: &str,
    ) -> Result<SubmitOutcome, SessionError> {
        let token = {
            let mut entry = self.entry_mut(session_id)?;
            match entry.graph.node_mut(ROOT_ID) {
                Some(root) => root.label = label.to_string(),
                None => entry
                    .graph
                    .push_node(GraphNode::new(ROOT_ID, NodeType::Root, label)),
            }
            entry.token
        };
        let ctx = PromptContext {
            root_title: Some(label.to_string()),
            ..Default::default()
        };
        let text = self.run_generation(Purpose::Init, &ctx).await?;
        let parsed = parse_expansion(&text, ROOT_ID);
        self.commit_root_merge(session_id, token, parsed, false)
    }

    /// User submit at a node; dispatch on the node's type.
    ///
    /// The raw text is always recorded in the node's `input_value` (textbox
    /// state survives independently of the expansion result); `details` is
    /// written only when the operation commits.
    pub async fn submit(
        &self,
        session_id: &str,
        node_id: &str,
        input: &str,
    ) -> Result<SubmitOutcome, SessionError> {
        let (node_type, label) = {
            let mut entry = self.entry_mut(session_id)?;
            let node = entry
                .graph
                .node_mut(node_id)
                .ok_or_else(|| SessionError::NodeNotFound(node_id.to_string()))?;
            node.input_value = Some(input.to_string());
            (node.node_type, node.label.clone())
        };
        match node_type {
            NodeType::Root => self.reprompt_root(session_id, None, input).await,
            NodeType::Info => self.reprompt_root(session_id, Some(label), input).await,
            NodeType::Step | NodeType::Pre => {
                self.expand_answer_path(session_id, node_id, input).await
            }
            NodeType::Answer | NodeType::Default => {
                let mut entry = self.entry_mut(session_id)?;
                let node = entry
                    .graph
                    .node_mut(node_id)
                    .ok_or_else(|| SessionError::NodeNotFound(node_id.to_string()))?;
                node.details = Some(input.to_string());
                Ok(SubmitOutcome::Saved)
            }
        }
    }

    /// Additive expansion of a step/pre node without user input (drilling
    /// into a branch); purpose `expand`.
    pub async fn expand_node(
        &self,
        session_id: &str,
        node_id: &str,
    ) -> Result<SubmitOutcome, SessionError> {
        let (token, ctx) = self.node_context(session_id, node_id, None)?;
        let text = self.run_generation(Purpose::Expand, &ctx).await?;
        let parsed = parse_expansion(&text, node_id);
        self.commit_node_merge(session_id, token, node_id, parsed, None)
    }

    /// Manual pre/post/info node creation (direct user action).
    ///
    /// Bumps the generation token: an expansion in flight across a manual
    /// structural edit is applied stale.
    pub fn add_node(
        &self,
        session_id: &str,
        anchor_id: &str,
        link_type: LinkType,
        label: &str,
    ) -> Result<GraphNode, SessionError> {
        let mut entry = self.entry_mut(session_id)?;
        let anchor_pos = entry
            .graph
            .node(anchor_id)
            .ok_or_else(|| SessionError::NodeNotFound(anchor_id.to_string()))?
            .position;
        let (suffix, node_type, position) = match link_type {
            LinkType::Pre => (
                "pre",
                NodeType::Pre,
                Point::new(anchor_pos.x, anchor_pos.y - BRANCH_ROW_OFFSET_Y),
            ),
            LinkType::Post => (
                "post",
                NodeType::Default,
                Point::new(anchor_pos.x, anchor_pos.y + BRANCH_ROW_OFFSET_Y),
            ),
            LinkType::Info => (
                "info",
                NodeType::Info,
                Point::new(
                    anchor_pos.x + CLARIFY_COLUMN_OFFSET_X,
                    anchor_pos.y + CLARIFY_ROW_OFFSET_Y,
                ),
            ),
        };
        let mut n = 1;
        let id = loop {
            let candidate = format!("{}-{}-{}", anchor_id, suffix, n);
            if !entry.graph.contains_node(&candidate) {
                break candidate;
            }
            n += 1;
        };
        let node = GraphNode::new(&id, node_type, label).at(position);
        entry.graph.push_node(node.clone());
        match link_type {
            LinkType::Pre => entry.graph.connect(&id, anchor_id, LinkType::Pre),
            LinkType::Post => entry.graph.connect(anchor_id, &id, LinkType::Post),
            LinkType::Info => entry.graph.connect(anchor_id, &id, LinkType::Info),
        }
        entry.token += 1;
        Ok(node)
    }

    /// Position update from the drag collaborator. Does not bump the token:
    /// a concurrent expansion is not invalidated by a repositioned node.
    pub fn set_position(
        &self,
        session_id: &str,
        node_id: &str,
        position: Point,
    ) -> Result<(), SessionError> {
        let mut entry = self.entry_mut(session_id)?;
        let node = entry
            .graph
            .node_mut(node_id)
            .ok_or_else(|| SessionError::NodeNotFound(node_id.to_string()))?;
        node.position = position;
        Ok(())
    }

    // -- orchestration internals -------------------------------------------

    fn entry(
        &self,
        session_id: &str,
    ) -> Result<dashmap::mapref::one::Ref<'_, String, SessionEntry>, SessionError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))
    }

    fn entry_mut(
        &self,
        session_id: &str,
    ) -> Result<dashmap::mapref::one::RefMut<'_, String, SessionEntry>, SessionError> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))
    }

    /// Issues one generation request and resolves the tri-state outcome
    /// against the fallback policy. Returns the text to parse (possibly
    /// canned, possibly empty under `Surface`).
    async fn run_generation(
        &self,
        purpose: Purpose,
        ctx: &PromptContext,
    ) -> Result<String, SessionError> {
        self.prompt_loading.store(true, Ordering::SeqCst);
        let _loading = LoadingGuard(&self.prompt_loading);

        let request = GenerationRequest {
            prompt: None,
            messages: messages_for(purpose, ctx, &self.prompts),
            prompt_type: purpose,
            model: self.model.clone(),
            temperature: self.temperature,
        };
        debug!(purpose = purpose.wire_name(), "expansion request issued");
        let outcome = GenerationOutcome::from_result(self.generator.generate(&request).await);
        match (outcome, self.policy) {
            (GenerationOutcome::Text(text), _) => Ok(text),
            (GenerationOutcome::Empty, FallbackPolicy::CannedText) => {
                warn!(
                    purpose = purpose.wire_name(),
                    "empty generation, substituting canned response"
                );
                Ok(canned_response(purpose).to_string())
            }
            (GenerationOutcome::Empty, FallbackPolicy::Surface) => Ok(String::new()),
            (GenerationOutcome::Failed(err), FallbackPolicy::CannedText) => {
                warn!(
                    purpose = purpose.wire_name(),
                    error = %err,
                    "generation failed, substituting canned response"
                );
                Ok(canned_response(purpose).to_string())
            }
            (GenerationOutcome::Failed(err), FallbackPolicy::Surface) => Err(err.into()),
        }
    }

    /// Reads the issue-time token and the prompt context for a node-anchored
    /// expansion.
    fn node_context(
        &self,
        session_id: &str,
        node_id: &str,
        user_input: Option<&str>,
    ) -> Result<(u64, PromptContext), SessionError> {
        let entry = self.entry(session_id)?;
        let node = entry
            .graph
            .node(node_id)
            .ok_or_else(|| SessionError::NodeNotFound(node_id.to_string()))?;
        let root = entry.graph.node(ROOT_ID);
        let ctx = PromptContext {
            root_title: root.map(|r| r.title.clone().unwrap_or_else(|| r.label.clone())),
            root_content: root.and_then(|r| r.content.clone()),
            clarifiers: entry.graph.root_clarifier_pairs(),
            path_label: Some(node.label.clone()),
            user_input: user_input.map(str::to_string),
            clarifying_question: None,
        };
        Ok((entry.token, ctx))
    }

    /// Root clarify reprompt: regenerate the root's title/content and
    /// destructively replace its entire child set.
    async fn reprompt_root(
        &self,
        session_id: &str,
        clarifying_question: Option<String>,
        input: &str,
    ) -> Result<SubmitOutcome, SessionError> {
        let (token, ctx) = {
            let entry = self.entry(session_id)?;
            let root = entry
                .graph
                .node(ROOT_ID)
                .ok_or_else(|| SessionError::NodeNotFound(ROOT_ID.to_string()))?;
            let ctx = PromptContext {
                root_title: Some(root.title.clone().unwrap_or_else(|| root.label.clone())),
                root_content: root.content.clone(),
                clarifiers: entry.graph.root_clarifier_pairs(),
                path_label: None,
                user_input: Some(input.to_string()),
                clarifying_question,
            };
            (entry.token, ctx)
        };
        let text = self.run_generation(Purpose::Clarify, &ctx).await?;
        let parsed = parse_expansion(&text, ROOT_ID);
        self.commit_root_merge(session_id, token, parsed, true)
    }

    /// Answer-path expansion: additively attach parsed children below the
    /// chosen node and record the user's text in its `details`.
    async fn expand_answer_path(
        &self,
        session_id: &str,
        node_id: &str,
        input: &str,
    ) -> Result<SubmitOutcome, SessionError> {
        let (token, ctx) = self.node_context(session_id, node_id, Some(input))?;
        let text = self.run_generation(Purpose::AnswerPath, &ctx).await?;
        let parsed = parse_expansion(&text, node_id);
        self.commit_node_merge(session_id, token, node_id, parsed, Some(input))
    }

    /// Applies a root-anchored expansion. `destructive` replaces the root's
    /// existing child set (clarify reprompt); otherwise children are added
    /// to whatever is present (init).
    fn commit_root_merge(
        &self,
        session_id: &str,
        issued_token: u64,
        parsed: ExpansionResult,
        destructive: bool,
    ) -> Result<SubmitOutcome, SessionError> {
        let mut entry = self.entry_mut(session_id)?;
        if entry.token != issued_token {
            warn!(session = session_id, "stale root expansion discarded");
            return Ok(SubmitOutcome::Stale);
        }
        if destructive {
            let removed = entry.graph.remove_root_subtree();
            debug!(removed, "root child set replaced");
        }
        let title = parsed.title.clone();
        let content = parsed.root_content.clone();
        {
            let root = entry
                .graph
                .node_mut(ROOT_ID)
                .ok_or_else(|| SessionError::NodeNotFound(ROOT_ID.to_string()))?;
            root.title = Some(title.clone());
            if destructive || content.is_some() {
                root.content = content.clone();
            }
        }
        let (steps, answers, clarifies) = merge_branches(&mut entry.graph, ROOT_ID, parsed);
        entry.token += 1;
        Ok(SubmitOutcome::Expanded(ExpansionReport {
            title: Some(title),
            content,
            steps,
            answers,
            clarifies,
        }))
    }

    /// Applies a node-anchored additive expansion; optionally records the
    /// user's input in the node's `details`.
    fn commit_node_merge(
        &self,
        session_id: &str,
        issued_token: u64,
        node_id: &str,
        parsed: ExpansionResult,
        details: Option<&str>,
    ) -> Result<SubmitOutcome, SessionError> {
        let mut entry = self.entry_mut(session_id)?;
        if entry.token != issued_token {
            warn!(session = session_id, node = node_id, "stale expansion discarded");
            return Ok(SubmitOutcome::Stale);
        }
        {
            let node = entry
                .graph
                .node_mut(node_id)
                .ok_or_else(|| SessionError::NodeNotFound(node_id.to_string()))?;
            if let Some(d) = details {
                node.details = Some(d.to_string());
            }
        }
        let (steps, answers, clarifies) = merge_branches(&mut entry.graph, node_id, parsed);
        entry.token += 1;
        Ok(SubmitOutcome::Expanded(ExpansionReport {
            title: None,
            content: None,
            steps,
            answers,
            clarifies,
        }))
    }
}

/// Materializes parsed branches below `anchor_id`: filters id collisions,
/// positions new nodes, displaces overlapping pre-existing nodes, and
/// connects edges (`post` for steps/answers, `info` for clarifiers).
///
/// Returns the branch lists actually materialized.
fn merge_branches(
    graph: &mut Graph,
    anchor_id: &str,
    parsed: ExpansionResult,
) -> (Vec<Branch>, Vec<Branch>, Vec<Branch>) {
    let anchor_pos = graph
        .node(anchor_id)
        .map(|n| n.position)
        .unwrap_or_default();

    // Already-materialized branches are never re-added.
    let keep = |branches: Vec<Branch>| -> Vec<Branch> {
        branches
            .into_iter()
            .filter(|b| !graph.contains_node(&b.id))
            .collect()
    };
    let steps = keep(parsed.steps);
    let answers = keep(parsed.answers);
    let clarifies = keep(parsed.clarifies);

    // Steps occupy the first row slots; answers continue after them.
    let row = branch_row_positions(anchor_pos, steps.len() + answers.len());
    let clar = clarifier_positions(anchor_pos, clarifies.len());

    let mut new_points: Vec<Point> = row.clone();
    new_points.extend(&clar);
    if let Some(region) = Region::around(&new_points) {
        displace_overlapping(&mut graph.nodes, &region, anchor_id);
    }

    for (branch, pos) in steps.iter().zip(&row) {
        graph.push_node(
            GraphNode::new(&branch.id, NodeType::Step, &branch.label)
                .with_content(branch.content.clone())
                .at(*pos),
        );
        graph.connect(anchor_id, &branch.id, LinkType::Post);
    }
    for (branch, pos) in answers.iter().zip(row.iter().skip(steps.len())) {
        graph.push_node(
            GraphNode::new(&branch.id, NodeType::Answer, &branch.label)
                .with_content(branch.content.clone())
                .at(*pos),
        );
        graph.connect(anchor_id, &branch.id, LinkType::Post);
    }
    for (branch, pos) in clarifies.iter().zip(&clar) {
        graph.push_node(
            GraphNode::new(&branch.id, NodeType::Info, &branch.label)
                .with_content(branch.content.clone())
                .at(*pos),
        );
        graph.connect(anchor_id, &branch.id, LinkType::Info);
    }
    (steps, answers, clarifies)
}
