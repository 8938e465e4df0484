//! Trellis CLI binary: interactive topic explorer over a session graph store.
//!
//! Seeds a topic, then reads REPL commands: plain text submits at the
//! selected node, `:commands` inspect or edit the graph. Mock mode (no
//! backend) is the default when `TRELLIS_BACKEND_URL` is unset.

mod logging;
mod repl;

use std::sync::Arc;

use clap::Parser;

use trellis::{HttpGenerator, MockGenerator, PromptSet, SessionStore, TextGenerator};

#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(about = "Trellis — explore a topic as a growing graph")]
struct Args {
    /// Seed topic; when omitted, the first plain REPL line seeds it
    #[arg(value_name = "TOPIC")]
    topic: Option<String>,

    /// Force mock mode (canned responses, no backend calls)
    #[arg(long)]
    mock: bool,

    /// Generation backend URL (default: TRELLIS_BACKEND_URL)
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Print Graphviz DOT instead of the text tree after each change
    #[arg(long)]
    dot: bool,

    /// Verbose: log expansion milestones to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Err(e) = env_config::load_and_apply_default() {
        eprintln!("config: {}", e);
    }
    logging::init(args.verbose);

    let mut settings = env_config::ExplorerSettings::from_env();
    if args.mock {
        settings.mock = true;
    }
    if let Some(url) = &args.backend_url {
        settings.backend_url = Some(url.clone());
    }

    let generator: Arc<dyn TextGenerator> = if settings.effective_mock() {
        tracing::info!("mock mode: canned generation responses");
        Arc::new(MockGenerator::new())
    } else {
        let url = settings.backend_url.clone().unwrap_or_default();
        tracing::info!(backend = %url, "live mode");
        Arc::new(HttpGenerator::new(url))
    };

    let store = SessionStore::new(generator)
        .with_prompts(PromptSet::from_env())
        .with_model(settings.model.clone())
        .with_temperature(settings.temperature);

    repl::run(&store, args.topic.as_deref(), args.dot).await
}
