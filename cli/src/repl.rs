//! Interactive REPL loop: read stdin, mutate the session graph, print it,
//! repeat until EOF or quit.
//!
//! Plain text submits at the selected node (or seeds the root when the graph
//! is empty). `:commands` select nodes, add manual nodes, drill into
//! branches, and switch sessions.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use trellis::render::{render_dot, render_text};
use trellis::{LinkType, SessionStore, SubmitOutcome, ROOT_ID};

const HELP: &str = "\
Plain text      submit at the selected node (seeds the root first)
:show           print the graph
:dot            print the graph as Graphviz DOT
:select <id>    change the selected node
:expand [<id>]  drill into a step/pre node without input
:add <pre|post|info> <label>   attach a manual node to the selection
:new <title>    start a fresh session
:sessions       list sessions
:help           this text
:quit           exit";

fn is_quit(line: &str) -> bool {
    matches!(line.trim(), ":quit" | ":exit" | "quit" | "exit")
}

fn print_outcome(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Expanded(report) => {
            if let Some(title) = &report.title {
                println!("« {} »", title);
            }
            println!(
                "+{} steps, +{} answers, +{} clarifiers",
                report.steps.len(),
                report.answers.len(),
                report.clarifies.len()
            );
        }
        SubmitOutcome::Saved => println!("noted."),
        SubmitOutcome::Stale => println!("discarded: the session changed while generating"),
    }
}

fn show(store: &SessionStore, session_id: &str, dot: bool) {
    match store.graph(session_id) {
        Some(graph) if dot => println!("{}", render_dot(&graph)),
        Some(graph) => println!("{}", render_text(&graph)),
        None => println!("no such session"),
    }
}

pub async fn run(
    store: &SessionStore,
    topic: Option<&str>,
    dot: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session_id = store.create_session("chat").id;
    let mut selected = ROOT_ID.to_string();

    if let Some(topic) = topic {
        let outcome = store.create_root(&session_id, topic).await?;
        print_outcome(&outcome);
        show(store, &session_id, dot);
    } else {
        println!("Type a topic to begin, or :help.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", selected);
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            None => break,
            Some(s) if s.trim().is_empty() => continue,
            Some(s) if is_quit(&s) => break,
            Some(s) => s,
        };
        let line = line.trim().to_string();

        if let Some(rest) = line.strip_prefix(':') {
            let mut parts = rest.splitn(2, ' ');
            let cmd = parts.next().unwrap_or_default();
            let arg = parts.next().unwrap_or_default().trim();
            match cmd {
                "help" => println!("{}", HELP),
                "show" => show(store, &session_id, false),
                "dot" => show(store, &session_id, true),
                "sessions" => {
                    for s in store.sessions() {
                        println!("{}  {}  {}", s.id, s.created_at.to_rfc3339(), s.title);
                    }
                }
                "select" => {
                    let exists = store
                        .graph(&session_id)
                        .map(|g| g.contains_node(arg))
                        .unwrap_or(false);
                    if exists {
                        selected = arg.to_string();
                    } else {
                        println!("no node {}", arg);
                    }
                }
                "new" => {
                    let title = if arg.is_empty() { "chat" } else { arg };
                    session_id = store.create_session(title).id;
                    selected = ROOT_ID.to_string();
                    println!("new session {}", session_id);
                }
                "expand" => {
                    let id = if arg.is_empty() { selected.as_str() } else { arg };
                    match store.expand_node(&session_id, id).await {
                        Ok(outcome) => {
                            print_outcome(&outcome);
                            show(store, &session_id, dot);
                        }
                        Err(e) => println!("error: {}", e),
                    }
                }
                "add" => {
                    let mut add_parts = arg.splitn(2, ' ');
                    let link = match add_parts.next().unwrap_or_default() {
                        "pre" => Some(LinkType::Pre),
                        "post" => Some(LinkType::Post),
                        "info" => Some(LinkType::Info),
                        _ => None,
                    };
                    let label = add_parts.next().unwrap_or_default().trim();
                    match link {
                        Some(link) if !label.is_empty() => {
                            match store.add_node(&session_id, &selected, link, label) {
                                Ok(node) => println!("added {}", node.id),
                                Err(e) => println!("error: {}", e),
                            }
                        }
                        _ => println!("usage: :add <pre|post|info> <label>"),
                    }
                }
                other => println!("unknown command :{} (try :help)", other),
            }
            continue;
        }

        // Plain text: seed the root on an empty graph, else submit at the
        // selected node.
        let has_root = store
            .graph(&session_id)
            .map(|g| g.contains_node(ROOT_ID))
            .unwrap_or(false);
        let result = if has_root {
            store.submit(&session_id, &selected, &line).await
        } else {
            store.create_root(&session_id, &line).await
        };
        match result {
            Ok(outcome) => {
                print_outcome(&outcome);
                show(store, &session_id, dot);
            }
            Err(e) => println!("error: {}", e),
        }
    }

    Ok(())
}
