//! Per-purpose system instructions and user prompt assembly.
//!
//! Each [`Purpose`] maps to a distinct system instruction (in-code default,
//! optional override via [`PromptSet`]) and a distinct template that joins
//! structured context as labeled lines. The instructions pin the tag
//! vocabulary the parser consumes.

use crate::generate::{ChatMessage, Purpose};

/// System prompt for the first expansion of a freshly named root.
pub const INIT_SYSTEM: &str = r#"You are a topic explorer. The user names a topic; you open it up into a small set of directions.

Rules:
- Respond ONLY with these tags, no markdown or explanation:
  <root><title>short reframed topic</title><content>one-line summary</content></root>
  <step><title>next direction</title><content>why or how</content></step>
  <answer><title>confident conclusion</title><content>reasoning</content></answer>
  <clarify>one clarifying question as free text</clarify>
- Emit exactly one <root>, 2-4 <step>, 0-2 <answer>, 1-2 <clarify>.
- Titles are short noun or verb phrases. No tag nesting beyond the forms above.
"#;

/// System prompt for a generic branch expansion.
pub const EXPAND_SYSTEM: &str = r#"You are a topic explorer deepening one branch of an existing exploration.

Rules:
- Respond ONLY with <step>, <answer>, and <clarify> tags as below, no markdown or explanation:
  <step><title>next direction</title><content>why or how</content></step>
  <answer><title>confident conclusion</title><content>reasoning</content></answer>
  <clarify>one clarifying question as free text</clarify>
- Do NOT emit a <root> tag.
- Emit 2-4 <step>, 0-2 <answer>, 0-2 <clarify>.
- Stay scoped to the chosen branch; do not restate the whole topic.
"#;

/// System prompt for reprocessing the root after a clarifier is answered.
pub const CLARIFY_SYSTEM: &str = r#"You are a topic explorer. The user has answered a clarifying question about their topic; fold the answer in and regenerate the opening directions.

Rules:
- Respond ONLY with these tags, no markdown or explanation:
  <root><title>sharpened topic</title><content>one-line summary reflecting the answer</content></root>
  <step><title>next direction</title><content>why or how</content></step>
  <answer><title>confident conclusion</title><content>reasoning</content></answer>
  <clarify>one NEW clarifying question as free text</clarify>
- Emit exactly one <root>, 2-4 <step>, 0-2 <answer>, 0-2 <clarify>.
- Do not repeat a clarifying question that was already answered.
"#;

/// System prompt for expanding a chosen step/pre node from user input.
pub const ANSWER_PATH_SYSTEM: &str = r#"You are a topic explorer. The user chose one path in their exploration and typed what they know or want; continue that path.

Rules:
- Respond ONLY with <step>, <answer>, and <clarify> tags as below, no markdown or explanation:
  <step><title>next direction</title><content>why or how</content></step>
  <answer><title>confident conclusion</title><content>reasoning</content></answer>
  <clarify>one clarifying question as free text</clarify>
- Do NOT emit a <root> tag.
- Build directly on the chosen path and the user's input.
- Emit 1-4 <step>, 0-2 <answer>, 0-2 <clarify>.
"#;

/// Structured context a prompt template draws from. All fields optional;
/// templates skip absent lines.
#[derive(Clone, Debug, Default)]
pub struct PromptContext {
    pub root_title: Option<String>,
    pub root_content: Option<String>,
    /// Clarifier question/answer pairs collected from the root's info nodes.
    pub clarifiers: Vec<(String, Option<String>)>,
    /// Label of the chosen step/pre node (answer-path expansion).
    pub path_label: Option<String>,
    /// The user's free-text submission.
    pub user_input: Option<String>,
    /// Label of the clarifier the user just answered (info-node submit).
    pub clarifying_question: Option<String>,
}

fn push_line(out: &mut Vec<String>, label: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.trim().is_empty() {
            out.push(format!("{}: {}", label, v.trim()));
        }
    }
}

fn push_clarifier_lines(out: &mut Vec<String>, ctx: &PromptContext) {
    for (question, answer) in &ctx.clarifiers {
        match answer {
            Some(a) if !a.trim().is_empty() => {
                out.push(format!("Clarifier: {} -> {}", question, a.trim()))
            }
            _ => out.push(format!("Clarifier: {} -> (unanswered)", question)),
        }
    }
}

/// Assembles the user prompt for a purpose from labeled context lines.
pub fn build_user_prompt(purpose: Purpose, ctx: &PromptContext) -> String {
    let mut lines: Vec<String> = Vec::new();
    match purpose {
        Purpose::Init => {
            push_line(&mut lines, "Topic", &ctx.root_title);
        }
        Purpose::Expand => {
            push_line(&mut lines, "Topic", &ctx.root_title);
            push_line(&mut lines, "Details", &ctx.root_content);
            push_line(&mut lines, "Chosen path", &ctx.path_label);
        }
        Purpose::Clarify => {
            push_line(&mut lines, "Topic", &ctx.root_title);
            push_line(&mut lines, "Details", &ctx.root_content);
            push_clarifier_lines(&mut lines, ctx);
            push_line(&mut lines, "Answered question", &ctx.clarifying_question);
            push_line(&mut lines, "User answer", &ctx.user_input);
        }
        Purpose::AnswerPath => {
            push_line(&mut lines, "Topic", &ctx.root_title);
            push_line(&mut lines, "Details", &ctx.root_content);
            push_clarifier_lines(&mut lines, ctx);
            push_line(&mut lines, "Chosen path", &ctx.path_label);
            push_line(&mut lines, "User input", &ctx.user_input);
        }
    }
    lines.join("\n")
}

/// Per-purpose system instruction overrides; `None` falls back to the
/// in-code default.
#[derive(Clone, Debug, Default)]
pub struct PromptSet {
    pub init: Option<String>,
    pub expand: Option<String>,
    pub clarify: Option<String>,
    pub answer_path: Option<String>,
}

impl PromptSet {
    /// Reads overrides from `TRELLIS_PROMPT_INIT`, `TRELLIS_PROMPT_EXPAND`,
    /// `TRELLIS_PROMPT_CLARIFY`, `TRELLIS_PROMPT_ANSWER_PATH`.
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            init: read("TRELLIS_PROMPT_INIT"),
            expand: read("TRELLIS_PROMPT_EXPAND"),
            clarify: read("TRELLIS_PROMPT_CLARIFY"),
            answer_path: read("TRELLIS_PROMPT_ANSWER_PATH"),
        }
    }

    /// Resolved system instruction for a purpose: override, else default.
    pub fn system_for(&self, purpose: Purpose) -> &str {
        let (over, default) = match purpose {
            Purpose::Init => (&self.init, INIT_SYSTEM),
            Purpose::Expand => (&self.expand, EXPAND_SYSTEM),
            Purpose::Clarify => (&self.clarify, CLARIFY_SYSTEM),
            Purpose::AnswerPath => (&self.answer_path, ANSWER_PATH_SYSTEM),
        };
        over.as_deref().unwrap_or(default)
    }
}

/// Builds the message list for a request: resolved system instruction plus
/// the assembled user prompt.
pub fn messages_for(purpose: Purpose, ctx: &PromptContext, set: &PromptSet) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(set.system_for(purpose)),
        ChatMessage::user(build_user_prompt(purpose, ctx)),
    ]
}
