//! Tagged-response lexer: model output text → typed expansion branches.
//!
//! The generation backend is instructed to emit a lightweight pseudo-XML
//! vocabulary (`<root>`, `<step>`, `<answer>`, `<clarify>`, with `<title>`,
//! `<content>`, `<subtitle>` sub-tags). Input is never assumed well-formed:
//! extraction is a non-greedy, case-insensitive, dot-all regex scan with no
//! nesting validation. [`parse_expansion`] never fails; text with no
//! recognized tags yields empty branch lists and a fallback title.
//!
//! Deliberate legacy fallback: when a response contains zero `<step>` tags
//! but at least one `<answer>`, the answers are reinterpreted as step
//! branches and the answer list is discarded (older prompt formats emitted
//! answers-as-branches only).
//!
//! **Interaction**: sole entry point is [`parse_expansion`], so a strict
//! grammar parser could replace this lexer without touching `session`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Per-expansion branch caps; bound graph growth per call.
pub const MAX_STEP_BRANCHES: usize = 6;
pub const MAX_ANSWER_BRANCHES: usize = 6;
pub const MAX_CLARIFY_BRANCHES: usize = 4;

/// Last resort of the root title fallback cascade.
pub const DEFAULT_TITLE: &str = "Get started";

static ROOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<root>(.*?)</root>").unwrap());
static STEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<step>(.*?)</step>").unwrap());
static ANSWER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<answer>(.*?)</answer>").unwrap());
static CLARIFY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<clarify>(.*?)</clarify>").unwrap());
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title>(.*?)</title>").unwrap());
static CONTENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<content>(.*?)</content>").unwrap());
static SUBTITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<subtitle>(.*?)</subtitle>").unwrap());
static ANY_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// One parsed, not-yet-materialized suggestion from a model response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Synthetic id: `<prefix>-step-<n>`, `<prefix>-ans-<n>`, or
    /// `<prefix>-clar-<n>`, 1-indexed in extraction order.
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Typed result of scanning one model response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionResult {
    /// Resolved title: parsed root title → first step label → first answer
    /// label → first non-blank raw line → [`DEFAULT_TITLE`].
    pub title: String,
    /// Title parsed from a `<root>` block, when present.
    pub root_title: Option<String>,
    /// Content parsed from a `<root>` block, when present.
    pub root_content: Option<String>,
    pub steps: Vec<Branch>,
    pub answers: Vec<Branch>,
    pub clarifies: Vec<Branch>,
}

/// Label + optional content extracted from one tag body.
struct TagItem {
    label: String,
    content: Option<String>,
}

fn strip_tags(body: &str) -> String {
    ANY_TAG_RE.replace_all(body, "").trim().to_string()
}

fn sub_match(re: &Regex, body: &str) -> Option<String> {
    re.captures(body)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Title: `<title>` → `<content>` → `<subtitle>` → body stripped of inner
/// tags. Content: `<content>`, with `<subtitle>` as legacy alias; extracted
/// independently of the title.
fn item_from_body(body: &str) -> TagItem {
    let label = sub_match(&TITLE_RE, body)
        .or_else(|| sub_match(&CONTENT_RE, body))
        .or_else(|| sub_match(&SUBTITLE_RE, body))
        .unwrap_or_else(|| strip_tags(body));
    let content = sub_match(&CONTENT_RE, body).or_else(|| sub_match(&SUBTITLE_RE, body));
    TagItem { label, content }
}

fn extract_items(re: &Regex, text: &str) -> Vec<TagItem> {
    re.captures_iter(text)
        .map(|c| item_from_body(&c[1]))
        .filter(|item| !item.label.is_empty())
        .collect()
}

/// Dedup by exact label (first seen wins), cap, and assign synthetic ids.
fn materialize(items: Vec<TagItem>, prefix: &str, kind: &str, cap: usize) -> Vec<Branch> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for item in items {
        if seen.contains(&item.label) {
            continue;
        }
        seen.push(item.label.clone());
        out.push(Branch {
            id: format!("{}-{}-{}", prefix, kind, out.len() + 1),
            label: item.label,
            content: item.content,
        });
        if out.len() == cap {
            break;
        }
    }
    out
}

fn first_non_blank_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Scans `text` for expansion tags and returns the typed result.
///
/// `node_id_prefix` is the id of the node being expanded (`"root"` for root
/// expansions); synthetic branch ids are derived from it. This function
/// never fails: degenerate input produces empty lists everywhere and a
/// cascading fallback title.
pub fn parse_expansion(text: &str, node_id_prefix: &str) -> ExpansionResult {
    let (root_title, root_content) = match ROOT_RE.captures(text) {
        Some(c) => {
            let body = &c[1];
            let item = item_from_body(body);
            let title = Some(item.label).filter(|s| !s.is_empty());
            (title, item.content)
        }
        None => (None, None),
    };

    let step_items = extract_items(&STEP_RE, text);
    let answer_items = extract_items(&ANSWER_RE, text);
    let clarify_items = extract_items(&CLARIFY_RE, text);

    // Legacy prompt formats emitted answers-as-branches only; reinterpret.
    let (step_items, answer_items) = if step_items.is_empty() && !answer_items.is_empty() {
        (answer_items, Vec::new())
    } else {
        (step_items, answer_items)
    };

    let steps = materialize(step_items, node_id_prefix, "step", MAX_STEP_BRANCHES);
    let answers = materialize(answer_items, node_id_prefix, "ans", MAX_ANSWER_BRANCHES);
    let clarifies = materialize(clarify_items, node_id_prefix, "clar", MAX_CLARIFY_BRANCHES);

    let title = root_title
        .clone()
        .or_else(|| steps.first().map(|b| b.label.clone()))
        .or_else(|| answers.first().map(|b| b.label.clone()))
        .or_else(|| first_non_blank_line(text))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    ExpansionResult {
        title,
        root_title,
        root_content,
        steps,
        answers,
        clarifies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Full vocabulary parses into all four categories.
    #[test]
    fn parses_all_categories() {
        let text = "<root><title>Trip</title><content>Plan it</content></root>\n\
                    <step><title>Pick dates</title></step>\n\
                    <answer><title>Go in May</title><content>Fewer crowds</content></answer>\n\
                    <clarify>What is your budget?</clarify>";
        let r = parse_expansion(text, "root");
        assert_eq!(r.title, "Trip");
        assert_eq!(r.root_title.as_deref(), Some("Trip"));
        assert_eq!(r.root_content.as_deref(), Some("Plan it"));
        assert_eq!(r.steps.len(), 1);
        assert_eq!(r.steps[0].id, "root-step-1");
        assert_eq!(r.answers.len(), 1);
        assert_eq!(r.answers[0].id, "root-ans-1");
        assert_eq!(r.answers[0].content.as_deref(), Some("Fewer crowds"));
        assert_eq!(r.clarifies.len(), 1);
        assert_eq!(r.clarifies[0].id, "root-clar-1");
        assert_eq!(r.clarifies[0].label, "What is your budget?");
    }

    /// **Scenario**: Parsing the same text twice with the same prefix yields
    /// identical id sequences.
    #[test]
    fn id_generation_idempotent() {
        let text = "<step>A</step><step>B</step><answer>C</answer>";
        let a = parse_expansion(text, "n4");
        let b = parse_expansion(text, "n4");
        let ids_a: Vec<&str> = a.steps.iter().map(|s| s.id.as_str()).collect();
        let ids_b: Vec<&str> = b.steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids_a, ["n4-step-1", "n4-step-2"]);
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.answers[0].id, "n4-ans-1");
    }

    /// **Scenario**: Repeated identical step bodies dedup by label; the list
    /// is truncated at six entries.
    #[test]
    fn dedups_and_caps_steps() {
        let mut text = String::new();
        for i in 0..10 {
            text.push_str(&format!("<step>Item {}</step>", i % 8));
        }
        // "Item 0" and "Item 1" repeat at i=8,9.
        let r = parse_expansion(&text, "node");
        let labels: Vec<&str> = r.steps.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(r.steps.len(), MAX_STEP_BRANCHES);
        assert_eq!(labels, ["Item 0", "Item 1", "Item 2", "Item 3", "Item 4", "Item 5"]);
        assert_eq!(r.steps[5].id, "node-step-6");
    }

    /// **Scenario**: Clarifies are capped at four entries.
    #[test]
    fn caps_clarifies_at_four() {
        let text = "<clarify>a</clarify><clarify>b</clarify><clarify>c</clarify>\
                    <clarify>d</clarify><clarify>e</clarify>";
        let r = parse_expansion(text, "root");
        assert_eq!(r.clarifies.len(), MAX_CLARIFY_BRANCHES);
        assert_eq!(r.clarifies[3].id, "root-clar-4");
    }

    /// **Scenario**: No `<root>`, one `<step>T1</step>`, no `<answer>`:
    /// the computed title equals the step label.
    #[test]
    fn title_falls_back_to_first_step_label() {
        let r = parse_expansion("<step>T1</step>", "root");
        assert_eq!(r.title, "T1");
        assert!(r.root_title.is_none());
    }

    /// **Scenario**: Zero `<step>` and two `<answer>` entries parse as two
    /// step branches and zero answers (legacy prompt compatibility).
    #[test]
    fn legacy_answers_become_steps() {
        let text = "<answer>First</answer><answer>Second</answer>";
        let r = parse_expansion(text, "root");
        assert_eq!(r.answers.len(), 0);
        assert_eq!(r.steps.len(), 2);
        assert_eq!(r.steps[0].id, "root-step-1");
        assert_eq!(r.steps[0].label, "First");
        assert_eq!(r.steps[1].label, "Second");
        // The reinterpreted labels also feed the title cascade.
        assert_eq!(r.title, "First");
    }

    /// **Scenario**: Tags are case-insensitive and bodies may span lines.
    #[test]
    fn case_insensitive_multiline() {
        let text = "<STEP>\n<Title>Spread\nout</Title>\n</STEP>";
        let r = parse_expansion(text, "root");
        assert_eq!(r.steps.len(), 1);
        assert_eq!(r.steps[0].label, "Spread\nout");
    }

    /// **Scenario**: `<subtitle>` works as a legacy alias for content and as
    /// a title fallback when `<title>` and `<content>` are absent.
    #[test]
    fn subtitle_alias() {
        let r = parse_expansion("<step><subtitle>Only sub</subtitle></step>", "root");
        assert_eq!(r.steps[0].label, "Only sub");
        assert_eq!(r.steps[0].content.as_deref(), Some("Only sub"));
    }

    /// **Scenario**: A bare tag body with no sub-tags is stripped and
    /// trimmed into the label.
    #[test]
    fn bare_body_becomes_label() {
        let r = parse_expansion("<step>  <b>Bold</b> move  </step>", "root");
        assert_eq!(r.steps[0].label, "Bold move");
        assert!(r.steps[0].content.is_none());
    }

    /// **Scenario**: Empty or tagless input produces empty lists and the
    /// raw-line then default title fallbacks.
    #[test]
    fn degenerate_input_never_fails() {
        let r = parse_expansion("", "root");
        assert!(r.steps.is_empty() && r.answers.is_empty() && r.clarifies.is_empty());
        assert_eq!(r.title, DEFAULT_TITLE);

        let r = parse_expansion("\n\n  just prose, no tags\nmore\n", "root");
        assert!(r.steps.is_empty());
        assert_eq!(r.title, "just prose, no tags");
    }

    /// **Scenario**: Content between unrecognized tags is ignored rather
    /// than erroring.
    #[test]
    fn unrecognized_tags_ignored() {
        let text = "<thinking>hm</thinking><step>Real</step><meta>x</meta>";
        let r = parse_expansion(text, "root");
        assert_eq!(r.steps.len(), 1);
        assert_eq!(r.steps[0].label, "Real");
    }

    /// **Scenario**: A `<root>` block with no sub-tags uses its stripped
    /// body as the title.
    #[test]
    fn root_without_subtags_uses_body() {
        let r = parse_expansion("<root>Plain topic</root>", "root");
        assert_eq!(r.root_title.as_deref(), Some("Plain topic"));
        assert_eq!(r.title, "Plain topic");
        assert!(r.root_content.is_none());
    }

    /// **Scenario**: Only the first `<root>` block is consumed.
    #[test]
    fn only_first_root_consumed() {
        let r = parse_expansion("<root>One</root><root>Two</root>", "root");
        assert_eq!(r.root_title.as_deref(), Some("One"));
    }
}
