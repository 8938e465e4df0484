//! Canned tagged responses, one per purpose.
//!
//! Used by [`MockGenerator`](super::MockGenerator) and as the substitution
//! text under [`FallbackPolicy::CannedText`](super::FallbackPolicy). The
//! strings use the same tag vocabulary as live output so the parser runs the
//! identical code path.

use super::Purpose;

const INIT: &str = "\
<root><title>Get started</title><content>Pick a step below, or answer a clarifying question to sharpen the topic.</content></root>
<step><title>Map the landscape</title><content>List the main options before committing to one.</content></step>
<step><title>Pick one angle</title><content>Choose the most promising direction and go a level deeper.</content></step>
<answer><title>Start small today</title><content>A first concrete action beats more planning.</content></answer>
<clarify>What outcome would count as success?</clarify>
<clarify>How much time can you give this?</clarify>
";

const EXPAND: &str = "\
<step><title>Break it down</title><content>Split this branch into smaller moves.</content></step>
<step><title>Check assumptions</title><content>Verify what has to be true before going further.</content></step>
<answer><title>Enough to act</title><content>You have what you need to proceed on this branch.</content></answer>
<clarify>Is anything blocking this right now?</clarify>
";

const CLARIFY: &str = "\
<root><title>Sharpened topic</title><content>Updated with your answer; the branches below reflect it.</content></root>
<step><title>Revisit the plan</title><content>Fold the new constraint into the next steps.</content></step>
<step><title>Drop what no longer fits</title><content>Prune directions your answer ruled out.</content></step>
<answer><title>Proceed as refined</title><content>The narrowed topic is ready to explore.</content></answer>
<clarify>Does anything else constrain the approach?</clarify>
";

const ANSWER_PATH: &str = "\
<step><title>Outline the next move</title><content>Turn your input into one concrete action.</content></step>
<step><title>Note what you'd need</title><content>List the resources this path depends on.</content></step>
<answer><title>This path looks viable</title><content>Your input is enough to continue down this branch.</content></answer>
<clarify>Who else is involved in this path?</clarify>
";

/// Fixed tagged response appropriate to the purpose.
pub fn canned_response(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::Init => INIT,
        Purpose::Expand => EXPAND,
        Purpose::Clarify => CLARIFY,
        Purpose::AnswerPath => ANSWER_PATH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_expansion;

    /// **Scenario**: The canned init response parses into the documented
    /// shape: root titled "Get started", 2 steps, 1 answer, 2 clarifies.
    #[test]
    fn canned_init_shape() {
        let r = parse_expansion(canned_response(Purpose::Init), "root");
        assert_eq!(r.root_title.as_deref(), Some("Get started"));
        assert_eq!(r.steps.len(), 2);
        assert_eq!(r.answers.len(), 1);
        assert_eq!(r.clarifies.len(), 2);
    }

    /// **Scenario**: Every canned response yields at least one branch, so a
    /// fallback substitution is never a silent no-op.
    #[test]
    fn every_purpose_has_branches() {
        for p in [
            Purpose::Init,
            Purpose::Expand,
            Purpose::Clarify,
            Purpose::AnswerPath,
        ] {
            let r = parse_expansion(canned_response(p), "n");
            assert!(!r.steps.is_empty(), "{:?} canned text has no steps", p);
        }
    }
}
