//! Recovery of a JSON candidate from raw model text.
//!
//! Models often wrap structured output in a markdown fence. Only one opening
//! fence at the very start and one closing fence at the very end are removed;
//! backticks anywhere else are left alone.

const FENCE: &str = "```";

/// Strip surrounding whitespace and a single pair of code-fence markers.
///
/// The opening marker may carry an info string such as `json`, which runs up
/// to the first whitespace character. Text that neither starts nor ends with
/// a fence is only trimmed, so normalizing clean output is a no-op.
///
/// Idempotent for input wrapped in at most one fence. A doubly fenced reply
/// loses one layer per call.
pub fn normalize(raw: &str) -> &str {
    let text = raw.trim();
    let text = strip_opening_fence(text);
    let text = text.strip_suffix(FENCE).unwrap_or(text);
    text.trim()
}

fn strip_opening_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };

    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '.')))
        .unwrap_or(rest.len());
    let (tag, after) = rest.split_at(tag_len);

    if tag.is_empty() || after.is_empty() || after.starts_with(char::is_whitespace) {
        after
    } else if tag.eq_ignore_ascii_case("json") {
        // "```json[" with no newline between hint and payload
        after
    } else {
        // Not an info string: the payload itself starts right after the fence.
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn strips_tagged_fence() {
        let raw = "```json\n[{\"question\":\"Q1\",\"answer\":\"A1\"}]\n```";
        assert_eq!(normalize(raw), "[{\"question\":\"Q1\",\"answer\":\"A1\"}]");
    }

    #[test]
    fn strips_untagged_fence_and_outer_whitespace() {
        let raw = "\n\n  ```\n{\"title\":\"T\"}\n```  \n";
        assert_eq!(normalize(raw), "{\"title\":\"T\"}");
    }

    #[test]
    fn strips_json_hint_glued_to_payload() {
        assert_eq!(normalize("```json[1,2]```"), "[1,2]");
        assert_eq!(normalize("```JSON{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn strips_other_language_hints() {
        assert_eq!(normalize("```javascript\n[]\n```"), "[]");
    }

    #[test]
    fn keeps_scalar_payload_directly_after_fence() {
        assert_eq!(normalize("```true```"), "true");
        assert_eq!(normalize("```-1.5```"), "-1.5");
    }

    #[test]
    fn handles_only_one_side_fenced() {
        assert_eq!(normalize("```json\n[1]"), "[1]");
        assert_eq!(normalize("[1]\n```"), "[1]");
    }

    #[test]
    fn leaves_inner_fences_untouched() {
        let raw = "```json\n[{\"answer\":\"use ```rust``` blocks\"}]\n```";
        assert_eq!(normalize(raw), "[{\"answer\":\"use ```rust``` blocks\"}]");
    }

    // Nested fences are the one case where a second pass changes the result.
    #[test]
    fn removes_only_a_single_layer() {
        let raw = "```json\n```json\n[1]\n```\n```";
        assert_eq!(normalize(raw), "```json\n[1]\n```");
        assert_eq!(normalize(normalize(raw)), "[1]");
    }

    #[test]
    fn prose_is_only_trimmed() {
        let raw = "  Sorry, I cannot help with that. ";
        assert_eq!(normalize(raw), "Sorry, I cannot help with that.");
    }

    #[test]
    fn normalizing_single_fenced_text_twice_is_a_no_op() {
        let samples = [
            "```json\n[{\"question\":\"Q\",\"answer\":\"A\"}]\n```",
            "{\"title\":\"t\",\"explanation\":\"e\"}",
            "   [ ]   ",
            "plain prose",
            "```\nnull\n```",
            "",
        ];
        for raw in samples {
            let once = normalize(raw);
            assert_eq!(normalize(once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn fenced_json_round_trips_to_original_structure() {
        let values = [
            json!([{ "question": "Q1", "answer": "A1" }, { "question": "Q2", "answer": "A2" }]),
            json!({ "title": "Closures", "explanation": "Functions that capture state." }),
            json!([]),
            json!("a string with ``` inside"),
            json!(42),
            json!(null),
        ];
        let wrappers: [fn(&str) -> String; 5] = [
            |s: &str| s.to_string(),
            |s: &str| format!("```json\n{s}\n```"),
            |s: &str| format!("```\n{s}\n```"),
            |s: &str| format!("  ```json {s} ```\n"),
            |s: &str| format!("```json\n{s}"),
        ];

        for value in &values {
            for compact in [value.to_string(), serde_json::to_string_pretty(value).unwrap()] {
                for wrap in wrappers {
                    let raw = wrap(&compact);
                    let parsed: Value = serde_json::from_str(normalize(&raw))
                        .unwrap_or_else(|e| panic!("failed to parse {raw:?}: {e}"));
                    assert_eq!(&parsed, value);
                }
            }
        }
    }
}
