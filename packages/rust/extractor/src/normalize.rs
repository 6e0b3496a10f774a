//! Markup-to-plain-text normalization for page bodies.
//!
//! Each pass is a function `&str -> String` applied in sequence. The whole
//! pipeline is repeated until the text stops changing, so decoding an entity
//! that reveals another entity or a tag never leaves work for a later call.

use std::sync::LazyLock;

use regex::Regex;

/// Entities decoded by [`decode_entities`], in application order.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Convert raw storage markup into a single line of plain text.
///
/// Tags become spaces, common entities are decoded, whitespace runs collapse
/// to one space, and the result is trimmed. `normalize(normalize(x)) ==
/// normalize(x)` for every input.
pub fn normalize(raw: &str) -> String {
    let mut current = run_pipeline(raw);
    loop {
        let next = run_pipeline(&current);
        // A pass that changes the text always shortens it, so this ends.
        if next == current {
            return current;
        }
        current = next;
    }
}

fn run_pipeline(text: &str) -> String {
    let mut result = strip_tags(text);
    result = decode_entities(&result);
    result = collapse_whitespace(&result);
    result
}

// ---------------------------------------------------------------------------
// Pass 1: Strip markup tags
// ---------------------------------------------------------------------------

/// Replace every `<...>` tag with a single space.
fn strip_tags(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

    TAG_RE.replace_all(text, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Decode entities
// ---------------------------------------------------------------------------

fn decode_entities(text: &str) -> String {
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, replacement)| {
            acc.replace(entity, replacement)
        })
}

// ---------------------------------------------------------------------------
// Pass 3: Collapse whitespace
// ---------------------------------------------------------------------------

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_decodes_nbsp() {
        assert_eq!(normalize("<p>A&nbsp;B</p>"), "A B");
    }

    #[test]
    fn tags_become_word_boundaries() {
        assert_eq!(normalize("<p>one</p><p>two</p>"), "one two");
        assert_eq!(
            normalize("<ac:structured-macro ac:name=\"info\">\n<ac:rich-text-body>Note</ac:rich-text-body></ac:structured-macro>"),
            "Note"
        );
    }

    #[test]
    fn decodes_ampersand_and_quotes() {
        assert_eq!(normalize("R&amp;D &quot;rocks&quot; it&#39;s"), "R&D \"rocks\" it's");
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(normalize("  a \n\t  b\r\n  c  "), "a b c");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n "), "");
        assert_eq!(normalize("<br/><hr/>"), "");
    }

    #[test]
    fn nested_entities_reach_a_fixed_point() {
        // `&amp;nbsp;` decodes to `&nbsp;`, which must not survive.
        let once = normalize("a&amp;nbsp;b");
        assert_eq!(once, "a b");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn idempotent_on_varied_inputs() {
        let inputs = [
            "<h1>Title</h1><p>Body &amp; more</p>",
            "plain text",
            "&amp;amp;amp;",
            "&amp;lt;p&amp;gt;",
            "a < b and c > d",
            "<unterminated",
            "x&nbsp;&nbsp;&nbsp;y",
            "<table><tr><td>1</td><td>2</td></tr></table>",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
            assert!(!once.starts_with(' ') && !once.ends_with(' '));
        }
    }

    #[test]
    fn unterminated_tag_is_kept_as_text() {
        assert_eq!(normalize("a <b"), "a <b");
    }
}
