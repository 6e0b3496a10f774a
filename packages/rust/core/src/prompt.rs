//! Grounding prompt assembly.
//!
//! The prompt is a fixed instruction preamble, the request metadata, and one
//! block per retrieved record. The response template it asks for is what
//! [`crate::sources`] parses afterwards, so the headings here and there must
//! stay in sync through [`SOURCES_HEADING`].

use std::fmt::Write as _;

use docground_shared::DocumentRecord;

/// Heading of the answer section that lists cited page titles.
pub const SOURCES_HEADING: &str = "## Sources Referenced";

/// Characters of record content kept per block.
pub const CONTENT_BUDGET_CHARS: usize = 4000;

/// Appended to content cut at [`CONTENT_BUDGET_CHARS`].
pub const TRUNCATION_MARKER: &str = "...";

const PREAMBLE: &str = "\
You are an expert technical analyst specializing in Confluence knowledge base analysis.
Your role is to provide comprehensive, well-structured, and actionable answers.

INSTRUCTIONS:
1. Use ONLY the Confluence context provided below. Do not infer or fabricate information.
2. If information is insufficient, explicitly state what is missing.
3. Reference specific source pages by title when citing information.
4. Structure your response using the format below.

RESPONSE FORMAT:
## Summary
A concise 2-3 sentence overview answering the core question.

## Key Findings
- Bullet points covering the main facts, decisions, or details found.
- Group related points together logically.

## Details
Expand on the key findings with relevant context, explanations, and relationships
between different pieces of information. Use sub-headings if multiple topics are covered.

## Sources Referenced
List each Confluence page title used in this answer, one per line.

## Gaps & Limitations
Note any areas where the available documentation is incomplete or unclear.
If no gaps exist, write \"None identified.\"

---
";

/// Build the grounding prompt for `question` over `records`.
///
/// Pure and deterministic: the same inputs always yield the same string.
pub fn build_prompt(question: &str, root_url: &str, records: &[DocumentRecord]) -> String {
    let mut prompt = String::with_capacity(PREAMBLE.len() + records.len() * 512);
    prompt.push_str(PREAMBLE);

    // Writing into a String cannot fail.
    let _ = writeln!(prompt, "Root URL: {root_url}");
    let _ = writeln!(prompt, "Total pages retrieved: {}", records.len());
    let _ = writeln!(prompt, "User question: {question}");
    prompt.push_str("\nConfluence context:");

    for (i, record) in records.iter().enumerate() {
        let _ = write!(
            prompt,
            "\n--- Source {n} ---\n\
             Page ID  : {id}\n\
             Title    : {title}\n\
             Depth    : {depth}\n\
             URL      : {url}\n\
             Content  :\n{content}\n",
            n = i + 1,
            id = record.id,
            title = record.title,
            depth = record.depth,
            url = record.source_url,
            content = truncate_content(&record.content, CONTENT_BUDGET_CHARS),
        );
    }

    prompt
}

/// Cut `content` to `max_chars` characters, marking the cut.
fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{TRUNCATION_MARKER}", &content[..idx]),
        None => content.to_string(),
    }
}
