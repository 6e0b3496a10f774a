//! Mapping titles cited in an answer back to retrieved records.

use std::collections::HashSet;

use tracing::debug;

use docground_shared::DocumentRecord;

use crate::prompt::SOURCES_HEADING;

/// Markers that end the sources section.
const SECTION_TERMINATORS: [&str; 2] = ["\n##", "\n---"];

/// Resolve the records cited in `answer`.
///
/// Each non-blank line of the sources section is compared, trimmed and
/// case-insensitively, against record titles; the first matching record wins
/// and no record is returned twice. When the section is missing or nothing
/// matches, every record is returned in its original order.
pub fn resolve_sources(answer: &str, records: &[DocumentRecord]) -> Vec<DocumentRecord> {
    let Some(section) = sources_section(answer) else {
        debug!("answer has no sources section, returning all records");
        return records.to_vec();
    };

    let mut selected: Vec<DocumentRecord> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for line in section.lines() {
        let candidate = line.trim();
        if candidate.is_empty() || candidate == SOURCES_HEADING {
            continue;
        }
        let wanted = candidate.to_lowercase();

        let hit = records
            .iter()
            .find(|record| record.title.trim().to_lowercase() == wanted);

        match hit {
            Some(record) if seen.insert(record.id.as_str()) => selected.push(record.clone()),
            Some(_) => {}
            None => debug!(title = candidate, "cited title matched no record"),
        }
    }

    if selected.is_empty() {
        debug!("no cited title matched, returning all records");
        return records.to_vec();
    }
    selected
}

/// Text between the sources heading and the next heading or rule.
fn sources_section(answer: &str) -> Option<&str> {
    let start = answer.find(SOURCES_HEADING)? + SOURCES_HEADING.len();
    let rest = &answer[start..];
    let end = SECTION_TERMINATORS
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.into(),
            title: title.into(),
            parent_id: None,
            depth: 0,
            source_url: format!("https://wiki.example.com/pages/{id}"),
            content: String::new(),
        }
    }

    fn library() -> Vec<DocumentRecord> {
        vec![
            record("1", "Architecture Overview"),
            record("2", "Deployment Guide"),
            record("3", "Runbook"),
        ]
    }

    fn ids(records: &[DocumentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn single_exact_match() {
        let answer = "## Summary\nStuff.\n\n## Sources Referenced\nDeployment Guide\n\n## Gaps & Limitations\nNone identified.";
        assert_eq!(ids(&resolve_sources(answer, &library())), vec!["2"]);
    }

    #[test]
    fn matching_is_trimmed_and_case_insensitive() {
        let answer = "## Sources Referenced\n   deployment GUIDE  \n\tRUNBOOK\n";
        assert_eq!(ids(&resolve_sources(answer, &library())), vec!["2", "3"]);
    }

    #[test]
    fn output_follows_citation_order() {
        let answer = "## Sources Referenced\nRunbook\nArchitecture Overview\n";
        assert_eq!(ids(&resolve_sources(answer, &library())), vec!["3", "1"]);
    }

    #[test]
    fn repeated_citation_is_returned_once() {
        let answer = "## Sources Referenced\nRunbook\nrunbook\nRunbook\n";
        assert_eq!(ids(&resolve_sources(answer, &library())), vec!["3"]);
    }

    #[test]
    fn duplicate_titles_resolve_to_first_record() {
        let records = vec![record("1", "Notes"), record("2", "Notes")];
        let answer = "## Sources Referenced\nNotes\n";
        assert_eq!(ids(&resolve_sources(answer, &records)), vec!["1"]);
    }

    #[test]
    fn missing_section_falls_back_to_all() {
        let answer = "## Summary\nNo citations here.";
        assert_eq!(ids(&resolve_sources(answer, &library())), vec!["1", "2", "3"]);
    }

    #[test]
    fn unmatched_titles_fall_back_to_all() {
        let answer = "## Sources Referenced\nSomething Else\n- Deployment Guide\n";
        assert_eq!(ids(&resolve_sources(answer, &library())), vec!["1", "2", "3"]);
    }

    #[test]
    fn empty_section_falls_back_to_all() {
        let answer = "## Sources Referenced\n\n## Gaps & Limitations\nRunbook";
        assert_eq!(ids(&resolve_sources(answer, &library())), vec!["1", "2", "3"]);
    }

    #[test]
    fn section_stops_at_horizontal_rule() {
        let answer = "## Sources Referenced\nRunbook\n---\nDeployment Guide";
        assert_eq!(ids(&resolve_sources(answer, &library())), vec!["3"]);
    }

    #[test]
    fn section_runs_to_end_of_text() {
        let answer = "## Sources Referenced\nArchitecture Overview\nDeployment Guide";
        assert_eq!(ids(&resolve_sources(answer, &library())), vec!["1", "2"]);
    }

    #[test]
    fn repeated_heading_is_not_a_citation() {
        let mut records = library();
        records.push(record("4", "## Sources Referenced"));

        // An indented repeat stays inside the section and is skipped.
        let answer = "## Sources Referenced\nRunbook\n  ## Sources Referenced\nDeployment Guide\n";
        assert_eq!(ids(&resolve_sources(answer, &records)), vec!["3", "2"]);

        // A repeat at line start closes the section.
        let answer = "## Sources Referenced\nRunbook\n## Sources Referenced\nDeployment Guide\n";
        assert_eq!(ids(&resolve_sources(answer, &records)), vec!["3"]);
    }

    #[test]
    fn no_records_yields_empty() {
        assert!(resolve_sources("## Sources Referenced\nRunbook", &[]).is_empty());
        assert!(resolve_sources("", &[]).is_empty());
    }
}
