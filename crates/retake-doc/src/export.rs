//! Plain-text export of block and alternative descriptions.
//!
//! Produces the text file body only; archiving and download headers belong to
//! whatever serves it.

use retake_types::{Alternative, ProjectSnapshot};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Which alternatives of each block are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportScope {
    #[default]
    AllAlternatives,
    CurrentOnly,
}

/// Render every block's descriptions as text.
pub fn export_descriptions(snapshot: &ProjectSnapshot, scope: ExportScope) -> String {
    let mut out = String::new();

    for (index, block) in snapshot.blocks.iter().enumerate() {
        // Numbering follows sequence position even if a block is skipped
        let current = block.current_alternative();
        if scope == ExportScope::CurrentOnly && current.is_none() {
            continue;
        }

        out.push_str(&format!("--- Block {}: {} ---\n", index + 1, block.name));
        if let Some(description) = non_empty(&block.description) {
            out.push_str(&format!("Block Description: {description}\n"));
        }
        out.push('\n');

        match (scope, current) {
            (ExportScope::CurrentOnly, Some(alt)) => {
                write_alternative(&mut out, "Current Alternative", alt);
            }
            _ => {
                for (alt_index, alt) in block.alternatives.iter().enumerate() {
                    write_alternative(&mut out, &format!("Alternative {}", alt_index + 1), alt);
                }
            }
        }

        out.push('\n');
    }

    out
}

/// File name for an export of `project_name`.
pub fn export_file_name(project_name: &str, scope: ExportScope) -> String {
    match scope {
        ExportScope::AllAlternatives => format!("{project_name}_descriptions.txt"),
        ExportScope::CurrentOnly => format!("{project_name}_current_descriptions.txt"),
    }
}

/// Unix millis as RFC 3339 UTC.
pub fn millis_to_rfc3339(millis: u64) -> String {
    let nanos = i128::from(millis) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn write_alternative(out: &mut String, label: &str, alt: &Alternative) {
    out.push_str(&format!("{label}: {}\n", alt.name));
    if let Some(description) = non_empty(&alt.description) {
        out.push_str(&format!("Description: {description}\n"));
    }
    out.push_str(&format!(
        "Modified: {}\n\n",
        millis_to_rfc3339(alt.modified_at)
    ));
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
