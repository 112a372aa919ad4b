use crate::error::BenchError;

pub const MARKER_START: &str = "<!-- OPENAI_BENCHMARK_RESULTS_START -->";
pub const MARKER_END: &str = "<!-- OPENAI_BENCHMARK_RESULTS_END -->";

/// Remove the marked section of `document` (if any) and append `block` at
/// the end, separated from the remaining text by one blank line.
///
/// Fails without touching anything when the markers are malformed: only one
/// present, either one duplicated, or end before start.
pub fn replace_block(
    document: &str,
    marker_start: &str,
    marker_end: &str,
    block: &str,
) -> Result<String, BenchError> {
    let starts: Vec<usize> = document.match_indices(marker_start).map(|(i, _)| i).collect();
    let ends: Vec<usize> = document.match_indices(marker_end).map(|(i, _)| i).collect();

    let remaining = match (starts.as_slice(), ends.as_slice()) {
        ([], []) => document.trim_end().to_string(),
        ([start], [end]) if start < end => {
            let before = document[..*start].trim_end();
            let after = strip_leading_blank_lines(&document[end + marker_end.len()..]);
            join_sections(before, after.trim_end())
        }
        ([start], [end]) => {
            return Err(BenchError::DocumentFormat(format!(
                "end marker (byte {end}) precedes start marker (byte {start})"
            )));
        }
        (s, e) => {
            return Err(BenchError::DocumentFormat(format!(
                "expected each marker exactly once, found {} start and {} end",
                s.len(),
                e.len()
            )));
        }
    };

    let block = block.trim_matches('\n');
    let mut out = remaining;
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(block);
    out.push('\n');
    Ok(out)
}

/// Drop the rest of the marker line and any blank lines after it.
fn strip_leading_blank_lines(text: &str) -> &str {
    let mut rest = text;
    loop {
        match rest.find('\n') {
            Some(i) if rest[..i].trim().is_empty() => rest = &rest[i + 1..],
            None if rest.trim().is_empty() => return "",
            _ => return rest,
        }
    }
}

fn join_sections(before: &str, after: &str) -> String {
    match (before.is_empty(), after.is_empty()) {
        (_, true) => before.to_string(),
        (true, false) => after.to_string(),
        (false, false) => format!("{before}\n\n{after}"),
    }
}
