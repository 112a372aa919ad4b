use std::fmt::Write;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

use crate::config::Config;
use crate::document::{MARKER_END, MARKER_START};
use crate::record::{RequestStatus, RunResult};

/// Second time reference shown next to UTC: Asia/Shanghai, which has no DST.
const LOCAL_OFFSET_SECS: i32 = 8 * 3600;
const LOCAL_LABEL: &str = "Asia/Shanghai";

const NOT_AVAILABLE: &str = "N/A";

/// Render the marker-wrapped report block. Output depends only on the inputs.
pub fn render(result: &RunResult, config: &Config) -> String {
    let mut out = String::new();
    out.push_str(MARKER_START);
    out.push('\n');
    out.push_str("## Latest Benchmark Run\n\n");
    for line in header_lines(result, config) {
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str("\n### Request Details\n\n");
    out.push_str("| # | Status | Duration (s) | Output Chars | Error |\n");
    out.push_str("|---|---|---:|---:|---|\n");
    if result.records.is_empty() {
        out.push_str("| - | - | - | - | no requests executed |\n");
    }
    for record in &result.records {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            record.sequence,
            record.status.as_str(),
            fmt_secs(record.duration),
            record.output_chars,
            record
                .error_message
                .as_deref()
                .map(escape_cell)
                .unwrap_or_default(),
        );
    }

    out.push_str(MARKER_END);
    out.push('\n');
    out
}

/// Compact summary for CI job pages: the header without the detail table,
/// followed by one line per failed request.
pub fn render_step_summary(result: &RunResult, config: &Config) -> String {
    let mut out = String::from("## Benchmark Availability Summary\n\n");
    for line in header_lines(result, config) {
        out.push_str(&line);
        out.push('\n');
    }

    let failed: Vec<_> = result
        .records
        .iter()
        .filter(|r| r.status == RequestStatus::Failure)
        .collect();
    if !failed.is_empty() {
        out.push_str("\n### Failed Requests\n\n");
        for record in failed {
            let _ = writeln!(
                out,
                "- Request {}: {}",
                record.sequence,
                record.error_message.as_deref().map(escape_cell).unwrap_or_default()
            );
        }
    }
    out
}

fn header_lines(result: &RunResult, config: &Config) -> Vec<String> {
    let summary = &result.summary;
    let mut lines = vec![
        format!("- Status: **{}**", result.status),
        format!("- Started (UTC): `{}`", fmt_utc(result.started_at)),
        format!("- Started ({LOCAL_LABEL}): `{}`", fmt_local(result.started_at)),
        format!("- API URL: `{}`", escape_inline(&config.api_url)),
        format!("- Model: `{}`", escape_inline(&config.model)),
        format!("- Prompt: `{}`", escape_inline(&config.prompt)),
        format!("- Planned Requests: `{}`", result.planned_count),
        format!("- Attempted Requests: `{}`", result.actual_count()),
        format!("- Request Timeout (s): `{}`", fmt_param(config.request_timeout)),
        format!("- Max Runtime (s, 0 = unlimited): `{}`", fmt_param(config.max_runtime)),
        format!("- Max Tokens: `{}`", config.max_tokens),
        format!("- Temperature: `{}`", config.temperature),
        format!("- Request Pause (s): `{}`", fmt_param(config.request_pause)),
        format!("- Successful Requests: `{}`", summary.success_count),
        format!("- Failed Requests: `{}`", summary.failure_count),
        format!("- Availability: `{:.1}%`", summary.availability_pct),
        format!("- Total Duration (s): `{}`", fmt_secs(result.total_duration)),
        format!("- Average Duration (s): `{}`", fmt_opt_secs(summary.avg_duration)),
        format!("- Fastest Duration (s): `{}`", fmt_opt_secs(summary.min_duration)),
        format!("- Slowest Duration (s): `{}`", fmt_opt_secs(summary.max_duration)),
    ];
    if let Some(ref message) = result.error_message {
        lines.push(format!("- Error: `{}`", escape_inline(message)));
    }
    lines
}

fn fmt_utc(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn fmt_local(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(LOCAL_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset).to_rfc3339_opts(SecondsFormat::Secs, false),
        None => fmt_utc(at),
    }
}

fn fmt_secs(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64())
}

fn fmt_opt_secs(d: Option<Duration>) -> String {
    d.map(fmt_secs).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Configured durations print without trailing zeros: `120`, `0.5`.
fn fmt_param(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("{}", d.as_secs())
    } else {
        format!("{secs}")
    }
}

/// Interpolated text must never reproduce a block marker, or the next run
/// would find the block malformed. Every HTML comment opener is defused.
fn neutralise_markers(text: &str) -> String {
    text.replace("<!--", "&lt;!--")
}

fn escape_cell(text: &str) -> String {
    neutralise_markers(text)
        .replace('|', "\\|")
        .replace(['\r', '\n'], " ")
}

fn escape_inline(text: &str) -> String {
    neutralise_markers(text)
        .replace('`', "'")
        .replace(['\r', '\n'], " ")
}
