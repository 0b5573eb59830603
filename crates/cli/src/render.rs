use std::fmt::Write;

use serde::Serialize;
use sigsim_compute::{BatchReport, ComparisonResult};
use sigsim_core::DetectionRule;

/// Everything one run produced, as written in JSON mode.
#[derive(Serialize)]
pub struct RunOutput<'a> {
    pub target_id: &'a str,
    pub target_title: &'a str,
    pub results: &'a [ComparisonResult],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a BatchReport>,
}

pub fn json(output: &RunOutput<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(output)
}

pub fn text(target: &DetectionRule, results: &[ComparisonResult], report: Option<&BatchReport>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Target: {} ({})", target.title, target.id);
    if let Some(r) = report {
        let _ = writeln!(
            out,
            "Scanned {} rules in {} ms: {} scored, {} failed, {} skipped, {} above threshold{}",
            r.total,
            r.elapsed_ms,
            r.scored,
            r.failed,
            r.skipped,
            r.matched,
            if r.cancelled { " (cancelled)" } else { "" }
        );
    }
    if results.is_empty() {
        let _ = writeln!(out, "\nNo similar rules found.");
        return out;
    }

    for (rank, r) in results.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n{:>2}. {:.1}%  {}  [{}]",
            rank + 1,
            r.weighted_similarity * 100.0,
            r.title,
            r.candidate_id
        );
        let _ = write!(
            out,
            "    fields {:.1}%  values {:.1}%",
            r.field_similarity * 100.0,
            r.value_similarity * 100.0
        );
        if let Some(content) = r.content_similarity {
            let _ = write!(out, "  content {:.1}%", content * 100.0);
        }
        let _ = writeln!(out);

        let d = &r.details;
        let _ = writeln!(
            out,
            "    logsource {}  level {}",
            if d.logsource_match { "same" } else { "differs" },
            if d.level_match { "same" } else { "differs" }
        );
        if !d.tag_overlap.is_empty() {
            let _ = writeln!(out, "    shared tags: {}", d.tag_overlap.join(", "));
        }
        for m in &d.value_matches {
            let _ = writeln!(
                out,
                "    '{}' ~ '{}' ({:.1}%)",
                m.target_value,
                m.candidate_value,
                m.score * 100.0
            );
        }
        if let Some(summary) = &r.summary {
            let _ = writeln!(out, "    summary: {summary}");
        }
    }
    out
}
