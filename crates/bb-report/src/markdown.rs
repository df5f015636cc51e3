//! Markdown and JSON rendering of experiment reports.

use std::fmt::Write as _;

use bb_common::{DriftOutcome, DriftPayload, DriftResult};
use tracing::info;

use crate::error::{ReportError, Result};
use crate::report::ExperimentReport;

/// Top-level report heading.
pub const REPORT_TITLE: &str = "Experiment Report";

/// Section headings in rendering order.
pub const SECTION_TITLES: [&str; 4] = [
    "Reference Metrics",
    "Mutated Metrics",
    "Drift Report",
    "Robustness Report",
];

/// One markdown section read back by [`parse_sections`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    /// Heading level: 1 for the title, 2 for the body sections.
    pub level: u8,
    pub title: String,
    pub entries: Vec<(String, String)>,
}

impl ReportSection {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Render the report as sectioned markdown.
pub fn render_markdown(report: &ExperimentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", REPORT_TITLE);
    out.push('\n');

    let mut meta = vec![
        ("run_id".to_string(), report.run_id().to_string()),
        ("generated_at".to_string(), report.generated_at().to_rfc3339()),
    ];
    if let Some(dataset) = report.dataset() {
        meta.push(("dataset".to_string(), dataset.to_string()));
    }
    if let Some(model) = report.model() {
        meta.push(("model".to_string(), model.to_string()));
    }
    for note in report.notes() {
        meta.push(("note".to_string(), note.clone()));
    }
    push_bullets(&mut out, &meta);

    let reference: Vec<_> = report
        .reference_metrics()
        .iter()
        .map(|(m, v)| (m.to_string(), fmt_f64(v)))
        .collect();
    push_section(&mut out, SECTION_TITLES[0], &reference);

    let mutated: Vec<_> = report
        .mutated_metrics()
        .iter()
        .map(|(m, v)| (m.to_string(), fmt_f64(v)))
        .collect();
    push_section(&mut out, SECTION_TITLES[1], &mutated);

    push_section(&mut out, SECTION_TITLES[2], &drift_entries(report));

    let mut robustness: Vec<_> = report
        .degradation()
        .iter()
        .map(|(m, pct)| (format!("{}_degradation_pct", m), fmt_f64(pct)))
        .collect();
    if let Some((metric, _)) = report.degradation().worst() {
        robustness.push(("worst_metric".to_string(), metric.to_string()));
    }
    push_section(&mut out, SECTION_TITLES[3], &robustness);

    info!(
        bytes = out.len(),
        run_id = report.run_id(),
        "Experiment report generated"
    );
    out
}

/// Render the report as pretty-printed JSON.
pub fn render_json(report: &ExperimentReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn drift_entries(report: &ExperimentReport) -> Vec<(String, String)> {
    let drift = report.drift();
    if drift.is_empty() {
        return vec![("status".to_string(), "unavailable".to_string())];
    }

    let mut entries = vec![
        ("backends".to_string(), drift.len().to_string()),
        ("succeeded".to_string(), drift.succeeded().to_string()),
    ];
    for result in drift.iter() {
        entries.extend(backend_entries(result));
    }
    entries
}

fn backend_entries(result: &DriftResult) -> Vec<(String, String)> {
    let key = |field: &str| format!("{}.{}", result.backend, field);
    match &result.outcome {
        DriftOutcome::Failed(failure) => vec![
            (key("status"), "unavailable".to_string()),
            (key("error"), failure.to_string()),
        ],
        DriftOutcome::Success(payload) => {
            let mut entries = vec![
                (key("status"), "success".to_string()),
                (key("score"), fmt_f64(payload.score())),
            ];
            if let Some(p) = payload.p_value() {
                entries.push((key("p_value"), fmt_f64(p)));
            }
            entries.push((key("drift_detected"), payload.drift_detected().to_string()));
            if let DriftPayload::FeatureReport(r) = payload {
                entries.push((
                    key("drifted_features"),
                    format!("{}/{}", r.drifted_count, r.features.len()),
                ));
                if !r.missing_features.is_empty() {
                    entries.push((key("missing_features"), r.missing_features.join(",")));
                }
            }
            entries
        }
    }
}

fn fmt_f64(value: f64) -> String {
    format!("{:.4}", value)
}

fn push_section(out: &mut String, title: &str, entries: &[(String, String)]) {
    out.push('\n');
    let _ = writeln!(out, "## {}", title);
    push_bullets(out, entries);
}

fn push_bullets(out: &mut String, entries: &[(String, String)]) {
    for (key, value) in entries {
        // a value must stay on its bullet line
        let value = value.replace(['\r', '\n'], " ");
        let _ = writeln!(out, "- {}: {}", key, value);
    }
}

/// Parse markdown produced by [`render_markdown`] back into sections.
///
/// Blank lines are skipped. Any other line must be a `#`/`##` heading or a
/// `- key: value` bullet under a heading.
pub fn parse_sections(markdown: &str) -> Result<Vec<ReportSection>> {
    let mut sections: Vec<ReportSection> = Vec::new();
    for (idx, line) in markdown.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(title) = line.strip_prefix("## ") {
            sections.push(ReportSection {
                level: 2,
                title: title.trim().to_string(),
                entries: Vec::new(),
            });
        } else if let Some(title) = line.strip_prefix("# ") {
            sections.push(ReportSection {
                level: 1,
                title: title.trim().to_string(),
                entries: Vec::new(),
            });
        } else if let Some(bullet) = line.strip_prefix("- ") {
            let (key, value) = bullet.split_once(": ").ok_or_else(|| ReportError::Malformed {
                line: line_no,
                message: "bullet without ': ' separator".to_string(),
            })?;
            let section = sections.last_mut().ok_or_else(|| ReportError::Malformed {
                line: line_no,
                message: "bullet before any heading".to_string(),
            })?;
            section.entries.push((key.to_string(), value.to_string()));
        } else {
            return Err(ReportError::Malformed {
                line: line_no,
                message: format!("unexpected line: {}", line),
            });
        }
    }
    Ok(sections)
}
