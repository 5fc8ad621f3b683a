//! Report rendering for the on-demand view.

use std::fmt::Write as _;

use crate::domain::{ProbeRecord, RunAggregate};

/// Records with enabled zones first, otherwise in run order.
fn enabled_first(aggregate: &RunAggregate) -> Vec<&ProbeRecord> {
    let mut rows: Vec<&ProbeRecord> = aggregate.records.iter().collect();
    // sort_by_key is stable, so ties keep their run order.
    rows.sort_by_key(|r| !r.outcome.is_enabled());
    rows
}

/// Minimal HTML escaping for text and attribute content.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the aggregate as a standalone HTML page.
pub fn render_html(aggregate: &RunAggregate) -> String {
    let mut rows = String::new();
    for record in enabled_first(aggregate) {
        let status_class = if record.outcome.is_enabled() {
            "text-green-600 font-bold"
        } else {
            "text-gray-400"
        };
        let _ = write!(
            rows,
            r#"
        <tr class="border-b border-gray-100 hover:bg-gray-50">
          <td class="py-3 px-6 text-sm font-medium text-gray-900">{}</td>
          <td class="py-3 px-6 text-xs text-gray-500">{}</td>
          <td class="py-3 px-6 text-xs text-gray-500">{}</td>
          <td class="py-3 px-6 text-sm"><span class="{}">{}</span></td>
        </tr>"#,
            escape_html(&record.resource.name),
            escape_html(&record.resource.account_name),
            escape_html(&record.resource.plan_tier),
            status_class,
            escape_html(record.outcome.message()),
        );
    }

    let error_html = if aggregate.diagnostics.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = aggregate.diagnostics.iter().map(|d| escape_html(d)).collect();
        format!(
            r#"<div class="bg-red-100 border-l-4 border-red-500 text-red-700 p-4 mb-4 text-xs">{}</div>"#,
            lines.join("<br>")
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>CF Snippets Monitor</title>
  <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-50 p-6 font-sans">
  <div class="max-w-5xl mx-auto bg-white shadow rounded-lg overflow-hidden">
    <div class="p-6 bg-gray-900 text-white flex justify-between items-center">
      <h1 class="text-xl font-bold">Cloudflare Snippets Monitor</h1>
      <div class="text-xs text-gray-400">检测了 {total} 个域名</div>
    </div>
    {error_html}
    <div class="overflow-x-auto">
      <table class="min-w-full text-left">
        <thead class="bg-gray-100 text-gray-600 text-xs uppercase">
          <tr>
            <th class="py-3 px-6">域名</th>
            <th class="py-3 px-6">账户</th>
            <th class="py-3 px-6">Plan</th>
            <th class="py-3 px-6">状态</th>
          </tr>
        </thead>
        <tbody>{rows}
        </tbody>
      </table>
    </div>
    <div class="p-4 bg-gray-50 text-xs text-center text-gray-400">
      {enabled} 个域名已开通 | Generated at {generated}
    </div>
  </div>
</body>
</html>
"#,
        total = aggregate.records.len(),
        enabled = aggregate.enabled_count(),
        generated = aggregate.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

/// Render the aggregate as a plain-text table for terminals.
pub fn render_text(aggregate: &RunAggregate) -> String {
    let rows = enabled_first(aggregate);
    let name_width = rows
        .iter()
        .map(|r| r.resource.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("ZONE".len());
    let account_width = rows
        .iter()
        .map(|r| r.resource.account_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("ACCOUNT".len());

    let mut out = String::new();
    for diagnostic in &aggregate.diagnostics {
        let _ = writeln!(out, "! {diagnostic}");
    }
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<account_width$}  {:<16}  STATUS",
        "ZONE", "ACCOUNT", "PLAN"
    );
    for record in rows {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<account_width$}  {:<16}  {}",
            record.resource.name,
            record.resource.account_name,
            record.resource.plan_tier,
            record.outcome.message()
        );
    }
    let _ = writeln!(
        out,
        "{} / {} zones enabled",
        aggregate.enabled_count(),
        aggregate.records.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProbeOutcome;
    use crate::test_support::record;
    use chrono::Utc;

    fn sample() -> RunAggregate {
        RunAggregate {
            records: vec![
                record("off.example", ProbeOutcome::NotEntitled),
                record("on.example", ProbeOutcome::Enabled),
                record("<script>.example", ProbeOutcome::NotFound),
            ],
            diagnostics: vec!["Token 处理出错 (...abcd): page 1: unexpected status: 401".to_string()],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_enabled_rows_first_stable() {
        let aggregate = sample();
        let names: Vec<_> = enabled_first(&aggregate)
            .iter()
            .map(|r| r.resource.name.as_str())
            .collect();
        assert_eq!(names, vec!["on.example", "off.example", "<script>.example"]);
    }

    #[test]
    fn test_html_contains_counts_and_diagnostics() {
        let html = render_html(&sample());
        assert!(html.contains("检测了 3 个域名"));
        assert!(html.contains("1 个域名已开通"));
        assert!(html.contains("...abcd"));
        assert!(html.contains("&lt;script&gt;.example"));
        assert!(!html.contains("<script>.example"));
    }

    #[test]
    fn test_html_without_diagnostics_has_no_banner() {
        let mut aggregate = sample();
        aggregate.diagnostics.clear();
        assert!(!render_html(&aggregate).contains("bg-red-100"));
    }

    #[test]
    fn test_text_table() {
        let text = render_text(&sample());
        assert!(text.starts_with("! Token"));
        assert!(text.contains("on.example"));
        assert!(text.ends_with("1 / 3 zones enabled\n"));
    }
}
