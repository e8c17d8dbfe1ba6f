//! Output formatting for batch reports
//!
//! Formats a batch report as human-readable text, JSON, or Markdown

use cvl_index::BatchReport;

/// Format as human-readable text
pub fn format_report_human(report: &BatchReport) -> String {
    let mut output = String::new();
    output.push_str("Running CVL index batch...\n\n");

    for summary in &report.indexed {
        output.push_str(&format!("{}\n", summary.name));
        output.push_str("  ✅ Status: INDEXED\n");
        output.push_str(&format!(
            "    Records: {} ({} properties, {} embeddable)\n",
            summary.records, summary.properties, summary.embeddable
        ));
        output.push_str(&format!("    Output: {}\n", summary.output.display()));
        output.push('\n');
    }

    for failure in &report.failed {
        output.push_str(&format!("{}\n", failure.name));
        output.push_str("  ❌ Status: FAILED\n");
        output.push_str(&format!("    Reason: {}\n", failure.error));
        output.push('\n');
    }

    for unpaired in &report.unpaired {
        output.push_str(&format!("{}\n", unpaired.name));
        output.push_str(&format!("  ⚠️  Status: SKIPPED (missing {})\n", unpaired.missing));
        output.push('\n');
    }

    output.push_str(&format!(
        "batch result: {}. {} indexed; {} failed; {} unpaired\n",
        if report.failed.is_empty() { "ok" } else { "FAILED" },
        report.indexed.len(),
        report.failed.len(),
        report.unpaired.len()
    ));
    output.push_str(&format!("  Records written: {}\n", report.total_records()));

    output
}

/// Format as JSON
pub fn format_report_json(report: &BatchReport) -> Result<String, serde_json::Error> {
    use serde_json::json;

    let output = json!({
        "summary": {
            "indexed": report.indexed.len(),
            "failed": report.failed.len(),
            "unpaired": report.unpaired.len(),
            "records": report.total_records(),
        },
        "indexed": report.indexed,
        "failed": report.failed,
        "unpaired": report.unpaired,
    });

    let mut text = serde_json::to_string_pretty(&output)?;
    text.push('\n');
    Ok(text)
}

/// Format as Markdown
pub fn format_report_markdown(report: &BatchReport) -> String {
    let mut md = String::new();
    md.push_str("# CVL Index Batch Report\n\n");

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- **Indexed**: {}\n", report.indexed.len()));
    md.push_str(&format!("- **Failed**: {}\n", report.failed.len()));
    md.push_str(&format!("- **Unpaired**: {}\n", report.unpaired.len()));
    md.push_str(&format!("- **Records**: {}\n\n", report.total_records()));

    if !report.indexed.is_empty() {
        md.push_str("## Indexed Pairs\n\n");
        md.push_str("| Pair | Records | Properties | Embeddable | Output |\n");
        md.push_str("|------|---------|------------|------------|--------|\n");
        for s in &report.indexed {
            md.push_str(&format!(
                "| {} | {} | {} | {} | `{}` |\n",
                s.name,
                s.records,
                s.properties,
                s.embeddable,
                s.output.display()
            ));
        }
        md.push('\n');
    }

    if !report.failed.is_empty() {
        md.push_str("## Failed Pairs\n\n");
        for f in &report.failed {
            md.push_str(&format!("- ❌ **{}**: {}\n", f.name, f.error));
        }
        md.push('\n');
    }

    if !report.unpaired.is_empty() {
        md.push_str("## Unpaired Files\n\n");
        for u in &report.unpaired {
            md.push_str(&format!("- ⚠️ **{}**: missing `{}`\n", u.name, u.missing));
        }
        md.push('\n');
    }

    md
}
