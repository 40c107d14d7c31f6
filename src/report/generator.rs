//! CSV report generation.
//!
//! Renders an [`AnalysisResult`] into the two-section CSV layout: an
//! overall summary followed by a per-user performance table.

use crate::models::AnalysisResult;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;

/// Column header of the per-user section.
const USER_HEADER: [&str; 9] = [
    "User",
    "Total",
    "Success",
    "Failed",
    "Lusha",
    "Lusha Ph",
    "Apollo",
    "Apollo Ph",
    "Total Ph",
];

/// A rendered report, ready to be written to disk and attached to an email.
#[derive(Debug, Clone)]
pub struct CsvReport {
    /// Timestamped filename, unique per run.
    pub filename: String,

    /// UTF-8 CSV bytes.
    pub bytes: Vec<u8>,
}

/// Render the analysis into the two-section CSV report.
pub fn generate(analysis: &AnalysisResult, now: DateTime<Utc>) -> Result<CsvReport> {
    // Rows range from one to nine fields, so the writer must be flexible.
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    let overall = &analysis.overall;

    writer.write_record(["OVERALL SUMMARY"])?;
    writer.write_record(["Metric", "Value"])?;
    for (metric, value) in [
        ("Total API Calls", overall.total_calls),
        ("Successful Calls", overall.successful_calls),
        ("Failed Calls", overall.failed_calls),
        ("Apollo Calls", overall.apollo_calls),
        ("Lusha Calls", overall.lusha_calls),
        ("Phone Found Total", overall.phone_found_total),
        ("Apollo Phone Found", overall.apollo_phone_found_total),
        ("Lusha Phone Found", overall.lusha_phone_found_total),
        ("Phone Not Found", overall.phone_not_found_total),
    ] {
        writer.write_record([metric, value.to_string().as_str()])?;
    }
    writer.write_record([""])?;

    writer.write_record(["USER-WISE PERFORMANCE"])?;
    writer.write_record(USER_HEADER)?;
    // BTreeMap iteration is already sorted by user name.
    for (user, stats) in &analysis.user_stats {
        writer.write_record([
            user.clone(),
            stats.total.to_string(),
            stats.success.to_string(),
            stats.failed.to_string(),
            stats.lusha_calls.to_string(),
            stats.lusha_phone_found.to_string(),
            stats.apollo_calls.to_string(),
            stats.apollo_phone_found.to_string(),
            stats.phone_found.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush the CSV buffer: {}", e))?;

    Ok(CsvReport {
        filename: report_filename(now),
        bytes,
    })
}

/// Timestamped report filename, so consecutive runs never collide.
pub fn report_filename(now: DateTime<Utc>) -> String {
    format!(
        "api_performance_report_{}.csv",
        now.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::models::CallRecord;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 8, 7).unwrap()
    }

    fn sample_analysis() -> AnalysisResult {
        let records = vec![
            CallRecord {
                user_name: Some("zoe".to_string()),
                lusha_api_success: Some(true),
                phone_found: Some(true),
                enrichment_source: Some("LUSHA".to_string()),
            },
            CallRecord {
                user_name: Some("alice".to_string()),
                lusha_api_success: Some(false),
                phone_found: Some(false),
                enrichment_source: Some("APOLLO".to_string()),
            },
            CallRecord::default(),
        ];
        analyze(&records)
    }

    fn render_lines(analysis: &AnalysisResult) -> Vec<String> {
        let report = generate(analysis, fixed_now()).unwrap();
        String::from_utf8(report.bytes)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_report_filename_embeds_timestamp() {
        assert_eq!(
            report_filename(fixed_now()),
            "api_performance_report_20240510_090807.csv"
        );
    }

    #[test]
    fn test_overall_section_layout() {
        let lines = render_lines(&sample_analysis());

        assert_eq!(lines[0], "OVERALL SUMMARY");
        assert_eq!(lines[1], "Metric,Value");
        assert_eq!(lines[2], "Total API Calls,3");
        assert_eq!(lines[3], "Successful Calls,1");
        assert_eq!(lines[4], "Failed Calls,1");
        assert_eq!(lines[5], "Apollo Calls,1");
        assert_eq!(lines[6], "Lusha Calls,2");
        assert_eq!(lines[7], "Phone Found Total,1");
        assert_eq!(lines[8], "Apollo Phone Found,0");
        assert_eq!(lines[9], "Lusha Phone Found,1");
        assert_eq!(lines[10], "Phone Not Found,1");
    }

    #[test]
    fn test_sections_are_separated_by_blank_row() {
        let lines = render_lines(&sample_analysis());

        assert_eq!(lines[11], "");
        assert_eq!(lines[12], "USER-WISE PERFORMANCE");
        assert_eq!(
            lines[13],
            "User,Total,Success,Failed,Lusha,Lusha Ph,Apollo,Apollo Ph,Total Ph"
        );
    }

    #[test]
    fn test_user_rows_are_sorted_by_name() {
        let lines = render_lines(&sample_analysis());

        let users: Vec<&str> = lines[14..]
            .iter()
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(users, vec!["Unknown", "alice", "zoe"]);

        let mut sorted = users.clone();
        sorted.sort();
        assert_eq!(users, sorted);
    }

    #[test]
    fn test_user_row_values() {
        let lines = render_lines(&sample_analysis());

        // alice: one explicit Apollo failure with no phone found.
        assert_eq!(lines[15], "alice,1,0,1,0,0,1,0,0");
        // zoe: one Lusha success with a phone found.
        assert_eq!(lines[16], "zoe,1,1,0,1,1,0,0,1");
    }

    #[test]
    fn test_empty_analysis_renders_headers_only() {
        let lines = render_lines(&AnalysisResult::default());

        assert_eq!(lines.len(), 14);
        assert_eq!(lines[0], "OVERALL SUMMARY");
        assert_eq!(lines[2], "Total API Calls,0");
        assert_eq!(lines[12], "USER-WISE PERFORMANCE");
    }
}
