//! Output formatting for ci-gate.
//!
//! Provides text, JSON, and JUnit XML output formatters.
//!
//! The text formatter's last line is always the bare verdict
//! (`All checks have passed!` / `Some checks have not passed!`), never
//! colourised, so scripts can match on it. Without `--verbose` it is the only
//! line.

use crate::cli::args::OutputFormat;
use crate::engine::result::GateReport;
use crate::Check;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a gate report into a string
    fn format(&self, report: &GateReport) -> String;
}

/// Human-readable formatter
pub struct TextFormatter {
    color: bool,
    verbose: bool,
}

impl TextFormatter {
    pub fn new(color: bool, verbose: bool) -> Self {
        TextFormatter { color, verbose }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.colorize(text, "32")
    }

    fn red(&self, text: &str) -> String {
        self.colorize(text, "31")
    }

    fn gray(&self, text: &str) -> String {
        self.colorize(text, "90")
    }

    fn check_line(&self, check: &Check) -> String {
        let status = if check.passed() {
            self.green("[PASS]")
        } else {
            self.red("[FAIL]")
        };
        let detail = self.gray(&format!("{}, {}ms", check.result.status, check.result.duration_ms));
        format!("  {} {}: {} ({})\n", status, check.id, check.name, detail)
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &GateReport) -> String {
        let decision = report.decision();
        if !self.verbose {
            return decision.message().to_string();
        }

        let rule = "--------------------------------------------------------------------------------\n";
        let mut output = String::new();

        output.push_str(rule);
        output.push_str("ci-gate report\n");
        output.push_str(&format!("Host: {}\n", report.hostname));
        output.push_str(&format!("Timestamp: {}\n", format_timestamp(report.timestamp)));
        output.push_str(rule);
        output.push('\n');

        output.push_str("CHECKS\n");
        for check in &report.checks {
            output.push_str(&self.check_line(check));
        }
        output.push('\n');

        let summary = report.summary();
        output.push_str(rule);
        output.push_str(&format!(
            "SUMMARY: {} passed, {} failed\n",
            summary.passed, summary.failed
        ));
        output.push_str(&format!(
            "Total time: {:.1}s\n",
            report.total_duration_ms as f64 / 1000.0
        ));
        output.push_str(&format!("Exit code: {}\n", decision.exit_code()));
        output.push_str(rule);
        output.push_str(decision.message());

        output
    }
}

/// JSON formatter
#[cfg(feature = "json")]
pub struct JsonFormatter {
    pretty: bool,
}

#[cfg(feature = "json")]
#[derive(serde::Serialize)]
struct JsonReport<'a> {
    passed: bool,
    exit_code: i32,
    message: &'static str,
    timestamp: u64,
    hostname: &'a str,
    total_duration_ms: u64,
    summary: crate::ResultSummary,
    checks: &'a [Check],
}

#[cfg(feature = "json")]
impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }
}

#[cfg(feature = "json")]
impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &GateReport) -> String {
        let decision = report.decision();
        let view = JsonReport {
            passed: decision.passed,
            exit_code: decision.exit_code(),
            message: decision.message(),
            timestamp: report.timestamp,
            hostname: &report.hostname,
            total_duration_ms: report.total_duration_ms,
            summary: report.summary(),
            checks: &report.checks,
        };

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&view)
        } else {
            serde_json::to_string(&view)
        };

        rendered.unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize report");
            serde_json::json!({
                "passed": decision.passed,
                "exit_code": decision.exit_code(),
                "message": decision.message(),
            })
            .to_string()
        })
    }
}

/// JUnit XML formatter
#[cfg(feature = "junit")]
#[derive(Default)]
pub struct JunitFormatter;

#[cfg(feature = "junit")]
impl JunitFormatter {
    pub fn new() -> Self {
        JunitFormatter
    }
}

#[cfg(feature = "junit")]
impl OutputFormatter for JunitFormatter {
    fn format(&self, report: &GateReport) -> String {
        let summary = report.summary();
        let time = report.total_duration_ms as f64 / 1000.0;

        let mut output = String::new();
        output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        output.push_str(&format!(
            "<testsuites tests=\"{}\" failures=\"{}\" errors=\"0\" time=\"{:.3}\">\n",
            summary.total, summary.failed, time
        ));
        output.push_str(&format!(
            "  <testsuite name=\"ci-gate\" tests=\"{}\" failures=\"{}\" errors=\"0\" time=\"{:.3}\" timestamp=\"{}\" hostname=\"{}\">\n",
            summary.total,
            summary.failed,
            time,
            format_timestamp(report.timestamp),
            escape_xml(&report.hostname)
        ));

        for check in &report.checks {
            let result = &check.result;
            output.push_str(&format!(
                "    <testcase name=\"{}\" classname=\"ci-gate.{}\" time=\"{:.3}\">\n",
                escape_xml(&check.name),
                escape_xml(&check.id),
                result.duration_ms as f64 / 1000.0
            ));
            if !result.passed() {
                output.push_str(&format!(
                    "      <failure message=\"{}\" type=\"check\">{}</failure>\n",
                    escape_xml(&format!("{} failed", check.id)),
                    escape_xml(&result.status.to_string())
                ));
            }
            if let Some(stdout) = &result.stdout {
                output.push_str(&format!("      <system-out>{}</system-out>\n", escape_xml(stdout)));
            }
            if let Some(stderr) = &result.stderr {
                output.push_str(&format!("      <system-err>{}</system-err>\n", escape_xml(stderr)));
            }
            output.push_str("    </testcase>\n");
        }

        output.push_str("  </testsuite>\n");
        output.push_str("</testsuites>");
        output
    }
}

/// Escape text for XML attributes and content. Control characters other
/// than tab, newline and carriage return are not allowed in XML 1.0 and
/// are dropped.
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            '\t' | '\n' | '\r' => result.push(c),
            c if c.is_control() => {}
            c => result.push(c),
        }
    }
    result
}

/// Get a formatter based on the output format
pub fn get_formatter(format: &OutputFormat, no_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(!no_color, verbose)),
        #[cfg(feature = "json")]
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        #[cfg(feature = "junit")]
        OutputFormat::Junit => Box::new(JunitFormatter::new()),
    }
}

/// Format a Unix timestamp as ISO 8601
pub fn format_timestamp(timestamp: u64) -> String {
    let days_since_epoch = timestamp / 86400;
    let time_of_day = timestamp % 86400;

    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    let mut year = 1970;
    let mut remaining_days = days_since_epoch;
    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining_days < days_in_year {
            break;
        }
        remaining_days -= days_in_year;
        year += 1;
    }

    let mut month = 1;
    loop {
        let days = days_in_month(year, month);
        if remaining_days < days {
            break;
        }
        remaining_days -= days;
        month += 1;
    }

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        remaining_days + 1,
        hours,
        minutes,
        seconds
    )
}

fn is_leap_year(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u64, month: u64) -> u64 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
