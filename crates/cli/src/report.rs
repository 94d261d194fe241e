//! Classification of graphql-inspector output.
//!
//! Every stdout line is re-emitted on the `gqli::inspector` target at the
//! level its content implies. Unrecognized lines are treated as errors.

use regex::Regex;
use std::sync::LazyLock;

/// Prefixes graphql-inspector puts in front of its messages.
const LEVEL_PREFIXES: &[&str] = &["[log] ", "[error] ", "[warn] ", "[success] ", "[info] "];

static CHANGES_HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^Detected the following changes \(\d+\) between schemas:$").ok());

static BREAKING_SUMMARY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^Detected \d+ breaking changes$").ok());

const NO_BREAKING_CHANGES: &str = "No breaking changes detected";

/// How a line of tool output is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Not reported.
    Skip,
    /// Reported at info.
    Info,
    /// Reported at error.
    Error,
}

/// Remove one leading level prefix such as `[log] `.
pub fn strip_level(line: &str) -> &str {
    LEVEL_PREFIXES
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))
        .unwrap_or(line)
}

fn matches(pattern: &LazyLock<Option<Regex>>, line: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(line))
}

/// Decide how a stripped line is reported.
pub fn classify(line: &str) -> Severity {
    if line.trim().is_empty() || matches(&CHANGES_HEADER, line) {
        Severity::Skip
    } else if matches(&BREAKING_SUMMARY, line) {
        Severity::Error
    } else if line == NO_BREAKING_CHANGES || line.starts_with('✔') {
        Severity::Info
    } else {
        Severity::Error
    }
}

/// Stripped stdout lines paired with how they are reported.
pub fn classify_output(output: &str) -> impl Iterator<Item = (Severity, &str)> {
    output.lines().map(strip_level).map(|line| (classify(line), line))
}

/// Log every line of the tool's stdout.
pub fn report_stdout(output: &str) {
    for (severity, line) in classify_output(output) {
        match severity {
            Severity::Skip => {}
            Severity::Info => tracing::info!(target: "gqli::inspector", "{line}"),
            Severity::Error => tracing::error!(target: "gqli::inspector", "{line}"),
        }
    }
}

/// Log every non-blank line of the tool's stderr as a warning.
pub fn report_stderr(output: &str) {
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        tracing::warn!(target: "gqli::inspector", "{line}");
    }
}
