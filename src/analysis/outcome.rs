use serde::Serialize;
use std::fmt;

/// Placeholder for an unidentified date, and the date of every failure
pub const NOT_AVAILABLE: &str = "N/A";

/// Why an analysis did not produce a structured result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// Upload retries exhausted, or the uploaded file never became usable
    Uploading,
    /// The model answered, but not with the expected JSON
    Parsing,
    /// The service rejected the request or could not be reached
    Api,
    /// Anything else
    Unknown,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Uploading => "error_uploading",
            Self::Parsing => "error_parsing",
            Self::Api => "error_api",
            Self::Unknown => "error_unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured result extracted from the recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    /// Lowercase color name, or `unknown`
    pub color: String,
    /// Free-text date, or `N/A`
    pub date: String,
    pub summary: String,
}

/// A classified failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Color recovered by scanning an unparseable response
    pub salvaged_color: Option<String>,
}

impl AnalysisFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            salvaged_color: None,
        }
    }
}

/// Result of one analysis request. Never an `Err`: every path yields the
/// same three fields for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AnalysisOutcome {
    Succeeded(AnalysisReport),
    Failed(AnalysisFailure),
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed(failure) => Some(failure.kind),
        }
    }

    /// Color label: the identified color, a salvaged color, or the failure label
    pub fn color(&self) -> &str {
        match self {
            Self::Succeeded(report) => &report.color,
            Self::Failed(failure) => failure
                .salvaged_color
                .as_deref()
                .unwrap_or_else(|| failure.kind.label()),
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Self::Succeeded(report) => &report.date,
            Self::Failed(_) => NOT_AVAILABLE,
        }
    }

    /// Summary text, or the failure message
    pub fn summary(&self) -> &str {
        match self {
            Self::Succeeded(report) => &report.summary,
            Self::Failed(failure) => &failure.message,
        }
    }

    pub fn into_triple(self) -> (String, String, String) {
        (
            self.color().to_string(),
            self.date().to_string(),
            self.summary().to_string(),
        )
    }
}
