//! Non-fatal diagnostics: notice kinds, severity levels, and aggregation.
//!
//! Degenerate factors, aliased candidates, discarded constants and lenient
//! match mismatches never abort a reconstruction. They are collected here
//! and returned next to the result; each notice is also forwarded to the
//! `log` facade as it is recorded.

use core::fmt;

use serde::Serialize;

/// Severity level of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; the result is unaffected.
    Info,
    /// The result was reduced or may be inaccurate.
    Warning,
}

/// What kind of recoverable event a notice records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeKind {
    /// A candidate is constant along the slice and was discarded.
    ConstantCandidate,
    /// A candidate factor appeared with multiplicity other than one.
    DegenerateFactor,
    /// Candidates share factors; one representative was kept.
    Aliased,
    /// A lenient match tolerated missing factors or mixed multiplicities.
    LenientMismatch,
    /// Scaling needed a fresh seed.
    Retried,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConstantCandidate => "constant-candidate",
            Self::DegenerateFactor => "degenerate-factor",
            Self::Aliased => "aliased",
            Self::LenientMismatch => "lenient-mismatch",
            Self::Retried => "retried",
        })
    }
}

/// A single recorded notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Event kind.
    pub kind: NoticeKind,
    /// Severity.
    pub severity: Severity,
    /// Human-readable summary.
    pub message: String,
    /// Optional additional detail lines.
    pub details: Vec<String>,
}

impl Notice {
    /// Creates an informational notice.
    pub fn info(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Info,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Creates a warning.
    pub fn warn(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Attaches detail lines.
    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Returns true for warnings.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        for d in &self.details {
            write!(f, "\n  {d}")?;
        }
        Ok(())
    }
}

/// Aggregated notices of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Notices in the order they were raised.
    pub notices: Vec<Notice>,
}

impl Diagnostics {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a notice and forwards it to the logger.
    pub fn push(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Warning => log::warn!("{notice}"),
            Severity::Info => log::info!("{notice}"),
        }
        self.notices.push(notice);
    }

    /// Appends the notices of another report without logging them again.
    pub fn extend(&mut self, other: Diagnostics) {
        self.notices.extend(other.notices);
    }

    /// Notices of the given kind.
    pub fn of_kind(&self, kind: NoticeKind) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(move |n| n.kind == kind)
    }

    /// Returns the count of warnings.
    pub fn warning_count(&self) -> usize {
        self.notices.iter().filter(|n| n.is_warning()).count()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
