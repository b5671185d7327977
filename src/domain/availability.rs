//! # Availability Verdicts
//!
//! The resolved availability signal for one product check and the
//! per-extractor results it is folded from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability of a product as seen in one check cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown,
}

impl Availability {
    /// `true` for AVAILABLE and UNAVAILABLE
    #[must_use]
    pub const fn is_definitive(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Available => "AVAILABLE",
            Self::Unavailable => "UNAVAILABLE",
            Self::Unknown => "UNKNOWN",
        })
    }
}

/// Availability plus a diagnostic reason.
///
/// The reason is for logs only; no decision ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityVerdict {
    pub availability: Availability,
    pub reason: Option<String>,
}

impl AvailabilityVerdict {
    #[must_use]
    pub fn available(reason: impl Into<String>) -> Self {
        Self {
            availability: Availability::Available,
            reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            availability: Availability::Unavailable,
            reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            availability: Availability::Unknown,
            reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub const fn is_definitive(&self) -> bool {
        self.availability.is_definitive()
    }
}

impl fmt::Display for AvailabilityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} ({})", self.availability, reason),
            None => write!(f, "{}", self.availability),
        }
    }
}

/// Rank of an extractor when extractors disagree. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    /// Purely lexical scan of the rendered text
    KeywordFallback = 1,
    /// Known purchase-action markers in the document tree
    StructuralMarker = 2,
    /// Authoritative backing data embedded in the page
    EmbeddedData = 3,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::KeywordFallback => "keyword-fallback",
            Self::StructuralMarker => "structural-marker",
            Self::EmbeddedData => "embedded-data",
        })
    }
}

/// What one extractor concluded about one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorResult {
    pub verdict: AvailabilityVerdict,
    pub confidence: Confidence,
}

impl ExtractorResult {
    #[must_use]
    pub const fn new(verdict: AvailabilityVerdict, confidence: Confidence) -> Self {
        Self { verdict, confidence }
    }

    #[must_use]
    pub const fn availability(&self) -> Availability {
        self.verdict.availability
    }
}
