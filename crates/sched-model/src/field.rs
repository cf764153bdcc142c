//! Canonical schedule fields that source columns are mapped onto.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Closed set of target fields understood by the serializers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    VisitName,
    VisitDay,
    Procedures,
    VisitWindow,
    SubjectId,
}

impl CanonicalField {
    /// All canonical fields in declaration order.
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::VisitName,
        CanonicalField::VisitDay,
        CanonicalField::Procedures,
        CanonicalField::VisitWindow,
        CanonicalField::SubjectId,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VisitName => "visit_name",
            Self::VisitDay => "visit_day",
            Self::Procedures => "procedures",
            Self::VisitWindow => "visit_window",
            Self::SubjectId => "subject_id",
        }
    }

    /// Short description used when prompting an external analyzer.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::VisitName => "Visit information",
            Self::VisitDay => "Day/Date information",
            Self::Procedures => "Procedures/Assessments",
            Self::VisitWindow => "Time windows",
            Self::SubjectId => "Subject/Patient ID",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownField(raw.to_string()))
    }
}
