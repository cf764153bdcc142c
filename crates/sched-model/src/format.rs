//! Input file types and output target formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Supported input encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Json,
    Text,
}

impl FileType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            _ => Err(ModelError::UnsupportedFileType(raw.to_string())),
        }
    }
}

/// Output schemas the converter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFormat {
    #[serde(rename = "CDISC_SDTM")]
    CdiscSdtm,
    #[serde(rename = "FHIR_R4")]
    FhirR4,
    #[serde(rename = "OMOP_CDM")]
    OmopCdm,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 3] = [Self::CdiscSdtm, Self::FhirR4, Self::OmopCdm];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CdiscSdtm => "CDISC_SDTM",
            Self::FhirR4 => "FHIR_R4",
            Self::OmopCdm => "OMOP_CDM",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetFormat {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == raw.trim())
            .ok_or_else(|| ModelError::UnknownTargetFormat(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_rejects_spreadsheets() {
        assert_eq!("CSV".parse::<FileType>(), Ok(FileType::Csv));
        assert_eq!(
            "xlsx".parse::<FileType>(),
            Err(ModelError::UnsupportedFileType("xlsx".to_string()))
        );
    }

    #[test]
    fn target_format_names_are_exact() {
        assert_eq!("FHIR_R4".parse::<TargetFormat>(), Ok(TargetFormat::FhirR4));
        assert!("fhir".parse::<TargetFormat>().is_err());
    }
}
