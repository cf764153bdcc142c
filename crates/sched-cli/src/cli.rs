//! CLI argument definitions for the schedule converter.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use sched_model::{CacheWritePolicy, FileType, TargetFormat};

#[derive(Parser)]
#[command(
    name = "schedule-converter",
    version,
    about = "Convert clinical trial visit schedules to CDISC SDTM, FHIR R4 or OMOP CDM",
    long_about = "Convert clinical trial visit schedules (CSV, JSON or text) to standard formats.\n\n\
                  Column mappings are settled by cached decisions, pattern rules, structural\n\
                  analysis and arbitration. Set AZURE_OPENAI_* variables (or a .env file) to\n\
                  enable the remote analysis oracle."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory of the persistent mapping cache (in-memory when omitted).
    #[arg(long = "cache-dir", value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// How a new decision treats a cached one for the same columns.
    #[arg(
        long = "write-policy",
        value_enum,
        default_value = "replace-always",
        global = true
    )]
    pub write_policy: WritePolicyArg,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow schedule cell values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a schedule file to a target format.
    Convert(ConvertArgs),

    /// Show columns, detected patterns and suggested mappings without converting.
    Analyze(AnalyzeArgs),

    /// Lint a previously converted document.
    Validate(ValidateArgs),

    /// Inspect or clear the mapping cache.
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Schedule file (raw or base64-encoded).
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Input file type.
    #[arg(long = "file-type", value_enum, default_value = "csv")]
    pub file_type: FileTypeArg,

    /// Target format.
    #[arg(long = "target", value_enum, default_value = "cdisc-sdtm")]
    pub target: TargetArg,

    /// Organization whose cached mappings are used and updated.
    #[arg(long = "org", value_name = "ID")]
    pub organization: Option<String>,

    /// Minimum confidence (0-100) for accepting a stage's mapping [default: 85].
    #[arg(long = "threshold", value_name = "PERCENT")]
    pub threshold: Option<f64>,

    /// STUDYID written to SDTM records.
    #[arg(long = "study-id", value_name = "ID")]
    pub study_id: Option<String>,

    /// Write the converted document to this file.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the full conversion result as JSON instead of a summary.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[arg(long = "file-type", value_enum, default_value = "csv")]
    pub file_type: FileTypeArg,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// JSON document produced by `convert`.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[arg(long = "target", value_enum, default_value = "cdisc-sdtm")]
    pub target: TargetArg,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// List cached mappings of an organization, most recently used first.
    List {
        #[arg(long = "org", value_name = "ID")]
        organization: String,
    },
    /// Remove cached mappings of an organization, or of everyone with `all`.
    Clear {
        #[arg(long = "org", value_name = "ID|all")]
        organization: String,
    },
    /// Show cache statistics for one organization or the whole cache.
    Stats {
        #[arg(long = "org", value_name = "ID")]
        organization: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FileTypeArg {
    Csv,
    Json,
    Text,
}

impl From<FileTypeArg> for FileType {
    fn from(arg: FileTypeArg) -> Self {
        match arg {
            FileTypeArg::Csv => FileType::Csv,
            FileTypeArg::Json => FileType::Json,
            FileTypeArg::Text => FileType::Text,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TargetArg {
    CdiscSdtm,
    FhirR4,
    OmopCdm,
}

impl From<TargetArg> for TargetFormat {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::CdiscSdtm => TargetFormat::CdiscSdtm,
            TargetArg::FhirR4 => TargetFormat::FhirR4,
            TargetArg::OmopCdm => TargetFormat::OmopCdm,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WritePolicyArg {
    ReplaceAlways,
    KeepHigherConfidence,
}

impl From<WritePolicyArg> for CacheWritePolicy {
    fn from(arg: WritePolicyArg) -> Self {
        match arg {
            WritePolicyArg::ReplaceAlways => CacheWritePolicy::ReplaceAlways,
            WritePolicyArg::KeepHigherConfidence => CacheWritePolicy::KeepHigherConfidence,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
