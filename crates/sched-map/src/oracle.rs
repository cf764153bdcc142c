//! Pluggable mapping oracle and its chat-completions client.
//!
//! An oracle is an external service that can propose a column mapping or judge
//! between two proposals. It is optional: without one, the analyzer and judge
//! run on their local rules.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use sched_model::{MappingProposal, ParsedInput};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OracleError;

/// HTTP request timeout used when none is configured.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Rows included in the analysis prompt.
const SAMPLE_ROWS: usize = 3;

const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";
const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
const ENV_TIMEOUT: &str = "SCHEDULE_ORACLE_TIMEOUT_SECS";

const ANALYSIS_PROMPT: &str = "You are a clinical data standards expert specializing in CDISC SDTM mapping.
Map column names from clinical trial schedules to standard fields.

Standard fields:
- Visit information -> visit_name
- Day/Date information -> visit_day
- Procedures/Assessments -> procedures
- Time windows -> visit_window
- Subject/Patient ID -> subject_id

Respond ONLY with valid JSON in this exact format:
{\"mappings\": {\"source_column\": \"target_field\"}, \"confidence\": 0-100, \"reasoning\": \"brief explanation\"}";

const JUDGE_PROMPT: &str = "You are the final arbiter for clinical data mapping decisions.
Choose the BEST mapping between two conflicting analyses.
Consider CDISC SDTM compliance, data consistency, and minimal information loss.

Respond ONLY with valid JSON:
{\"chosen\": \"llm\" or \"fuzzy\", \"confidence\": 0-100, \"reasoning\": \"one sentence explanation\", \"final_mappings\": {}}";

/// Raw mapping suggested by an oracle. Field names are not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OracleProposal {
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Which of the two judged proposals the oracle picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum VerdictChoice {
    #[serde(rename = "llm", alias = "first", alias = "a")]
    First,
    #[serde(rename = "fuzzy", alias = "second", alias = "b")]
    Second,
}

/// Arbitration answer from an oracle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OracleVerdict {
    pub chosen: VerdictChoice,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    /// Replacement mappings; empty means keep the chosen proposal's mappings.
    #[serde(default)]
    pub final_mappings: BTreeMap<String, String>,
}

/// External mapping service consulted by the analyzer and the judge.
pub trait MappingOracle: Send + Sync {
    /// Proposes a mapping for the input's columns.
    fn propose(&self, parsed: &ParsedInput) -> Result<OracleProposal, OracleError>;

    /// Chooses between two disagreeing proposals.
    fn judge(
        &self,
        first: &MappingProposal,
        second: &MappingProposal,
        parsed: &ParsedInput,
    ) -> Result<OracleVerdict, OracleError>;
}

/// Connection settings for [`ChatCompletionsOracle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub api_key: String,
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl OracleConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Returns `None` unless key, endpoint, deployment and API version are all set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let timeout = read(ENV_TIMEOUT)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or(DEFAULT_ORACLE_TIMEOUT, Duration::from_secs);
        Some(Self {
            api_key: read(ENV_API_KEY)?,
            endpoint: read(ENV_ENDPOINT)?,
            deployment: read(ENV_DEPLOYMENT)?,
            api_version: read(ENV_API_VERSION)?,
            timeout,
        })
    }

    /// Chat-completions URL for the configured deployment.
    pub fn completions_url(&self) -> String {
        let endpoint = self.endpoint.trim_end_matches('/');
        format!(
            "{endpoint}/openai/deployments/{}/chat/completions?api-version={}",
            self.deployment, self.api_version
        )
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Oracle backed by an Azure OpenAI style chat-completions deployment.
pub struct ChatCompletionsOracle {
    client: Client,
    config: OracleConfig,
}

impl ChatCompletionsOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(OracleError::Network)?;
        Ok(Self { client, config })
    }

    /// Builds an oracle from the environment, if it is fully configured.
    pub fn from_env() -> Result<Option<Self>, OracleError> {
        OracleConfig::from_env().map(Self::new).transpose()
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, OracleError> {
        let body = CompletionRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
        };
        debug!(deployment = %self.config.deployment, "calling mapping oracle");
        let response = self
            .client
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OracleError::Status { status, message });
        }

        let completion: CompletionResponse = response.json()?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OracleError::MalformedResponse("no completion content".to_string()))
    }
}

impl MappingOracle for ChatCompletionsOracle {
    fn propose(&self, parsed: &ParsedInput) -> Result<OracleProposal, OracleError> {
        let sample = serde_json::to_string_pretty(parsed.sample_rows(SAMPLE_ROWS))
            .map_err(|error| OracleError::MalformedResponse(error.to_string()))?;
        let user = format!(
            "Map these clinical trial schedule columns to standard fields:\n\nColumns: {}\n\nFirst few rows of data:\n{sample}",
            parsed.columns().join(", ")
        );
        let content = self.complete(ANALYSIS_PROMPT, &user, 0.2, 500)?;
        parse_reply(&content)
    }

    fn judge(
        &self,
        first: &MappingProposal,
        second: &MappingProposal,
        parsed: &ParsedInput,
    ) -> Result<OracleVerdict, OracleError> {
        let render = |proposal: &MappingProposal| {
            serde_json::to_string_pretty(&proposal.mappings)
                .map_err(|error| OracleError::MalformedResponse(error.to_string()))
        };
        let user = format!(
            "Two systems disagree on mapping this clinical trial schedule:\n\nColumns in file: {:?}\n\n\
             LLM Analysis (confidence: {}):\n{}\n\n\
             Fuzzy Logic Analysis (confidence: {}):\n{}\n\n\
             Which mapping is more appropriate for CDISC SDTM compliance?",
            parsed.columns(),
            first.confidence,
            render(first)?,
            second.confidence,
            render(second)?,
        );
        let content = self.complete(JUDGE_PROMPT, &user, 0.1, 300)?;
        parse_reply(&content)
    }
}

/// Decodes a JSON reply, tolerating a surrounding Markdown code fence.
pub fn parse_reply<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, OracleError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim())
        .map_err(|error| OracleError::MalformedResponse(error.to_string()))
}
