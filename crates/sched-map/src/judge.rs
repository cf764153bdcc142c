//! Arbitration between two disagreeing proposals.

use std::sync::Arc;

use sched_model::{JudgeKind, MappingProposal, ParsedInput};
use tracing::{info, warn};

use crate::analyzer::filter_mappings;
use crate::oracle::{MappingOracle, OracleVerdict, VerdictChoice};
use crate::thresholds::{ARBITRATION_BOOST, ARBITRATION_CAP, clamp_confidence};

/// Picks one of two proposals when they do not agree well enough.
///
/// An oracle, when configured, is consulted first. The heuristic fallback picks
/// the higher self-reported confidence (ties keep the first proposal) and
/// boosts it by a fixed amount up to a cap.
#[derive(Clone)]
pub struct Judge {
    oracle: Option<Arc<dyn MappingOracle>>,
    boost: f64,
    cap: f64,
}

impl std::fmt::Debug for Judge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Judge")
            .field("oracle", &self.oracle.is_some())
            .field("boost", &self.boost)
            .field("cap", &self.cap)
            .finish()
    }
}

impl Default for Judge {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Judge {
    pub fn new(oracle: Option<Arc<dyn MappingOracle>>) -> Self {
        Self {
            oracle,
            boost: ARBITRATION_BOOST,
            cap: ARBITRATION_CAP,
        }
    }

    #[must_use]
    pub fn with_boost(mut self, boost: f64, cap: f64) -> Self {
        self.boost = boost;
        self.cap = cap;
        self
    }

    /// Always returns a proposal with `arbitrated` set.
    pub fn arbitrate(
        &self,
        first: &MappingProposal,
        second: &MappingProposal,
        parsed: &ParsedInput,
    ) -> MappingProposal {
        if let Some(oracle) = &self.oracle {
            match oracle.judge(first, second, parsed) {
                Ok(verdict) => return apply_verdict(verdict, first, second, parsed),
                Err(error) => warn!(%error, "oracle arbitration failed, using heuristic"),
            }
        }
        self.heuristic(first, second, parsed)
    }

    fn heuristic(
        &self,
        first: &MappingProposal,
        second: &MappingProposal,
        parsed: &ParsedInput,
    ) -> MappingProposal {
        let (chosen, other) = if second.confidence > first.confidence {
            (second, first)
        } else {
            (first, second)
        };
        let mut decision = chosen.clone();
        decision.fingerprint = parsed.fingerprint().to_string();
        decision.confidence = (chosen.confidence + self.boost).min(self.cap);
        decision.reasoning = Some(format!(
            "{} proposal showed higher confidence ({:.1} vs {:.1})",
            chosen.method.as_str(),
            chosen.confidence,
            other.confidence
        ));
        decision.arbitrated = true;
        decision.judge = Some(JudgeKind::HeuristicFallback);
        info!(
            fingerprint = parsed.fingerprint(),
            chosen = chosen.method.as_str(),
            confidence = decision.confidence,
            "heuristic arbitration"
        );
        decision
    }
}

fn apply_verdict(
    verdict: OracleVerdict,
    first: &MappingProposal,
    second: &MappingProposal,
    parsed: &ParsedInput,
) -> MappingProposal {
    let chosen = match verdict.chosen {
        VerdictChoice::First => first,
        VerdictChoice::Second => second,
    };
    let mut decision = chosen.clone().with_reasoning(
        verdict
            .reasoning
            .unwrap_or_else(|| "Oracle arbitration".to_string()),
    );
    decision.fingerprint = parsed.fingerprint().to_string();
    if !verdict.final_mappings.is_empty() {
        decision.mappings = filter_mappings(verdict.final_mappings, parsed);
    }
    decision.confidence = verdict
        .confidence
        .map_or(chosen.confidence, clamp_confidence);
    decision.arbitrated = true;
    decision.judge = Some(JudgeKind::Oracle);
    info!(
        fingerprint = parsed.fingerprint(),
        chosen = chosen.method.as_str(),
        confidence = decision.confidence,
        "oracle arbitration"
    );
    decision
}
