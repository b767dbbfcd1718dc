//! Sampling strategy documents
//!
//! These types mirror the JSON document that tracing clients fetch from the
//! agent's sampling endpoint. Field names follow the wire format (camelCase),
//! so serializing a [`SamplingStrategyResponse`] yields the exact body clients
//! expect.

use serde::{Deserialize, Serialize};

/// Sampling rate served by the reset responder (0.1% of traces).
pub const DEFAULT_SAMPLING_RATE: f64 = 0.001;

/// Kind of sampling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyType {
    Probabilistic,
    RateLimiting,
}

/// Probabilistic sampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilisticSampling {
    /// Fraction of traces to sample, in `[0.0, 1.0]`
    pub sampling_rate: f64,
}

/// Strategy document returned to polling clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingStrategyResponse {
    pub strategy_type: StrategyType,
    pub probabilistic_sampling: ProbabilisticSampling,
}

impl SamplingStrategyResponse {
    /// Probabilistic strategy with the given rate
    pub fn probabilistic(sampling_rate: f64) -> Self {
        Self {
            strategy_type: StrategyType::Probabilistic,
            probabilistic_sampling: ProbabilisticSampling { sampling_rate },
        }
    }

    /// The known-default strategy that resets clients to 0.1% sampling
    pub fn reset_default() -> Self {
        Self::probabilistic(DEFAULT_SAMPLING_RATE)
    }

    /// Compact JSON encoding, as written on the wire
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Default for SamplingStrategyResponse {
    fn default() -> Self {
        Self::reset_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_default_wire_format() {
        let json = SamplingStrategyResponse::reset_default().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"strategyType":"PROBABILISTIC","probabilisticSampling":{"samplingRate":0.001}}"#
        );
    }

    #[test]
    fn test_strategy_type_names() {
        assert_eq!(
            serde_json::to_string(&StrategyType::Probabilistic).unwrap(),
            "\"PROBABILISTIC\""
        );
        assert_eq!(
            serde_json::to_string(&StrategyType::RateLimiting).unwrap(),
            "\"RATE_LIMITING\""
        );
    }

    #[test]
    fn test_parses_client_view() {
        // Whitespace as emitted by other agents must still parse.
        let body = r#"{"strategyType": "PROBABILISTIC", "probabilisticSampling": {"samplingRate": 1}}"#;
        let parsed: SamplingStrategyResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed, SamplingStrategyResponse::probabilistic(1.0));
    }

    #[test]
    fn test_default_is_reset() {
        let strategy = SamplingStrategyResponse::default();
        assert_eq!(strategy.strategy_type, StrategyType::Probabilistic);
        assert_eq!(strategy.probabilistic_sampling.sampling_rate, DEFAULT_SAMPLING_RATE);
    }
}
