//! Detector output before persistence.

use quiniela_core::errors::DetectionError;
use quiniela_core::types::{NewPattern, NewPatternScore, PatternKind};
use serde::Serialize;

use super::{PatternParams, PatternSignature, ScoreDetails};

/// One pattern found by a detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedPattern {
    pub signature: PatternSignature,
    pub params: PatternParams,
    /// In [0, 1].
    pub strength: f64,
    pub support: u64,
    pub scores: Vec<DetectedScore>,
}

/// A per-number score attached to a detected pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedScore {
    pub number: u8,
    /// In [0, 100].
    pub score: f64,
    /// In [0, 1].
    pub confidence: f64,
    pub details: ScoreDetails,
    pub reasoning: String,
}

impl DetectedPattern {
    pub fn kind(&self) -> PatternKind {
        self.signature.kind()
    }

    /// Encode the typed payloads into the storage record.
    pub fn encode(&self) -> Result<NewPattern, DetectionError> {
        let signature = self.signature.to_json().map_err(|e| encoding("signature", e))?;
        let params = serde_json::to_string(&self.params).map_err(|e| encoding("params", e))?;
        let scores = self
            .scores
            .iter()
            .map(|s| {
                Ok(NewPatternScore {
                    number: s.number,
                    score: s.score,
                    confidence: s.confidence,
                    details: serde_json::to_string(&s.details)
                        .map_err(|e| encoding("score details", e))?,
                    reasoning: s.reasoning.clone(),
                })
            })
            .collect::<Result<Vec<_>, DetectionError>>()?;

        Ok(NewPattern {
            kind: self.kind(),
            signature,
            params,
            strength: self.strength,
            support: self.support,
            scores,
        })
    }
}

fn encoding(what: &'static str, e: serde_json::Error) -> DetectionError {
    DetectionError::Encoding {
        what,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_keeps_kind_and_tagged_details() {
        let pattern = DetectedPattern {
            signature: PatternSignature::correlation(9, 3),
            params: PatternParams::NumberCorrelation {
                pmi: 1.2,
                chi_square: 12.0,
                p_value: 0.001,
                joint_count: 9,
            },
            strength: 0.6,
            support: 9,
            scores: vec![DetectedScore {
                number: 3,
                score: 21.0,
                confidence: 0.61,
                details: ScoreDetails::Correlation {
                    correlated_with: 9,
                    pmi: 1.2,
                    joint_count: 9,
                    chi_square: 12.0,
                },
                reasoning: "co-occurs with 9".to_string(),
            }],
        };

        let record = pattern.encode().unwrap();
        assert_eq!(record.kind, PatternKind::Correlation);
        assert_eq!(record.signature, r#"{"type":"number_correlation","numbers":[3,9]}"#);
        assert!(record.scores[0].details.starts_with(r#"{"type":"correlation""#));
    }
}
