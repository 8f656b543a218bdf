use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single input row: one prompt under one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRow {
    /// Prompt category (e.g. "Prompt Injection")
    pub category: String,
    /// The prompt text sent to each model
    pub prompt: String,
}

/// All responses generated for one prompt row, keyed by model display name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Prompt category
    pub category: String,
    /// Original prompt text
    pub prompt: String,
    /// Responses per model, in request order
    pub responses_by_model: BTreeMap<String, Vec<String>>,
}

impl GenerationRecord {
    /// Create an empty record for a prompt row
    pub fn new(category: &str, prompt: &str) -> Self {
        Self {
            category: category.to_string(),
            prompt: prompt.to_string(),
            responses_by_model: BTreeMap::new(),
        }
    }

    /// Append a response for the given model, preserving request order
    pub fn push_response(&mut self, model: &str, response: String) {
        self.responses_by_model
            .entry(model.to_string())
            .or_default()
            .push(response);
    }

    /// A record is complete once every model has exactly `repeat_count` responses
    pub fn is_complete(&self, models: &[String], repeat_count: usize) -> bool {
        models.iter().all(|model| {
            self.responses_by_model
                .get(model)
                .map(|responses| responses.len() == repeat_count)
                .unwrap_or(false)
        })
    }
}

/// Parsed score plus the judge's explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Numeric score; the valid range depends on the rubric
    /// (0-10 breach severity, {0, 2, 3} defense effectiveness, 0-1 consistency)
    pub score: f64,
    /// Explanation text from the judge
    pub explanation: String,
}

/// One scored response: one record per (model, category, prompt, response_index)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Model display name
    pub model: String,
    /// Prompt category
    pub category: String,
    /// Original prompt text
    pub prompt: String,
    /// 0-based position of this response within its group
    pub response_index: usize,
    /// The response text that was scored
    pub response: String,
    /// Security breach severity score (0-10 rubric)
    pub breach: ScoreResult,
    /// Defense mechanism effectiveness score ({0, 2, 3} rubric)
    pub defense: ScoreResult,
    /// Cross-response consistency score (0-1 rubric), computed once per group
    /// and shared by every record in the group
    pub consistency: Option<ScoreResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_response_preserves_order() {
        let mut record = GenerationRecord::new("X", "Why?");
        record.push_response("A", "first".to_string());
        record.push_response("A", "second".to_string());
        record.push_response("B", "other".to_string());

        assert_eq!(record.responses_by_model["A"], vec!["first", "second"]);
        assert_eq!(record.responses_by_model["B"], vec!["other"]);
    }

    #[test]
    fn test_is_complete() {
        let models = vec!["A".to_string(), "B".to_string()];
        let mut record = GenerationRecord::new("X", "Why?");

        for _ in 0..2 {
            record.push_response("A", "r".to_string());
            record.push_response("B", "r".to_string());
        }
        assert!(record.is_complete(&models, 2));
        assert!(!record.is_complete(&models, 3));

        record.push_response("A", "r".to_string());
        assert!(!record.is_complete(&models, 2));
    }

    #[test]
    fn test_is_complete_missing_model() {
        let models = vec!["A".to_string(), "B".to_string()];
        let mut record = GenerationRecord::new("X", "Why?");
        record.push_response("A", "r".to_string());
        assert!(!record.is_complete(&models, 1));
    }

    #[test]
    fn test_evaluation_record_serialization_round_trip() {
        let record = EvaluationRecord {
            model: "LLaMA 2".to_string(),
            category: "Jailbreak".to_string(),
            prompt: "test".to_string(),
            response_index: 3,
            response: "refused".to_string(),
            breach: ScoreResult {
                score: 2.0,
                explanation: "minor".to_string(),
            },
            defense: ScoreResult {
                score: 3.0,
                explanation: "strong refusal".to_string(),
            },
            consistency: None,
        };

        let json = serde_json::to_string(&record).unwrap();
        let parsed: EvaluationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model, "LLaMA 2");
        assert_eq!(parsed.response_index, 3);
        assert_eq!(parsed.breach.score, 2.0);
        assert!(parsed.consistency.is_none());
    }
}
