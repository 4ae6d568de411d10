//! Scored self-assessment data types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Question id (1..=10) to answer value (0..=3).
pub type Answers = BTreeMap<u8, u8>;

/// Overall severity band of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "minimal")]
    Minimal,
    #[serde(rename = "mild")]
    Mild,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "moderately severe")]
    ModeratelySevere,
    #[serde(rename = "severe")]
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minimal => "minimal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::ModeratelySevere => "moderately severe",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean answer per concern area. `suicidal_thoughts` is the raw answer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScores {
    pub depression: f64,
    pub anxiety: f64,
    pub physical_symptoms: f64,
    pub suicidal_thoughts: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub answers: Answers,
    pub total_score: u32,
    pub severity: Severity,
    /// Concern labels in fixed order: Depression, Anxiety,
    /// Physical Symptoms, Suicidal Thoughts.
    pub primary_concerns: Vec<String>,
    pub category_scores: CategoryScores,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_wire_names() {
        assert_eq!(
            serde_json::to_string(&Severity::ModeratelySevere).unwrap(),
            "\"moderately severe\""
        );
        assert!(Severity::Severe > Severity::Moderate);
    }

    #[test]
    fn test_answers_survive_json() {
        let mut answers = Answers::new();
        answers.insert(10, 2);
        answers.insert(1, 3);
        let json = serde_json::to_string(&answers).unwrap();
        let back: Answers = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&10), Some(&2));
        assert_eq!(back.keys().copied().collect::<Vec<_>>(), vec![1, 10]);
    }
}
