use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::resume::lenient_strings;

/// Outcome of classifying a job-related email. The discriminants are the
/// integers the classifying agent is instructed to reply with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationResult {
    Rejecting = 0,
    Qualifying = 1,
    Unrelated = 2,
}

impl ClassificationResult {
    pub fn code(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for ClassificationResult {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Rejecting),
            1 => Ok(Self::Qualifying),
            2 => Ok(Self::Unrelated),
            other => Err(other),
        }
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Rejecting => "rejecting",
            Self::Qualifying => "qualifying",
            Self::Unrelated => "unrelated",
        };
        write!(f, "{label} ({})", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailAction {
    MarkRead,
    Star,
    Trash,
}

impl fmt::Display for MailAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MarkRead => "mark-read",
            Self::Star => "star",
            Self::Trash => "trash",
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Agent-reported fit between a résumé and a job. The percentage may arrive
/// as a number or as text such as `"64%"`, and the skills as a list or a
/// comma-separated string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchScore {
    #[serde(default, deserialize_with = "percentage")]
    pub match_percentage: f64,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub matched_skills: Vec<String>,
}

fn percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("match_percentage out of range")),
        Value::String(s) => {
            let trimmed = s.trim().trim_end_matches('%').trim_end();
            trimmed
                .parse()
                .map_err(|_| de::Error::custom(format!("match_percentage is not a number: {s:?}")))
        }
        other => Err(de::Error::custom(format!(
            "match_percentage is not a number: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_codes_round_trip_through_try_from() {
        for code in 0..=2 {
            let result = ClassificationResult::try_from(code).unwrap();
            assert_eq!(result.code(), code);
        }
        assert_eq!(ClassificationResult::try_from(3), Err(3));
        assert_eq!(ClassificationResult::try_from(-1), Err(-1));
    }

    #[test]
    fn match_score_defaults_missing_keys() {
        let score: MatchScore = serde_json::from_str(r#"{"match_percentage": 72.5}"#).unwrap();
        assert_eq!(score.match_percentage, 72.5);
        assert!(score.matched_skills.is_empty());
    }

    #[test]
    fn match_score_reads_percentage_text() {
        let score: MatchScore =
            serde_json::from_str(r#"{"match_percentage": " 64% ", "matched_skills": ["Azure"]}"#).unwrap();
        assert_eq!(score.match_percentage, 64.0);
        assert_eq!(score.matched_skills, vec!["Azure"]);
    }

    #[test]
    fn match_score_splits_joined_skills() {
        let score: MatchScore =
            serde_json::from_str(r#"{"match_percentage": 64, "matched_skills": "Azure, ETL"}"#).unwrap();
        assert_eq!(score.match_percentage, 64.0);
        assert_eq!(score.matched_skills, vec!["Azure", "ETL"]);
    }

    #[test]
    fn match_score_rejects_wordy_percentage() {
        assert!(serde_json::from_str::<MatchScore>(r#"{"match_percentage": "high"}"#).is_err());
    }
}
