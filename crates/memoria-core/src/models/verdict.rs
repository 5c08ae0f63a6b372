use serde::{Deserialize, Serialize};

use super::wire::VerdictRow;
use crate::constants::VALIDATION_FALLBACK_EXPLANATION;

/// Accept/reject decision of the remote validator plus its explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub accepted: bool,
    pub explanation: String,
}

impl Verdict {
    pub fn accepted(explanation: impl Into<String>) -> Self {
        Self {
            accepted: true,
            explanation: explanation.into(),
        }
    }

    pub fn rejected(explanation: impl Into<String>) -> Self {
        Self {
            accepted: false,
            explanation: explanation.into(),
        }
    }
}

impl From<VerdictRow> for Verdict {
    /// Only an explicit `is_valid: true` accepts.
    fn from(row: VerdictRow) -> Self {
        let explanation = row
            .output
            .filter(|o| !o.trim().is_empty())
            .unwrap_or_else(|| VALIDATION_FALLBACK_EXPLANATION.to_string());
        Self {
            accepted: row.is_valid == Some(true),
            explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_flag_rejects_with_fallback() {
        let verdict = Verdict::from(VerdictRow::default());
        assert!(!verdict.accepted);
        assert_eq!(verdict.explanation, VALIDATION_FALLBACK_EXPLANATION);
    }

    #[test]
    fn test_explanation_kept_verbatim() {
        let verdict = Verdict::from(VerdictRow {
            is_valid: Some(true),
            output: Some("clear face, acceptable".to_string()),
        });
        assert!(verdict.accepted);
        assert_eq!(verdict.explanation, "clear face, acceptable");
    }
}
