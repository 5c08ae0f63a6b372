use serde::{Deserialize, Serialize};

/// Why the backend refused a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewRejection {
    MaxReviews,
    ScreenshotRequired,
    DuplicateReview,
    Other(String),
}

impl ReviewRejection {
    pub fn from_code(code: Option<&str>, message: Option<&str>) -> Self {
        match code {
            Some("MAX_REVIEWS") => ReviewRejection::MaxReviews,
            Some("SCREENSHOT_REQUIRED") => ReviewRejection::ScreenshotRequired,
            Some("DUPLICATE_REVIEW") => ReviewRejection::DuplicateReview,
            _ => ReviewRejection::Other(
                message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or("Submission failed. Please try again.")
                    .to_string(),
            ),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ReviewRejection::MaxReviews => "Maximum reviews reached. Thank you.",
            ReviewRejection::ScreenshotRequired => "Please upload at least one screenshot.",
            ReviewRejection::DuplicateReview => "You already submitted feedback.",
            ReviewRejection::Other(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(
            ReviewRejection::from_code(Some("DUPLICATE_REVIEW"), None),
            ReviewRejection::DuplicateReview
        );
        assert_eq!(
            ReviewRejection::from_code(None, Some("Server busy")),
            ReviewRejection::Other("Server busy".to_string())
        );
        assert_eq!(
            ReviewRejection::from_code(Some("WHATEVER"), None).message(),
            "Submission failed. Please try again."
        );
    }
}
