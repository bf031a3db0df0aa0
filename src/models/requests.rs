use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{StudentProfile, WeightsInput};

/// Request to rank the catalog for a profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendRequest {
    #[validate(nested)]
    pub profile: StudentProfile,
    #[serde(default)]
    pub weights: Option<WeightsInput>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to rank the catalog for a stored session's profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SessionRecommendRequest {
    #[serde(default)]
    pub weights: Option<WeightsInput>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to open a session, optionally seeded with what is already known
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(nested)]
    #[serde(default)]
    pub profile: StudentProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_request_validation() {
        let request: RecommendRequest = serde_json::from_str(
            r#"{"profile": {"budget": -10.0}, "limit": 3}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());

        let request: RecommendRequest = serde_json::from_str(
            r#"{"profile": {"budget": 8000, "gpa": 8.5}, "weights": [1, 1, 1, 1, 1, 1]}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(request.limit.is_none());
    }

    #[test]
    fn test_gpa_out_of_range() {
        let request: CreateSessionRequest =
            serde_json::from_str(r#"{"profile": {"gpa": 12.0}}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let request: SessionRecommendRequest = serde_json::from_str(r#"{"limit": 0}"#).unwrap();
        assert!(request.validate().is_err());
    }
}
