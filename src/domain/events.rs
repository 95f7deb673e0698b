use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::publishing::PublishPayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsOfJoining {
    pub signed_at: DateTime<Utc>,
    pub version: String,
}

/// Raised when a trainee signs the conditions of joining for a programme
/// membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsOfJoiningSignedEvent {
    pub membership_id: String,
    pub person_id: String,
    pub programme_name: String,
    pub conditions_of_joining: ConditionsOfJoining,
}

impl PublishPayload for ConditionsOfJoiningSignedEvent {
    fn correlation_id(&self) -> &str {
        &self.membership_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> ConditionsOfJoiningSignedEvent {
        ConditionsOfJoiningSignedEvent {
            membership_id: "a6de88b8-de41-48dd-9492-c518f5001176".to_string(),
            person_id: "47165".to_string(),
            programme_name: "General Practice".to_string(),
            conditions_of_joining: ConditionsOfJoining {
                signed_at: Utc.with_ymd_and_hms(2024, 2, 1, 10, 30, 0).unwrap(),
                version: "GG9".to_string(),
            },
        }
    }

    #[test]
    fn test_membership_id_is_correlation_id() {
        assert_eq!(event().correlation_id(), "a6de88b8-de41-48dd-9492-c518f5001176");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(event()).unwrap();
        assert_eq!(json["membershipId"], "a6de88b8-de41-48dd-9492-c518f5001176");
        assert_eq!(json["conditionsOfJoining"]["version"], "GG9");
        assert!(json["conditionsOfJoining"]["signedAt"].is_string());
    }
}
