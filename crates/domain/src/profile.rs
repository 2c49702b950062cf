//! User profile types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in user's profile as returned by `/users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Server-side identifier.
    pub id: Value,
    /// Login email.
    pub email: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Current weight in kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Goal weight in kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_weight_kg: Option<f64>,
    /// Daily water target in millilitres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_goal_ml: Option<u32>,
    /// Fields this client does not model, kept so the cached user round-trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial profile update sent with PATCH.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New goal weight in kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_weight_kg: Option<f64>,
    /// New daily water target in millilitres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_goal_ml: Option<u32>,
}

impl ProfileUpdate {
    /// Returns true if the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.goal_weight_kg.is_none() && self.water_goal_ml.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let body = json!({
            "id": 42,
            "email": "sam@example.com",
            "weight_kg": 71.5,
            "onboarding_step": "done"
        });
        let profile: UserProfile = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(profile.email, "sam@example.com");
        assert_eq!(profile.extra.get("onboarding_step"), Some(&json!("done")));
        assert_eq!(serde_json::to_value(&profile).unwrap(), body);
    }

    #[test]
    fn test_profile_update_omits_unset_fields() {
        let update = ProfileUpdate {
            water_goal_ml: Some(2500),
            ..ProfileUpdate::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"water_goal_ml": 2500})
        );
        assert!(ProfileUpdate::default().is_empty());
    }
}
