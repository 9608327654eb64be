#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Budget allocation types shared by the simulator, the record sink
//! client, the server, and storage.
//!
//! Field names serialize in camelCase to match the JSON documents the
//! browser client sends and receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Percentage total above which an allocation is over budget.
pub const FULL_ALLOCATION: f64 = 100.0;

/// One spending bucket and the share assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationCategory {
    /// Stable catalog identifier (e.g. `"health-env"`).
    pub id: String,
    /// Thai display name.
    pub name: String,
    pub description: String,
    /// Assigned share, nominally 0 to 100 but not clamped.
    pub percentage: f64,
    /// `percentage / 100 * total budget`, in baht.
    pub amount: f64,
    /// Display color as a CSS hex string.
    pub color: String,
}

/// A snapshot of one user's allocation, as sent to the record sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSubmission {
    pub municipality_id: String,
    pub municipality_name: String,
    /// Municipality budget at submission time, in baht.
    pub total_budget: f64,
    pub categories: Vec<AllocationCategory>,
    /// True iff the percentages summed to more than 100.
    pub over_budget: bool,
    /// Free-text revenue ideas, only kept when over budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub over_budget_ideas: Option<String>,
}

impl AllocationSubmission {
    /// Sum of all category percentages.
    #[must_use]
    pub fn total_percentage(&self) -> f64 {
        self.categories.iter().map(|c| c.percentage).sum()
    }
}

/// Requester metadata attached when a submission is received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A submission as persisted, with the fields assigned on receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAllocation {
    pub id: String,
    #[serde(flatten)]
    pub submission: AllocationSubmission,
    pub timestamp: DateTime<Utc>,
    pub user_info: RequesterInfo,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn category(id: &str, percentage: f64) -> AllocationCategory {
        AllocationCategory {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            percentage,
            amount: 0.0,
            color: "#000000".to_string(),
        }
    }

    #[test]
    fn submission_uses_camel_case_and_omits_missing_ideas() {
        let submission = AllocationSubmission {
            municipality_id: "5101".into(),
            municipality_name: "เทศบาลเมืองลำพูน".into(),
            total_budget: 4.0e8,
            categories: vec![category("water", 100.0)],
            over_budget: false,
            over_budget_ideas: None,
        };

        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["municipalityId"], "5101");
        assert_eq!(value["totalBudget"], 4.0e8);
        assert_eq!(value["overBudget"], false);
        assert!(value.get("overBudgetIdeas").is_none());
    }

    #[test]
    fn parses_browser_payload() {
        let submission: AllocationSubmission = serde_json::from_value(json!({
            "municipalityId": "5101",
            "municipalityName": "เทศบาลเมืองลำพูน",
            "totalBudget": 400000000,
            "categories": [{
                "id": "water",
                "name": "บริหารจัดการน้ำ",
                "description": "",
                "percentage": 60,
                "amount": 240000000,
                "color": "#42A5F5"
            }, {
                "id": "economy",
                "name": "เศรษฐกิจและแหล่งท่องเที่ยว",
                "description": "",
                "percentage": 45.5,
                "amount": 182000000,
                "color": "#66BB6A"
            }],
            "overBudget": true,
            "overBudgetIdeas": "ภาษีป้าย"
        }))
        .unwrap();

        assert!((submission.total_percentage() - 105.5).abs() < 1e-9);
        assert_eq!(submission.over_budget_ideas.as_deref(), Some("ภาษีป้าย"));
    }

    #[test]
    fn stored_allocation_flattens_submission() {
        let stored = StoredAllocation {
            id: "abc".into(),
            submission: AllocationSubmission {
                municipality_id: "1".into(),
                municipality_name: "ก".into(),
                total_budget: 8.0e7,
                categories: vec![],
                over_budget: false,
                over_budget_ideas: None,
            },
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            user_info: RequesterInfo {
                ip_address: Some("127.0.0.1".into()),
                user_agent: None,
            },
        };

        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["municipalityId"], "1");
        assert_eq!(value["userInfo"]["ipAddress"], "127.0.0.1");
        assert!(value["timestamp"].as_str().unwrap().starts_with("2024-05-01T10:00:00"));

        let back: StoredAllocation = serde_json::from_value(value).unwrap();
        assert_eq!(back, stored);
    }
}
