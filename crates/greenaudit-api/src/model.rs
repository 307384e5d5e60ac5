use greenaudit_core::{Grade, Recommendation};
use serde::{Deserialize, Serialize};

/// Business-metrics record submitted for an audit. Wire names are
/// camelCase; every field is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    pub text: String,
    pub paper_usage: f64,
    pub cloud_spending: f64,
    pub remote_percent: f64,
    pub disposable_cost: f64,
    pub electricity_usage: f64,
    pub waste_volume: f64,
}

impl AuditRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err(
                "all business metrics are required: text must not be empty".to_string(),
            );
        }
        Ok(())
    }
}

/// The full audit outcome: raw reply plus everything derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub reply: String,
    pub score: u8,
    pub grade: Grade,
    pub grade_style: &'static str,
    pub score_source: &'static str,
    pub recommendations: Vec<Recommendation>,
    pub provider: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AuditRequest {
        AuditRequest {
            text: "Local coffee roastery".to_string(),
            paper_usage: 10.0,
            cloud_spending: 120.0,
            remote_percent: 40.0,
            disposable_cost: 75.0,
            electricity_usage: 900.0,
            waste_volume: 30.0,
        }
    }

    #[test]
    fn camel_case_wire_names_deserialize() {
        let raw = r#"{
            "text": "Local coffee roastery",
            "paperUsage": 10,
            "cloudSpending": 120,
            "remotePercent": 40,
            "disposableCost": 75,
            "electricityUsage": 900,
            "wasteVolume": 30
        }"#;
        let parsed: AuditRequest = serde_json::from_str(raw).expect("parse request");
        assert_eq!(parsed.text, "Local coffee roastery");
        assert_eq!(parsed.waste_volume, 30.0);
    }

    #[test]
    fn missing_metric_is_rejected() {
        let raw = r#"{"text": "idea", "paperUsage": 10}"#;
        assert!(serde_json::from_str::<AuditRequest>(raw).is_err());
    }

    #[test]
    fn blank_text_fails_validation() {
        let mut req = request();
        req.text = "   ".to_string();
        assert!(req.validate().is_err());
        assert!(request().validate().is_ok());
    }
}
