//! Wire types for the hosted feature service REST API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute bag of a single feature.
pub type Attributes = Map<String, Value>;

/// Error envelope the service returns in place of a result, often with
/// HTTP 200.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    /// OAuth endpoints use `error_description` instead of `message`.
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
}

impl ServiceError {
    /// Best human-readable description available.
    pub fn describe(&self) -> String {
        let text = self
            .message
            .as_deref()
            .or(self.error_description.as_deref())
            .unwrap_or("unknown error");
        match self.code {
            Some(code) => format!("{} (code {})", text, code),
            None => text.to_string(),
        }
    }
}

/// One feature from a query response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub attributes: Attributes,
}

/// Response of a layer `query` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
}

/// Response of the OAuth2 token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub error: Option<ServiceError>,
}

/// Per-feature error inside `addResults`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One entry of `addResults`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditResult {
    #[serde(rename = "objectId", default)]
    pub object_id: Option<i64>,
    #[serde(rename = "globalId", default)]
    pub global_id: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<EditError>,
}

/// Response of a layer `addFeatures` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddFeaturesResponse {
    #[serde(rename = "addResults", default)]
    pub add_results: Vec<EditResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
}

/// One element of the `features` array sent to `addFeatures`.
#[derive(Debug, Serialize)]
pub struct NewFeature<'a, T: Serialize> {
    pub attributes: &'a T,
}

/// Identifiers the service assigned to a newly added feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    #[serde(rename = "objectId")]
    pub object_id: Option<i64>,
    #[serde(rename = "globalId")]
    pub global_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_set_missing_features_defaults_empty() {
        let set: FeatureSet = serde_json::from_str("{}").unwrap();
        assert!(set.features.is_empty());
        assert!(set.error.is_none());
    }

    #[test]
    fn test_feature_set_error_envelope() {
        let set: FeatureSet = serde_json::from_str(
            r#"{"error":{"code":498,"message":"Invalid token.","details":[]}}"#,
        )
        .unwrap();
        let err = set.error.unwrap();
        assert_eq!(err.describe(), "Invalid token. (code 498)");
    }

    #[test]
    fn test_token_error_uses_description() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"error":{"code":400,"error_description":"Invalid client_id"}}"#,
        )
        .unwrap();
        assert!(resp.access_token.is_none());
        assert!(resp.error.unwrap().describe().contains("Invalid client_id"));
    }

    #[test]
    fn test_add_results_parse() {
        let resp: AddFeaturesResponse = serde_json::from_str(
            r#"{"addResults":[{"objectId":42,"globalId":"{ABC}","success":true}]}"#,
        )
        .unwrap();
        assert_eq!(resp.add_results.len(), 1);
        assert_eq!(resp.add_results[0].object_id, Some(42));
        assert!(resp.add_results[0].success);
    }

    #[test]
    fn test_add_result_failure_parse() {
        let resp: AddFeaturesResponse = serde_json::from_str(
            r#"{"addResults":[{"success":false,"error":{"code":1000,"description":"bad field"}}]}"#,
        )
        .unwrap();
        let err = resp.add_results[0].error.clone().unwrap();
        assert_eq!(err.code, Some(1000));
        assert_eq!(err.description.as_deref(), Some("bad field"));
    }
}
