//! Feature service client.
//!
//! [`FeatureService`] is the seam the HTTP handlers depend on;
//! [`ArcGisClient`] is the reqwest-backed implementation that talks to the
//! hosted layers named in [`Config`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, ServlineError};
use crate::records::Submission;

use super::auth::{request_token, ClientCredentials, TokenCache};
use super::types::{
    AddFeaturesResponse, AddOutcome, Attributes, FeatureSet, NewFeature, ServiceError,
};

/// Fields requested from the service points layer.
pub const POINT_FIELDS: &str = "PTR,ServiceAddress,GlobalID,coory,coorx";

/// Fields requested from the service line records layer.
pub const RECORD_FIELDS: &str = "LOCDESC,AssetID,MXUNumber,customerSL";

/// Service error codes meaning the token was rejected.
const INVALID_TOKEN_CODES: &[i64] = &[498, 499];

/// Operations the API needs from the upstream feature service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeatureService: Send + Sync {
    /// All service points, for the table view.
    async fn query_service_points(&self) -> Result<FeatureSet>;

    /// Attributes of the newest record attached to a meter, if any.
    async fn latest_record(&self, global_id: &str) -> Result<Option<Attributes>>;

    /// Add one record and return the identifiers the service assigned.
    async fn add_record(&self, submission: &Submission) -> Result<AddOutcome>;
}

/// Build the `where` clause selecting records for a meter.
///
/// Single quotes are doubled so the id cannot close the string literal.
pub fn record_where_clause(global_id: &str) -> String {
    format!("meterGlobal='{}'", global_id.replace('\'', "''"))
}

/// Interpret an `addFeatures` response for a single submitted feature.
///
/// `raw` is the body as received; it is returned as error details when the
/// service sends no per-feature result.
pub fn interpret_add_response(resp: AddFeaturesResponse, raw: Value) -> Result<AddOutcome> {
    if let Some(err) = resp.error {
        return Err(ServlineError::Upstream(err.describe()));
    }

    let Some(first) = resp.add_results.into_iter().next() else {
        return Err(ServlineError::NoAddResults { details: raw });
    };

    if !first.success {
        let err = first.error.unwrap_or_default();
        return Err(ServlineError::AddFeature {
            code: err.code,
            description: err
                .description
                .unwrap_or_else(|| "Unknown error occurred".to_string()),
        });
    }

    Ok(AddOutcome {
        object_id: first.object_id,
        global_id: first.global_id,
    })
}

// ---------------------------------------------------------------------------
// ArcGisClient
// ---------------------------------------------------------------------------

/// reqwest-backed [`FeatureService`].
pub struct ArcGisClient {
    http: reqwest::Client,
    creds: ClientCredentials,
    tokens: TokenCache,
    points_query_url: String,
    records_query_url: String,
    records_add_url: String,
}

impl std::fmt::Debug for ArcGisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcGisClient")
            .field("creds", &self.creds)
            .field("points_query_url", &self.points_query_url)
            .field("records_query_url", &self.records_query_url)
            .field("records_add_url", &self.records_add_url)
            .finish()
    }
}

impl ArcGisClient {
    /// Create a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| ServlineError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            creds: ClientCredentials {
                token_url: config.token_url.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            },
            tokens: TokenCache::new(),
            points_query_url: config.points_query_url.clone(),
            records_query_url: config.records_query_url.clone(),
            records_add_url: config.records_add_url.clone(),
        })
    }

    async fn token(&self) -> Result<String> {
        self.tokens
            .get_or_refresh(|| request_token(&self.http, &self.creds))
            .await
    }

    /// Check a 200 response body for the service's error envelope.
    async fn check_service_error(&self, error: Option<&ServiceError>) -> Result<()> {
        let Some(err) = error else {
            return Ok(());
        };
        if err.code.is_some_and(|c| INVALID_TOKEN_CODES.contains(&c)) {
            warn!(code = ?err.code, "Feature service rejected token; clearing cache");
            self.tokens.invalidate().await;
        }
        Err(ServlineError::Upstream(err.describe()))
    }

    async fn query<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T> {
        let resp = self.http.get(url).query(params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ServlineError::Upstream(format!(
                "Server returned status {}",
                status.as_u16()
            )));
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl FeatureService for ArcGisClient {
    async fn query_service_points(&self) -> Result<FeatureSet> {
        let token = self.token().await?;
        let params = [
            ("where", "1=1"),
            ("outFields", POINT_FIELDS),
            ("returnGeometry", "false"),
            ("token", token.as_str()),
            ("f", "json"),
        ];

        let set: FeatureSet = self.query(&self.points_query_url, &params).await?;
        self.check_service_error(set.error.as_ref()).await?;
        debug!(features = set.features.len(), "Queried service points");
        Ok(set)
    }

    async fn latest_record(&self, global_id: &str) -> Result<Option<Attributes>> {
        let token = self.token().await?;
        let where_clause = record_where_clause(global_id);
        let params = [
            ("where", where_clause.as_str()),
            ("outFields", RECORD_FIELDS),
            ("returnGeometry", "false"),
            ("orderByFields", "OBJECTID DESC"),
            ("resultRecordCount", "1"),
            ("token", token.as_str()),
            ("f", "json"),
        ];

        let set: FeatureSet = self.query(&self.records_query_url, &params).await?;
        self.check_service_error(set.error.as_ref()).await?;
        Ok(set.features.into_iter().next().map(|f| f.attributes))
    }

    async fn add_record(&self, submission: &Submission) -> Result<AddOutcome> {
        let token = self.token().await?;
        let features = serde_json::to_string(&[NewFeature {
            attributes: submission,
        }])?;
        let params = [
            ("features", features.as_str()),
            ("token", token.as_str()),
            ("f", "json"),
        ];

        let resp = self
            .http
            .post(&self.records_add_url)
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ServlineError::Upstream(format!(
                "Server returned status {}",
                status.as_u16()
            )));
        }

        let raw: Value = resp.json().await?;
        let parsed: AddFeaturesResponse = serde_json::from_value(raw.clone())?;
        self.check_service_error(parsed.error.as_ref()).await?;
        interpret_add_response(parsed, raw)
    }
}
