//! Record shaping between the feature service and the data-entry UI.
//!
//! Two directions:
//! - [`transform_features`] flattens service point features into table rows.
//! - [`Submission::from_form`] validates a submitted form and builds the
//!   attribute set that is forwarded to `addFeatures`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::safety::{Rejection, TextSanitizer};
use crate::upstream::FeatureSet;

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// One row of the service point table.
///
/// Values are passed through untouched; absent attributes become `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePoint {
    /// `PTR`
    pub id: Value,
    /// `ServiceAddress`
    pub address: Value,
    /// `GlobalID`, hidden in the UI and used to look up records.
    pub globalid: Value,
    /// `coory`
    pub latitude: Value,
    /// `coorx`
    pub longitude: Value,
}

impl ServicePoint {
    fn from_attributes(attrs: &Map<String, Value>) -> Self {
        let get = |key: &str| attrs.get(key).cloned().unwrap_or(Value::Null);
        Self {
            id: get("PTR"),
            address: get("ServiceAddress"),
            globalid: get("GlobalID"),
            latitude: get("coory"),
            longitude: get("coorx"),
        }
    }
}

/// Flatten a service point query result into table rows, keeping order.
pub fn transform_features(set: &FeatureSet) -> Vec<ServicePoint> {
    set.features
        .iter()
        .map(|f| ServicePoint::from_attributes(&f.attributes))
        .collect()
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// Form field holding the free-text location description.
pub const LOCATION_FIELD: &str = "LOCDESC";

/// Why a submitted form cannot be forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("No form data provided")]
    NoFormData,

    #[error("Location Description {0}")]
    Location(#[from] Rejection),

    #[error("Asset Number and Antenna Number must be valid integers")]
    InvalidInteger,

    #[error("Missing GlobalID for record update")]
    MissingGlobalId,
}

/// Validated attribute set for a new service line record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    #[serde(rename = "customerSL")]
    pub customer_sl: Value,
    #[serde(rename = "AssetID")]
    pub asset_id: Option<i64>,
    #[serde(rename = "MXUNumber")]
    pub mxu_number: Option<i64>,
    #[serde(rename = "LOCDESC")]
    pub location_description: String,
    #[serde(rename = "meterGlobal")]
    pub meter_global: Value,
}

impl Submission {
    /// Validate a submitted form.
    ///
    /// Checks run in a fixed order (location text, integer fields, meter
    /// id) and the first failure is returned.
    pub fn from_form(
        form: &Map<String, Value>,
        sanitizer: &TextSanitizer,
    ) -> Result<Self, SubmissionError> {
        if form.is_empty() {
            return Err(SubmissionError::NoFormData);
        }

        let raw_location = form.get(LOCATION_FIELD).map(value_as_text).unwrap_or_default();
        let location_description = sanitizer.validate(&raw_location).into_result()?;

        let asset_id = coerce_integer(form.get("AssetID"))?;
        let mxu_number = coerce_integer(form.get("MXUNumber"))?;

        let meter_global = form
            .get("meterGlobal")
            .filter(|v| is_truthy(v))
            .cloned()
            .ok_or(SubmissionError::MissingGlobalId)?;

        Ok(Self {
            customer_sl: form.get("customerSL").cloned().unwrap_or(Value::Null),
            asset_id,
            mxu_number,
            location_description,
            meter_global,
        })
    }
}

/// Text form of a JSON value; `null` becomes the empty string.
fn value_as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a form value counts as filled in.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Convert an optional numeric form field.
///
/// Numbers are always kept, `0` included; floats are truncated toward zero.
/// Other unfilled values (`null`, `""`, `false`, empty containers) become
/// `None`.
fn coerce_integer(value: Option<&Value>) -> Result<Option<i64>, SubmissionError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        _ if !is_truthy(value) => return Ok(None),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(true) => Some(1),
        _ => None,
    };

    parsed.map(Some).ok_or(SubmissionError::InvalidInteger)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
