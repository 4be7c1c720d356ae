#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the wildlife risk server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the dataset and model types to allow independent evolution of the
//! API contract.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use wildlife_risk_collision_models::RiskLevel;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of collision records loaded.
    pub records: usize,
    /// Whether a prediction model is available.
    pub model_loaded: bool,
}

/// Dropdown domains for the prediction form and chart filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    /// Sorted distinct counties.
    pub counties: Vec<String>,
    /// `"All species"` followed by the sorted distinct species.
    pub species: Vec<String>,
}

/// Query parameters for the municipalities endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityQueryParams {
    /// County to list municipalities for.
    pub county: String,
}

/// Query parameters for endpoints filtered by species.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesQueryParams {
    /// Species name; absent or `"All species"` means every species.
    pub species: Option<String>,
}

/// Query parameters for the collision map endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQueryParams {
    /// Year to plot; defaults to the latest year in the dataset.
    pub year: Option<i32>,
    /// Species name; absent or `"All species"` means every species.
    pub species: Option<String>,
}

/// Request body for the prediction endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    /// County.
    pub county: String,
    /// Municipality within the county.
    pub municipality: Option<String>,
    /// Calendar month (1-12).
    pub month: u32,
    /// Hour of day (0-23).
    pub hour: u32,
    /// Species.
    pub species: String,
    /// Calendar year; defaults to the current year.
    pub year: Option<i32>,
    /// WGS84 latitude.
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
    /// Ordinal day of the year.
    pub day_of_year: Option<u32>,
    /// English weekday name.
    pub weekday: Option<String>,
}

/// Probability of a single class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClassProbability {
    /// Class label.
    pub class: String,
    /// Probability in `[0, 1]`.
    pub probability: f64,
}

/// Where to place the prediction on the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMarker {
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Popup text.
    pub label: String,
}

/// A named feature with its value or weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFeatureWeight {
    /// Encoded column name (e.g. `Species_Moose`).
    pub feature: String,
    /// Encoded value or model coefficient.
    pub value: f64,
}

/// Response from the prediction endpoint.
///
/// The risk fields are absent for models that only produce class labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPrediction {
    /// Risk level name.
    pub risk_level: Option<RiskLevel>,
    /// Risk level numeric value (1-5).
    pub risk_value: Option<u8>,
    /// Driving advice for the risk level.
    pub advice: Option<String>,
    /// Probability returned by the model.
    pub raw_score: Option<f64>,
    /// Probability after the risk policy's transform.
    pub adjusted_score: Option<f64>,
    /// Most likely class.
    pub predicted_class: String,
    /// Every class with its probability (empty for label-only models).
    pub probabilities: Vec<ApiClassProbability>,
    /// Map marker for the queried location.
    pub marker: ApiMarker,
    /// Non-zero encoded features, largest magnitude first.
    pub features: Vec<ApiFeatureWeight>,
}

/// Collisions in one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMonthCount {
    /// Calendar month (1-12).
    pub month: u32,
    /// Number of collisions.
    pub count: u64,
}

/// Collisions in one hour of the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHourCount {
    /// Hour of day (0-23).
    pub hour: u32,
    /// Number of collisions.
    pub count: u64,
}

/// Collisions in one county.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCountyCount {
    /// County name.
    pub county: String,
    /// Number of collisions.
    pub count: u64,
}

/// A collision plotted on the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMapPoint {
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Species involved.
    pub species: String,
    /// County.
    pub county: String,
    /// Municipality.
    pub municipality: String,
    /// Calendar date, if known.
    pub date: Option<NaiveDate>,
}

/// Response from the collision map endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMap {
    /// Year plotted, or `None` if the dataset has no dated rows.
    pub year: Option<i32>,
    /// Sampled points (at most 10 000).
    pub points: Vec<ApiMapPoint>,
}

/// Description of the deployed model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiModelInsights {
    /// Model family (e.g. `logistic`).
    pub model_kind: String,
    /// Number of encoded input columns.
    pub feature_count: usize,
    /// Class labels in model order.
    pub classes: Vec<String>,
    /// Features with the largest absolute coefficients, if the model has
    /// linear coefficients.
    pub top_features: Option<Vec<ApiFeatureWeight>>,
}

/// One of the hypotheses the analysis is built around.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHypothesis {
    /// Display order (1-based).
    pub id: u8,
    /// Short title.
    pub title: String,
    /// The claim being tested.
    pub statement: String,
    /// Why the claim is plausible.
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_request_accepts_minimal_body() {
        let request: PredictRequest = serde_json::from_str(
            r#"{"county":"Värmlands län","month":9,"hour":19,"species":"Moose"}"#,
        )
        .unwrap();
        assert_eq!(request.county, "Värmlands län");
        assert!(request.municipality.is_none());
        assert!(request.year.is_none());
        assert!(request.day_of_year.is_none());
    }

    #[test]
    fn prediction_serializes_camel_case_risk_level() {
        let prediction = ApiPrediction {
            risk_level: Some(RiskLevel::VeryHigh),
            risk_value: Some(5),
            advice: None,
            raw_score: Some(0.98),
            adjusted_score: Some(0.95),
            predicted_class: "1".to_owned(),
            probabilities: Vec::new(),
            marker: ApiMarker {
                latitude: 60.0,
                longitude: 15.0,
                label: "Sunne".to_owned(),
            },
            features: Vec::new(),
        };
        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(json["riskLevel"], "Very High");
        assert_eq!(json["predictedClass"], "1");
        assert!(json.get("adjustedScore").is_some());
    }
}
