//! HTTP handler functions for the wildlife risk API.

use actix_web::{HttpResponse, web};
use chrono::Datelike as _;
use wildlife_risk_server_models::{
    ApiHealth, MapQueryParams, MunicipalityQueryParams, PredictRequest, SpeciesQueryParams,
};

use crate::{Dashboard, PredictError, hypotheses};

/// `GET /api/health`
pub async fn health(state: web::Data<Dashboard>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        records: state.table().len(),
        model_loaded: state.predictor().is_ok(),
    })
}

/// `GET /api/options`
///
/// Returns the county and species dropdown domains.
pub async fn options(state: web::Data<Dashboard>) -> HttpResponse {
    HttpResponse::Ok().json(state.options())
}

/// `GET /api/municipalities?county=`
///
/// An unknown county yields an empty list.
pub async fn municipalities(
    state: web::Data<Dashboard>,
    params: web::Query<MunicipalityQueryParams>,
) -> HttpResponse {
    HttpResponse::Ok().json(state.municipalities(&params.county))
}

/// `POST /api/predict`
///
/// Scores one location, time and species. The year defaults to the
/// current year.
pub async fn predict(
    state: web::Data<Dashboard>,
    body: web::Json<PredictRequest>,
) -> HttpResponse {
    let current_year = chrono::Local::now().year();
    match state.predict(&body, current_year) {
        Ok(prediction) => HttpResponse::Ok().json(prediction),
        Err(e) => predict_error(&e),
    }
}

/// `GET /api/eda/monthly?species=`
pub async fn monthly(
    state: web::Data<Dashboard>,
    params: web::Query<SpeciesQueryParams>,
) -> HttpResponse {
    HttpResponse::Ok().json(state.monthly_counts(params.species.as_deref()))
}

/// `GET /api/eda/hourly?species=`
pub async fn hourly(
    state: web::Data<Dashboard>,
    params: web::Query<SpeciesQueryParams>,
) -> HttpResponse {
    HttpResponse::Ok().json(state.hourly_counts(params.species.as_deref()))
}

/// `GET /api/eda/counties?species=`
pub async fn counties(
    state: web::Data<Dashboard>,
    params: web::Query<SpeciesQueryParams>,
) -> HttpResponse {
    HttpResponse::Ok().json(state.county_counts(params.species.as_deref()))
}

/// `GET /api/eda/years`
pub async fn years(state: web::Data<Dashboard>) -> HttpResponse {
    HttpResponse::Ok().json(state.years())
}

/// `GET /api/eda/map?year=&species=`
///
/// Returns at most 10 000 collision points for one year.
pub async fn map(
    state: web::Data<Dashboard>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    HttpResponse::Ok().json(state.map(params.year, params.species.as_deref()))
}

/// `GET /api/model/insights`
pub async fn model_insights(state: web::Data<Dashboard>) -> HttpResponse {
    match state.insights() {
        Ok(insights) => HttpResponse::Ok().json(insights),
        Err(e) => predict_error(&e),
    }
}

/// `GET /api/hypotheses`
pub async fn hypotheses() -> HttpResponse {
    HttpResponse::Ok().json(hypotheses::hypotheses())
}

fn predict_error(e: &PredictError) -> HttpResponse {
    match e {
        PredictError::ModelUnavailable(_) => {
            log::error!("Prediction requested without a model: {e}");
            HttpResponse::ServiceUnavailable()
        }
        PredictError::Build(_) | PredictError::Score(_) => {
            log::debug!("Rejected prediction request: {e}");
            HttpResponse::BadRequest()
        }
    }
    .json(serde_json::json!({
        "error": e.to_string()
    }))
}
