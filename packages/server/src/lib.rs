#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the wildlife collision risk dashboard.
//!
//! Serves the prediction form's dropdown domains, risk predictions, the
//! exploratory aggregates behind the charts and map, and model insights.
//! The collision table, its index and the model are loaded once into a
//! [`Dashboard`] and shared read-only by every worker.

pub mod dashboard;
mod handlers;
pub mod hypotheses;

#[cfg(test)]
mod fixtures;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use wildlife_risk_data::DataConfig;
use wildlife_risk_model::{ModelConfig, RiskPolicy};

pub use dashboard::{Dashboard, PredictError};

/// Address bound when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Port bound when `PORT` is unset or invalid.
pub const DEFAULT_PORT: u16 = 8080;

/// Registers every `/api` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/options", web::get().to(handlers::options))
            .route("/municipalities", web::get().to(handlers::municipalities))
            .route("/predict", web::post().to(handlers::predict))
            .route("/eda/monthly", web::get().to(handlers::monthly))
            .route("/eda/hourly", web::get().to(handlers::hourly))
            .route("/eda/counties", web::get().to(handlers::counties))
            .route("/eda/years", web::get().to(handlers::years))
            .route("/eda/map", web::get().to(handlers::map))
            .route("/model/insights", web::get().to(handlers::model_insights))
            .route("/hypotheses", web::get().to(handlers::hypotheses)),
    );
}

/// Loads the dashboard from the environment and starts the API server.
///
/// The dataset comes from `DATA_PATH`/`CLEAN_DATA_URL`, the model from
/// `MODEL_PATH`/`MODEL_URL` and `MODEL_COLUMNS_PATH`/`MODEL_COLUMNS_URL`.
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset cannot be loaded, or
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let data = DataConfig::from_env();
    let model = ModelConfig::from_env();

    log::info!("Loading collision data from {}...", data.location());
    let dashboard = Dashboard::load(&data, &model, RiskPolicy::default())
        .await
        .map_err(std::io::Error::other)?;

    serve(dashboard).await
}

/// Starts the API server for an already loaded dashboard.
///
/// Binds to `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default `8080`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(dashboard: Dashboard) -> std::io::Result<()> {
    let state = web::Data::new(dashboard);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
