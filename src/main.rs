mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use axum::{Router, routing::get, response::Html};
use crate::routes::simulation_routes::api_routes;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;
use crate::api_docs::ApiDoc;
use crate::shared_state::AppState;
use crate::config::Config;
use crate::services::geo_service::GeoClient;
use crate::services::irradiance_service::PvgisClient;
use crate::services::lead_service::AirtableClient;
use crate::services::solar_potential::SolarPotentialEstimator;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Load configuration
    let config_path = std::env::var("SOLAR_SIZING_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load {}: {}", config_path, e);
            return;
        }
    };
    info!(
        tariff_points = config.engine.tariff.points.len(),
        min_power_kwc = config.engine.min_power_kwc,
        max_power_kwc = config.engine.max_power_kwc,
        offline_mode = config.offline_mode,
        "configuration loaded"
    );

    // 2. Collaborators
    let offline_mode = Arc::new(AtomicBool::new(config.offline_mode));
    let pvgis = match PvgisClient::new(config.pvgis.clone(), offline_mode.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build PVGIS client: {}", e);
            return;
        }
    };
    let leads = AirtableClient::from_env(config.airtable.clone());
    if !leads.is_configured() {
        warn!("Airtable not configured, leads will be accepted but not stored");
    }

    // 3. Sizing engine
    let estimator = match SolarPotentialEstimator::new(&config.engine, Arc::new(pvgis)) {
        Ok(e) => e,
        Err(e) => {
            error!("Invalid engine configuration: {}", e);
            return;
        }
    };
    let state = AppState::new(estimator, GeoClient::new(config.geocoding.clone()), leads, offline_mode);

    // 4. Start Axum HTTP server
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("API Server listening on http://{}", addr);
    info!("Scalar UI: http://{}/scalar", addr);

    if let Err(e) = axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
    {
        error!("HTTP server error: {}", e);
    }
}
