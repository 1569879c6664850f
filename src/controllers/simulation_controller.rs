use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::config::TariffPoint;
use crate::models::simulation::{
    AddressSuggestion, LeadAccepted, LeadRequest, OfflineModeSetting, SimulationRequest, SimulationResult,
};
use crate::services::solar_potential::EstimationError;
use crate::shared_state::AppState;

fn error_body(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// POST /api/simulations
/// Size an installation
///
/// Runs the sizing engine for the given address, roof and consumption and
/// returns the recommended power with its yearly economics.
#[utoipa::path(
    post,
    path = "/api/simulations",
    request_body = SimulationRequest,
    responses(
        (status = 200, description = "Sizing result", body = SimulationResult),
        (status = 400, description = "Roof or consumption values out of range"),
        (status = 422, description = "Address has no coordinates, select a suggestion first")
    )
)]
pub async fn run_simulation(
    State(state): State<AppState>,
    Json(request): Json<SimulationRequest>,
) -> impl IntoResponse {
    if !(request.roof.surface_m2 > 0.0) {
        return error_body(StatusCode::BAD_REQUEST, "roof surface must be positive");
    }
    let negative = |v: Option<f64>| v.is_some_and(|x| x < 0.0);
    if negative(request.consumption.annual_consumption_kwh) || negative(request.consumption.monthly_bill) {
        return error_body(StatusCode::BAD_REQUEST, "consumption and bill cannot be negative");
    }

    match state
        .estimator
        .estimate(&request.location, &request.roof, &request.consumption)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e @ EstimationError::MissingLocation) => error_body(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddressQuery {
    /// Free-text address, at least 3 characters
    pub q: String,
}

/// GET /api/addresses
/// Address autocomplete
#[utoipa::path(
    get,
    path = "/api/addresses",
    params(AddressQuery),
    responses(
        (status = 200, description = "Matching addresses", body = Vec<AddressSuggestion>),
        (status = 502, description = "Address service unavailable")
    )
)]
pub async fn search_addresses(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> impl IntoResponse {
    match state.geo.search(&query.q).await {
        Ok(suggestions) => Json(suggestions).into_response(),
        Err(e) => {
            warn!("address search failed: {}", e);
            error_body(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// POST /api/leads
/// Store a lead
///
/// The record is written in the background; the response only confirms
/// that the lead was accepted.
#[utoipa::path(
    post,
    path = "/api/leads",
    request_body = LeadRequest,
    responses(
        (status = 202, description = "Lead accepted for storage", body = LeadAccepted)
    )
)]
pub async fn submit_lead(
    State(state): State<AppState>,
    Json(lead): Json<LeadRequest>,
) -> impl IntoResponse {
    let reference = Uuid::new_v4();
    let leads = state.leads.clone();

    tokio::spawn(async move {
        match leads.submit(&lead).await {
            Ok(record_id) => info!(%reference, %record_id, "lead forwarded"),
            Err(e) => warn!(%reference, "lead could not be stored: {}", e),
        }
    });

    (StatusCode::ACCEPTED, Json(LeadAccepted { reference })).into_response()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TariffOverview {
    pub subscription: Vec<TariffPoint>,
    pub default_electricity_price: f64,
}

/// GET /api/tariffs
/// Subscription grid
#[utoipa::path(
    get,
    path = "/api/tariffs",
    responses(
        (status = 200, description = "Monthly subscription per installed power", body = TariffOverview)
    )
)]
pub async fn get_tariffs(State(state): State<AppState>) -> impl IntoResponse {
    Json(TariffOverview {
        subscription: state.estimator.optimizer().tariff().points().to_vec(),
        default_electricity_price: state.estimator.pricing().default_price(),
    })
}

/// GET /api/settings/offline-mode
#[utoipa::path(
    get,
    path = "/api/settings/offline-mode",
    responses(
        (status = 200, description = "Whether PVGIS lookups are bypassed", body = OfflineModeSetting)
    )
)]
pub async fn get_offline_mode(State(state): State<AppState>) -> impl IntoResponse {
    Json(OfflineModeSetting { offline_mode: state.is_offline() })
}

/// POST /api/settings/offline-mode
#[utoipa::path(
    post,
    path = "/api/settings/offline-mode",
    request_body = OfflineModeSetting,
    responses(
        (status = 200, description = "Updated setting", body = OfflineModeSetting)
    )
)]
pub async fn set_offline_mode(
    State(state): State<AppState>,
    Json(setting): Json<OfflineModeSetting>,
) -> impl IntoResponse {
    state.set_offline(setting.offline_mode);
    info!(offline_mode = setting.offline_mode, "offline mode changed");
    Json(OfflineModeSetting { offline_mode: state.is_offline() })
}
