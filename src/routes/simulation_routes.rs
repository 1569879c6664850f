use axum::{routing::{get, post}, Router};
use crate::controllers::simulation_controller::{
    // Sizing
    run_simulation, get_tariffs,
    // Collaborators
    search_addresses, submit_lead,
    // Settings
    get_offline_mode, set_offline_mode,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/simulations",             post(run_simulation))
        .route("/tariffs",                 get(get_tariffs))
        .route("/addresses",               get(search_addresses))
        .route("/leads",                   post(submit_lead))
        .route("/settings/offline-mode",   get(get_offline_mode).post(set_offline_mode))
        .with_state(state)
}
