use utoipa::OpenApi;
use crate::controllers::simulation_controller;
use crate::models::simulation;
use crate::config;

#[derive(OpenApi)]
#[openapi(
    paths(
        simulation_controller::run_simulation,
        simulation_controller::get_tariffs,
        simulation_controller::search_addresses,
        simulation_controller::submit_lead,
        simulation_controller::get_offline_mode,
        simulation_controller::set_offline_mode
    ),
    components(
        schemas(
            simulation::SimulationRequest,
            simulation::SimulationResult,
            simulation::PvProduction,
            simulation::LeadRequest,
            simulation::LeadAccepted,
            simulation::AddressSuggestion,
            simulation::OfflineModeSetting,
            simulation_controller::TariffOverview,
            config::TariffPoint
        )
    ),
    tags(
        (name = "solar-sizing", description = "Rooftop PV sizing & subscription API")
    )
)]
pub struct ApiDoc;
