pub mod electricity_pricing;
pub mod feed_in_pricing;
pub mod geo_service;
pub mod irradiance_service;
pub mod lead_service;
pub mod power_optimizer;
pub mod self_consumption;
pub mod solar_potential;
pub mod tariff_table;

use crate::config::POWER_STEP_KWC;

/// Rounds to the nearest installable power step (0.5 kWc).
pub fn round_to_power_step(power_kwc: f64) -> f64 {
    (power_kwc / POWER_STEP_KWC).round() * POWER_STEP_KWC
}
