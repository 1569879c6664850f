use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::services::geo_service::GeoClient;
use crate::services::lead_service::AirtableClient;
use crate::services::solar_potential::SolarPotentialEstimator;

#[derive(Clone, Debug)]
pub struct AppState {
    /// Sizing engine, immutable and shared by every request
    pub estimator: Arc<SolarPotentialEstimator>,
    pub geo: GeoClient,
    pub leads: AirtableClient,
    /// When set, the PVGIS client skips the network and serves default yields.
    /// Switched through `/api/settings/offline-mode`.
    pub offline_mode: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        estimator: SolarPotentialEstimator,
        geo: GeoClient,
        leads: AirtableClient,
        offline_mode: Arc<AtomicBool>,
    ) -> Self {
        Self {
            estimator: Arc::new(estimator),
            geo,
            leads,
            offline_mode,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline_mode.load(Ordering::Relaxed)
    }

    pub fn set_offline(&self, value: bool) {
        self.offline_mode.store(value, Ordering::Relaxed);
    }
}
