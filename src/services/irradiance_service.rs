use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PvgisConfig;
use crate::models::simulation::{MonthlyProduction, PvProduction, PvgisResponse};

pub const DEFAULT_SPECIFIC_PRODUCTION: f64 = 1200.0;
pub const DEFAULT_TILT_DEG: f64 = 30.0;
pub const DEFAULT_AZIMUTH_DEG: f64 = 180.0;
pub const DEFAULT_SYSTEM_LOSS_PERCENT: f64 = 14.0;

/// Source of yearly PV production for a site.
///
/// Implementations never fail: when the upstream data is unavailable they
/// answer with [`default_production`].
#[async_trait]
pub trait IrradianceSource: Send + Sync {
    async fn production_data(&self, latitude: f64, longitude: f64, peak_power_kwc: f64) -> PvProduction;
}

#[derive(Debug, Error)]
pub enum IrradianceError {
    #[error("PVGIS request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("PVGIS response has no fixed-mounting totals")]
    MissingTotals,
}

/// Climatological fallback used whenever PVGIS cannot answer.
pub fn default_production(peak_power_kwc: f64) -> PvProduction {
    PvProduction {
        annual_production_kwh: (peak_power_kwc * DEFAULT_SPECIFIC_PRODUCTION).round(),
        specific_production_kwh_per_kwc: DEFAULT_SPECIFIC_PRODUCTION,
        optimal_tilt_deg: DEFAULT_TILT_DEG,
        optimal_azimuth_deg: DEFAULT_AZIMUTH_DEG,
        system_loss_percent: DEFAULT_SYSTEM_LOSS_PERCENT,
        monthly: Vec::new(),
    }
}

/// Client for the JRC PVGIS `PVcalc` endpoint.
#[derive(Debug, Clone)]
pub struct PvgisClient {
    http: reqwest::Client,
    config: PvgisConfig,
    /// Offline mode flag, shared with the API so it can be toggled at runtime
    offline: Arc<AtomicBool>,
}

impl PvgisClient {
    pub fn new(config: PvgisConfig, offline: Arc<AtomicBool>) -> Result<Self, IrradianceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_s))
            .build()?;
        Ok(Self { http, config, offline })
    }

    async fn fetch(&self, latitude: f64, longitude: f64, peak_power_kwc: f64) -> Result<PvProduction, IrradianceError> {
        let url = format!("{}/PVcalc", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("raddatabase", self.config.radiation_database.clone()),
                ("outputformat", "json".to_string()),
                ("usehorizon", "1".to_string()),
                ("peakpower", peak_power_kwc.to_string()),
                ("loss", self.config.system_loss_percent.to_string()),
                ("trackingtype", "0".to_string()),
                ("optimalinclination", "1".to_string()),
                ("optimalangles", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body = response.json::<PvgisResponse>().await?;
        production_from_response(body, peak_power_kwc, self.config.system_loss_percent)
    }
}

#[async_trait]
impl IrradianceSource for PvgisClient {
    async fn production_data(&self, latitude: f64, longitude: f64, peak_power_kwc: f64) -> PvProduction {
        if self.offline.load(Ordering::Relaxed) {
            debug!(peak_power_kwc, "offline mode, using default production");
            return default_production(peak_power_kwc);
        }

        match self.fetch(latitude, longitude, peak_power_kwc).await {
            Ok(production) => production,
            Err(e) => {
                warn!(latitude, longitude, peak_power_kwc, "PVGIS unavailable, using defaults: {}", e);
                default_production(peak_power_kwc)
            }
        }
    }
}

fn production_from_response(
    body: PvgisResponse,
    peak_power_kwc: f64,
    requested_loss: f64,
) -> Result<PvProduction, IrradianceError> {
    let outputs = body.outputs.ok_or(IrradianceError::MissingTotals)?;
    let e_y = outputs
        .totals
        .and_then(|t| t.fixed)
        .map(|f| f.e_y)
        .ok_or(IrradianceError::MissingTotals)?;

    let fixed_mounting = body
        .inputs
        .as_ref()
        .and_then(|i| i.mounting_system.as_ref())
        .and_then(|m| m.fixed.as_ref());
    let tilt = fixed_mounting
        .and_then(|f| f.slope.as_ref())
        .and_then(|a| a.value)
        .unwrap_or(DEFAULT_TILT_DEG);
    let azimuth = fixed_mounting
        .and_then(|f| f.azimuth.as_ref())
        .and_then(|a| a.value)
        // PVGIS reports 0 = south, -90 = east; convert to compass degrees
        .map(|aspect| aspect + 180.0)
        .unwrap_or(DEFAULT_AZIMUTH_DEG);
    let system_loss = body
        .inputs
        .as_ref()
        .and_then(|i| i.pv_module.as_ref())
        .and_then(|m| m.system_loss)
        .unwrap_or(requested_loss);

    let monthly = outputs
        .monthly
        .map(|m| {
            m.fixed
                .into_iter()
                .map(|row| MonthlyProduction { month: row.month, energy_kwh: row.e_m })
                .collect()
        })
        .unwrap_or_default();

    Ok(PvProduction {
        annual_production_kwh: e_y.round(),
        specific_production_kwh_per_kwc: (e_y / peak_power_kwc).round(),
        optimal_tilt_deg: tilt,
        optimal_azimuth_deg: azimuth,
        system_loss_percent: system_loss,
        monthly,
    })
}
