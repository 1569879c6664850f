use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Granularity of every installable power value (kWc).
pub const POWER_STEP_KWC: f64 = 0.5;

fn default_offline_mode() -> bool { false }

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid engine configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_offline_mode")]
    pub offline_mode: bool,
    #[serde(default)]
    pub pvgis: PvgisConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub airtable: AirtableConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PvgisConfig {
    pub base_url: String,
    pub radiation_database: String,
    pub system_loss_percent: f64,
    pub timeout_s: u64,
}

impl Default for PvgisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://re.jrc.ec.europa.eu/api/v5_2".to_string(),
            radiation_database: "PVGIS-SARAH2".to_string(),
            system_loss_percent: 14.0,
            timeout_s: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub limit: u8,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-adresse.data.gouv.fr".to_string(),
            limit: 5,
        }
    }
}

/// Lead storage target. The API key never lives in the file: it is read
/// from `AIRTABLE_API_KEY` at start-up.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AirtableConfig {
    pub base_url: String,
    pub base_id: Option<String>,
    pub table_name: String,
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.airtable.com/v0".to_string(),
            base_id: None,
            table_name: "Leads Solaires".to_string(),
        }
    }
}

// ─── Engine constants ────────────────────────────────────────────────────────

/// One row of the subscription grid: installed power → monthly price.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, ToSchema)]
pub struct TariffPoint {
    pub power_kwc: f64,
    pub monthly_price: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, ToSchema)]
#[serde(default)]
pub struct TariffConfig {
    /// Grid points, sorted by power, prices strictly increasing.
    pub points: Vec<TariffPoint>,
    /// Price added per kWc beyond the last grid point.
    pub extrapolation_per_kwc: f64,
}

const SUBSCRIPTION_GRID: [(f64, f64); 26] = [
    (2.5, 49.0),
    (3.0, 59.0),
    (3.5, 68.5),
    (4.0, 78.0),
    (4.5, 87.0),
    (5.0, 96.0),
    (5.5, 105.5),
    (6.0, 115.0),
    (6.5, 124.0),
    (7.0, 132.0),
    (7.5, 140.0),
    (8.0, 149.0),
    (8.5, 158.0),
    (9.0, 167.0),
    (9.5, 176.0),
    (10.0, 185.0),
    (10.5, 194.0),
    (11.0, 203.0),
    (11.5, 212.0),
    (12.0, 221.0),
    (15.0, 275.0),
    (18.0, 329.0),
    (20.0, 365.0),
    (25.0, 455.0),
    (30.0, 545.0),
    (36.0, 654.0),
];

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            points: SUBSCRIPTION_GRID
                .iter()
                .map(|&(power_kwc, monthly_price)| TariffPoint { power_kwc, monthly_price })
                .collect(),
            extrapolation_per_kwc: 18.0,
        }
    }
}

/// Grid resale tiers: `low_rate` below `threshold_kwc`, `high_rate` from the
/// threshold upward (including beyond `cap_kwc`).
#[derive(Debug, Deserialize, Serialize, Clone, ToSchema)]
#[serde(default)]
pub struct FeedInConfig {
    pub threshold_kwc: f64,
    pub cap_kwc: f64,
    pub low_rate: f64,
    pub high_rate: f64,
}

impl Default for FeedInConfig {
    fn default() -> Self {
        Self {
            threshold_kwc: 9.0,
            cap_kwc: 100.0,
            low_rate: 0.04,
            high_rate: 0.0617,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub min_power_kwc: f64,
    pub max_power_kwc: f64,
    /// €/kWh used when no plausible personalized price can be derived
    pub default_electricity_price: f64,
    pub min_plausible_price: f64,
    pub max_plausible_price: f64,
    pub fallback_annual_consumption_kwh: f64,
    pub min_self_consumption_percent: f64,
    pub power_density_kwc_per_m2: f64,
    pub obstacle_surface_factor: f64,
    pub co2_factor_kg_per_kwh: f64,
    pub high_consumption_threshold_kwh: f64,
    pub high_consumption_production_ratio: f64,
    pub production_ratio: f64,
    /// Share of consumption covered when no power size is profitable
    pub fallback_coverage_ratio: f64,
    /// Peak power used to probe the irradiance source for specific production
    pub nominal_probe_power_kwc: f64,
    pub tariff: TariffConfig,
    pub feed_in: FeedInConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_power_kwc: 2.5,
            max_power_kwc: 36.0,
            default_electricity_price: 0.1952,
            min_plausible_price: 0.10,
            max_plausible_price: 0.50,
            fallback_annual_consumption_kwh: 4000.0,
            min_self_consumption_percent: 60.0,
            power_density_kwc_per_m2: 0.6,
            obstacle_surface_factor: 0.8,
            co2_factor_kg_per_kwh: 0.079,
            high_consumption_threshold_kwh: 15000.0,
            high_consumption_production_ratio: 1.2,
            production_ratio: 1.5,
            fallback_coverage_ratio: 0.3,
            nominal_probe_power_kwc: 1.0,
            tariff: TariffConfig::default(),
            feed_in: FeedInConfig::default(),
        }
    }
}

fn is_power_step_multiple(power: f64) -> bool {
    (power / POWER_STEP_KWC).fract() == 0.0
}

impl EngineConfig {
    /// Rejects combinations the engine's invariants cannot hold with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.min_power_kwc > 0.0) || !is_power_step_multiple(self.min_power_kwc) {
            return invalid(format!(
                "min_power_kwc must be a positive multiple of {POWER_STEP_KWC}, got {}",
                self.min_power_kwc
            ));
        }
        if !is_power_step_multiple(self.max_power_kwc) || self.max_power_kwc < self.min_power_kwc {
            return invalid(format!(
                "max_power_kwc must be a multiple of {POWER_STEP_KWC} not below min_power_kwc, got {}",
                self.max_power_kwc
            ));
        }
        if !(self.default_electricity_price > 0.0) {
            return invalid("default_electricity_price must be positive".to_string());
        }
        if self.min_plausible_price > self.max_plausible_price {
            return invalid(format!(
                "plausible price band is inverted: [{}, {}]",
                self.min_plausible_price, self.max_plausible_price
            ));
        }
        if !(0.0..=100.0).contains(&self.min_self_consumption_percent) {
            return invalid(format!(
                "min_self_consumption_percent must lie in [0, 100], got {}",
                self.min_self_consumption_percent
            ));
        }
        if !(self.power_density_kwc_per_m2 > 0.0) {
            return invalid("power_density_kwc_per_m2 must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.obstacle_surface_factor) {
            return invalid("obstacle_surface_factor must lie in [0, 1]".to_string());
        }
        if !(self.nominal_probe_power_kwc > 0.0) {
            return invalid("nominal_probe_power_kwc must be positive".to_string());
        }
        for (name, ratio) in [
            ("production_ratio", self.production_ratio),
            ("high_consumption_production_ratio", self.high_consumption_production_ratio),
            ("fallback_coverage_ratio", self.fallback_coverage_ratio),
        ] {
            if !(ratio > 0.0) {
                return invalid(format!("{name} must be positive, got {ratio}"));
            }
        }
        self.validate_feed_in()?;
        self.validate_tariff()
    }

    fn validate_feed_in(&self) -> Result<(), ConfigError> {
        let tiers = &self.feed_in;
        if tiers.threshold_kwc > tiers.cap_kwc {
            return Err(ConfigError::Invalid(format!(
                "feed-in threshold {} kWc lies above the cap {} kWc",
                tiers.threshold_kwc, tiers.cap_kwc
            )));
        }
        if !(tiers.low_rate >= 0.0) || !(tiers.high_rate >= 0.0) {
            return Err(ConfigError::Invalid("feed-in rates cannot be negative".to_string()));
        }
        Ok(())
    }

    fn validate_tariff(&self) -> Result<(), ConfigError> {
        let points = &self.tariff.points;
        if points.is_empty() {
            return Err(ConfigError::Invalid("tariff table is empty".to_string()));
        }
        for pair in points.windows(2) {
            if pair[1].power_kwc <= pair[0].power_kwc || pair[1].monthly_price <= pair[0].monthly_price {
                return Err(ConfigError::Invalid(format!(
                    "tariff table must be strictly increasing, {} kWc ({}) is followed by {} kWc ({})",
                    pair[0].power_kwc, pair[0].monthly_price, pair[1].power_kwc, pair[1].monthly_price
                )));
            }
        }
        if !(points[0].monthly_price > 0.0) || self.tariff.extrapolation_per_kwc < 0.0 {
            return Err(ConfigError::Invalid(
                "tariff prices and extrapolation increment must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.engine.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let json = r#"{ "server": { "port": 9000 }, "engine": { "min_self_consumption_percent": 50 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(!config.offline_mode);
        assert_eq!(config.engine.min_self_consumption_percent, 50.0);
        assert_eq!(config.engine.max_power_kwc, 36.0);
        assert_eq!(config.engine.tariff.points.len(), 26);
        assert_eq!(config.pvgis.system_loss_percent, 14.0);
    }

    #[test]
    fn test_shipped_config_loads() {
        let config = Config::load("config.json").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.engine.default_electricity_price, 0.1952);
        assert_eq!(config.engine.tariff.extrapolation_per_kwc, 18.0);
        assert!(config.airtable.base_id.is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(Config::load("does-not-exist.json"), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_rejects_non_monotonic_tariff() {
        let mut engine = EngineConfig::default();
        engine.tariff.points[3].monthly_price = 50.0;
        assert!(matches!(engine.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_off_grid_power_bounds() {
        let engine = EngineConfig { min_power_kwc: 2.3, ..EngineConfig::default() };
        assert!(engine.validate().is_err());

        let engine = EngineConfig { max_power_kwc: 2.0, ..EngineConfig::default() };
        assert!(engine.validate().is_err(), "max below min must be rejected");
    }

    #[test]
    fn test_rejects_guarantee_above_hundred() {
        let engine = EngineConfig { min_self_consumption_percent: 120.0, ..EngineConfig::default() };
        assert!(engine.validate().is_err());
    }

    #[test]
    fn test_rejects_inconsistent_feed_in_tiers() {
        let mut engine = EngineConfig::default();
        engine.feed_in.threshold_kwc = 120.0;
        assert!(matches!(engine.validate(), Err(ConfigError::Invalid(_))), "threshold above cap");

        let mut engine = EngineConfig::default();
        engine.feed_in.low_rate = -0.01;
        assert!(matches!(engine.validate(), Err(ConfigError::Invalid(_))));

        let mut engine = EngineConfig::default();
        engine.feed_in.high_rate = -0.06;
        assert!(matches!(engine.validate(), Err(ConfigError::Invalid(_))));

        let mut engine = EngineConfig::default();
        engine.feed_in.threshold_kwc = engine.feed_in.cap_kwc;
        assert!(engine.validate().is_ok(), "threshold equal to cap is allowed");
    }

    #[test]
    fn test_rejects_non_positive_ratios() {
        for engine in [
            EngineConfig { production_ratio: 0.0, ..EngineConfig::default() },
            EngineConfig { high_consumption_production_ratio: -1.2, ..EngineConfig::default() },
            EngineConfig { fallback_coverage_ratio: 0.0, ..EngineConfig::default() },
        ] {
            assert!(matches!(engine.validate(), Err(ConfigError::Invalid(_))));
        }
    }
}
