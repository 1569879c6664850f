use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Request facts ───────────────────────────────────────────────────────────

/// Selected address. Coordinates are optional because the address step can
/// be submitted before a suggestion has been picked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Location {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub full_address: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    #[serde(alias = "sud")]
    South,
    #[serde(alias = "sud-est")]
    SouthEast,
    #[serde(alias = "sud-ouest")]
    SouthWest,
    #[serde(alias = "est")]
    East,
    #[serde(alias = "ouest")]
    West,
    #[serde(alias = "nord")]
    North,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RoofCovering {
    #[default]
    #[serde(alias = "tuiles")]
    Tiles,
    #[serde(alias = "ardoises")]
    Slate,
    #[serde(alias = "bac-acier")]
    SteelDeck,
    Membrane,
    #[serde(alias = "autre")]
    Other,
}

fn default_inclination() -> f64 { 30.0 }

/// Roof description. Only `surface_m2` and `obstacles` drive the sizing;
/// the remaining fields travel with the lead.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoofFacts {
    /// Gross roof surface (m²), > 0
    pub surface_m2: f64,
    #[serde(default)]
    pub obstacles: bool,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default = "default_inclination")]
    pub inclination_deg: f64,
    #[serde(default)]
    pub covering: RoofCovering,
}

impl RoofFacts {
    pub fn new(surface_m2: f64, obstacles: bool) -> Self {
        Self {
            surface_m2,
            obstacles,
            orientation: Orientation::default(),
            inclination_deg: default_inclination(),
            covering: RoofCovering::default(),
        }
    }

    /// Surface left for panels once obstacles are accounted for.
    pub fn usable_surface(&self, obstacle_factor: f64) -> f64 {
        if self.obstacles {
            self.surface_m2 * obstacle_factor
        } else {
            self.surface_m2
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HeatingType {
    #[default]
    #[serde(alias = "electrique")]
    Electric,
    #[serde(alias = "gaz")]
    Gas,
    #[serde(alias = "fioul")]
    Oil,
    #[serde(alias = "autre")]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ConsumptionFacts {
    /// Annual consumption (kWh); absent or 0 when unknown
    pub annual_consumption_kwh: Option<f64>,
    /// Average monthly electricity bill (€)
    pub monthly_bill: Option<f64>,
    #[serde(default)]
    pub heating_type: HeatingType,
}

// ─── Engine values ───────────────────────────────────────────────────────────

/// Effective purchase price and consumption for one simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingContext {
    /// €/kWh
    pub electricity_price: f64,
    pub annual_consumption_kwh: f64,
}

/// Economics of a single installed power, evaluated during the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerCandidate {
    pub power_kwc: f64,
    pub annual_production_kwh: f64,
    pub self_consumption_percent: f64,
    pub self_consumed_kwh: f64,
    pub sold_kwh: f64,
    pub annual_savings: f64,
    pub monthly_subscription: f64,
    pub monthly_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyProduction {
    /// 1 = January
    pub month: u8,
    pub energy_kwh: f64,
}

/// What the irradiance source reports for a given peak power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PvProduction {
    pub annual_production_kwh: f64,
    pub specific_production_kwh_per_kwc: f64,
    pub optimal_tilt_deg: f64,
    pub optimal_azimuth_deg: f64,
    pub system_loss_percent: f64,
    pub monthly: Vec<MonthlyProduction>,
}

/// Final sizing and economics for one roof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SimulationResult {
    pub installed_power_kwc: f64,
    pub annual_production_kwh: f64,
    pub self_consumption_percent: f64,
    pub self_consumed_energy_kwh: f64,
    pub sold_energy_kwh: f64,
    /// € per year, rounded
    pub annual_savings: f64,
    /// € per month, rounded
    pub monthly_subscription: f64,
    pub co2_reduction_kg: f64,
    /// €/kWh used for the savings
    pub electricity_price: f64,
    pub annual_consumption_kwh: f64,
    pub production: PvProduction,
}

// ─── REST API types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SimulationRequest {
    pub location: Location,
    pub roof: RoofFacts,
    #[serde(default)]
    pub consumption: ConsumptionFacts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContactPreference {
    #[default]
    Email,
    Phone,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub contact_preference: ContactPreference,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeadRequest {
    pub location: Location,
    pub roof: RoofFacts,
    pub consumption: ConsumptionFacts,
    pub contact: ContactInfo,
    pub simulation: SimulationResult,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeadAccepted {
    pub reference: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AddressSuggestion {
    pub label: String,
    pub city: String,
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub context: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfflineModeSetting {
    pub offline_mode: bool,
}

// ─── PVGIS wire types ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PvgisResponse {
    pub inputs: Option<PvgisInputs>,
    pub outputs: Option<PvgisOutputs>,
}

#[derive(Debug, Deserialize)]
pub struct PvgisInputs {
    pub mounting_system: Option<PvgisMountingSystem>,
    pub pv_module: Option<PvgisModule>,
}

#[derive(Debug, Deserialize)]
pub struct PvgisMountingSystem {
    pub fixed: Option<PvgisFixedMounting>,
}

#[derive(Debug, Deserialize)]
pub struct PvgisFixedMounting {
    pub slope: Option<PvgisAngle>,
    pub azimuth: Option<PvgisAngle>,
}

#[derive(Debug, Deserialize)]
pub struct PvgisAngle {
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PvgisModule {
    pub system_loss: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PvgisOutputs {
    pub totals: Option<PvgisTotals>,
    pub monthly: Option<PvgisMonthly>,
}

#[derive(Debug, Deserialize)]
pub struct PvgisTotals {
    pub fixed: Option<PvgisFixedTotals>,
}

#[derive(Debug, Deserialize)]
pub struct PvgisFixedTotals {
    #[serde(rename = "E_y")]
    pub e_y: f64,
}

#[derive(Debug, Deserialize)]
pub struct PvgisMonthly {
    #[serde(default)]
    pub fixed: Vec<PvgisMonthRow>,
}

#[derive(Debug, Deserialize)]
pub struct PvgisMonthRow {
    pub month: u8,
    #[serde(rename = "E_m")]
    pub e_m: f64,
}

// ─── Address API wire types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GeoSearchResponse {
    #[serde(default)]
    pub features: Vec<GeoFeature>,
}

#[derive(Debug, Deserialize)]
pub struct GeoFeature {
    pub geometry: GeoGeometry,
    pub properties: GeoProperties,
}

#[derive(Debug, Deserialize)]
pub struct GeoGeometry {
    /// [longitude, latitude]
    pub coordinates: [f64; 2],
}

#[derive(Debug, Deserialize)]
pub struct GeoProperties {
    pub label: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
    pub context: Option<String>,
}
