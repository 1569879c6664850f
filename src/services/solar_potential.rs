use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, EngineConfig};
use crate::models::simulation::{ConsumptionFacts, Location, RoofFacts, SimulationResult};
use crate::services::electricity_pricing::ElectricityPricing;
use crate::services::irradiance_service::IrradianceSource;
use crate::services::power_optimizer::PowerOptimizer;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimationError {
    #[error("GPS coordinates are missing, an address must be selected first")]
    MissingLocation,
}

/// Sizes an installation for one roof and assembles its economics.
///
/// Holds only immutable configuration, so a single instance serves every
/// request concurrently.
pub struct SolarPotentialEstimator {
    optimizer: PowerOptimizer,
    pricing: ElectricityPricing,
    irradiance: Arc<dyn IrradianceSource>,
    power_density_kwc_per_m2: f64,
    obstacle_surface_factor: f64,
    co2_factor_kg_per_kwh: f64,
    nominal_probe_power_kwc: f64,
}

impl std::fmt::Debug for SolarPotentialEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolarPotentialEstimator")
            .field("optimizer", &self.optimizer)
            .field("pricing", &self.pricing)
            .finish_non_exhaustive()
    }
}

impl SolarPotentialEstimator {
    pub fn new(config: &EngineConfig, irradiance: Arc<dyn IrradianceSource>) -> Result<Self, ConfigError> {
        Ok(Self {
            optimizer: PowerOptimizer::new(config)?,
            pricing: ElectricityPricing::new(config),
            irradiance,
            power_density_kwc_per_m2: config.power_density_kwc_per_m2,
            obstacle_surface_factor: config.obstacle_surface_factor,
            co2_factor_kg_per_kwh: config.co2_factor_kg_per_kwh,
            nominal_probe_power_kwc: config.nominal_probe_power_kwc,
        })
    }

    pub fn optimizer(&self) -> &PowerOptimizer {
        &self.optimizer
    }

    pub fn pricing(&self) -> &ElectricityPricing {
        &self.pricing
    }

    pub async fn estimate(
        &self,
        location: &Location,
        roof: &RoofFacts,
        consumption: &ConsumptionFacts,
    ) -> Result<SimulationResult, EstimationError> {
        let (Some(latitude), Some(longitude)) = (location.latitude, location.longitude) else {
            return Err(EstimationError::MissingLocation);
        };

        let usable_surface = roof.usable_surface(self.obstacle_surface_factor);
        let max_power_from_surface = (usable_surface * self.power_density_kwc_per_m2).floor();

        let probe = self
            .irradiance
            .production_data(latitude, longitude, self.nominal_probe_power_kwc)
            .await;
        let specific_production = probe.specific_production_kwh_per_kwc;

        let pricing = self
            .pricing
            .derive(consumption.annual_consumption_kwh, consumption.monthly_bill);

        let installed_power_kwc = self.optimizer.optimal_power(
            pricing.annual_consumption_kwh,
            consumption.heating_type,
            specific_production,
            max_power_from_surface,
            pricing.electricity_price,
        );

        let production = self
            .irradiance
            .production_data(latitude, longitude, installed_power_kwc)
            .await;
        let annual_production_kwh = production.annual_production_kwh;

        let self_consumption_percent = self.optimizer.self_consumption().estimate(
            annual_production_kwh,
            pricing.annual_consumption_kwh,
            consumption.heating_type,
        );
        let self_consumed_energy_kwh = annual_production_kwh * self_consumption_percent / 100.0;
        let sold_energy_kwh = annual_production_kwh - self_consumed_energy_kwh;

        let bill_savings = self_consumed_energy_kwh * pricing.electricity_price;
        let sale_revenue = sold_energy_kwh * self.optimizer.feed_in().resale_price(installed_power_kwc);

        let result = SimulationResult {
            installed_power_kwc,
            annual_production_kwh,
            self_consumption_percent,
            self_consumed_energy_kwh,
            sold_energy_kwh,
            annual_savings: (bill_savings + sale_revenue).round(),
            monthly_subscription: self.optimizer.tariff().monthly_subscription(installed_power_kwc).round(),
            co2_reduction_kg: (annual_production_kwh * self.co2_factor_kg_per_kwh).round(),
            electricity_price: pricing.electricity_price,
            annual_consumption_kwh: pricing.annual_consumption_kwh,
            production,
        };

        info!(
            latitude,
            longitude,
            power_kwc = result.installed_power_kwc,
            production_kwh = result.annual_production_kwh,
            savings = result.annual_savings,
            subscription = result.monthly_subscription,
            "simulation completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::simulation::{HeatingType, PvProduction};
    use crate::services::irradiance_service::default_production;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Deterministic irradiance source recording the requested peak powers.
    pub(crate) struct StubIrradiance {
        specific_production: f64,
        pub(crate) requests: Mutex<Vec<f64>>,
        pub(crate) calls: AtomicUsize,
    }

    impl StubIrradiance {
        pub(crate) fn new(specific_production: f64) -> Self {
            Self { specific_production, requests: Mutex::new(Vec::new()), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait::async_trait]
    impl IrradianceSource for StubIrradiance {
        async fn production_data(&self, _latitude: f64, _longitude: f64, peak_power_kwc: f64) -> PvProduction {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(peak_power_kwc);
            PvProduction {
                annual_production_kwh: (peak_power_kwc * self.specific_production).round(),
                specific_production_kwh_per_kwc: self.specific_production,
                ..default_production(peak_power_kwc)
            }
        }
    }

    fn paris() -> Location {
        Location {
            address: "1 rue de Rivoli".to_string(),
            city: "Paris".to_string(),
            postal_code: "75001".to_string(),
            latitude: Some(48.8566),
            longitude: Some(2.3522),
            full_address: None,
        }
    }

    fn electric_household() -> ConsumptionFacts {
        ConsumptionFacts {
            annual_consumption_kwh: Some(4000.0),
            monthly_bill: Some(120.0),
            heating_type: HeatingType::Electric,
        }
    }

    fn estimator(stub: Arc<StubIrradiance>) -> SolarPotentialEstimator {
        SolarPotentialEstimator::new(&EngineConfig::default(), stub).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_sizing() {
        let stub = Arc::new(StubIrradiance::new(1200.0));
        let estimator = estimator(stub.clone());

        let result = estimator
            .estimate(&paris(), &RoofFacts::new(50.0, false), &electric_household())
            .await
            .unwrap();

        // 120 €/month over 4000 kWh → 0.36 €/kWh, plausible
        assert!((result.electricity_price - 0.36).abs() < 1e-9);
        assert_eq!(result.annual_consumption_kwh, 4000.0);
        assert!(result.installed_power_kwc >= 2.5 && result.installed_power_kwc <= 5.0);
        assert_eq!(result.installed_power_kwc, 5.0);
        assert_eq!(result.annual_production_kwh, 6000.0);
        assert_eq!(result.self_consumption_percent, 70.0);
        assert_eq!(result.monthly_subscription, 96.0);
        // 4200 kWh × 0.36 + 1800 kWh × 0.04
        assert_eq!(result.annual_savings, 1584.0);
        assert_eq!(result.co2_reduction_kg, 474.0);
        assert!(result.annual_savings / 12.0 - result.monthly_subscription > 0.0);

        let requests = stub.requests.lock().unwrap().clone();
        assert_eq!(requests, vec![1.0, 5.0], "probe at 1 kWc then at the chosen power");
    }

    #[tokio::test]
    async fn test_energy_partition_in_result() {
        let stub = Arc::new(StubIrradiance::new(1137.0));
        let consumption = ConsumptionFacts {
            annual_consumption_kwh: Some(7300.0),
            monthly_bill: None,
            heating_type: HeatingType::Oil,
        };
        let result = estimator(stub)
            .estimate(&paris(), &RoofFacts::new(37.0, true), &consumption)
            .await
            .unwrap();

        let total = result.self_consumed_energy_kwh + result.sold_energy_kwh;
        assert!((total - result.annual_production_kwh).abs() < 1e-6);
        assert!(result.self_consumption_percent >= 60.0 && result.self_consumption_percent <= 100.0);
    }

    #[tokio::test]
    async fn test_surface_limits_power() {
        let stub = Arc::new(StubIrradiance::new(1300.0));
        let consumption = ConsumptionFacts {
            annual_consumption_kwh: Some(30000.0),
            monthly_bill: Some(500.0),
            heating_type: HeatingType::Electric,
        };
        // 20 m² with obstacles → 16 m² usable → floor(9.6) = 9 kWc
        let result = estimator(stub)
            .estimate(&paris(), &RoofFacts::new(20.0, true), &consumption)
            .await
            .unwrap();
        assert!(result.installed_power_kwc <= 9.0, "got {}", result.installed_power_kwc);
    }

    #[tokio::test]
    async fn test_identical_inputs_give_identical_results() {
        let stub = Arc::new(StubIrradiance::new(1250.0));
        let estimator = estimator(stub);
        let roof = RoofFacts::new(64.0, false);
        let consumption = ConsumptionFacts {
            annual_consumption_kwh: None,
            monthly_bill: Some(95.0),
            heating_type: HeatingType::Gas,
        };

        let first = estimator.estimate(&paris(), &roof, &consumption).await.unwrap();
        let second = estimator.estimate(&paris(), &roof, &consumption).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_coordinates_fail_without_calls() {
        let stub = Arc::new(StubIrradiance::new(1200.0));
        let estimator = estimator(stub.clone());

        let mut location = paris();
        location.latitude = None;
        let err = estimator
            .estimate(&location, &RoofFacts::new(50.0, false), &electric_household())
            .await
            .unwrap_err();

        assert_eq!(err, EstimationError::MissingLocation);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

        let mut location = paris();
        location.longitude = None;
        assert!(estimator.estimate(&location, &RoofFacts::new(50.0, false), &electric_household()).await.is_err());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }
}
