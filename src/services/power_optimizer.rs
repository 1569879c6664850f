/// ============================================================
///  Installed-power search
///
///   1. Consumption bound – production capped at 120 % (large
///                          consumers) or 150 % of consumption
///   2. Search ceiling    – min(surface, MAX_POWER, consumption)
///   3. Linear scan       – MIN_POWER … ceiling in 0.5 kWc steps,
///                          keep the strictly best positive profit
///   4. Fallback          – cover a share of consumption when no
///                          size pays for its subscription
///   5. Clamp & round     – [MIN_POWER, MAX_POWER], 0.5 kWc grid
/// ============================================================

use tracing::debug;

use crate::config::{ConfigError, EngineConfig, POWER_STEP_KWC};
use crate::models::simulation::{HeatingType, PowerCandidate};
use crate::services::feed_in_pricing::FeedInPricing;
use crate::services::round_to_power_step;
use crate::services::self_consumption::SelfConsumptionModel;
use crate::services::tariff_table::TariffTable;

#[derive(Debug, Clone)]
pub struct PowerOptimizer {
    min_power_kwc: f64,
    max_power_kwc: f64,
    high_consumption_threshold_kwh: f64,
    high_consumption_production_ratio: f64,
    production_ratio: f64,
    fallback_coverage_ratio: f64,
    tariff: TariffTable,
    feed_in: FeedInPricing,
    self_consumption: SelfConsumptionModel,
}

impl PowerOptimizer {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            min_power_kwc: config.min_power_kwc,
            max_power_kwc: config.max_power_kwc,
            high_consumption_threshold_kwh: config.high_consumption_threshold_kwh,
            high_consumption_production_ratio: config.high_consumption_production_ratio,
            production_ratio: config.production_ratio,
            fallback_coverage_ratio: config.fallback_coverage_ratio,
            tariff: TariffTable::new(config)?,
            feed_in: FeedInPricing::new(&config.feed_in),
            self_consumption: SelfConsumptionModel::new(config.min_self_consumption_percent),
        })
    }

    pub fn tariff(&self) -> &TariffTable {
        &self.tariff
    }

    pub fn feed_in(&self) -> &FeedInPricing {
        &self.feed_in
    }

    pub fn self_consumption(&self) -> &SelfConsumptionModel {
        &self.self_consumption
    }

    /// Highest power worth testing for the given consumption and roof.
    pub fn search_ceiling(
        &self,
        annual_consumption_kwh: f64,
        specific_production: f64,
        max_power_from_surface: f64,
    ) -> f64 {
        let ratio = if annual_consumption_kwh > self.high_consumption_threshold_kwh {
            self.high_consumption_production_ratio
        } else {
            self.production_ratio
        };
        let max_power_from_consumption = annual_consumption_kwh * ratio / specific_production;

        max_power_from_surface
            .min(self.max_power_kwc)
            .min(max_power_from_consumption)
    }

    /// Full economics of installing `power_kwc`.
    pub fn evaluate(
        &self,
        power_kwc: f64,
        annual_consumption_kwh: f64,
        heating: HeatingType,
        specific_production: f64,
        electricity_price: f64,
    ) -> PowerCandidate {
        let annual_production_kwh = power_kwc * specific_production;
        let self_consumption_percent =
            self.self_consumption.estimate(annual_production_kwh, annual_consumption_kwh, heating);

        let self_consumed_kwh = annual_production_kwh * self_consumption_percent / 100.0;
        let sold_kwh = annual_production_kwh - self_consumed_kwh;

        let annual_savings =
            self_consumed_kwh * electricity_price + sold_kwh * self.feed_in.resale_price(power_kwc);
        let monthly_subscription = self.tariff.monthly_subscription(power_kwc);

        PowerCandidate {
            power_kwc,
            annual_production_kwh,
            self_consumption_percent,
            self_consumed_kwh,
            sold_kwh,
            annual_savings,
            monthly_subscription,
            monthly_profit: annual_savings / 12.0 - monthly_subscription,
        }
    }

    /// Power (kWc) with the best positive monthly profit, or a coverage-based
    /// fallback when none is profitable.
    pub fn optimal_power(
        &self,
        annual_consumption_kwh: f64,
        heating: HeatingType,
        specific_production: f64,
        max_power_from_surface: f64,
        electricity_price: f64,
    ) -> f64 {
        let ceiling = self.search_ceiling(annual_consumption_kwh, specific_production, max_power_from_surface);

        let mut best: Option<PowerCandidate> = None;
        for power in self.candidate_powers(ceiling) {
            let candidate =
                self.evaluate(power, annual_consumption_kwh, heating, specific_production, electricity_price);

            #[cfg(feature = "verbose_log")]
            debug!(
                power_kwc = candidate.power_kwc,
                production_kwh = candidate.annual_production_kwh,
                self_consumption = candidate.self_consumption_percent,
                subscription = candidate.monthly_subscription,
                profit = candidate.monthly_profit,
                "candidate evaluated"
            );

            let incumbent = best.map_or(0.0, |b| b.monthly_profit);
            if candidate.monthly_profit > incumbent {
                best = Some(candidate);
            }
        }

        let power = match best {
            Some(winner) => {
                debug!(
                    power_kwc = winner.power_kwc,
                    monthly_profit = winner.monthly_profit,
                    ceiling,
                    "most profitable power found"
                );
                winner.power_kwc
            }
            None => {
                let coverage_power = annual_consumption_kwh * self.fallback_coverage_ratio / specific_production;
                let fallback = round_to_power_step(self.min_power_kwc.max(ceiling.min(coverage_power)));
                debug!(ceiling, fallback_kwc = fallback, "no profitable power, covering part of consumption");
                fallback
            }
        };

        round_to_power_step(power.clamp(self.min_power_kwc, self.max_power_kwc))
    }

    /// MIN_POWER, MIN_POWER + 0.5, … up to and including `ceiling`.
    fn candidate_powers(&self, ceiling: f64) -> impl Iterator<Item = f64> + use<> {
        let min_power = self.min_power_kwc;
        (0u32..)
            .map(move |step| min_power + f64::from(step) * POWER_STEP_KWC)
            .take_while(move |power| *power <= ceiling)
    }
}
