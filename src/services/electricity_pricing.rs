use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::models::simulation::PricingContext;

/// Derives the per-kWh purchase price from what the occupant told us about
/// their bill, estimating consumption when only the bill is known.
#[derive(Debug, Clone)]
pub struct ElectricityPricing {
    default_price: f64,
    min_plausible_price: f64,
    max_plausible_price: f64,
    fallback_consumption_kwh: f64,
}

impl ElectricityPricing {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            default_price: config.default_electricity_price,
            min_plausible_price: config.min_plausible_price,
            max_plausible_price: config.max_plausible_price,
            fallback_consumption_kwh: config.fallback_annual_consumption_kwh,
        }
    }

    pub fn default_price(&self) -> f64 {
        self.default_price
    }

    /// Never fails: missing or implausible data degrades to defaults.
    pub fn derive(&self, annual_consumption_kwh: Option<f64>, monthly_bill: Option<f64>) -> PricingContext {
        let consumption = annual_consumption_kwh.filter(|c| *c > 0.0);

        let Some(bill) = monthly_bill.filter(|b| *b > 0.0) else {
            return PricingContext {
                electricity_price: self.default_price,
                annual_consumption_kwh: consumption.unwrap_or(self.fallback_consumption_kwh),
            };
        };

        match consumption {
            Some(annual) => {
                let personalized = bill / (annual / 12.0);
                if (self.min_plausible_price..=self.max_plausible_price).contains(&personalized) {
                    debug!(price = personalized, "using personalized electricity price");
                    PricingContext { electricity_price: personalized, annual_consumption_kwh: annual }
                } else {
                    warn!(
                        personalized,
                        monthly_bill = bill,
                        annual_consumption_kwh = annual,
                        "implausible personalized electricity price, using default {:.4} €/kWh",
                        self.default_price
                    );
                    PricingContext { electricity_price: self.default_price, annual_consumption_kwh: annual }
                }
            }
            None => PricingContext {
                electricity_price: self.default_price,
                annual_consumption_kwh: (bill * 12.0 / self.default_price).round(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pricing() -> ElectricityPricing {
        ElectricityPricing::new(&EngineConfig::default())
    }

    #[test]
    fn test_no_bill_uses_defaults() {
        let p = pricing();
        let ctx = p.derive(None, None);
        assert_eq!(ctx.electricity_price, 0.1952);
        assert_eq!(ctx.annual_consumption_kwh, 4000.0);

        let ctx = p.derive(Some(5200.0), Some(0.0));
        assert_eq!(ctx.electricity_price, 0.1952);
        assert_eq!(ctx.annual_consumption_kwh, 5200.0);
    }

    #[test]
    fn test_personalized_price_within_band() {
        let ctx = pricing().derive(Some(4000.0), Some(80.0));
        assert_relative_eq!(ctx.electricity_price, 0.24, epsilon = 1e-12);
        assert_eq!(ctx.annual_consumption_kwh, 4000.0);
    }

    #[test]
    fn test_implausible_price_keeps_consumption() {
        // 300 €/month for 3000 kWh/year → 1.2 €/kWh
        let ctx = pricing().derive(Some(3000.0), Some(300.0));
        assert_eq!(ctx.electricity_price, 0.1952);
        assert_eq!(ctx.annual_consumption_kwh, 3000.0);

        // 10 €/month for 12000 kWh/year → 0.01 €/kWh
        let ctx = pricing().derive(Some(12000.0), Some(10.0));
        assert_eq!(ctx.electricity_price, 0.1952);
        assert_eq!(ctx.annual_consumption_kwh, 12000.0);
    }

    #[test]
    fn test_plausible_band_is_inclusive() {
        // 1000 kWh per month
        let ctx = pricing().derive(Some(12000.0), Some(100.0));
        assert_eq!(ctx.electricity_price, 0.10);

        let ctx = pricing().derive(Some(12000.0), Some(500.0));
        assert_eq!(ctx.electricity_price, 0.50);
    }

    #[test]
    fn test_consumption_estimated_from_bill() {
        let ctx = pricing().derive(Some(0.0), Some(90.0));
        assert_eq!(ctx.electricity_price, 0.1952);
        assert_eq!(ctx.annual_consumption_kwh, (90.0_f64 * 12.0 / 0.1952).round());
        assert_eq!(ctx.annual_consumption_kwh, 5533.0);

        let ctx = pricing().derive(None, Some(90.0));
        assert_eq!(ctx.annual_consumption_kwh, 5533.0);
    }
}
