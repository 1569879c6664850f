/// ============================================================
///  Subscription grid
///
///  Monthly leasing price as a function of installed power:
///   - input rounded to the nearest 0.5 kWc
///   - exact grid hit → grid price
///   - below the grid → lowest price
///   - above the grid → linear extrapolation at a fixed €/kWc
///   - otherwise → linear interpolation between neighbours
/// ============================================================

use crate::config::{ConfigError, EngineConfig, TariffPoint};
use crate::services::round_to_power_step;

#[derive(Debug, Clone)]
pub struct TariffTable {
    points: Vec<TariffPoint>,
    extrapolation_per_kwc: f64,
}

impl TariffTable {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            points: config.tariff.points.clone(),
            extrapolation_per_kwc: config.tariff.extrapolation_per_kwc,
        })
    }

    pub fn points(&self) -> &[TariffPoint] {
        &self.points
    }

    /// Monthly subscription (€) for `power_kwc`. Precondition: `power_kwc > 0`.
    pub fn monthly_subscription(&self, power_kwc: f64) -> f64 {
        let power = round_to_power_step(power_kwc);

        // `new` guarantees a non-empty grid
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];

        if power <= first.power_kwc {
            return first.monthly_price;
        }
        if power > last.power_kwc {
            return last.monthly_price + (power - last.power_kwc) * self.extrapolation_per_kwc;
        }

        // first index whose power is >= the rounded input; always >= 1 here
        let upper = self.points.partition_point(|p| p.power_kwc < power);
        let hi = self.points[upper];
        if hi.power_kwc == power {
            return hi.monthly_price;
        }
        let lo = self.points[upper - 1];
        let ratio = (power - lo.power_kwc) / (hi.power_kwc - lo.power_kwc);
        lo.monthly_price + ratio * (hi.monthly_price - lo.monthly_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> TariffTable {
        TariffTable::new(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_exact_grid_points() {
        let t = table();
        assert_eq!(t.monthly_subscription(6.0), 115.0);
        assert_eq!(t.monthly_subscription(2.5), 49.0);
        assert_eq!(t.monthly_subscription(36.0), 654.0);
    }

    #[test]
    fn test_input_rounded_to_half_kwc_before_lookup() {
        let t = table();
        // 6.25 rounds up onto the 6.5 grid point
        assert_eq!(t.monthly_subscription(6.25), 124.0);
        assert_eq!(t.monthly_subscription(6.2), 115.0);
    }

    #[test]
    fn test_interpolates_between_sparse_grid_points() {
        let t = table();
        // between 12 (221) and 15 (275)
        assert_relative_eq!(t.monthly_subscription(13.5), 248.0, epsilon = 1e-9);
        assert_relative_eq!(t.monthly_subscription(13.0), 221.0 + 54.0 / 3.0, epsilon = 1e-9);
        // between 30 (545) and 36 (654)
        assert_relative_eq!(t.monthly_subscription(33.0), 599.5, epsilon = 1e-9);
    }

    #[test]
    fn test_floor_clamp_below_grid() {
        let t = table();
        assert_eq!(t.monthly_subscription(1.0), 49.0);
        assert_eq!(t.monthly_subscription(0.1), 49.0);
    }

    #[test]
    fn test_extrapolation_above_grid() {
        let t = table();
        assert_relative_eq!(t.monthly_subscription(40.0), 654.0 + 4.0 * 18.0, epsilon = 1e-9);
        assert_relative_eq!(t.monthly_subscription(36.5), 663.0, epsilon = 1e-9);
    }

    #[test]
    fn test_monotonic_over_power_range() {
        let t = table();
        let mut previous = t.monthly_subscription(0.1);
        for step in 1..=1000 {
            let power = 0.1 + f64::from(step) * 0.05;
            let price = t.monthly_subscription(power);
            assert!(price >= previous, "price dropped at {power:.2} kWc: {previous} -> {price}");
            assert!(price.is_finite() && price > 0.0);
            previous = price;
        }
    }
}
