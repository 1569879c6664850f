use crate::models::simulation::HeatingType;

/// Heuristic share of the production consumed on site.
///
/// Heating type sets a base rate (electric heating shifts more load into
/// daylight hours), then the production/consumption ratio adds a boost for
/// relatively small installations, each bracket with its own ceiling.
#[derive(Debug, Clone)]
pub struct SelfConsumptionModel {
    minimum_guarantee: f64,
}

impl SelfConsumptionModel {
    pub fn new(minimum_guarantee: f64) -> Self {
        Self { minimum_guarantee }
    }

    /// Percentage in `[minimum_guarantee, 100]`.
    pub fn estimate(&self, annual_production_kwh: f64, annual_consumption_kwh: f64, heating: HeatingType) -> f64 {
        estimate(annual_production_kwh, annual_consumption_kwh, heating, self.minimum_guarantee)
    }
}

pub fn estimate(
    annual_production_kwh: f64,
    annual_consumption_kwh: f64,
    heating: HeatingType,
    minimum_guarantee: f64,
) -> f64 {
    // zero consumption gives inf/NaN, both land in the last bracket
    let ratio = annual_production_kwh / annual_consumption_kwh;

    let base = match heating {
        HeatingType::Electric => minimum_guarantee.max(65.0),
        HeatingType::Gas | HeatingType::Oil => minimum_guarantee.max(60.0),
        HeatingType::Other => minimum_guarantee,
    };

    let boosted = if ratio <= 0.5 {
        (base + 20.0).min(85.0)
    } else if ratio <= 1.0 {
        (base + 10.0).min(75.0)
    } else if ratio <= 1.5 {
        (base + 5.0).min(70.0)
    } else {
        base
    };

    boosted.max(minimum_guarantee)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_HEATING: [HeatingType; 4] = [HeatingType::Electric, HeatingType::Gas, HeatingType::Oil, HeatingType::Other];

    #[test]
    fn test_brackets_with_default_guarantee() {
        assert_eq!(estimate(2000.0, 4000.0, HeatingType::Electric, 60.0), 85.0);
        assert_eq!(estimate(4000.0, 4000.0, HeatingType::Electric, 60.0), 75.0);
        assert_eq!(estimate(5000.0, 4000.0, HeatingType::Electric, 60.0), 70.0);
        assert_eq!(estimate(8000.0, 4000.0, HeatingType::Electric, 60.0), 65.0);

        assert_eq!(estimate(2000.0, 4000.0, HeatingType::Gas, 60.0), 80.0);
        assert_eq!(estimate(4000.0, 4000.0, HeatingType::Oil, 60.0), 70.0);
        assert_eq!(estimate(5000.0, 4000.0, HeatingType::Gas, 60.0), 65.0);
        assert_eq!(estimate(8000.0, 4000.0, HeatingType::Other, 60.0), 60.0);
    }

    #[test]
    fn test_ceiling_can_fall_below_base_but_never_below_guarantee() {
        // base 72 + 5 capped at 70, then lifted back to the guarantee
        assert_eq!(estimate(5000.0, 4000.0, HeatingType::Other, 72.0), 72.0);
        assert_eq!(estimate(1000.0, 4000.0, HeatingType::Other, 90.0), 90.0);
    }

    #[test]
    fn test_zero_consumption_uses_base() {
        assert_eq!(estimate(3000.0, 0.0, HeatingType::Electric, 60.0), 65.0);
        assert_eq!(estimate(0.0, 0.0, HeatingType::Gas, 60.0), 60.0);
    }

    #[test]
    fn test_bounds_hold_across_inputs() {
        for guarantee in [0.0, 30.0, 60.0, 65.0, 80.0, 100.0] {
            for heating in ALL_HEATING {
                for tenths in 0..=40 {
                    let production = f64::from(tenths) * 250.0;
                    let pct = estimate(production, 4000.0, heating, guarantee);
                    assert!(pct >= guarantee, "{pct} below guarantee {guarantee}");
                    assert!(pct <= 100.0, "{pct} above 100");
                }
            }
        }
    }
}
