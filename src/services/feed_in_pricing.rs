use crate::config::FeedInConfig;

/// Price paid by the grid operator for exported surplus, by installation size.
#[derive(Debug, Clone)]
pub struct FeedInPricing {
    tiers: FeedInConfig,
}

impl FeedInPricing {
    pub fn new(tiers: &FeedInConfig) -> Self {
        Self { tiers: tiers.clone() }
    }

    /// €/kWh for an installation of `power_kwc`.
    pub fn resale_price(&self, power_kwc: f64) -> f64 {
        // no tier exists past cap_kwc; the upper rate keeps applying
        if power_kwc < self.tiers.threshold_kwc {
            self.tiers.low_rate
        } else {
            self.tiers.high_rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        let pricing = FeedInPricing::new(&FeedInConfig::default());
        assert_eq!(pricing.resale_price(2.5), 0.04);
        assert_eq!(pricing.resale_price(8.5), 0.04);
        assert_eq!(pricing.resale_price(9.0), 0.0617);
        assert_eq!(pricing.resale_price(36.0), 0.0617);
        assert_eq!(pricing.resale_price(100.0), 0.0617);
        assert_eq!(pricing.resale_price(150.0), 0.0617);
    }
}
