use thiserror::Error;
use tracing::debug;

use crate::config::GeocodingConfig;
use crate::models::simulation::{AddressSuggestion, GeoSearchResponse};

/// Queries shorter than this are not worth a round-trip.
const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("address search failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Address autocomplete backed by the French national address API.
#[derive(Debug, Clone)]
pub struct GeoClient {
    http: reqwest::Client,
    config: GeocodingConfig,
}

impl GeoClient {
    pub fn new(config: GeocodingConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<AddressSuggestion>, GeoError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let url = format!("{}/search/", self.config.base_url.trim_end_matches('/'));
        let body = self
            .http
            .get(&url)
            .query(&[("q", query.to_string()), ("limit", self.config.limit.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json::<GeoSearchResponse>()
            .await?;

        debug!(query, results = body.features.len(), "address search");
        Ok(suggestions_from_response(body))
    }
}

fn suggestions_from_response(body: GeoSearchResponse) -> Vec<AddressSuggestion> {
    body.features
        .into_iter()
        .map(|feature| {
            let [longitude, latitude] = feature.geometry.coordinates;
            AddressSuggestion {
                label: feature.properties.label,
                city: feature.properties.city,
                postal_code: feature.properties.postcode,
                latitude,
                longitude,
                context: feature.properties.context,
            }
        })
        .collect()
}
