//! Lead storage
//!
//! Pushes a completed simulation and the prospect's contact details to the
//! sales team's Airtable base. Column names follow that table's schema.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::config::AirtableConfig;
use crate::models::simulation::{ContactPreference, HeatingType, LeadRequest, Orientation, RoofCovering};

#[derive(Debug, Error)]
pub enum LeadError {
    #[error("Airtable credentials are not configured (AIRTABLE_API_KEY / airtable.base_id)")]
    MissingCredentials,
    #[error("Airtable request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: String,
}

#[derive(Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    config: AirtableConfig,
    api_key: Option<String>,
}

impl std::fmt::Debug for AirtableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableClient")
            .field("config", &self.config)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AirtableClient {
    pub fn new(config: AirtableConfig, api_key: Option<String>) -> Self {
        Self { http: reqwest::Client::new(), config, api_key }
    }

    /// Reads the API key from `AIRTABLE_API_KEY`.
    pub fn from_env(config: AirtableConfig) -> Self {
        let api_key = std::env::var("AIRTABLE_API_KEY").ok().filter(|k| !k.is_empty());
        Self::new(config, api_key)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.config.base_id.is_some()
    }

    /// Creates one record and returns its Airtable id.
    pub async fn submit(&self, lead: &LeadRequest) -> Result<String, LeadError> {
        let (Some(api_key), Some(base_id)) = (&self.api_key, &self.config.base_id) else {
            return Err(LeadError::MissingCredentials);
        };

        let url = format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            base_id,
            self.config.table_name
        );
        let record = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&json!({ "fields": lead_fields(lead, Utc::now().date_naive()) }))
            .send()
            .await?
            .error_for_status()?
            .json::<CreatedRecord>()
            .await?;

        info!(record_id = %record.id, "lead stored");
        Ok(record.id)
    }
}

fn lead_fields(lead: &LeadRequest, created: NaiveDate) -> Value {
    let contact = &lead.contact;
    let location = &lead.location;
    let roof = &lead.roof;
    let consumption = &lead.consumption;
    let result = &lead.simulation;

    json!({
        "Prénom": contact.first_name,
        "Nom": contact.last_name,
        "Email": contact.email,
        "Téléphone": contact.phone,
        "Code postal": contact.postal_code.as_deref().unwrap_or(&location.postal_code),
        "Préférence contact": match contact.contact_preference {
            ContactPreference::Email => "Email",
            ContactPreference::Phone => "Téléphone",
        },

        "Adresse complète": location.full_address.as_deref().unwrap_or(&location.address),
        "Ville": location.city,

        "Surface toiture": roof.surface_m2,
        "Orientation": orientation_label(roof.orientation),
        "Inclinaison": roof.inclination_deg,
        "Type toiture": covering_label(roof.covering),
        "Obstacles": roof.obstacles,

        "Consommation annuelle": consumption.annual_consumption_kwh.unwrap_or(0.0),
        "Facture mensuelle": consumption.monthly_bill.unwrap_or(0.0),
        "Type chauffage": heating_label(consumption.heating_type),

        "Puissance recommandée": result.installed_power_kwc,
        "Production annuelle": result.annual_production_kwh,
        "Autoconsommation": result.self_consumption_percent,
        "Économies annuelles": result.annual_savings,
        "Abonnement mensuel": result.monthly_subscription,
        "Réduction CO2": result.co2_reduction_kg,

        "Date création": created.format("%Y-%m-%d").to_string(),
        "Statut": "Nouveau",
    })
}

fn orientation_label(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::South => "Sud",
        Orientation::SouthEast => "Sud-est",
        Orientation::SouthWest => "Sud-ouest",
        Orientation::East => "Est",
        Orientation::West => "Ouest",
        Orientation::North => "Nord",
    }
}

fn covering_label(covering: RoofCovering) -> &'static str {
    match covering {
        RoofCovering::Tiles => "Tuiles",
        RoofCovering::Slate => "Ardoises",
        RoofCovering::SteelDeck => "Bac acier",
        RoofCovering::Membrane => "Membrane EPDM",
        RoofCovering::Other => "Autre",
    }
}

fn heating_label(heating: HeatingType) -> &'static str {
    match heating {
        HeatingType::Electric => "Electrique",
        HeatingType::Gas => "Gaz",
        HeatingType::Oil => "Fioul",
        HeatingType::Other => "Autre",
    }
}
