use crate::clean::clean_label;
use crate::error::{ErrorKind, Result};
use crate::lookup::LabelLookup;
use async_trait::async_trait;
use exn::ResultExt;
use renamr_cache::Coordinate;
use serde_json::{Map, Value};
use std::time::Duration;

/// Public Nominatim reverse geocoding endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";

/// Address fields that name a settlement, most specific first.
const PLACE_FIELDS: [&str; 4] = ["city", "town", "village", "municipality"];

#[derive(Debug, Clone, PartialEq)]
pub struct NominatimOptions {
    pub endpoint: String,
    /// Nominatim's usage policy requires an identifying user agent.
    pub user_agent: String,
    /// Preferred language for returned names (`accept-language`).
    pub language: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Level of detail; 10 is city level.
    pub zoom: u8,
}

impl Default for NominatimOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: concat!("renamr/", env!("CARGO_PKG_VERSION")).to_string(),
            language: "en".to_string(),
            timeout: Duration::from_secs(10),
            zoom: 10,
        }
    }
}

/// [`LabelLookup`] backed by the Nominatim reverse geocoding API.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    options: NominatimOptions,
}

impl NominatimClient {
    pub fn new(options: NominatimOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.timeout)
            .build()
            .or_raise(|| ErrorKind::Config)?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &NominatimOptions {
        &self.options
    }

    fn transport_error(e: reqwest::Error) -> crate::error::Error {
        let kind = if e.is_timeout() { ErrorKind::Timeout } else { ErrorKind::Network };
        exn::Exn::from(e).raise(kind)
    }
}

#[async_trait]
impl LabelLookup for NominatimClient {
    #[tracing::instrument(skip_all, fields(coordinate = %coordinate))]
    async fn lookup(&self, coordinate: Coordinate) -> Result<String> {
        let query = [
            ("format", "json".to_string()),
            ("lat", coordinate.latitude().to_string()),
            ("lon", coordinate.longitude().to_string()),
            ("zoom", self.options.zoom.to_string()),
            ("addressdetails", "1".to_string()),
            ("accept-language", self.options.language.clone()),
        ];
        let response =
            self.client.get(&self.options.endpoint).query(&query).send().await.map_err(Self::transport_error)?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let body = response.text().await.map_err(Self::transport_error)?;
        tracing::debug!(bytes = body.len(), "Response received");
        let label = parse_label(&body)?;
        if label.is_empty() {
            tracing::warn!("No place name in response");
        } else {
            tracing::info!(label = %label, "Resolved place label");
        }
        Ok(label)
    }
}

/// Extracts the place label from a Nominatim `format=json` response body.
///
/// The first non-blank of `city`, `town`, `village` and `municipality` is
/// cleaned with [`clean_label`]; failing those, `county` is used verbatim.
/// A response without an address (e.g. `{"error": "Unable to geocode"}`)
/// yields an empty label.
///
/// # Errors
/// [`ErrorKind::MalformedResponse`] with the raw body when it isn't a JSON object.
pub fn parse_label(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body).or_raise(|| ErrorKind::MalformedResponse(body.to_string()))?;
    let Some(object) = value.as_object() else {
        exn::bail!(ErrorKind::MalformedResponse(body.to_string()));
    };
    let Some(address) = object.get("address").and_then(Value::as_object) else {
        return Ok(String::new());
    };
    if let Some(place) = PLACE_FIELDS.iter().find_map(|field| address_field(address, field)) {
        return Ok(clean_label(place));
    }
    Ok(address_field(address, "county").unwrap_or_default().to_string())
}

fn address_field<'a>(address: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    address.get(field).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}
