use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{domain::Pokemon, error::FetchError, protocol::PokemonResponse};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::PokemonGateway;

pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum GatewayConfigError {
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("api base url '{url}' cannot carry a path")]
    OpaqueBaseUrl { url: String },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Fetches pokemon from a PokeAPI-compatible HTTP service.
#[derive(Debug, Clone)]
pub struct HttpPokemonGateway {
    http: Client,
    base_url: Url,
}

impl HttpPokemonGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayConfigError> {
        let parsed = Url::parse(base_url).map_err(|source| GatewayConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(GatewayConfigError::OpaqueBaseUrl {
                url: base_url.to_string(),
            });
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resource_url(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("pokemon").push(key);
        }
        url
    }
}

#[async_trait]
impl PokemonGateway for HttpPokemonGateway {
    async fn fetch(&self, key: &str) -> Result<Pokemon, FetchError> {
        let url = self.resource_url(key);
        debug!(%url, "gateway: fetching pokemon");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::not_found(key));
        }

        let body: PokemonResponse = response
            .error_for_status()
            .map_err(|e| {
                warn!(key, error = %e, "gateway: upstream rejected request");
                FetchError::transport(e.to_string())
            })?
            .json()
            .await
            .map_err(|e| FetchError::transport(format!("invalid pokemon payload: {e}")))?;

        Ok(body.into())
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
