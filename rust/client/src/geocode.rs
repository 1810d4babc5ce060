// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reverse geocoding of project coordinates to city names.
//!
//! Lookups go to a Nominatim-compatible `reverse` endpoint. Every answered
//! lookup is cached for the life of the [`Geocoder`] under the coordinate
//! pair key, including lookups that found no city. Transport and status
//! failures fall back to [`UNKNOWN_CITY`] without being cached.

use std::sync::{Mutex, PoisonError};

use bim_dash_core::{KeyValueStore, MemoryStore};
use reqwest::header::USER_AGENT;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{ClientError, Result};

/// City label used when a lookup finds nothing or fails.
pub const UNKNOWN_CITY: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
}

impl Address {
    fn settlement(self) -> Option<String> {
        [self.city, self.town, self.village]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
    }
}

/// Caching reverse geocoder.
#[derive(Debug)]
pub struct Geocoder {
    reverse_url: Url,
    user_agent: String,
    http: reqwest::Client,
    cache: Mutex<MemoryStore>,
}

impl Geocoder {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        Self::with_client(base_url, user_agent, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, user_agent: &str, http: reqwest::Client) -> Result<Self> {
        let invalid = |reason: String| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };
        let mut reverse_url =
            Url::parse(base_url.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
        reverse_url
            .path_segments_mut()
            .map_err(|_| invalid("not a base URL".to_string()))?
            .pop_if_empty()
            .push("reverse");

        Ok(Self {
            reverse_url,
            user_agent: user_agent.to_string(),
            http,
            cache: Mutex::new(MemoryStore::new()),
        })
    }

    /// City name for a coordinate pair, never failing.
    pub async fn city_for(&self, latitude: f64, longitude: f64) -> String {
        let key = pair_key(latitude, longitude);
        if let Some(city) = self.cached(&key) {
            return city;
        }

        match self.lookup(latitude, longitude).await {
            Ok(city) => {
                let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = cache.set_as(&key, &city) {
                    tracing::warn!(key = %key, error = %e, "Failed to cache city");
                }
                city
            }
            Err(e) => {
                tracing::warn!(latitude, longitude, error = %e, "Reverse geocoding failed");
                UNKNOWN_CITY.to_string()
            }
        }
    }

    /// Number of cached coordinate pairs.
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn cached(&self, key: &str) -> Option<String> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get_as::<String>(key).ok().flatten()
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<String> {
        let url = self.reverse_url.to_string();
        let resp = self
            .http
            .get(self.reverse_url.clone())
            .header(USER_AGENT, &self.user_agent)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let bytes = resp.bytes().await.map_err(|source| ClientError::Transport {
            url: url.clone(),
            source,
        })?;
        let body: ReverseResponse = serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::Decode {
                url,
                reason: e.to_string(),
            }
        })?;

        let city = body
            .address
            .and_then(Address::settlement)
            .unwrap_or_else(|| UNKNOWN_CITY.to_string());
        tracing::debug!(latitude, longitude, city = %city, "Resolved city");
        Ok(city)
    }
}

/// Cache key of a coordinate pair.
pub fn pair_key(latitude: f64, longitude: f64) -> String {
    format!("{latitude}_{longitude}")
}
