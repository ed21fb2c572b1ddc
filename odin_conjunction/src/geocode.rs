/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License"); 
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! reverse lookup of place names for the reference body ground position

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize,Deserialize};
use serde_json::Value;
use tracing::debug;
use crate::errors::{op_failed, OdinConjunctionError, Result};

pub const UNKNOWN_LOCATION: &str = "Unknown";
pub const OPEN_WATER_LOCATION: &str = "Over Earth";

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct GeocodeConfig {
    pub url: String,
    pub api_key: String,
    pub interval: Duration,
}

impl Default for GeocodeConfig {
    fn default()->Self {
        GeocodeConfig {
            url: "https://api.opencagedata.com/geocode/v1/json".to_string(),
            api_key: String::new(),
            interval: Duration::from_secs(10),
        }
    }
}

#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve (&self, latitude_deg: f64, longitude_deg: f64) -> Result<String>;
}

/// the resolved name, degrading to "Unknown" if there is no resolver or the lookup fails
pub async fn resolve_or_unknown (resolver: Option<&dyn LocationResolver>, latitude_deg: f64, longitude_deg: f64)->String {
    match resolver {
        Some(resolver) => match resolver.resolve( latitude_deg, longitude_deg).await {
            Ok(name) => name,
            Err(e) => {
                debug!("location lookup failed: {}", e);
                UNKNOWN_LOCATION.to_string()
            }
        }
        None => UNKNOWN_LOCATION.to_string()
    }
}

/// pick the most specific place name (city, state, country) of an OpenCage response
pub fn place_name (response: &Value)->String {
    let components = &response["results"][0]["components"];
    ["city", "state", "country"].iter()
        .find_map( |key| components[*key].as_str().filter( |s| !s.is_empty()))
        .unwrap_or( OPEN_WATER_LOCATION)
        .to_string()
}

pub struct OpenCageResolver {
    client: Client,
    config: GeocodeConfig,
}

impl OpenCageResolver {
    pub fn new (config: GeocodeConfig)->Self {
        OpenCageResolver { client: Client::new(), config }
    }
}

#[async_trait]
impl LocationResolver for OpenCageResolver {
    async fn resolve (&self, latitude_deg: f64, longitude_deg: f64) -> Result<String> {
        let query = format!("{latitude_deg} {longitude_deg}");
        let response = self.client.get( &self.config.url)
            .query( &[("q", query.as_str()), ("key", self.config.api_key.as_str())])
            .send().await?;

        if !response.status().is_success() {
            return Err( op_failed!("location lookup failed with status {}", response.status()))
        }

        let json: Value = response.json().await?;
        Ok( place_name( &json))
    }
}
