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

#![allow(unused)]

//! orbital state tracking and collision-risk screening.
//!
//! The [`engine::Engine`] owns a [`catalog::CatalogStore`] that is filled by the
//! [`loader::IncrementalLoader`] from CelesTrak style three-line feeds, re-propagates all tracked
//! objects periodically ([`tick::TickScheduler`]) and runs threshold-distance screening
//! ([`evaluator`]) on a dedicated worker thread ([`worker::EvaluatorWorker`]).

use std::{path::Path, time::Duration};
use chrono::{DateTime,Utc,TimeZone,TimeDelta};
use satkit::Instant;
use serde::{Deserialize,Serialize};

pub mod errors;
use errors::{OdinConjunctionError,Result,op_failed};

pub mod geo;
pub mod elements;
pub mod propagator;
pub mod catalog;
pub mod loader;
pub mod feed;
pub mod tick;
pub mod evaluator;
pub mod worker;
pub mod geocode;
pub mod engine;

use loader::{CatalogGroups, PurgeScope};
use geocode::GeocodeConfig;

/// the store id of the (single) launch candidate
pub const LAUNCH_CANDIDATE_ID: &str = "CURRENT-LAUNCH";

/* #region config *************************************************************/

/// the tracked reference body (ISS by default)
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct ReferenceConfig {
    pub id: String,
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl Default for ReferenceConfig {
    fn default()->Self {
        ReferenceConfig {
            id: "ISS-ZARYA".to_string(),
            name: "ISS (ZARYA)".to_string(),
            line1: "1 25544U 98067A   24166.20347222  .00001666  00000+0  38509-4 0  9998".to_string(),
            line2: "2 25544  51.6411 115.2241 0003852 331.0922  74.5720 15.50068506392920".to_string(),
        }
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct ConjunctionConfig {
    pub update_interval: Duration,
    pub page_size: usize,
    pub threshold_km: f64,
    pub horizon: Duration,
    pub trail_capacity: usize,
    pub fallback_launch_altitude_km: f64,

    pub default_group: String,
    pub reference: ReferenceConfig,
    pub groups: CatalogGroups,
    pub group_change_purge: PurgeScope,

    /// feed URL templates. `{group}`, `{name}` and `{catnr}` are replaced by the url-encoded query
    pub group_url: String,
    pub name_url: String,
    pub catnr_url: String,

    pub geocode: Option<GeocodeConfig>,
}

impl Default for ConjunctionConfig {
    fn default()->Self {
        ConjunctionConfig {
            update_interval: Duration::from_millis(2000),
            page_size: 100,
            threshold_km: 25.0,
            horizon: Duration::from_secs(10 * 60),
            trail_capacity: 300,
            fallback_launch_altitude_km: 400.0,
            default_group: "starlink".to_string(),
            reference: ReferenceConfig::default(),
            groups: CatalogGroups::default(),
            group_change_purge: PurgeScope::AllLoaded,
            group_url: "https://celestrak.org/NORAD/elements/gp.php?GROUP={group}&FORMAT=tle".to_string(),
            name_url: "https://celestrak.org/NORAD/elements/gp.php?NAME={name}&FORMAT=tle".to_string(),
            catnr_url: "https://celestrak.org/NORAD/elements/gp.php?CATNR={catnr}&FORMAT=tle".to_string(),
            geocode: None,
        }
    }
}

/// load a RON config from the given path
pub fn load_config<C,P> (path: P) -> Result<C> where C: for <'a> Deserialize<'a>, P: AsRef<Path> {
    let data = std::fs::read( path.as_ref())?;
    Ok( ron::de::from_bytes( data.as_slice())? )
}

/* #endregion config */

//--- general utility functions

pub fn instant_from_datetime<Z> (dt: DateTime<Z>)->Instant where Z:TimeZone {
    Instant::from_unixtime( dt.timestamp_millis() as f64 / 1000.0)
}

pub fn datetime_from_unixtime (secs: f64)->DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis( (secs * 1000.0).round() as i64).unwrap_or_default()
}

/// std to chrono duration, saturating at `TimeDelta::MAX`
pub fn time_delta (d: Duration)->TimeDelta {
    TimeDelta::from_std( d).unwrap_or( TimeDelta::MAX)
}

/// the point in time `horizon` after `now`, saturating at the max representable time
pub fn horizon_time (now: DateTime<Utc>, horizon: Duration)->DateTime<Utc> {
    now.checked_add_signed( time_delta( horizon)).unwrap_or( DateTime::<Utc>::MAX_UTC)
}
