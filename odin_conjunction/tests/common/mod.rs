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

//! shared test fixtures: element sets, feeds and a deterministic propagator

use std::{collections::HashMap, sync::{Arc, atomic::{AtomicUsize, Ordering}}, time::Duration};
use async_trait::async_trait;
use chrono::{DateTime,TimeZone,Utc};
use odin_conjunction::{
    catalog::{ObjectCategory, ObjectSnapshot, TrackedObject},
    elements::OrbitalElementSet,
    errors::{OdinConjunctionError, Result},
    feed::{first_record, validate_query, FeedSource, ThreeLineRecord},
    geo::Cartesian3,
    propagator::{EciState, Propagator}
};

pub const ISS_ID: &str = "ISS-ZARYA";
pub const ISS_NAME: &str = "ISS (ZARYA)";
pub const ISS_LINE1: &str = "1 25544U 98067A   24166.20347222  .00001666  00000+0  38509-4 0  9998";
pub const ISS_LINE2: &str = "2 25544  51.6411 115.2241 0003852 331.0922  74.5720 15.50068506392920";

pub const KM: f64 = 1000.0;

pub fn fixed_now ()->DateTime<Utc> {
    Utc.with_ymd_and_hms( 2024, 6, 14, 5, 0, 0).unwrap()
}

/// valid elements under an arbitrary name (the analytic propagator only looks at names)
pub fn elements (name: &str)->OrbitalElementSet {
    OrbitalElementSet::parse( name, ISS_LINE1, ISS_LINE2).unwrap()
}

pub fn snapshot (id: &str)->ObjectSnapshot {
    ObjectSnapshot { id: id.to_string(), elements: elements(id) }
}

pub fn reference_object ()->TrackedObject {
    TrackedObject::new( ISS_ID, ObjectCategory::Reference, elements(ISS_NAME))
}

pub fn three_line_record (name: &str)->String {
    format!("{name}\n{ISS_LINE1}\n{ISS_LINE2}\n")
}

pub fn three_line_feed (names: &[&str])->String {
    names.iter().map( |n| three_line_record(n)).collect()
}

/// a line with a broken checksum
pub fn corrupted_line2 ()->String {
    ISS_LINE2.replace( "392920", "392921")
}

/* #region analytic propagator ************************************************/

/// fixed inertial positions keyed by object name. Objects without a position fail to propagate
#[derive(Debug,Clone,Default)]
pub struct AnalyticPropagator {
    positions: Arc<HashMap<String,Cartesian3>>,
}

impl AnalyticPropagator {
    pub fn new (entries: &[(&str,Cartesian3)])->Self {
        let positions = entries.iter().map( |(name,p)| (name.to_string(), *p)).collect();
        AnalyticPropagator { positions: Arc::new(positions) }
    }
}

impl Propagator for AnalyticPropagator {
    fn propagate (&self, elements: &OrbitalElementSet, t: DateTime<Utc>) -> Option<EciState> {
        self.positions.get( elements.name()).map( |p| EciState::new( *p, Cartesian3::new( 0.0, 7660.0, 0.0)))
    }
}

/// base point of the scenario geometry, roughly at LEO radius
pub fn base ()->Cartesian3 {
    Cartesian3::new( 6_900.0 * KM, 0.0, 0.0)
}

/// 2 debris and 2 active objects with separations D1-A1: 12km, D1-A2: 40km, D2-A1: 5km, D2-A2: 30km
pub fn scenario_positions ()->Vec<(&'static str,Cartesian3)> {
    let b = base();
    let a1 = b;
    let d1 = b + Cartesian3::new( 0.0, 0.0, 12.0 * KM);
    let d2 = b + Cartesian3::new( 3.0 * KM, 4.0 * KM, 0.0);
    let a2 = b + Cartesian3::new( 23.477049118607894 * KM, -4.982786838955921 * KM, -20.0 * KM);

    vec![ ("A1", a1), ("A2", a2), ("D1", d1), ("D2", d2) ]
}

pub fn scenario_propagator ()->AnalyticPropagator {
    let mut entries = scenario_positions();
    entries.push( (ISS_NAME, Cartesian3::new( -6_800.0 * KM, 0.0, 0.0)));
    AnalyticPropagator::new( &entries)
}

/* #endregion analytic propagator */

/* #region feed source ********************************************************/

/// in-memory feed source. Group fetches can be delayed to simulate slow servers
#[derive(Default)]
pub struct MapFeedSource {
    pub groups: HashMap<String,String>,
    pub records: Vec<String>,
    pub delays: HashMap<String,Duration>,
    pub lookups: AtomicUsize,
}

impl MapFeedSource {
    pub fn new (groups: &[(&str,String)], records: &[&str])->Self {
        MapFeedSource {
            groups: groups.iter().map( |(g,t)| (g.to_string(), t.clone())).collect(),
            records: records.iter().map( |r| r.to_string()).collect(),
            ..MapFeedSource::default()
        }
    }

    pub fn with_delay (mut self, group: &str, delay: Duration)->Self {
        self.delays.insert( group.to_string(), delay);
        self
    }

    pub fn lookup_count (&self)->usize {
        self.lookups.load( Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for MapFeedSource {
    async fn fetch_group (&self, group: &str) -> Result<String> {
        if let Some(delay) = self.delays.get( group) {
            tokio::time::sleep( *delay).await;
        }
        self.groups.get( group).cloned().ok_or( OdinConjunctionError::FeedUnavailable( group.to_string()))
    }

    async fn lookup (&self, query: &str) -> Result<Option<ThreeLineRecord>> {
        self.lookups.fetch_add( 1, Ordering::SeqCst);
        let query = validate_query( query)?;
        Ok( self.records.iter().find( |r| r.starts_with(query)).and_then( |r| first_record(r)))
    }
}

/* #endregion feed source */
