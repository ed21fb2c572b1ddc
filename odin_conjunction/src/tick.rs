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

//! periodic re-propagation of the catalog to the current time

use std::{collections::VecDeque, time::Duration};
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use tracing::debug;
use crate::{
    catalog::{CatalogStore, ObjectCategory},
    geo::{Cartesian3, Cartographic},
    geocode::UNKNOWN_LOCATION,
    propagator::{eci_to_geodetic, EciState, Propagator}
};

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct PositionSample {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
    pub eci_position: Cartesian3,
    pub eci_velocity: Cartesian3,
}

impl PositionSample {
    pub fn new (id: &str, timestamp: DateTime<Utc>, state: &EciState)->Self {
        let c = eci_to_geodetic( &state.position, timestamp);
        PositionSample {
            id: id.to_string(),
            timestamp,
            latitude_deg: c.latitude_deg(),
            longitude_deg: c.longitude_deg(),
            altitude_m: c.height,
            eci_position: state.position,
            eci_velocity: state.velocity,
        }
    }

    pub fn cartographic (&self)->Cartographic {
        Cartographic::from_degrees( self.longitude_deg, self.latitude_deg, self.altitude_m)
    }
}

/// what we show about the reference body
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct ReferenceStatus {
    pub sample: PositionSample,
    pub speed_kmh: f64,
    pub location_name: String,
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct TickUpdate {
    pub timestamp: DateTime<Utc>,
    pub samples: Vec<PositionSample>,
    pub reference: Option<ReferenceStatus>,
    /// ids of objects that could not be propagated in this tick
    pub skipped: Vec<String>,
}

/// bounded, chronologically ordered ground track of the reference body
#[derive(Debug,Clone)]
pub struct Trail {
    capacity: usize,
    points: VecDeque<Cartographic>,
}

impl Trail {
    pub fn new (capacity: usize)->Self {
        Trail { capacity, points: VecDeque::with_capacity( capacity) }
    }

    /// append a point, evicting the oldest ones if we are at capacity
    pub fn push (&mut self, p: Cartographic) {
        if self.capacity == 0 { return }
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(p);
    }

    pub fn len (&self)->usize { self.points.len() }
    pub fn is_empty (&self)->bool { self.points.is_empty() }
    pub fn capacity (&self)->usize { self.capacity }
    pub fn clear (&mut self) { self.points.clear() }
    pub fn last (&self)->Option<&Cartographic> { self.points.back() }

    pub fn iter (&self)->impl Iterator<Item=&Cartographic> {
        self.points.iter()
    }
}

pub struct TickScheduler {
    period: Duration,
    trail: Trail,
}

impl TickScheduler {
    pub fn new (period: Duration, trail_capacity: usize)->Self {
        TickScheduler { period, trail: Trail::new( trail_capacity) }
    }

    pub fn period (&self)->Duration { self.period }

    pub fn trail (&self)->&Trail { &self.trail }

    /// propagate every object in the store to `now`. Objects that fail to propagate are skipped
    /// for this tick, the reference body also updates speed and trail
    pub fn tick<P> (&mut self, store: &CatalogStore, propagator: &P, now: DateTime<Utc>)->TickUpdate where P: Propagator + ?Sized {
        let mut samples = Vec::with_capacity( store.len());
        let mut skipped = Vec::new();
        let mut reference = None;

        for obj in store.iter() {
            match propagator.propagate( &obj.elements, now) {
                Some(state) => {
                    let sample = PositionSample::new( &obj.id, now, &state);
                    if obj.category == ObjectCategory::Reference {
                        self.trail.push( sample.cartographic());
                        reference = Some( ReferenceStatus {
                            sample: sample.clone(),
                            speed_kmh: state.speed_kmh(),
                            location_name: UNKNOWN_LOCATION.to_string(),
                        });
                    }
                    samples.push( sample);
                }
                None => {
                    debug!("skipping {} in tick at {}", obj.id, now);
                    skipped.push( obj.id.clone());
                }
            }
        }

        TickUpdate { timestamp: now, samples, reference, skipped }
    }
}
