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

mod common;

use std::time::Duration;
use chrono::TimeDelta;
use odin_conjunction::{
    catalog::{CatalogStore, ObjectCategory, TrackedObject},
    geo::Cartesian3,
    geocode::UNKNOWN_LOCATION,
    propagator::{Propagator, Sgp4Propagator},
    tick::{TickScheduler, Trail}
};
use common::*;

#[test]
fn test_tick_skips_failing_objects () {
    let propagator = scenario_propagator();
    let mut store = CatalogStore::new( reference_object());
    store.insert( TrackedObject::new( "A1_0", ObjectCategory::Active, elements("A1")));
    store.insert( TrackedObject::new( "LOST_1", ObjectCategory::Debris, elements("LOST")));
    store.insert( TrackedObject::new( "D1_0", ObjectCategory::Debris, elements("D1")));

    let mut ticker = TickScheduler::new( Duration::from_millis(2000), 300);
    let update = ticker.tick( &store, &propagator, fixed_now());

    let ids: Vec<&str> = update.samples.iter().map( |s| s.id.as_str()).collect();
    println!("sampled: {:?}, skipped: {:?}", ids, update.skipped);
    assert_eq!( ids, vec![ISS_ID, "A1_0", "D1_0"]);
    assert_eq!( update.skipped, vec!["LOST_1".to_string()]);
    assert_eq!( update.timestamp, fixed_now());

    let r = update.reference.expect("no reference status");
    assert_eq!( r.sample.id, ISS_ID);
    assert!( (r.speed_kmh - 7660.0 * 3.6).abs() < 1e-6);
    assert_eq!( r.location_name, UNKNOWN_LOCATION);
    assert!( (r.sample.altitude_m - (6_800_000.0 - 6_378_137.0)).abs() < 1.0); // on the equator
    assert_eq!( ticker.trail().len(), 1);
}

#[test]
fn test_trail_is_bounded () {
    let propagator = scenario_propagator();
    let store = CatalogStore::new( reference_object());
    let mut ticker = TickScheduler::new( Duration::from_millis(2000), 3);

    let t0 = fixed_now();
    for i in 0..5 {
        ticker.tick( &store, &propagator, t0 + TimeDelta::seconds( 2 * i));
    }
    assert_eq!( ticker.trail().len(), 3);
    assert_eq!( ticker.trail().capacity(), 3);

    // the reference position is fixed in the inertial frame, so the ground track moves west
    let lons: Vec<f64> = ticker.trail().iter().map( |c| c.longitude_deg()).collect();
    println!("trail longitudes: {:?}", lons);
    assert!( lons.windows(2).all( |w| w[1] != w[0]));
}

#[test]
fn test_trail_eviction_order () {
    let mut trail = Trail::new(2);
    for i in 0..4 {
        trail.push( odin_conjunction::geo::Cartographic::from_degrees( i as f64, 0.0, 0.0));
    }
    let lons: Vec<i64> = trail.iter().map( |c| c.longitude_deg().round() as i64).collect();
    assert_eq!( lons, vec![2, 3]);

    let mut empty = Trail::new(0);
    empty.push( odin_conjunction::geo::Cartographic::from_degrees( 0.0, 0.0, 0.0));
    assert!( empty.is_empty());
}

#[test]
fn test_sgp4_tick () {
    let store = CatalogStore::new( reference_object());
    let mut ticker = TickScheduler::new( Duration::from_millis(2000), 300);
    let update = ticker.tick( &store, &Sgp4Propagator, fixed_now());

    let r = update.reference.expect("ISS not propagated");
    println!("ISS at {:.3},{:.3} alt {:.1}km speed {:.0}km/h", r.sample.latitude_deg, r.sample.longitude_deg, r.sample.altitude_m / 1000.0, r.speed_kmh);
    assert!( r.speed_kmh > 27_000.0 && r.speed_kmh < 28_100.0);
    assert!( r.sample.altitude_m > 350_000.0 && r.sample.altitude_m < 450_000.0);
}
