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

use odin_conjunction::{
    catalog::{CatalogCounts, CatalogStore, ObjectCategory, TrackedObject},
    loader::PurgeScope,
    LAUNCH_CANDIDATE_ID
};
use common::*;

fn populated_store ()->CatalogStore {
    let mut store = CatalogStore::new( reference_object());
    assert!( store.insert( TrackedObject::new( "A1_0", ObjectCategory::Active, elements("A1"))));
    assert!( store.insert( TrackedObject::new( "A2_1", ObjectCategory::Active, elements("A2"))));
    assert!( store.insert( TrackedObject::new( "D1_0", ObjectCategory::Debris, elements("D1"))));
    assert!( store.insert( TrackedObject::new( "GPS_0", ObjectCategory::Untracked, elements("GPS"))));
    store
}

#[test]
fn test_insert () {
    let mut store = populated_store();
    assert_eq!( store.len(), 5);

    // no overwrites, no second reference or candidate through insert
    assert!( !store.insert( TrackedObject::new( "A1_0", ObjectCategory::Debris, elements("X"))));
    assert!( !store.insert( TrackedObject::new( "R2", ObjectCategory::Reference, elements("R2"))));
    assert!( !store.insert( TrackedObject::new( "L", ObjectCategory::LaunchCandidate, elements("L"))));
    assert!( !store.insert( TrackedObject::new( LAUNCH_CANDIDATE_ID, ObjectCategory::Active, elements("L"))));
    assert_eq!( store.len(), 5);
    assert_eq!( store.get("A1_0").unwrap().category, ObjectCategory::Active);

    let ids: Vec<String> = store.snapshot_by_category( ObjectCategory::Active).into_iter().map( |o| o.id).collect();
    assert_eq!( ids, vec!["A1_0", "A2_1"]);

    let all: Vec<&str> = store.iter().map( |o| o.id.as_str()).collect();
    println!("{:?}", all);
    assert_eq!( all, vec![ISS_ID, "A1_0", "A2_1", "D1_0", "GPS_0"]);
}

#[test]
fn test_candidate_replacement () {
    let mut store = populated_store();

    let c = store.replace_candidate( elements("FALCON"));
    assert_eq!( c.id, LAUNCH_CANDIDATE_ID);
    assert_eq!( c.name, "FALCON");

    store.replace_candidate( elements("ATLAS"));
    assert_eq!( store.snapshot_by_category( ObjectCategory::LaunchCandidate).len(), 1);
    assert_eq!( store.candidate().unwrap().name, "ATLAS");
    assert_eq!( store.counts(), CatalogCounts { active: 2, debris: 1, launch: 1, total: 5 });

    assert_eq!( store.remove_candidate().unwrap().name, "ATLAS");
    assert!( store.candidate().is_none());
    assert!( store.remove_candidate().is_none());
}

#[test]
fn test_reset () {
    let mut store = populated_store();
    store.replace_candidate( elements("FALCON"));
    store.reset();

    assert_eq!( store.len(), 1);
    let r = store.reference();
    assert_eq!( r.id, ISS_ID);
    assert_eq!( r.category, ObjectCategory::Reference);
    assert_eq!( r.elements.line1(), ISS_LINE1);
    assert_eq!( r.elements.line2(), ISS_LINE2);
    assert_eq!( store.counts(), CatalogCounts { active: 0, debris: 0, launch: 0, total: 1 });
}

#[test]
fn test_purge () {
    let mut store = populated_store();
    store.replace_candidate( elements("FALCON"));

    assert_eq!( store.purge_loaded( PurgeScope::KeepActive), 2);
    assert!( store.contains("A1_0"));
    assert!( !store.contains("D1_0"));
    assert!( !store.contains("GPS_0"));

    assert_eq!( store.purge_loaded( PurgeScope::AllLoaded), 2);
    assert_eq!( store.len(), 2); // reference and candidate survive
    assert!( store.candidate().is_some());
}

#[test]
fn test_snapshots_are_values () {
    let mut store = populated_store();
    let snap = store.snapshot_elements( ObjectCategory::Debris);
    store.reset();

    assert_eq!( snap.len(), 1);
    assert_eq!( snap[0].id, "D1_0");
    assert_eq!( snap[0].elements.name(), "D1");
}
