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

//! the catalog of tracked objects

use std::{collections::HashMap, fmt};
use serde::{Serialize,Deserialize};
use crate::{elements::OrbitalElementSet, loader::PurgeScope, LAUNCH_CANDIDATE_ID};

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
pub enum ObjectCategory {
    /// the single baseline body (e.g. the ISS)
    Reference,
    /// screening targets
    Active,
    /// screening sources
    Debris,
    /// hypothetical launch
    LaunchCandidate,
    /// loaded for display only, never screened
    Untracked,
}

impl fmt::Display for ObjectCategory {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectCategory::Reference => "reference",
            ObjectCategory::Active => "active",
            ObjectCategory::Debris => "debris",
            ObjectCategory::LaunchCandidate => "launch",
            ObjectCategory::Untracked => "untracked",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug,Clone)]
pub struct TrackedObject {
    pub id: String,
    pub name: String,
    pub category: ObjectCategory,
    pub elements: OrbitalElementSet,
}

impl TrackedObject {
    pub fn new (id: impl ToString, category: ObjectCategory, elements: OrbitalElementSet)->Self {
        TrackedObject { id: id.to_string(), name: elements.name().to_string(), category, elements }
    }

    pub fn snapshot (&self)->ObjectSnapshot {
        ObjectSnapshot { id: self.id.clone(), elements: self.elements.clone() }
    }
}

/// the value snapshot of an object that is handed to the evaluator
#[derive(Debug,Clone)]
pub struct ObjectSnapshot {
    pub id: String,
    pub elements: OrbitalElementSet,
}

#[derive(Debug,Clone,Copy,Default,PartialEq,Eq,Serialize,Deserialize)]
pub struct CatalogCounts {
    pub active: usize,
    pub debris: usize,
    pub launch: usize,
    pub total: usize, // including the reference
}

/// id -> TrackedObject map with insertion ordered category partitions.
///
/// The store always contains exactly one `Reference` object and at most one `LaunchCandidate`,
/// both of which can only be set through dedicated methods
#[derive(Debug,Clone)]
pub struct CatalogStore {
    reference: TrackedObject, // as it was at construction, used to restore on reset
    objects: HashMap<String,TrackedObject>,
    active: Vec<String>,
    debris: Vec<String>,
    untracked: Vec<String>,
    candidate: Option<String>,
}

impl CatalogStore {
    pub fn new (reference: TrackedObject)->Self {
        let mut reference = reference;
        reference.category = ObjectCategory::Reference;

        let mut objects = HashMap::new();
        objects.insert( reference.id.clone(), reference.clone());

        CatalogStore { reference, objects, active: Vec::new(), debris: Vec::new(), untracked: Vec::new(), candidate: None }
    }

    /// add a loaded object. This never overwrites, and it rejects categories with invariants
    /// (there is only one reference and one launch candidate)
    pub fn insert (&mut self, obj: TrackedObject)->bool {
        if self.objects.contains_key( &obj.id) || obj.id == LAUNCH_CANDIDATE_ID {
            return false
        }

        match obj.category {
            ObjectCategory::Active => self.active.push( obj.id.clone()),
            ObjectCategory::Debris => self.debris.push( obj.id.clone()),
            ObjectCategory::Untracked => self.untracked.push( obj.id.clone()),
            ObjectCategory::Reference | ObjectCategory::LaunchCandidate => return false
        }
        self.objects.insert( obj.id.clone(), obj);
        true
    }

    /// replace any existing launch candidate, returning the new one
    pub fn replace_candidate (&mut self, elements: OrbitalElementSet)->&TrackedObject {
        self.remove_candidate();

        let id = LAUNCH_CANDIDATE_ID.to_string();
        self.candidate = Some( id.clone());
        self.objects.entry( id.clone())
            .insert_entry( TrackedObject::new( id, ObjectCategory::LaunchCandidate, elements))
            .into_mut()
    }

    pub fn remove_candidate (&mut self)->Option<TrackedObject> {
        self.candidate.take().and_then( |id| self.objects.remove( &id))
    }

    /// remove everything but the reference object, which is restored to its initial state
    pub fn reset (&mut self) {
        self.objects.clear();
        self.objects.insert( self.reference.id.clone(), self.reference.clone());
        self.active.clear();
        self.debris.clear();
        self.untracked.clear();
        self.candidate = None;
    }

    /// remove loader-created objects, returning the number of removed objects
    pub fn purge_loaded (&mut self, scope: PurgeScope)->usize {
        let mut removed = Self::purge_ids( &mut self.objects, &mut self.debris)
            + Self::purge_ids( &mut self.objects, &mut self.untracked);
        if scope == PurgeScope::AllLoaded {
            removed += Self::purge_ids( &mut self.objects, &mut self.active);
        }
        removed
    }

    fn purge_ids (objects: &mut HashMap<String,TrackedObject>, ids: &mut Vec<String>)->usize {
        let n = ids.len();
        for id in ids.drain(..) {
            objects.remove( &id);
        }
        n
    }

    fn ids (&self, category: ObjectCategory)->Vec<&String> {
        match category {
            ObjectCategory::Reference => vec![ &self.reference.id ],
            ObjectCategory::Active => self.active.iter().collect(),
            ObjectCategory::Debris => self.debris.iter().collect(),
            ObjectCategory::Untracked => self.untracked.iter().collect(),
            ObjectCategory::LaunchCandidate => self.candidate.iter().collect(),
        }
    }

    /// all objects of the given category in insertion order
    pub fn snapshot_by_category (&self, category: ObjectCategory)->Vec<TrackedObject> {
        self.ids( category).into_iter().filter_map( |id| self.objects.get(id)).cloned().collect()
    }

    /// `{id,elements}` value snapshots of the given category in insertion order
    pub fn snapshot_elements (&self, category: ObjectCategory)->Vec<ObjectSnapshot> {
        self.ids( category).into_iter().filter_map( |id| self.objects.get(id)).map( |o| o.snapshot()).collect()
    }

    pub fn contains (&self, id: &str)->bool {
        self.objects.contains_key( id)
    }

    pub fn get (&self, id: &str)->Option<&TrackedObject> {
        self.objects.get( id)
    }

    pub fn len (&self)->usize {
        self.objects.len()
    }

    pub fn reference (&self)->&TrackedObject {
        // the reference can't be removed, fall back to the initial one just in case
        self.objects.get( &self.reference.id).unwrap_or( &self.reference)
    }

    pub fn candidate (&self)->Option<&TrackedObject> {
        self.candidate.as_ref().and_then( |id| self.objects.get(id))
    }

    /// iterate over all objects, reference first, then active, debris, untracked and the candidate
    pub fn iter (&self)->impl Iterator<Item=&TrackedObject> {
        std::iter::once( &self.reference.id)
            .chain( self.active.iter())
            .chain( self.debris.iter())
            .chain( self.untracked.iter())
            .chain( self.candidate.iter())
            .filter_map( |id| self.objects.get(id))
    }

    pub fn counts (&self)->CatalogCounts {
        let active = self.active.len();
        let debris = self.debris.len();
        let launch = if self.candidate.is_some() { 1 } else { 0 };
        CatalogCounts { active, debris, launch, total: active + debris + launch + 1 }
    }
}
