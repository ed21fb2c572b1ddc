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

//! paginated ingestion of three-line element feeds

use serde::{Serialize,Deserialize};
use tracing::{debug,info};
use crate::{
    catalog::{CatalogStore, ObjectCategory, TrackedObject},
    elements::OrbitalElementSet
};

/// the catalog groups we know how to route
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct CatalogGroups {
    pub active: Vec<String>,
    pub debris: Vec<String>,
}

impl Default for CatalogGroups {
    fn default()->Self {
        CatalogGroups {
            active: ["active", "starlink", "weather", "noaa"].iter().map( |s| s.to_string()).collect(),
            debris: ["iridium-33-debris", "cosmos-2251-debris"].iter().map( |s| s.to_string()).collect(),
        }
    }
}

impl CatalogGroups {
    /// the category objects of a feed group are stored as. Unknown groups are display-only
    pub fn route (&self, group: &str)->ObjectCategory {
        if self.active.iter().any( |g| g == group) {
            ObjectCategory::Active
        } else if self.debris.iter().any( |g| g == group) {
            ObjectCategory::Debris
        } else {
            ObjectCategory::Untracked
        }
    }
}

/// what to remove from the store when the selected group changes
#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub enum PurgeScope {
    /// all loader-created objects
    AllLoaded,
    /// debris and display-only objects, previously loaded active objects remain screening targets
    KeepActive,
}

/// the store id of the record at `record_index` (zero based, counted over the whole feed)
pub fn record_id (name: &str, record_index: usize)->String {
    format!("{}_{}", name.trim(), record_index)
}

/// split a feed response into lines. We drop the CR of CRLF line ends
pub fn split_feed (text: &str)->Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        Vec::new()
    } else {
        text.lines().map( |l| l.trim_end_matches('\r').to_string()).collect()
    }
}

/// number of (possibly incomplete) three-line records in a feed
pub fn record_count (lines: &[String])->usize {
    lines.len().div_ceil(3)
}

/// load up to `page_size` new records into the store, starting at record `page_index * page_size`.
/// Incomplete records, records whose id is already in the store and records that can't be parsed
/// are skipped without being counted, i.e. scanning continues past the nominal page end until
/// `page_size` records are loaded or the feed is exhausted. Returns the number of loaded records
pub fn load_page (store: &mut CatalogStore, lines: &[String], category: ObjectCategory, page_index: usize, page_size: usize)->usize {
    let n_records = record_count( lines);
    let mut count = 0;
    let mut rec = page_index.saturating_mul( page_size);

    while rec < n_records && count < page_size {
        let i = rec * 3;
        let name = lines.get(i).map( |s| s.trim()).unwrap_or_default();
        let line1 = lines.get(i+1).map( |s| s.trim()).unwrap_or_default();
        let line2 = lines.get(i+2).map( |s| s.trim()).unwrap_or_default();

        if !name.is_empty() && !line1.is_empty() && !line2.is_empty() {
            let id = record_id( name, rec);
            if !store.contains( &id) {
                match OrbitalElementSet::parse( name, line1, line2) {
                    Ok(elements) => {
                        if store.insert( TrackedObject::new( id, category, elements)) { count += 1 }
                    }
                    Err(e) => debug!("skipping record {} ({}): {}", rec, name, e)
                }
            }
        } else {
            debug!("skipping incomplete record {}", rec);
        }
        rec += 1;
    }

    count
}

/// the stateful loader for the currently selected catalog group
#[derive(Debug,Clone)]
pub struct IncrementalLoader {
    groups: CatalogGroups,
    purge_scope: PurgeScope,
    page_size: usize,

    group: String,
    category: ObjectCategory,
    lines: Vec<String>,
    page_index: usize,
}

impl IncrementalLoader {
    pub fn new (groups: CatalogGroups, purge_scope: PurgeScope, page_size: usize, group: &str)->Self {
        let category = groups.route( group);
        IncrementalLoader { groups, purge_scope, page_size, group: group.to_string(), category, lines: Vec::new(), page_index: 0 }
    }

    /// switch to a new group. This drops the current feed and purges loaded objects from the store
    pub fn select_group (&mut self, group: &str, store: &mut CatalogStore) {
        let n_purged = store.purge_loaded( self.purge_scope);
        info!("selected group '{}', purged {} objects", group, n_purged);

        self.group = group.to_string();
        self.category = self.groups.route( group);
        self.lines.clear();
        self.page_index = 0;
    }

    /// set the feed text of the current group, returning the number of records in it
    pub fn set_feed (&mut self, text: &str)->usize {
        self.lines = split_feed( text);
        self.page_index = 0;
        record_count( &self.lines)
    }

    pub fn load_next_page (&mut self, store: &mut CatalogStore)->usize {
        let n = load_page( store, &self.lines, self.category, self.page_index, self.page_size);
        self.page_index += 1;
        debug!("loaded {} '{}' records from page {}", n, self.group, self.page_index - 1);
        n
    }

    pub fn reset (&mut self) {
        self.lines.clear();
        self.page_index = 0;
    }

    pub fn has_more (&self)->bool {
        self.page_index.saturating_mul( self.page_size) < record_count( &self.lines)
    }

    pub fn group (&self)->&str { &self.group }
    pub fn category (&self)->ObjectCategory { self.category }
    pub fn page_index (&self)->usize { self.page_index }
    pub fn page_size (&self)->usize { self.page_size }
    pub fn record_count (&self)->usize { record_count( &self.lines) }
    pub fn groups (&self)->&CatalogGroups { &self.groups }
}
