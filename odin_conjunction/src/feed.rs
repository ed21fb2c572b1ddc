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

//! catalog feed retrieval (CelesTrak GP queries in TLE format)

use std::path::{Path,PathBuf};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug,info,warn};
use crate::{
    ConjunctionConfig,
    errors::{feed_unavailable, OdinConjunctionError, Result},
    loader::split_feed
};

/// a single name/line1/line2 record as returned by object lookups
#[derive(Debug,Clone,PartialEq)]
pub struct ThreeLineRecord {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

/// the first complete record of a feed text, if any
pub fn first_record (text: &str)->Option<ThreeLineRecord> {
    let lines = split_feed( text);
    if lines.len() < 3 {
        None
    } else {
        Some( ThreeLineRecord { name: lines[0].trim().to_string(), line1: lines[1].clone(), line2: lines[2].clone() })
    }
}

/// trimmed lookup input, rejecting blank queries before anything goes out
pub fn validate_query (query: &str)->Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        Err( OdinConjunctionError::InvalidInput("please enter a satellite name or NORAD catalog id".to_string()))
    } else {
        Ok(query)
    }
}

pub fn is_catalog_number (query: &str)->bool {
    !query.is_empty() && query.chars().all( |c| c.is_ascii_digit())
}

/// source of catalog group feeds and single object lookups
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// the complete three-line feed of a catalog group. Empty feeds are `FeedUnavailable` errors
    async fn fetch_group (&self, group: &str) -> Result<String>;

    /// look up a single object by name or catalog number. Not finding anything is `Ok(None)`
    async fn lookup (&self, query: &str) -> Result<Option<ThreeLineRecord>>;
}

/* #region celestrak **********************************************************/

pub struct CelestrakFeedSource {
    client: Client,
    group_url: String,
    name_url: String,
    catnr_url: String,
}

impl CelestrakFeedSource {
    pub fn new (config: &ConjunctionConfig)->Self {
        CelestrakFeedSource {
            client: Client::new(),
            group_url: config.group_url.clone(),
            name_url: config.name_url.clone(),
            catnr_url: config.catnr_url.clone(),
        }
    }

    pub fn group_query_url (&self, group: &str)->String {
        self.group_url.replace( "{group}", &urlencoding::encode(group))
    }

    pub fn lookup_query_url (&self, query: &str)->String {
        if is_catalog_number( query) {
            self.catnr_url.replace( "{catnr}", query)
        } else {
            self.name_url.replace( "{name}", &urlencoding::encode(query))
        }
    }

    async fn get_text (&self, url: &str)->Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await
            .map_err( |e| feed_unavailable!("request {} failed: {}", url, e))?;

        if response.status().is_success() {
            Ok( response.text().await? )
        } else {
            Err( feed_unavailable!("request {} failed with status {}", url, response.status()))
        }
    }
}

#[async_trait]
impl FeedSource for CelestrakFeedSource {
    async fn fetch_group (&self, group: &str) -> Result<String> {
        let text = self.get_text( &self.group_query_url(group)).await?;
        if text.trim().is_empty() {
            Err( feed_unavailable!("empty feed for group '{}'", group))
        } else {
            info!("retrieved feed for group '{}' ({} bytes)", group, text.len());
            Ok(text)
        }
    }

    async fn lookup (&self, query: &str) -> Result<Option<ThreeLineRecord>> {
        let query = validate_query( query)?;
        let text = self.get_text( &self.lookup_query_url(query)).await?;
        Ok( first_record( &text))
    }
}

/* #endregion celestrak */

/* #region files **************************************************************/

/// offline feed source reading `<group>.tle` files from a directory
pub struct FileFeedSource {
    dir: PathBuf,
}

impl FileFeedSource {
    pub fn new (dir: impl AsRef<Path>)->Self {
        FileFeedSource { dir: dir.as_ref().to_path_buf() }
    }

    pub fn group_path (&self, group: &str)->PathBuf {
        self.dir.join( format!("{group}.tle"))
    }

    async fn feed_texts (&self)->Result<Vec<String>> {
        let mut texts = Vec::new();
        let mut entries = tokio::fs::read_dir( &self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and( |ext| ext == "tle") {
                texts.push( tokio::fs::read_to_string( &path).await?);
            }
        }
        Ok(texts)
    }
}

#[async_trait]
impl FeedSource for FileFeedSource {
    async fn fetch_group (&self, group: &str) -> Result<String> {
        let path = self.group_path( group);
        let text = tokio::fs::read_to_string( &path).await
            .map_err( |e| feed_unavailable!("cannot read {:?}: {}", path, e))?;

        if text.trim().is_empty() {
            Err( feed_unavailable!("empty feed file {:?}", path))
        } else {
            Ok(text)
        }
    }

    async fn lookup (&self, query: &str) -> Result<Option<ThreeLineRecord>> {
        let query = validate_query( query)?;
        let by_catnr = is_catalog_number( query);
        let query_upper = query.to_uppercase();

        for text in self.feed_texts().await? {
            let lines = split_feed( &text);
            for rec in lines.chunks_exact(3) {
                let matches = if by_catnr {
                    rec[1].get(2..7).is_some_and( |c| c.trim().parse::<u32>().ok() == query.parse::<u32>().ok())
                } else {
                    rec[0].trim().to_uppercase().contains( &query_upper)
                };
                if matches {
                    return Ok( Some( ThreeLineRecord { name: rec[0].trim().to_string(), line1: rec[1].clone(), line2: rec[2].clone() }))
                }
            }
        }
        Ok(None)
    }
}

/* #endregion files */
