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

use std::{sync::Arc, time::Duration};
use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use lazy_static::lazy_static;
use tracing_subscriber::EnvFilter;
use odin_conjunction::{
    load_config, ConjunctionConfig,
    catalog::{CatalogStore, ObjectCategory, TrackedObject},
    elements::OrbitalElementSet,
    evaluator::sorted_by_distance,
    feed::{CelestrakFeedSource, FeedSource, FileFeedSource},
    loader::{load_page, record_count, split_feed},
    propagator::Sgp4Propagator,
    worker::{EvalKind, EvaluatorWorker}
};

/// one-shot screening of a debris group against an active group
#[derive(Parser,Debug)]
#[command(version, about="screen a debris catalog group against an active catalog group", long_about = None)]
struct CliOpts {
    /// RON config file (built-in defaults if omitted)
    #[arg(short,long)]
    config: Option<String>,

    /// read `<group>.tle` feeds from this directory instead of CelesTrak
    #[arg(long)]
    offline: Option<String>,

    /// number of pages to load from each group
    #[arg(short,long,default_value_t=1)]
    pages: usize,

    /// override the configured threshold distance in km
    #[arg(short,long)]
    threshold: Option<f64>,

    /// override the configured prediction horizon in minutes
    #[arg(long)]
    horizon_minutes: Option<u64>,

    /// debris group
    debris_group: String,

    /// active group
    active_group: String,
}

lazy_static! { static ref ARGS: CliOpts = CliOpts::parse(); }

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter( EnvFilter::from_default_env()).init();

    let mut config: ConjunctionConfig = match &ARGS.config {
        Some(path) => load_config( path)?,
        None => ConjunctionConfig::default()
    };
    if let Some(threshold) = ARGS.threshold { config.threshold_km = threshold }
    if let Some(minutes) = ARGS.horizon_minutes { config.horizon = Duration::from_secs( minutes * 60) }

    let feed: Arc<dyn FeedSource> = match &ARGS.offline {
        Some(dir) => Arc::new( FileFeedSource::new( dir)),
        None => Arc::new( CelestrakFeedSource::new( &config))
    };

    let rc = &config.reference;
    let reference = OrbitalElementSet::parse( &rc.name, &rc.line1, &rc.line2)?;
    let mut store = CatalogStore::new( TrackedObject::new( &rc.id, ObjectCategory::Reference, reference));

    let (debris_text, active_text) = futures::try_join!(
        feed.fetch_group( &ARGS.debris_group),
        feed.fetch_group( &ARGS.active_group)
    )?;

    for (group, text, category) in [(&ARGS.debris_group, debris_text, ObjectCategory::Debris), (&ARGS.active_group, active_text, ObjectCategory::Active)] {
        let lines = split_feed( &text);
        let n: usize = (0..ARGS.pages).map( |page| load_page( &mut store, &lines, category, page, config.page_size)).sum();
        println!("loaded {} of {} records from '{}' as {}", n, record_count( &lines), group, category);
    }

    let debris = store.snapshot_elements( ObjectCategory::Debris);
    let mut targets = store.snapshot_elements( ObjectCategory::Reference);
    targets.extend( store.snapshot_elements( ObjectCategory::Active));

    let worker = EvaluatorWorker::spawn( Sgp4Propagator)?;
    let now = Utc::now();
    print!("screening {} debris against {} targets at {} + {} min.. ", debris.len(), targets.len(), now.format("%Y-%m-%dT%H:%M:%SZ"), config.horizon.as_secs() / 60);
    let response = worker.submit( EvalKind::Pairwise { debris, targets }, config.threshold_km, config.horizon, now).await?;
    worker.shutdown().await?;

    println!("{} warnings within {} km", response.collisions.len(), config.threshold_km);
    for w in sorted_by_distance( &response.collisions) {
        let band = w.display_band();
        println!("  [{:8}] {}", band.label(), w);
    }

    Ok(())
}
