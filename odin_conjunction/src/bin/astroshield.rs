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

use std::sync::Arc;
use anyhow::Result;
use clap::Parser;
use lazy_static::lazy_static;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use odin_conjunction::{
    load_config, ConjunctionConfig,
    engine::{spawn_engine, EngineCmd, EngineEvent, EngineHandle},
    evaluator::CollisionWarning,
    feed::{CelestrakFeedSource, FeedSource, FileFeedSource},
    geocode::{LocationResolver, OpenCageResolver},
    propagator::Sgp4Propagator,
    tick::TickUpdate
};

/// console front end of the collision risk engine
#[derive(Parser,Debug)]
#[command(version, about="orbital collision risk monitor", long_about = None)]
struct CliOpts {
    /// RON config file (built-in defaults if omitted)
    #[arg(short,long)]
    config: Option<String>,

    /// initial catalog group
    #[arg(short,long)]
    group: Option<String>,

    /// read `<group>.tle` feeds from this directory instead of CelesTrak
    #[arg(long)]
    offline: Option<String>,

    /// print reference body status every N ticks (0: never)
    #[arg(long,default_value_t=5)]
    status_ticks: usize,
}

lazy_static! { static ref ARGS: CliOpts = CliOpts::parse(); }

const HELP: &str = "commands: group <name> | more | clear | check | launch <name|catnr> | status | quit";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter( EnvFilter::from_default_env()).init();

    let mut config: ConjunctionConfig = match &ARGS.config {
        Some(path) => load_config( path)?,
        None => ConjunctionConfig::default()
    };
    if let Some(group) = &ARGS.group { config.default_group = group.clone() }

    let feed: Arc<dyn FeedSource> = match &ARGS.offline {
        Some(dir) => Arc::new( FileFeedSource::new( dir)),
        None => Arc::new( CelestrakFeedSource::new( &config))
    };
    let resolver: Option<Arc<dyn LocationResolver>> = config.geocode.clone()
        .filter( |g| !g.api_key.is_empty())
        .map( |g| Arc::new( OpenCageResolver::new(g)) as Arc<dyn LocationResolver>);

    let (handle, events, engine_task) = spawn_engine( config, Sgp4Propagator, feed, resolver)?;

    let printer = tokio::spawn( async move {
        let mut n_ticks = 0;
        while let Ok(event) = events.recv().await {
            if let EngineEvent::Tick(update) = &event {
                n_ticks += 1;
                if ARGS.status_ticks > 0 && n_ticks % ARGS.status_ticks == 0 { print_tick( update) }
            } else {
                print_event( &event);
            }
        }
    });

    println!("{HELP}");
    let mut lines = BufReader::new( tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_cmd( &line) {
            Some(cmd) => {
                let is_shutdown = matches!( cmd, EngineCmd::Shutdown);
                handle.send( cmd).await?;
                if is_shutdown { break }
            }
            None => if !line.trim().is_empty() { println!("{HELP}") }
        }
    }

    drop(handle); // terminates the engine if we got here by EOF
    engine_task.await??;
    printer.await?;
    Ok(())
}

fn parse_cmd (line: &str)->Option<EngineCmd> {
    let line = line.trim();
    let (verb, arg) = line.split_once( char::is_whitespace).map( |(v,a)| (v, a.trim())).unwrap_or( (line, ""));

    match verb {
        "group" if !arg.is_empty() => Some( EngineCmd::SelectGroup( arg.to_string())),
        "more" => Some( EngineCmd::LoadMore),
        "clear" => Some( EngineCmd::ClearAll),
        "check" => Some( EngineCmd::CheckRisks),
        "launch" => Some( EngineCmd::PredictLaunch( arg.to_string())), // the engine rejects blank queries
        "status" => Some( EngineCmd::Status),
        "quit" | "exit" => Some( EngineCmd::Shutdown),
        _ => None
    }
}

fn print_tick (update: &TickUpdate) {
    if let Some(r) = &update.reference {
        println!("{}  lat {:8.3}  lon {:8.3}  alt {:7.1} km  speed {:8.0} km/h  over {}  ({} objects, {} skipped)",
            update.timestamp.format("%H:%M:%S"), r.sample.latitude_deg, r.sample.longitude_deg, r.sample.altitude_m / 1000.0,
            r.speed_kmh, r.location_name, update.samples.len(), update.skipped.len());
    }
}

fn print_warnings (warnings: &[CollisionWarning]) {
    for w in odin_conjunction::evaluator::sorted_by_distance( warnings) {
        let band = w.display_band();
        println!("  [{:8} {:6}] {}", band.label(), band.color(), w);
    }
}

fn print_event (event: &EngineEvent) {
    match event {
        EngineEvent::Counts(c) => println!("objects: {} active, {} debris, {} launch, {} total", c.active, c.debris, c.launch, c.total),
        EngineEvent::FeedLoaded { group, records } => println!("feed '{group}' has {records} records"),
        EngineEvent::PageLoaded { group, page, loaded, has_more } => {
            println!("loaded {loaded} objects from page {page} of '{group}'{}", if *has_more { ", 'more' loads the next page" } else { "" })
        }
        EngineEvent::CollisionWarnings(ws) => {
            if ws.is_empty() { println!("no collision risks") } else {
                println!("{} collision risks detected:", ws.len());
                print_warnings( ws);
            }
        }
        EngineEvent::LaunchWarnings { candidate, warnings } => {
            if candidate.is_empty() { return } // cleared
            if warnings.is_empty() { println!("no launch collision risks found for {candidate}") } else {
                println!("{} launch collision risks detected for {candidate}:", warnings.len());
                print_warnings( warnings);
            }
        }
        EngineEvent::Status(s) => println!("{s:#?}"),
        EngineEvent::Notice(msg) => println!("{msg}"),
        EngineEvent::Failure(msg) => eprintln!("ERROR: {msg}"),
        EngineEvent::Tick(_) => {}
    }
}
