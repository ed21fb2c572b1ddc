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

//! the engine task that owns the catalog.
//!
//! All catalog state (store, loader, ticker and the last warning lists) is owned by a single tokio
//! task, which processes [`EngineCmd`]s from the UI layer, its own update interval and the results
//! of the background operations it spawned (feed retrieval, lookups, evaluations). Each of those is
//! handled to completion before the next one, so ticks always see a consistent store. State changes
//! are published as [`EngineEvent`]s

use std::{sync::Arc, time::Duration};
use chrono::{DateTime,Utc};
use kanal::{AsyncReceiver, AsyncSender};
use serde::Serialize;
use tokio::{task::JoinHandle, time::{interval, MissedTickBehavior}};
use tracing::{debug,info,warn};
use crate::{
    ConjunctionConfig, time_delta,
    catalog::{CatalogCounts, CatalogStore, ObjectCategory, ObjectSnapshot, TrackedObject},
    elements::OrbitalElementSet,
    errors::{op_failed, OdinConjunctionError, Result},
    evaluator::{CollisionWarning, LaunchCandidate},
    feed::{validate_query, FeedSource, ThreeLineRecord},
    geocode::{resolve_or_unknown, LocationResolver, UNKNOWN_LOCATION},
    loader::IncrementalLoader,
    propagator::Propagator,
    tick::{TickScheduler, TickUpdate},
    worker::{EvalKind, EvalResponse, EvaluatorWorker}
};

pub const NOT_LOADED_MSG: &str = "Load debris and active satellites first.";
pub const NOT_FOUND_MSG: &str = "No TLE found for this object.";

const CMD_QUEUE_LEN: usize = 64;
const EVENT_QUEUE_LEN: usize = 256;
const DEFAULT_LOCATION_INTERVAL: Duration = Duration::from_secs(10);

/// requests from the UI layer
#[derive(Debug,Clone)]
pub enum EngineCmd {
    SelectGroup(String),
    LoadMore,
    ClearAll,
    CheckRisks,
    PredictLaunch(String),
    Status,
    Shutdown,
}

#[derive(Debug,Clone,Serialize)]
pub struct EngineStatus {
    pub group: String,
    pub category: ObjectCategory,
    pub page_index: usize,
    pub records: usize,
    pub has_more: bool,
    pub counts: CatalogCounts,
    pub location_name: String,
    pub collisions: usize,
    pub launch_collisions: usize,
}

/// what the engine reports to the UI layer
#[derive(Debug,Clone)]
pub enum EngineEvent {
    Tick(TickUpdate),
    Counts(CatalogCounts),
    FeedLoaded { group: String, records: usize },
    PageLoaded { group: String, page: usize, loaded: usize, has_more: bool },
    CollisionWarnings(Vec<CollisionWarning>),
    LaunchWarnings { candidate: String, warnings: Vec<CollisionWarning> },
    Status(EngineStatus),
    /// something the user should know about (e.g. "not found"), not an error of the engine
    Notice(String),
    Failure(String),
}

/// results of spawned background operations
enum Completion {
    Feed { generation: u64, group: String, result: Result<String> },
    Lookup { query: String, result: Result<Option<ThreeLineRecord>> },
    Evaluated { launch: Option<String>, result: Result<EvalResponse> },
    Location(String),
}

#[derive(Clone)]
pub struct EngineHandle {
    tx: AsyncSender<EngineCmd>,
}

impl EngineHandle {
    pub async fn send (&self, cmd: EngineCmd)->Result<()> {
        self.tx.send( cmd).await.map_err( |_| op_failed!("engine terminated"))
    }

    pub fn is_closed (&self)->bool {
        self.tx.is_closed()
    }
}

pub struct Engine<P> where P: Propagator + Clone + 'static {
    config: ConjunctionConfig,
    store: CatalogStore,
    loader: IncrementalLoader,
    ticker: TickScheduler,
    propagator: P,
    feed: Arc<dyn FeedSource>,
    resolver: Option<Arc<dyn LocationResolver>>,
    worker: EvaluatorWorker,

    feed_generation: u64,
    location_name: String,
    last_location_lookup: Option<DateTime<Utc>>,
    location_pending: bool,

    collisions: Vec<CollisionWarning>,
    launch_warnings: Vec<CollisionWarning>,

    events: AsyncSender<EngineEvent>,
    completion_tx: AsyncSender<Completion>,
    completion_rx: AsyncReceiver<Completion>,
}

/// create an engine and run it in its own task. This has to be called from within a tokio runtime
pub fn spawn_engine<P> (config: ConjunctionConfig, propagator: P, feed: Arc<dyn FeedSource>, resolver: Option<Arc<dyn LocationResolver>>)
    -> Result<(EngineHandle, AsyncReceiver<EngineEvent>, JoinHandle<Result<()>>)>
    where P: Propagator + Clone + 'static
{
    let (cmd_tx, cmd_rx) = kanal::bounded_async( CMD_QUEUE_LEN);
    let (event_tx, event_rx) = kanal::bounded_async( EVENT_QUEUE_LEN);

    let engine = Engine::new( config, propagator, feed, resolver, event_tx)?;
    let task = tokio::spawn( engine.run( cmd_rx));

    Ok( (EngineHandle { tx: cmd_tx }, event_rx, task) )
}

impl<P> Engine<P> where P: Propagator + Clone + 'static {

    pub fn new (config: ConjunctionConfig, propagator: P, feed: Arc<dyn FeedSource>, resolver: Option<Arc<dyn LocationResolver>>,
                events: AsyncSender<EngineEvent>)->Result<Self>
    {
        let rc = &config.reference;
        let elements = OrbitalElementSet::parse( &rc.name, &rc.line1, &rc.line2)?;
        let store = CatalogStore::new( TrackedObject::new( &rc.id, ObjectCategory::Reference, elements));

        let loader = IncrementalLoader::new( config.groups.clone(), config.group_change_purge, config.page_size, &config.default_group);
        let ticker = TickScheduler::new( config.update_interval, config.trail_capacity);
        let worker = EvaluatorWorker::spawn( propagator.clone())?;
        let (completion_tx, completion_rx) = kanal::unbounded_async();

        Ok( Engine {
            config, store, loader, ticker, propagator, feed, resolver, worker,
            feed_generation: 0,
            location_name: UNKNOWN_LOCATION.to_string(),
            last_location_lookup: None,
            location_pending: false,
            collisions: Vec::new(),
            launch_warnings: Vec::new(),
            events, completion_tx, completion_rx
        })
    }

    pub fn store (&self)->&CatalogStore { &self.store }
    pub fn loader (&self)->&IncrementalLoader { &self.loader }
    pub fn ticker (&self)->&TickScheduler { &self.ticker }
    pub fn collisions (&self)->&[CollisionWarning] { &self.collisions }
    pub fn launch_warnings (&self)->&[CollisionWarning] { &self.launch_warnings }

    /// the engine loop. Terminates on `EngineCmd::Shutdown` or when all handles are dropped
    pub async fn run (mut self, cmds: AsyncReceiver<EngineCmd>)->Result<()> {
        let group = self.config.default_group.clone();
        self.select_group( &group).await;

        let completions = self.completion_rx.clone();
        let mut timer = interval( self.ticker.period());
        timer.set_missed_tick_behavior( MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.on_tick( Utc::now()).await;
                }
                cmd = cmds.recv() => match cmd {
                    Ok(EngineCmd::Shutdown) | Err(_) => break,
                    Ok(cmd) => self.handle_cmd( cmd).await,
                },
                completion = completions.recv() => {
                    if let Ok(completion) = completion { self.handle_completion( completion).await }
                }
            }
        }

        info!("engine terminating");
        self.worker.shutdown().await
    }

    /* #region commands *******************************************************/

    pub async fn handle_cmd (&mut self, cmd: EngineCmd) {
        debug!("engine command {:?}", cmd);
        match cmd {
            EngineCmd::SelectGroup(group) => self.select_group( &group).await,
            EngineCmd::LoadMore => self.load_more().await,
            EngineCmd::ClearAll => self.clear_all().await,
            EngineCmd::CheckRisks => self.check_risks( Utc::now()).await,
            EngineCmd::PredictLaunch(query) => self.predict_launch( &query).await,
            EngineCmd::Status => self.emit( EngineEvent::Status( self.status())).await,
            EngineCmd::Shutdown => {} // handled by run loop
        }
    }

    async fn select_group (&mut self, group: &str) {
        self.loader.select_group( group, &mut self.store);
        self.feed_generation += 1;
        self.emit( EngineEvent::Counts( self.store.counts())).await;

        let generation = self.feed_generation;
        let group = group.to_string();
        let feed = self.feed.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn( async move {
            let result = feed.fetch_group( &group).await;
            let _ = tx.send( Completion::Feed { generation, group, result }).await;
        });
    }

    async fn load_more (&mut self) {
        if self.loader.record_count() == 0 {
            self.emit( EngineEvent::Notice( format!("no feed loaded for group '{}'", self.loader.group()))).await;
        } else if !self.loader.has_more() {
            self.emit( EngineEvent::Notice( format!("all records of group '{}' loaded", self.loader.group()))).await;
        } else {
            self.load_next_page().await;
        }
    }

    async fn load_next_page (&mut self) {
        let page = self.loader.page_index();
        let loaded = self.loader.load_next_page( &mut self.store);
        let group = self.loader.group().to_string();
        let has_more = self.loader.has_more();

        self.emit( EngineEvent::PageLoaded { group, page, loaded, has_more }).await;
        self.emit( EngineEvent::Counts( self.store.counts())).await;
    }

    async fn clear_all (&mut self) {
        self.store.reset();
        self.loader.reset();
        self.feed_generation += 1; // drop feeds that are still in flight
        self.collisions.clear();
        self.launch_warnings.clear();

        self.emit( EngineEvent::CollisionWarnings( Vec::new())).await;
        self.emit( EngineEvent::LaunchWarnings { candidate: String::new(), warnings: Vec::new() }).await;
        self.emit( EngineEvent::Counts( self.store.counts())).await;
    }

    async fn check_risks (&mut self, now: DateTime<Utc>) {
        let debris = self.store.snapshot_elements( ObjectCategory::Debris);
        let mut targets = self.store.snapshot_elements( ObjectCategory::Reference);
        targets.extend( self.store.snapshot_elements( ObjectCategory::Active));

        if debris.is_empty() || targets.is_empty() {
            self.emit( EngineEvent::Notice( NOT_LOADED_MSG.to_string())).await;
        } else {
            info!("screening {} debris against {} targets", debris.len(), targets.len());
            self.submit( EvalKind::Pairwise { debris, targets }, None, now);
        }
    }

    async fn predict_launch (&mut self, query: &str) {
        let query = match validate_query( query) {
            Ok(query) => query.to_string(),
            Err(e) => {
                self.emit( EngineEvent::Notice( e.to_string())).await;
                return
            }
        };

        if self.store.remove_candidate().is_some() {
            self.emit( EngineEvent::Counts( self.store.counts())).await;
        }

        let feed = self.feed.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn( async move {
            let result = feed.lookup( &query).await;
            let _ = tx.send( Completion::Lookup { query, result }).await;
        });
    }

    fn submit (&self, kind: EvalKind, launch: Option<String>, now: DateTime<Utc>) {
        let handle = self.worker.handle();
        let tx = self.completion_tx.clone();
        let threshold_km = self.config.threshold_km;
        let horizon = self.config.horizon;

        tokio::spawn( async move {
            let result = handle.submit( kind, threshold_km, horizon, now).await;
            let _ = tx.send( Completion::Evaluated { launch, result }).await;
        });
    }

    pub fn status (&self)->EngineStatus {
        EngineStatus {
            group: self.loader.group().to_string(),
            category: self.loader.category(),
            page_index: self.loader.page_index(),
            records: self.loader.record_count(),
            has_more: self.loader.has_more(),
            counts: self.store.counts(),
            location_name: self.location_name.clone(),
            collisions: self.collisions.len(),
            launch_collisions: self.launch_warnings.len(),
        }
    }

    /* #endregion commands */

    /* #region completions ****************************************************/

    async fn handle_completion (&mut self, completion: Completion) {
        match completion {
            Completion::Feed { generation, group, result } => self.on_feed( generation, group, result).await,
            Completion::Lookup { query, result } => self.on_lookup( query, result).await,
            Completion::Evaluated { launch, result } => self.on_evaluated( launch, result).await,
            Completion::Location(name) => {
                self.location_pending = false;
                self.location_name = name;
            }
        }
    }

    async fn on_feed (&mut self, generation: u64, group: String, result: Result<String>) {
        if generation != self.feed_generation {
            debug!("dropping outdated feed for group '{}'", group);
            return
        }

        match result {
            Ok(text) => {
                let records = self.loader.set_feed( &text);
                info!("feed for group '{}' has {} records", group, records);
                self.emit( EngineEvent::FeedLoaded { group, records }).await;
                self.load_next_page().await;
            }
            Err(e) => {
                warn!("no data loaded for group '{}': {}", group, e);
                self.emit( EngineEvent::Failure( format!("no data loaded for group '{group}': {e}"))).await;
            }
        }
    }

    async fn on_lookup (&mut self, query: String, result: Result<Option<ThreeLineRecord>>) {
        match result {
            Ok(Some(rec)) => {
                let fallback_alt = self.config.fallback_launch_altitude_km;
                let candidate = match OrbitalElementSet::parse( &rec.name, &rec.line1, &rec.line2) {
                    Ok(elements) => {
                        self.store.replace_candidate( elements.clone());
                        self.emit( EngineEvent::Counts( self.store.counts())).await;
                        LaunchCandidate::from_elements( elements, fallback_alt)
                    }
                    Err(e) => {
                        warn!("invalid elements for '{}', assuming {} km fallback orbit: {}", rec.name, fallback_alt, e);
                        LaunchCandidate::without_elements( &rec.name, fallback_alt)
                    }
                };

                let name = candidate.name.clone();
                let debris = self.store.snapshot_elements( ObjectCategory::Debris);
                self.submit( EvalKind::Launch { debris, candidate }, Some(name), Utc::now());
            }
            Ok(None) => {
                info!("no TLE found for '{}'", query);
                self.emit( EngineEvent::Notice( NOT_FOUND_MSG.to_string())).await;
            }
            Err(e) => {
                warn!("lookup of '{}' failed: {}", query, e);
                self.emit( EngineEvent::Failure( format!("lookup of '{query}' failed: {e}"))).await;
            }
        }
    }

    async fn on_evaluated (&mut self, launch: Option<String>, result: Result<EvalResponse>) {
        match result {
            Ok(response) => match launch {
                None => {
                    self.collisions = response.collisions;
                    self.launch_warnings.clear();
                    self.emit( EngineEvent::CollisionWarnings( self.collisions.clone())).await;
                }
                Some(candidate) => {
                    self.launch_warnings = response.launch_collisions;
                    self.collisions.clear();
                    self.emit( EngineEvent::LaunchWarnings { candidate, warnings: self.launch_warnings.clone() }).await;
                }
            }
            Err(e) => {
                warn!("evaluation failed: {}", e);
                self.emit( EngineEvent::Failure( format!("evaluation failed: {e}"))).await;
            }
        }
    }

    /* #endregion completions */

    /* #region ticks **********************************************************/

    pub async fn on_tick (&mut self, now: DateTime<Utc>) {
        let mut update = self.ticker.tick( &self.store, &self.propagator, now);

        if let Some(reference) = &mut update.reference {
            reference.location_name = self.location_name.clone();
            let (lat, lon) = (reference.sample.latitude_deg, reference.sample.longitude_deg);
            self.update_location( lat, lon, now);
        }

        // position updates are superseded by the next tick, no need to wait for slow consumers
        match self.events.try_send( EngineEvent::Tick(update)) {
            Ok(true) => {}
            Ok(false) => debug!("event queue full, dropping tick"),
            Err(_) => debug!("no event receiver"),
        }
    }

    fn update_location (&mut self, latitude_deg: f64, longitude_deg: f64, now: DateTime<Utc>) {
        let Some(resolver) = self.resolver.clone() else { return };
        if self.location_pending { return }

        let lookup_interval = self.config.geocode.as_ref().map( |g| g.interval).unwrap_or( DEFAULT_LOCATION_INTERVAL);
        let min_interval = time_delta( lookup_interval);
        if self.last_location_lookup.is_some_and( |last| now - last < min_interval) { return }

        self.location_pending = true;
        self.last_location_lookup = Some(now);

        let tx = self.completion_tx.clone();
        tokio::spawn( async move {
            let name = resolve_or_unknown( Some( resolver.as_ref()), latitude_deg, longitude_deg).await;
            let _ = tx.send( Completion::Location(name)).await;
        });
    }

    /* #endregion ticks */

    async fn emit (&self, event: EngineEvent) {
        if self.events.send( event).await.is_err() {
            debug!("no event receiver");
        }
    }
}
