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

use std::{sync::Arc, time::Duration};
use kanal::AsyncReceiver;
use odin_conjunction::{
    ConjunctionConfig,
    engine::{spawn_engine, EngineCmd, EngineEvent, NOT_FOUND_MSG, NOT_LOADED_MSG},
    evaluator::RiskLevel,
    errors::OdinConjunctionError,
    feed::FeedSource,
    loader::PurgeScope
};
use common::*;

async fn next_event<F> (events: &AsyncReceiver<EngineEvent>, mut pred: F)->EngineEvent where F: FnMut(&EngineEvent)->bool {
    tokio::time::timeout( Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred( &event) { return event }
        }
    }).await.expect("timeout waiting for event")
}

/// all events received within `dur`
async fn events_within (events: &AsyncReceiver<EngineEvent>, dur: Duration)->Vec<EngineEvent> {
    let deadline = tokio::time::Instant::now() + dur;
    let mut list = Vec::new();
    while let Ok(Ok(event)) = tokio::time::timeout_at( deadline, events.recv()).await {
        list.push( event);
    }
    list
}

fn is_feed_of (event: &EngineEvent, group_name: &str)->bool {
    match event {
        EngineEvent::FeedLoaded { group, .. } | EngineEvent::PageLoaded { group, .. } => group == group_name,
        _ => false
    }
}

fn test_config ()->ConjunctionConfig {
    ConjunctionConfig {
        update_interval: Duration::from_millis(100),
        default_group: "starlink".to_string(),
        group_change_purge: PurgeScope::KeepActive,
        ..ConjunctionConfig::default()
    }
}

fn test_feed ()->Arc<MapFeedSource> {
    Arc::new( MapFeedSource::new(
        &[ ("starlink", three_line_feed( &["A1", "A2"])),
           ("cosmos-2251-debris", three_line_feed( &["D1", "D2"])) ],
        &[ three_line_record("A1").as_str(), format!("BROKEN\n{}\n{}\n", ISS_LINE1, corrupted_line2()).as_str() ]
    ))
}

#[tokio::test]
async fn test_engine_session () {
    let (handle, events, task) = spawn_engine( test_config(), scenario_propagator(), test_feed(), None).unwrap();

    // the default group is loaded on start
    let ev = next_event( &events, |e| matches!( e, EngineEvent::PageLoaded{..})).await;
    if let EngineEvent::PageLoaded { group, loaded, has_more, .. } = ev {
        assert_eq!( group, "starlink");
        assert_eq!( loaded, 2);
        assert!( !has_more);
    }

    // screening without debris is rejected
    handle.send( EngineCmd::CheckRisks).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::Notice(_))).await;
    assert!( matches!( ev, EngineEvent::Notice(msg) if msg == NOT_LOADED_MSG));

    handle.send( EngineCmd::SelectGroup( "cosmos-2251-debris".to_string())).await.unwrap();
    next_event( &events, |e| matches!( e, EngineEvent::PageLoaded{..})).await;

    handle.send( EngineCmd::CheckRisks).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::CollisionWarnings(_))).await;
    if let EngineEvent::CollisionWarnings(warnings) = ev {
        for w in &warnings { println!("{}", w) }
        assert_eq!( warnings.len(), 2);
        assert_eq!( warnings[1].risk_level, RiskLevel::Moderate);
    }

    // the reference body is ticked
    let ev = next_event( &events, |e| matches!( e, EngineEvent::Tick(_))).await;
    if let EngineEvent::Tick(update) = ev {
        assert!( update.reference.is_some());
        assert_eq!( update.samples.len(), 5);
    }

    handle.send( EngineCmd::Status).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::Status(_))).await;
    if let EngineEvent::Status(status) = ev {
        println!("{:#?}", status);
        assert_eq!( status.counts.active, 2);
        assert_eq!( status.counts.debris, 2);
        assert_eq!( status.counts.total, 5);
        assert_eq!( status.collisions, 2);
    }

    handle.send( EngineCmd::Shutdown).await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_engine_launch_prediction () {
    let feed = test_feed();
    let (handle, events, task) = spawn_engine( test_config(), scenario_propagator(), feed.clone(), None).unwrap();

    handle.send( EngineCmd::SelectGroup( "cosmos-2251-debris".to_string())).await.unwrap();
    next_event( &events, |e| matches!( e, EngineEvent::PageLoaded{ group, ..} if group == "cosmos-2251-debris")).await;

    // blank queries are rejected before any lookup goes out
    handle.send( EngineCmd::PredictLaunch( "   ".to_string())).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::Notice(_))).await;
    println!("{:?}", ev);
    let expected = OdinConjunctionError::InvalidInput( String::new()).to_string();
    assert!( matches!( &ev, EngineEvent::Notice(msg) if msg.starts_with( expected.trim_end())));
    assert_eq!( feed.lookup_count(), 0);

    handle.send( EngineCmd::PredictLaunch( "NOTHING".to_string())).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::Notice(_))).await;
    assert!( matches!( ev, EngineEvent::Notice(msg) if msg == NOT_FOUND_MSG));
    assert_eq!( feed.lookup_count(), 1);

    handle.send( EngineCmd::PredictLaunch( "A1".to_string())).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::LaunchWarnings{..})).await;
    if let EngineEvent::LaunchWarnings { candidate, warnings } = ev {
        assert_eq!( candidate, "A1");
        assert_eq!( warnings.len(), 2); // D1 at 12km, D2 at 5km
    }

    // a record with unusable elements falls back to the default orbit, which is far from all debris
    handle.send( EngineCmd::PredictLaunch( "BROKEN".to_string())).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::LaunchWarnings{..})).await;
    if let EngineEvent::LaunchWarnings { candidate, warnings } = ev {
        assert_eq!( candidate, "BROKEN");
        assert!( warnings.is_empty());
    }

    handle.send( EngineCmd::ClearAll).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::Counts(_))).await;
    if let EngineEvent::Counts(counts) = ev {
        assert_eq!( counts.total, 1);
    }

    drop(handle);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_outdated_feed_is_dropped_on_group_change () {
    let feed = Arc::new( MapFeedSource::new(
        &[ ("starlink", three_line_feed( &["A1", "A2"])),
           ("cosmos-2251-debris", three_line_feed( &["D1", "D2"])) ],
        &[]
    ).with_delay( "starlink", Duration::from_millis(300)));
    let (handle, events, task) = spawn_engine( test_config(), scenario_propagator(), feed, None).unwrap();

    // the default group is still in flight when we switch
    handle.send( EngineCmd::SelectGroup( "cosmos-2251-debris".to_string())).await.unwrap();
    next_event( &events, |e| matches!( e, EngineEvent::PageLoaded{ group, ..} if group == "cosmos-2251-debris")).await;

    let late = events_within( &events, Duration::from_millis(600)).await;
    assert!( !late.iter().any( |e| is_feed_of( e, "starlink")));

    handle.send( EngineCmd::Status).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::Status(_))).await;
    if let EngineEvent::Status(status) = ev {
        assert_eq!( status.group, "cosmos-2251-debris");
        assert_eq!( status.counts.active, 0);
        assert_eq!( status.counts.debris, 2);
    }

    handle.send( EngineCmd::Shutdown).await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_outdated_feed_is_dropped_on_clear () {
    let feed = Arc::new( MapFeedSource::new( &[ ("starlink", three_line_feed( &["A1", "A2"])) ], &[])
        .with_delay( "starlink", Duration::from_millis(300)));
    let (handle, events, task) = spawn_engine( test_config(), scenario_propagator(), feed, None).unwrap();

    handle.send( EngineCmd::ClearAll).await.unwrap();
    let late = events_within( &events, Duration::from_millis(600)).await;
    assert!( !late.iter().any( |e| is_feed_of( e, "starlink")));

    handle.send( EngineCmd::Status).await.unwrap();
    let ev = next_event( &events, |e| matches!( e, EngineEvent::Status(_))).await;
    if let EngineEvent::Status(status) = ev {
        assert_eq!( status.records, 0);
        assert_eq!( status.counts.total, 1);
    }

    handle.send( EngineCmd::Shutdown).await.unwrap();
    task.await.unwrap().unwrap();
}
