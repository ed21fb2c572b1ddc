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

//! the collision evaluator running on its own thread.
//!
//! Requests are value snapshots that are sent to a dedicated OS thread over a kanal channel.
//! Each request carries a unique [`RequestId`] which is echoed in its response. A dispatcher task
//! owns the table of pending requests and hands each response to exactly the caller that
//! submitted the matching request. Callers register with the dispatcher *before* the request is
//! sent, and the worker posts its responses into the same channel, hence a response can never
//! overtake its registration

use std::{collections::HashMap, sync::{Arc, atomic::{AtomicU64,Ordering}}, thread, time::Duration};
use chrono::{DateTime,Utc};
use kanal::{AsyncReceiver, AsyncSender};
use serde::Serialize;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug,info,warn};
use crate::{
    catalog::ObjectSnapshot,
    errors::{op_failed, OdinConjunctionError, Result},
    evaluator::{evaluate_launch, evaluate_pairwise, CollisionWarning, LaunchCandidate},
    propagator::Propagator
};

pub type RequestId = u64;

/// max number of queued requests before submitters have to wait
const REQUEST_QUEUE_LEN: usize = 16;

#[derive(Debug,Clone)]
pub enum EvalKind {
    Pairwise { debris: Vec<ObjectSnapshot>, targets: Vec<ObjectSnapshot> },
    Launch { debris: Vec<ObjectSnapshot>, candidate: LaunchCandidate },
}

#[derive(Debug,Clone)]
pub struct EvalRequest {
    pub id: RequestId,
    pub kind: EvalKind,
    pub threshold_km: f64,
    pub horizon: Duration,
    pub now: DateTime<Utc>,
}

/// at most one of `collisions` (pairwise) and `launch_collisions` (launch) is non-empty
#[derive(Debug,Clone,Default,PartialEq,Serialize)]
pub struct EvalResponse {
    pub id: RequestId,
    pub collisions: Vec<CollisionWarning>,
    pub launch_collisions: Vec<CollisionWarning>,
}

/// run a request synchronously (this is what the worker thread does)
pub fn process_request<P> (propagator: &P, request: &EvalRequest)->EvalResponse where P: Propagator + ?Sized {
    let EvalRequest { id, threshold_km, horizon, now, .. } = *request;

    match &request.kind {
        EvalKind::Pairwise { debris, targets } => EvalResponse {
            id,
            collisions: evaluate_pairwise( propagator, debris, targets, threshold_km, horizon, now),
            launch_collisions: Vec::new(),
        },
        EvalKind::Launch { debris, candidate } => EvalResponse {
            id,
            collisions: Vec::new(),
            launch_collisions: evaluate_launch( propagator, debris, candidate, threshold_km, horizon, now),
        }
    }
}

enum WorkerMsg {
    Evaluate( EvalRequest),
    Terminate,
}

enum DispatchMsg {
    Register( RequestId, oneshot::Sender<EvalResponse>),
    Cancel( RequestId),
    Response( EvalResponse),
    Terminate,
}

/// cloneable submission end of an [`EvaluatorWorker`]
#[derive(Clone)]
pub struct EvaluatorHandle {
    next_id: Arc<AtomicU64>,
    request_tx: AsyncSender<WorkerMsg>,
    dispatch_tx: AsyncSender<DispatchMsg>,
}

impl EvaluatorHandle {
    /// submit an evaluation and wait for its response
    pub async fn submit (&self, kind: EvalKind, threshold_km: f64, horizon: Duration, now: DateTime<Utc>)->Result<EvalResponse> {
        let id = self.next_id.fetch_add( 1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        self.dispatch_tx.send( DispatchMsg::Register( id, tx)).await.map_err( |_| OdinConjunctionError::WorkerClosed)?;

        let request = EvalRequest { id, kind, threshold_km, horizon, now };
        if self.request_tx.send( WorkerMsg::Evaluate(request)).await.is_err() {
            let _ = self.dispatch_tx.send( DispatchMsg::Cancel(id)).await;
            return Err( OdinConjunctionError::WorkerClosed)
        }
        debug!("submitted evaluation request {}", id);

        rx.await.map_err( |_| OdinConjunctionError::WorkerClosed)
    }

    pub fn is_closed (&self)->bool {
        self.request_tx.is_closed()
    }
}

pub struct EvaluatorWorker {
    handle: EvaluatorHandle,
    thread: Option<thread::JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl EvaluatorWorker {
    /// start the worker thread and its dispatcher task. This has to be called from within a tokio runtime
    pub fn spawn<P> (propagator: P)->Result<Self> where P: Propagator + 'static {
        let (request_tx, request_rx) = kanal::bounded::<WorkerMsg>( REQUEST_QUEUE_LEN);
        let (dispatch_tx, dispatch_rx) = kanal::unbounded_async::<DispatchMsg>();

        let response_tx = dispatch_tx.clone().to_sync();
        let thread = thread::Builder::new()
            .name( "conjunction-evaluator".to_string())
            .spawn( move || run_worker( propagator, request_rx, response_tx))?;

        let dispatcher = tokio::spawn( run_dispatcher( dispatch_rx));
        info!("evaluator worker started");

        let handle = EvaluatorHandle { next_id: Arc::new( AtomicU64::new(1)), request_tx: request_tx.to_async(), dispatch_tx };
        Ok( EvaluatorWorker { handle, thread: Some(thread), dispatcher: Some(dispatcher) })
    }

    pub fn handle (&self)->EvaluatorHandle {
        self.handle.clone()
    }

    pub async fn submit (&self, kind: EvalKind, threshold_km: f64, horizon: Duration, now: DateTime<Utc>)->Result<EvalResponse> {
        self.handle.submit( kind, threshold_km, horizon, now).await
    }

    /// let the worker finish all requests queued so far and wait for its thread to terminate.
    /// Requests submitted after this get a `WorkerClosed` error
    pub async fn shutdown (mut self)->Result<()> {
        self.handle.request_tx.send( WorkerMsg::Terminate).await.map_err( |_| OdinConjunctionError::WorkerClosed)?;

        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking( move || thread.join()).await
                .map_err( |e| op_failed!("failed to join evaluator thread: {}", e))?
                .map_err( |_| op_failed!("evaluator thread panicked"))?;
        }

        // all responses are queued before this
        self.handle.dispatch_tx.send( DispatchMsg::Terminate).await.map_err( |_| OdinConjunctionError::WorkerClosed)?;
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.await.map_err( |e| op_failed!("failed to join dispatcher: {}", e))?;
        }

        info!("evaluator worker terminated");
        Ok(())
    }
}

impl Drop for EvaluatorWorker {
    fn drop (&mut self) {
        if self.thread.is_some() { // not shut down, bail out without waiting
            let _ = self.handle.request_tx.close();
            let _ = self.handle.dispatch_tx.close();
        }
    }
}

fn run_worker<P> (propagator: P, requests: kanal::Receiver<WorkerMsg>, responses: kanal::Sender<DispatchMsg>) where P: Propagator {
    while let Ok(WorkerMsg::Evaluate(request)) = requests.recv() {
        let response = process_request( &propagator, &request);
        debug!("evaluation request {} done", response.id);
        if responses.send( DispatchMsg::Response(response)).is_err() {
            break
        }
    }
}

async fn run_dispatcher (rx: AsyncReceiver<DispatchMsg>) {
    let mut pending: HashMap<RequestId,oneshot::Sender<EvalResponse>> = HashMap::new();

    while let Ok(msg) = rx.recv().await {
        match msg {
            DispatchMsg::Register( id, tx) => {
                pending.insert( id, tx);
            }
            DispatchMsg::Cancel( id) => {
                pending.remove( &id);
            }
            DispatchMsg::Terminate => break,
            DispatchMsg::Response( response) => {
                match pending.remove( &response.id) {
                    Some(tx) => {
                        let id = response.id;
                        if tx.send( response).is_err() { debug!("submitter of request {} is gone", id) }
                    }
                    None => warn!("dropping response for unknown request {}", response.id)
                }
            }
        }
    }

    if !pending.is_empty() {
        warn!("evaluator closed with {} pending requests", pending.len());
    }
}
