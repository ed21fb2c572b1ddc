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

//! threshold-distance collision screening.
//!
//! All functions are pure: they work on value snapshots of tracked objects and an explicit
//! evaluation time `now`, so identical inputs produce identical warning lists. Warnings are
//! reported in input order (debris major, target minor)

use std::{cmp::Ordering, fmt, time::Duration};
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use tracing::debug;
use crate::{
    catalog::ObjectSnapshot,
    elements::OrbitalElementSet,
    geo::{Cartesian3, Cartographic},
    horizon_time,
    propagator::{geodetic_to_eci, Propagator}
};

/// the fixed risk policy for reported warnings
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
pub enum RiskLevel {
    Critical,
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    pub fn from_distance_km (d: f64)->Self {
        if d < 1.0 { RiskLevel::Critical }
        else if d < 5.0 { RiskLevel::High }
        else if d < 10.0 { RiskLevel::Moderate }
        else { RiskLevel::Low }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::High => "High",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::Low => "Low",
        };
        write!(f, "{s}")
    }
}

/// the (coarser) banding used to present warning lists. This is independent of [`RiskLevel`]
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
pub enum DisplayRiskBand {
    Critical,
    Moderate,
    Low,
}

impl DisplayRiskBand {
    pub fn from_distance_km (d: f64)->Self {
        if d <= 10.0 { DisplayRiskBand::Critical }
        else if d <= 100.0 { DisplayRiskBand::Moderate }
        else { DisplayRiskBand::Low }
    }

    pub fn label (&self)->&'static str {
        match self {
            DisplayRiskBand::Critical => "Critical",
            DisplayRiskBand::Moderate => "Moderate",
            DisplayRiskBand::Low => "Low",
        }
    }

    pub fn color (&self)->&'static str {
        match self {
            DisplayRiskBand::Critical => "red",
            DisplayRiskBand::Moderate => "orange",
            DisplayRiskBand::Low => "green",
        }
    }
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct CollisionWarning {
    pub source_id: String,
    pub target_id: String,
    pub distance_km: f64,
    pub time: DateTime<Utc>,
    pub risk_level: RiskLevel,
}

impl CollisionWarning {
    pub fn new (source_id: &str, target_id: &str, distance_km: f64, time: DateTime<Utc>)->Self {
        CollisionWarning {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            distance_km,
            time,
            risk_level: RiskLevel::from_distance_km( distance_km),
        }
    }

    pub fn display_band (&self)->DisplayRiskBand {
        DisplayRiskBand::from_distance_km( self.distance_km)
    }
}

impl fmt::Display for CollisionWarning {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "{} <-> {}: {:.2} km at {} ({})", self.source_id, self.target_id, self.distance_km, self.time.format("%Y-%m-%dT%H:%M:%SZ"), self.risk_level)
    }
}

/// a (hypothetical) launch to screen against debris. Without elements the candidate is assumed
/// to be at `fallback_altitude_km` above (0°,0°)
#[derive(Debug,Clone)]
pub struct LaunchCandidate {
    pub name: String,
    pub elements: Option<OrbitalElementSet>,
    pub fallback_altitude_km: f64,
}

impl LaunchCandidate {
    pub fn from_elements (elements: OrbitalElementSet, fallback_altitude_km: f64)->Self {
        LaunchCandidate { name: elements.name().to_string(), elements: Some(elements), fallback_altitude_km }
    }

    pub fn without_elements (name: &str, fallback_altitude_km: f64)->Self {
        LaunchCandidate { name: name.to_string(), elements: None, fallback_altitude_km }
    }
}

/// inertial position of the geodetic point (0°,0°,altitude) at time `t`
pub fn fallback_launch_position (altitude_km: f64, t: DateTime<Utc>)->Cartesian3 {
    geodetic_to_eci( &Cartographic::new( 0.0, 0.0, altitude_km * 1000.0), t)
}

pub fn distance_km (a: &Cartesian3, b: &Cartesian3)->f64 {
    a.distance_to(b) / 1000.0
}

/// propagate each object once. `None` entries mark failed propagations
pub fn future_positions<P> (propagator: &P, objects: &[ObjectSnapshot], t: DateTime<Utc>)->Vec<Option<Cartesian3>> where P: Propagator + ?Sized {
    objects.iter().map( |o| propagator.propagate( &o.elements, t).map( |s| s.position)).collect()
}

/// screen every (debris,target) pair at `now + horizon`, reporting pairs closer than `threshold_km`
pub fn evaluate_pairwise<P> (propagator: &P, debris: &[ObjectSnapshot], targets: &[ObjectSnapshot],
                             threshold_km: f64, horizon: Duration, now: DateTime<Utc>)->Vec<CollisionWarning>
    where P: Propagator + ?Sized
{
    let future = horizon_time( now, horizon);
    let debris_pos = future_positions( propagator, debris, future);
    let target_pos = future_positions( propagator, targets, future);

    let mut warnings = Vec::new();
    for (d, dp) in debris.iter().zip( debris_pos.iter()) {
        let Some(dp) = dp else { continue };
        for (t, tp) in targets.iter().zip( target_pos.iter()) {
            let Some(tp) = tp else { continue };
            let dist = distance_km( dp, tp);
            if dist < threshold_km {
                warnings.push( CollisionWarning::new( &d.id, &t.id, dist, future));
            }
        }
    }

    debug!("pairwise screening of {}x{} objects: {} warnings", debris.len(), targets.len(), warnings.len());
    warnings
}

/// screen all debris against a single launch candidate at `now + horizon`
pub fn evaluate_launch<P> (propagator: &P, debris: &[ObjectSnapshot], candidate: &LaunchCandidate,
                           threshold_km: f64, horizon: Duration, now: DateTime<Utc>)->Vec<CollisionWarning>
    where P: Propagator + ?Sized
{
    let future = horizon_time( now, horizon);
    let candidate_pos = match &candidate.elements {
        Some(elements) => propagator.propagate( elements, future).map( |s| s.position),
        None => Some( fallback_launch_position( candidate.fallback_altitude_km, future))
    };

    let Some(cp) = candidate_pos else {
        debug!("launch candidate {} cannot be propagated to {}", candidate.name, future);
        return Vec::new()
    };

    let warnings: Vec<CollisionWarning> = debris.iter().zip( future_positions( propagator, debris, future))
        .filter_map( |(d, dp)| {
            let dist = distance_km( &dp?, &cp);
            (dist < threshold_km).then( || CollisionWarning::new( &d.id, &candidate.name, dist, future))
        })
        .collect();

    debug!("launch screening of {} against {} debris objects: {} warnings", candidate.name, debris.len(), warnings.len());
    warnings
}

/// a copy of the warnings ordered by increasing distance
pub fn sorted_by_distance (warnings: &[CollisionWarning])->Vec<CollisionWarning> {
    let mut sorted = warnings.to_vec();
    sorted.sort_by( |a,b| a.distance_km.partial_cmp( &b.distance_km).unwrap_or( Ordering::Equal));
    sorted
}
