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

//! orbit propagation and inertial to geodetic conversion

use chrono::{DateTime,Utc};
use nalgebra::Vector3;
use satkit::{frametransform::qteme2itrf, sgp4::{sgp4, SGP4Error}};
use serde::{Serialize,Deserialize};
use tracing::trace;
use crate::{
    elements::OrbitalElementSet,
    geo::{Cartesian3, Cartographic},
    instant_from_datetime
};

/// inertial (TEME) state of an object. Positions are in meters, velocities in m/s
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct EciState {
    pub position: Cartesian3,
    pub velocity: Cartesian3,
}

impl EciState {
    pub fn new (position: Cartesian3, velocity: Cartesian3)->Self {
        EciState { position, velocity }
    }

    /// speed in km/h
    pub fn speed_kmh (&self)->f64 {
        self.velocity.length() * 3.6
    }
}

/// something that can compute the inertial state of an element set at a given time.
/// Returns `None` if the elements cannot be propagated to `t` (e.g. decayed orbits), which callers
/// treat as a per-object omission, never as a fatal error
pub trait Propagator: Send + Sync {
    fn propagate (&self, elements: &OrbitalElementSet, t: DateTime<Utc>) -> Option<EciState>;
}

/// the production propagator based on the SGP4/SDP4 implementation of satkit
#[derive(Debug,Clone,Copy,Default)]
pub struct Sgp4Propagator;

impl Propagator for Sgp4Propagator {
    fn propagate (&self, elements: &OrbitalElementSet, t: DateTime<Utc>) -> Option<EciState> {
        let tvec = vec![ instant_from_datetime(t) ];
        let (pteme, vteme, errs) = sgp4( &mut elements.tle().clone(), &tvec); // sgp4 mutates the TLE

        if !matches!( errs.first(), Some(SGP4Error::SGP4Success)) {
            trace!("propagation of {} to {} failed: {:?}", elements.name(), t, errs.first());
            return None
        }

        let position = Cartesian3::new( pteme[(0,0)], pteme[(1,0)], pteme[(2,0)]);
        let velocity = Cartesian3::new( vteme[(0,0)], vteme[(1,0)], vteme[(2,0)]);
        if position.is_finite() && velocity.is_finite() {
            Some( EciState::new( position, velocity))
        } else {
            trace!("propagation of {} to {} produced non-finite state", elements.name(), t);
            None
        }
    }
}

/* #region frame conversion ***************************************************/

/// rotate an inertial (TEME) position into the earth-fixed (ITRF) frame at `t`
pub fn eci_to_ecef (p: &Cartesian3, t: DateTime<Utc>)->Cartesian3 {
    let q = qteme2itrf( &instant_from_datetime(t));
    Cartesian3::from( q.to_rotation_matrix() * Vector3::from(*p))
}

pub fn ecef_to_eci (p: &Cartesian3, t: DateTime<Utc>)->Cartesian3 {
    let q = qteme2itrf( &instant_from_datetime(t)).conjugate();
    Cartesian3::from( q.to_rotation_matrix() * Vector3::from(*p))
}

pub fn eci_to_geodetic (p: &Cartesian3, t: DateTime<Utc>)->Cartographic {
    Cartographic::from( eci_to_ecef( p, t))
}

pub fn geodetic_to_eci (c: &Cartographic, t: DateTime<Utc>)->Cartesian3 {
    ecef_to_eci( &Cartesian3::from(c), t)
}

/* #endregion frame conversion */

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_eci_ecef_roundtrip () {
        let t = Utc.with_ymd_and_hms( 2024, 6, 14, 4, 53, 0).unwrap();
        let p = Cartesian3::new( 4_000_000.0, -3_500_000.0, 3_900_000.0);
        let pe = eci_to_ecef( &p, t);
        assert!( (pe.length() - p.length()).abs() < 1e-6);

        let p1 = ecef_to_eci( &pe, t);
        assert!( p.distance_to(&p1) < 1e-6);
    }
}
