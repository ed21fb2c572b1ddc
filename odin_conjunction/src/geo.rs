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

//! cartesian and cartographic coordinates as used by propagation and screening.
//! Cartesian3 is unit-less (we use meters for positions and m/s for velocities), Cartographic
//! uses radians and meters above the WGS84 ellipsoid

use std::{fmt, ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign}};
use nalgebra::Vector3;
use serde::{Serialize,Deserialize};

pub const EQUATORIAL_EARTH_RADIUS: f64 = 6_378_137.0; // WGS84 semi-major axis in meters
pub const E_EARTH_SQUARED: f64 = 6.6943799901377997e-3; // first eccentricity squared

#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct Cartesian3 {
    pub x: f64,
    pub y: f64,
    pub z: f64
}

impl Cartesian3 {
    pub fn new (x: f64, y: f64, z: f64)->Cartesian3 {
        Cartesian3{x,y,z}
    }

    pub fn zero ()->Cartesian3 {
        Cartesian3{x: 0.0, y: 0.0, z: 0.0}
    }

    pub fn dot (&self, p: &Cartesian3)->f64 {
        self.x * p.x + self.y * p.y + self.z * p.z
    }

    pub fn length_squared (&self)->f64 {
        self.dot(self)
    }

    pub fn length (&self)->f64 {
        self.length_squared().sqrt()
    }

    pub fn distance_to (&self, p: &Cartesian3)->f64 {
        (*self - *p).length()
    }

    pub fn is_finite (&self)->bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Vector3<f64>> for Cartesian3 {
    fn from (v: Vector3<f64>)->Self {
        Cartesian3::new( v.x, v.y, v.z)
    }
}

impl From<Cartesian3> for Vector3<f64> {
    fn from (p: Cartesian3)->Self {
        Vector3::new( p.x, p.y, p.z)
    }
}

impl fmt::Display for Cartesian3 {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/* #region ops ****************************************************************/

impl Add for Cartesian3 {
    type Output = Cartesian3;
    fn add (self, rhs: Cartesian3)->Cartesian3 {
        Cartesian3::new( self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Cartesian3 {
    fn add_assign (&mut self, rhs: Cartesian3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Cartesian3 {
    type Output = Cartesian3;
    fn sub (self, rhs: Cartesian3)->Cartesian3 {
        Cartesian3::new( self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Cartesian3 {
    fn sub_assign (&mut self, rhs: Cartesian3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<f64> for Cartesian3 {
    type Output = Cartesian3;
    fn mul (self, s: f64)->Cartesian3 {
        Cartesian3::new( self.x * s, self.y * s, self.z * s)
    }
}

impl MulAssign<f64> for Cartesian3 {
    fn mul_assign (&mut self, s: f64) {
        self.x *= s;
        self.y *= s;
        self.z *= s;
    }
}

impl Neg for Cartesian3 {
    type Output = Cartesian3;
    fn neg (self)->Cartesian3 {
        Cartesian3::new( -self.x, -self.y, -self.z)
    }
}

/* #endregion ops */

/// geodetic coordinates on the WGS84 ellipsoid
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct Cartographic {
    pub longitude: f64, // radians
    pub latitude: f64,  // radians
    pub height: f64     // meters above ellipsoid
}

impl Cartographic {
    pub fn new (longitude:f64, latitude: f64, height: f64)->Self {
        Cartographic { longitude, latitude, height }
    }

    pub fn from_degrees (lon: f64, lat: f64, height: f64)->Self {
        Cartographic::new( lon.to_radians(), lat.to_radians(), height)
    }

    pub fn longitude_deg (&self)-> f64 { self.longitude.to_degrees() }
    pub fn latitude_deg (&self)-> f64 { self.latitude.to_degrees() }
}

impl From<&Cartesian3> for Cartographic {

    /// earth-fixed cartesian to geodetic coordinates, see
    ///    Olson, D. K. (1996).
    ///    Converting Earth-Centered, Earth-Fixed Coordinates to Geodetic Coordinates.
    ///    IEEE Transactions on Aerospace and Electronic Systems, 32(1), 473–476.
    /// points closer than 100km to the earth center are not supported and map to (0,0,0)
    fn from (p: &Cartesian3) -> Self {
        let a  = EQUATORIAL_EARTH_RADIUS;
        let e2 = E_EARTH_SQUARED;
        let a1 = 4.2697672707157535e+4;
        let a2 = 1.8230912546075455e+9;
        let a3 = 1.4291722289812413e+2;
        let a4 = 4.5577281365188637e+9;
        let a5 = 4.2840589930055659e+4;
        let a6 = 9.9330562000986220e-1;

        let Cartesian3 { x, y, z } = *p;

        let zp = z.abs();
        let w2 = x*x + y*y;
        let w = w2.sqrt();
        let z2 = z*z;
        let r2 = w2 + z2;
        let r = r2.sqrt();

        if r < 100_000.0 {
            return Cartographic::new( 0.0, 0.0, 0.0)
        }

        let lon = y.atan2(x);
        let s2 = z2 / r2;
        let c2 = w2 / r2;
        let mut u = a2 / r;
        let mut v = a3 - a4 / r;

        let (mut lat, s, c, ss) = if c2 > 0.3 {
            let s = (zp/r)*(1.0 + c2*(a1 + u + s2*v)/r);
            let ss = s*s;
            (s.asin(), s, (1.0 - ss).sqrt(), ss)
        } else {
            let c = (w/r)*(1.0 - s2*(a5 - u - c2*v)/r);
            let ss = 1.0 - c*c;
            (c.acos(), ss.sqrt(), c, ss)
        };

        let g = 1.0 - e2*ss;
        let rg = a / g.sqrt();
        let rf = a6 * rg;
        u = w - rg * c;
        v = zp - rf * s;
        let f = c * u + s * v;
        let m = c * v - s * u;
        let p = m / (rf / g + f);

        lat += p;
        let height = f + m*p/2.0;
        if z < 0.0 { lat = -lat; }

        Cartographic::new( lon, lat, height)
    }
}

impl From<Cartesian3> for Cartographic {
    fn from (p: Cartesian3) -> Self {
        Cartographic::from(&p)
    }
}

impl From<&Cartographic> for Cartesian3 {
    /// geodetic to earth-fixed cartesian coordinates
    fn from (c: &Cartographic) -> Self {
        let (sin_lat, cos_lat) = c.latitude.sin_cos();
        let (sin_lon, cos_lon) = c.longitude.sin_cos();
        let n = EQUATORIAL_EARTH_RADIUS / (1.0 - E_EARTH_SQUARED * sin_lat * sin_lat).sqrt();

        Cartesian3::new(
            (n + c.height) * cos_lat * cos_lon,
            (n + c.height) * cos_lat * sin_lon,
            (n * (1.0 - E_EARTH_SQUARED) + c.height) * sin_lat
        )
    }
}

impl From<Cartographic> for Cartesian3 {
    fn from (c: Cartographic) -> Self {
        Cartesian3::from(&c)
    }
}
