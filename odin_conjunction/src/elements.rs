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

//! parsed two-line element sets

use std::fmt;
use chrono::{DateTime,Utc};
use satkit::TLE;
use crate::{datetime_from_unixtime, errors::{tle_error, OdinConjunctionError, Result}};

/// minimum length of a TLE data line (including the checksum column)
pub const TLE_LINE_LEN: usize = 69;

/// an immutable, validated orbital element set of a named object.
/// We keep the raw lines around so that element sets can be displayed and re-serialized
#[derive(Debug,Clone)]
pub struct OrbitalElementSet {
    name: String,
    line1: String,
    line2: String,
    tle: TLE,
}

impl OrbitalElementSet {

    /// parse and validate a three-line record (name, line1, line2). We check line format and
    /// checksums ourselves since not all TLE sources (and parsers) do
    pub fn parse (name: &str, line1: &str, line2: &str) -> Result<Self> {
        let name = name.trim();
        let line1 = line1.trim();
        let line2 = line2.trim();

        if name.is_empty() { return Err( tle_error!("empty object name")) }
        check_line( line1, '1')?;
        check_line( line2, '2')?;

        if line1[2..7] != line2[2..7] {
            return Err( tle_error!("catalog number mismatch between lines of '{}'", name))
        }

        let tle = TLE::load_2line( line1, line2).map_err( |e| tle_error!("TLE import of '{}' failed: {:?}", name, e))?;

        Ok( OrbitalElementSet { name: name.to_string(), line1: line1.to_string(), line2: line2.to_string(), tle })
    }

    pub fn name (&self)->&str { &self.name }
    pub fn line1 (&self)->&str { &self.line1 }
    pub fn line2 (&self)->&str { &self.line2 }

    /// the satkit TLE these elements were parsed into. Note that SGP4 propagation mutates its
    /// TLE argument so callers have to propagate on a clone
    pub fn tle (&self)->&TLE { &self.tle }

    /// NORAD catalog number as decoded by satkit
    pub fn catalog_number (&self)->u32 {
        self.tle.sat_num as u32
    }

    pub fn epoch (&self)->DateTime<Utc> {
        datetime_from_unixtime( self.tle.epoch.as_unixtime())
    }

    pub fn inclination_deg (&self)->f64 { self.tle.inclination }

    /// revolutions per day
    pub fn mean_motion (&self)->f64 { self.tle.mean_motion }

    pub fn eccentricity (&self)->f64 { self.tle.eccen }

    /// orbital period in minutes
    pub fn period_minutes (&self)->f64 {
        if self.tle.mean_motion > 0.0 { 1440.0 / self.tle.mean_motion } else { f64::INFINITY }
    }
}

impl fmt::Display for OrbitalElementSet {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "{}\n{}\n{}", self.name, self.line1, self.line2)
    }
}

/// the modulo-10 TLE checksum over the first 68 columns: digits count with their value, '-' as 1
pub fn tle_checksum (line: &str)->u32 {
    line.bytes().take( TLE_LINE_LEN-1).map( |b| match b {
        b'0'..=b'9' => (b - b'0') as u32,
        b'-' => 1,
        _ => 0
    }).sum::<u32>() % 10
}

fn check_line (line: &str, line_no: char)->Result<()> {
    if !line.is_ascii() {
        return Err( tle_error!("line {} contains non-ASCII characters", line_no))
    }
    if line.len() < TLE_LINE_LEN {
        return Err( tle_error!("line {} too short: {} chars", line_no, line.len()))
    }

    let mut prefix = line.chars();
    if prefix.next() != Some(line_no) || prefix.next() != Some(' ') {
        return Err( tle_error!("not a TLE line {}: '{}'", line_no, line))
    }

    let expected = (line.as_bytes()[TLE_LINE_LEN-1] as char).to_digit(10)
        .ok_or( tle_error!("line {} has no checksum digit", line_no))?;
    let computed = tle_checksum( line);
    if computed != expected {
        return Err( tle_error!("line {} checksum mismatch (expected {}, computed {})", line_no, expected, computed))
    }

    Ok(())
}
