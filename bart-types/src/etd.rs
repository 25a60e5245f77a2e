//! The live estimated-departure feed (`etd.aspx?cmd=etd&orig=all`).

use serde::{Deserialize as _, Deserializer};
use serde_derive::Deserialize;

use crate::fns;

/// Sentinel for an estimate of `Leaving`: the train is at, or pulling out
/// of, the platform right now.
///
/// This sorts below every real estimate, which downstream consumers rely
/// on; change it and the departure accounting breaks.
pub const LEAVING: i32 = -1;

#[derive(Deserialize, Clone, Debug)]
pub struct EtdResponse {
    pub root: EtdRoot,
}
#[derive(Deserialize, Clone, Debug)]
pub struct EtdRoot {
    #[serde(rename = "station", default)]
    pub stations: Vec<StationEtd>,
}
/// All live departures from one origin station.
#[derive(Deserialize, Clone, Debug)]
pub struct StationEtd {
    pub name: String,
    pub abbr: String,
    #[serde(rename = "etd", default)]
    pub lines: Vec<EtdLine>,
}
/// Departures from one origin towards one destination.
#[derive(Deserialize, Clone, Debug)]
pub struct EtdLine {
    pub destination: String,
    /// Destination station code.
    pub abbreviation: String,
    #[serde(rename = "estimate", deserialize_with = "sorted_estimates", default)]
    pub estimates: Vec<Estimate>,
}
/// A single train's estimate.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Estimate {
    /// Minutes until departure, or [`LEAVING`].
    #[serde(deserialize_with = "fns::parse_minutes")]
    pub minutes: i32,
    #[serde(deserialize_with = "fns::parse_str_num")]
    pub platform: u32,
    pub direction: String,
    /// Number of cars.
    #[serde(rename = "length", deserialize_with = "fns::parse_str_num")]
    pub cars: u32,
    pub color: String,
    pub hexcolor: String,
    #[serde(rename = "bikeflag", deserialize_with = "fns::parse_flag")]
    pub bike: bool,
    #[serde(deserialize_with = "fns::parse_str_num", default)]
    pub delay: i32,
}

// The feed does not guarantee an order, but everything downstream wants
// nearest-first with LEAVING at the front.
fn sorted_estimates<'de, D>(d: D) -> Result<Vec<Estimate>, D::Error> where D: Deserializer<'de> {
    let mut ests: Vec<Estimate> = Vec::deserialize(d)?;
    ests.sort_by_key(|e| e.minutes);
    Ok(ests)
}
