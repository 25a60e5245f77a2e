//! The station list (`stn.aspx?cmd=stns`).

use serde_derive::Deserialize;

use crate::fns;

#[derive(Deserialize, Clone, Debug)]
pub struct StationListResponse {
    pub root: StationListRoot,
}
#[derive(Deserialize, Clone, Debug)]
pub struct StationListRoot {
    pub stations: StationList,
}
#[derive(Deserialize, Clone, Debug)]
pub struct StationList {
    #[serde(rename = "station", default)]
    pub stations: Vec<Station>,
}
/// One physical BART station.
#[derive(Deserialize, Clone, Debug)]
pub struct Station {
    /// Full station name.
    pub name: String,
    /// Four-letter station code; unique, and the key every other feed uses.
    pub abbr: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub state: String,
    pub zipcode: String,
    #[serde(rename = "gtfs_latitude", deserialize_with = "fns::parse_str_num")]
    pub lat: f64,
    #[serde(rename = "gtfs_longitude", deserialize_with = "fns::parse_str_num")]
    pub lng: f64,
}
