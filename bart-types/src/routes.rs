//! The route list (`route.aspx?cmd=routes`).

use serde_derive::Deserialize;

use crate::fns;

#[derive(Deserialize, Clone, Debug)]
pub struct RouteListResponse {
    pub root: RouteListRoot,
}
#[derive(Deserialize, Clone, Debug)]
pub struct RouteListRoot {
    pub routes: RouteList,
}
#[derive(Deserialize, Clone, Debug)]
pub struct RouteList {
    #[serde(rename = "route", default)]
    pub routes: Vec<Route>,
}
/// One directional route, e.g. "Dublin/Pleasanton - Daly City".
///
/// Each direction of a physical line is a separate route with its own
/// number; the number is the key into the schedule API.
#[derive(Deserialize, Clone, Debug)]
pub struct Route {
    pub name: String,
    pub abbr: String,
    /// Route number, unique across the system.
    #[serde(deserialize_with = "fns::parse_str_num")]
    pub number: u32,
    pub color: String,
    pub hexcolor: String,
}
