//! Per-route schedules (`sched.aspx?cmd=routesched&route=N`).

use chrono::NaiveTime;
use serde_derive::Deserialize;

use crate::fns;

#[derive(Deserialize, Clone, Debug)]
pub struct RouteSchedResponse {
    pub root: RouteSchedRoot,
}
#[derive(Deserialize, Clone, Debug)]
pub struct RouteSchedRoot {
    #[serde(deserialize_with = "fns::parse_str_num")]
    pub sched_num: u32,
    pub date: String,
    pub route: RouteSched,
}
/// The scheduled trains for one route on the requested day.
///
/// A route that does not run on that day has no `train` elements at all.
#[derive(Deserialize, Clone, Debug)]
pub struct RouteSched {
    #[serde(rename = "train", default)]
    pub trains: Vec<SchedTrain>,
}
#[derive(Deserialize, Clone, Debug)]
pub struct SchedTrain {
    #[serde(rename = "@trainId")]
    pub id: String,
    #[serde(rename = "@trainIdx", deserialize_with = "fns::parse_str_num")]
    pub index: u32,
    #[serde(rename = "stop", default)]
    pub stops: Vec<SchedStop>,
}
/// One scheduled stop. Stops the train passes without calling carry no
/// `origTime`; consumers should drop those.
#[derive(Deserialize, Clone, Debug)]
pub struct SchedStop {
    #[serde(rename = "@station")]
    pub station: String,
    /// Scheduled departure, as a raw time of day. **Not** normalized for
    /// the service-day rollover; times before the end of service belong to
    /// the following calendar day.
    #[serde(rename = "@origTime", deserialize_with = "fns::parse_sched_time", default)]
    pub orig_time: Option<NaiveTime>,
    #[serde(rename = "@bikeflag", deserialize_with = "fns::parse_flag", default)]
    pub bike: bool,
    #[serde(rename = "@load", deserialize_with = "fns::parse_opt_num", default)]
    pub load: Option<u32>,
    #[serde(rename = "@level", default)]
    pub level: Option<String>,
}
