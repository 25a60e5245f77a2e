//! Fetching the BART legacy API.

use bart_types::etd::EtdResponse;
use bart_types::routes::RouteListResponse;
use bart_types::sched::RouteSchedResponse;
use bart_types::stations::StationListResponse;
use log::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::config::Config;
use crate::errors::*;
use crate::types::{Estimate, Route, ScheduledTrain, Station};

static DEFAULT_BASE_URL: &str = "https://api.bart.gov/api";
/// The BART validation key, published in the API docs for public use.
static DEFAULT_API_KEY: &str = "MW9S-E7SL-26DU-VV8V";

pub struct BartClient {
    base_url: String,
    api_key: String,
    cli: Client
}

impl BartClient {
    pub fn new(cfg: &Config) -> Self {
        let cli = Client::new();
        Self {
            base_url: cfg.base_url.clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            api_key: cfg.api_key.clone()
                .unwrap_or_else(|| DEFAULT_API_KEY.into()),
            cli
        }
    }
    fn get<T: DeserializeOwned>(&self, path: &str) -> WatchResult<T> {
        let url = format!("{}/{}&key={}&json=y", self.base_url, path, self.api_key);
        debug!("Requesting: {}", url);
        let mut resp = self.cli.get(&url).send()?;
        let st = resp.status();
        if !st.is_success() {
            return Err(WatchError::BadStatus(st.as_u16()));
        }
        Ok(resp.json()?)
    }
    pub fn stations(&self) -> WatchResult<Vec<Station>> {
        let resp: StationListResponse = self.get("stn.aspx?cmd=stns")?;
        Ok(resp.root.stations.stations.into_iter()
           .map(Station::from)
           .collect())
    }
    pub fn route_schedule(&self, number: u32) -> WatchResult<Vec<ScheduledTrain>> {
        let resp: RouteSchedResponse = self.get(&format!("sched.aspx?cmd=routesched&route={}", number))?;
        Ok(resp.root.route.trains.into_iter()
           .map(ScheduledTrain::from)
           .collect())
    }
    /// Fetches the route list, then each route's schedule for the current
    /// day. Routes come back sorted by number, so "first candidate route"
    /// decisions downstream are deterministic.
    pub fn routes_with_schedules(&self) -> WatchResult<Vec<Route>> {
        let resp: RouteListResponse = self.get("route.aspx?cmd=routes")?;
        let mut routes = vec![];
        for info in resp.root.routes.routes {
            let trains = self.route_schedule(info.number)?;
            if trains.is_empty() {
                // Route doesn't run on the loaded day; it still gets an
                // (empty) entry so the travel-time model stays total.
                info!("Route {} ({}) has no trains today", info.number, info.name);
            }
            routes.push(Route::new(info, trains));
        }
        routes.sort_by_key(|r| r.number);
        Ok(routes)
    }
    /// One poll of the live feed: origin station code → estimates for every
    /// train out of it, nearest-first per destination.
    pub fn etds(&self) -> WatchResult<HashMap<String, Vec<Estimate>>> {
        let resp: EtdResponse = self.get("etd.aspx?cmd=etd&orig=all")?;
        let mut map = HashMap::new();
        for stn in resp.root.stations {
            let mut ests = vec![];
            for line in &stn.lines {
                ests.extend(Estimate::from_line(line));
            }
            map.insert(stn.abbr, ests);
        }
        Ok(map)
    }
}
