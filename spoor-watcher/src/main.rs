//! Tracks BART trains through the public ETD feed, giving each physical
//! train a stable identity and an interpolated position.

pub mod errors;
pub mod config;
pub mod types;
pub mod client;
pub mod model;
pub mod resolver;
pub mod engine;
pub mod watcher;
pub mod ctx;

use log::*;
use spoor_util::ConfigExt;
use spoor_util::http;
use std::sync::{Arc, RwLock};

use crate::client::BartClient;
use crate::config::Config;
use crate::ctx::App;
use crate::engine::LiveSnapshot;
use crate::model::TravelTimeModel;
use crate::resolver::SegmentResolver;
use crate::watcher::Watcher;
use errors::Result;

fn main() -> Result<()> {
    spoor_util::setup_logging()?;
    info!("spoor-watcher, but not yet");
    info!("loading config");
    let cfg = Config::load()?;
    let client = BartClient::new(&cfg);
    info!("fetching stations");
    let stations = Arc::new(client.stations()?);
    info!("fetching routes and schedules");
    let routes = Arc::new(client.routes_with_schedules()?);
    info!("got {} stations, {} routes", stations.len(), routes.len());
    let model = TravelTimeModel::build(&routes);
    let resolver = SegmentResolver::new(routes.clone(), model);
    let snapshot = Arc::new(RwLock::new(Arc::new(LiveSnapshot::default())));
    let app = App::new(stations, &routes, snapshot.clone());
    let watcher = Watcher::new(client, resolver, snapshot, &cfg);
    watcher.run()?;
    info!("spoor-watcher running!");
    http::start_server(&cfg.listen, app)
}
