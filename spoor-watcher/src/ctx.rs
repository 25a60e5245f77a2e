//! Main app context: the read-only HTTP API over the live snapshot.

use log::*;
use rouille::{Request, Response, router};
use serde_derive::Serialize;
use spoor_util::http::HttpServer;
use spoor_util::user_agent;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::engine::{LiveSnapshot, TrainId, TrainView};
use crate::errors::*;
use crate::types::{Route, Station, LEAVING};

/// Handle to the snapshot the poll loop publishes: a whole new
/// `LiveSnapshot` is swapped in after each successful cycle, so readers
/// see either the pre- or post-cycle state and nothing in between.
pub type SharedSnapshot = Arc<RwLock<Arc<LiveSnapshot>>>;

/// An interpolated position, planar per-axis between the segment endpoints.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lng: f64
}

/// Where a train is, given its latest estimate and the segment's expected
/// transit time. `LEAVING` pins it to the origin platform; an estimate
/// above the average extrapolates past the origin, which is accepted as an
/// approximation rather than clamped away.
pub fn interpolate(origin: &Station, dest: &Station, minutes: i32, expected: f64) -> Position {
    let progress = if minutes == LEAVING {
        1.0
    } else {
        minutes as f64 / expected
    };
    Position {
        lat: dest.lat - progress * (dest.lat - origin.lat),
        lng: dest.lng - progress * (dest.lng - origin.lng)
    }
}

/// One live train as served to consumers, position included.
#[derive(Serialize, Clone, Debug)]
pub struct LiveTrain {
    #[serde(flatten)]
    pub view: TrainView,
    pub minutes: Option<i32>,
    /// Absent when either endpoint is missing from the station list.
    pub position: Option<Position>
}

/// Summary of a route, without the (large) schedule.
#[derive(Serialize, Clone, Debug)]
pub struct RouteView {
    pub number: u32,
    pub name: String,
    pub abbr: String,
    pub color: String,
    pub trains_today: usize
}

pub struct App {
    stations: Arc<Vec<Station>>,
    by_abbr: HashMap<String, Station>,
    routes: Vec<RouteView>,
    snapshot: SharedSnapshot
}

impl HttpServer for App {
    type Error = WatchError;

    fn on_request(&self, req: &Request) -> WatchResult<Response> {
        router!(req,
            (GET) (/) => {
                Ok(Response::text(user_agent!()))
            },
            (GET) (/stations) => {
                Ok(Response::json(&*self.stations))
            },
            (GET) (/routes) => {
                Ok(Response::json(&self.routes))
            },
            (GET) (/trains) => {
                Ok(Response::json(&self.live_trains()))
            },
            (GET) (/trains/{id: TrainId}) => {
                self.live_train(id).map(|x| Response::json(&x))
            },
            _ => {
                Err(WatchError::InvalidPath)
            }
        )
    }
}

impl App {
    pub fn new(stations: Arc<Vec<Station>>, routes: &[Route], snapshot: SharedSnapshot) -> Self {
        let by_abbr = stations.iter()
            .map(|s| (s.abbr.clone(), s.clone()))
            .collect();
        let routes = routes.iter().map(|r| RouteView {
            number: r.number,
            name: r.name.clone(),
            abbr: r.abbr.clone(),
            color: r.color.clone(),
            trains_today: r.trains.len()
        }).collect();
        Self { stations, by_abbr, routes, snapshot }
    }
    fn current(&self) -> Arc<LiveSnapshot> {
        self.snapshot.read().unwrap().clone()
    }
    fn to_live(&self, view: &TrainView) -> LiveTrain {
        let minutes = view.latest_minutes();
        let position = match (minutes,
                              self.by_abbr.get(&view.origin_abbr),
                              self.by_abbr.get(&view.destination_abbr)) {
            (Some(min), Some(origin), Some(dest)) => {
                Some(interpolate(origin, dest, min, view.average_minutes))
            },
            _ => {
                warn!("No coordinates for segment {}-{}", view.origin_abbr, view.destination_abbr);
                None
            }
        };
        LiveTrain {
            view: view.clone(),
            minutes,
            position
        }
    }
    fn live_trains(&self) -> Vec<LiveTrain> {
        self.current().trains.iter()
            .map(|t| self.to_live(t))
            .collect()
    }
    fn live_train(&self, id: TrainId) -> WatchResult<LiveTrain> {
        let snap = self.current();
        let view = snap.train(id).ok_or(WatchError::NotFound)?;
        Ok(self.to_live(view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(abbr: &str, lat: f64, lng: f64) -> Station {
        Station {
            abbr: abbr.into(),
            name: abbr.into(),
            address: "".into(),
            city: "".into(),
            county: "".into(),
            zipcode: "".into(),
            lat,
            lng
        }
    }

    #[test]
    fn leaving_pins_to_origin() {
        let a = station("A", 10.0, 20.0);
        let b = station("B", 14.0, 28.0);
        assert_eq!(interpolate(&a, &b, LEAVING, 8.0), Position { lat: 10.0, lng: 20.0 });
    }

    #[test]
    fn halfway_and_arriving() {
        let a = station("A", 10.0, 20.0);
        let b = station("B", 14.0, 28.0);
        assert_eq!(interpolate(&a, &b, 4, 8.0), Position { lat: 12.0, lng: 24.0 });
        assert_eq!(interpolate(&a, &b, 0, 8.0), Position { lat: 14.0, lng: 28.0 });
    }

    #[test]
    fn over_average_extrapolates_past_origin() {
        let a = station("A", 10.0, 20.0);
        let b = station("B", 14.0, 28.0);
        // 12 minutes on an 8-minute segment: half a segment behind the
        // origin, by design not clamped.
        assert_eq!(interpolate(&a, &b, 12, 8.0), Position { lat: 8.0, lng: 16.0 });
    }
}
