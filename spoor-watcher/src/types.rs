//! Domain types: the static network, and the live estimates laid over it.

use bart_types::{etd, routes, sched, stations};
use chrono::NaiveTime;
use serde_derive::Serialize;

pub use bart_types::etd::LEAVING;

/// End of the BART service day ("barttime"). Scheduled times earlier than
/// this belong to the *next* calendar day; see
/// <https://api.bart.gov/docs/overview/barttime.aspx>.
pub fn service_end() -> NaiveTime {
    NaiveTime::from_hms(2, 27, 0)
}

/// A BART station.
#[derive(Serialize, Clone, Debug)]
pub struct Station {
    /// Four-letter station code (unique key).
    pub abbr: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub zipcode: String,
    pub lat: f64,
    pub lng: f64
}
impl From<stations::Station> for Station {
    fn from(s: stations::Station) -> Station {
        Station {
            abbr: s.abbr,
            name: s.name,
            address: s.address,
            city: s.city,
            county: s.county,
            zipcode: s.zipcode,
            lat: s.lat,
            lng: s.lng
        }
    }
}

/// A directional route, together with its scheduled trains for the day the
/// schedule was loaded on.
#[derive(Clone, Debug)]
pub struct Route {
    /// Route number (unique key).
    pub number: u32,
    pub name: String,
    pub abbr: String,
    pub color: String,
    pub trains: Vec<ScheduledTrain>
}
impl Route {
    pub fn new(info: routes::Route, trains: Vec<ScheduledTrain>) -> Route {
        Route {
            number: info.number,
            name: info.name,
            abbr: info.abbr,
            color: info.color,
            trains
        }
    }
}

/// One scheduled run of a route.
#[derive(Clone, Debug)]
pub struct ScheduledTrain {
    pub id: String,
    /// Stops the train actually calls at, in order. Run-through stops
    /// (no scheduled time in the feed) are dropped on conversion.
    pub stops: Vec<Stop>
}
impl ScheduledTrain {
    /// True if this train calls at `origin` and, at a strictly later stop,
    /// at `dest`.
    pub fn visits_in_order(&self, origin: &str, dest: &str) -> bool {
        let o = self.stops.iter().position(|s| s.station == origin);
        let d = self.stops.iter().position(|s| s.station == dest);
        match (o, d) {
            (Some(o), Some(d)) => o < d,
            _ => false
        }
    }
}
impl From<sched::SchedTrain> for ScheduledTrain {
    fn from(t: sched::SchedTrain) -> ScheduledTrain {
        let stops = t.stops.into_iter().filter_map(|s| {
            let time = s.orig_time?;
            let day_offset = if time < service_end() { 1 } else { 0 };
            Some(Stop {
                station: s.station,
                time,
                day_offset,
                bike: s.bike,
                load: s.load
            })
        }).collect();
        ScheduledTrain { id: t.id, stops }
    }
}

/// One scheduled stop, with the service-day rollover normalized into
/// `day_offset`.
#[derive(Clone, Debug)]
pub struct Stop {
    pub station: String,
    pub time: NaiveTime,
    /// 0 for the service day itself, 1 for times that wrap past midnight
    /// into the next calendar day.
    pub day_offset: u8,
    pub bike: bool,
    pub load: Option<u32>
}
impl Stop {
    /// Minutes since the start of the service day, rollover included, so
    /// that adjacent stops subtract cleanly across midnight.
    pub fn service_minutes(&self) -> i64 {
        let midnight = NaiveTime::from_hms(0, 0, 0);
        self.day_offset as i64 * 1440 + (self.time - midnight).num_minutes()
    }
}

/// A raw feed estimate, scoped to one origin station.
#[derive(Clone, Debug, PartialEq)]
pub struct Estimate {
    /// Destination station code.
    pub destination_abbr: String,
    /// Minutes until departure, or [`LEAVING`].
    pub minutes: i32,
    pub cars: u32,
    pub bike: bool,
    pub platform: u32
}
impl Estimate {
    pub fn is_leaving(&self) -> bool {
        self.minutes == LEAVING
    }
    pub fn from_line(line: &etd::EtdLine) -> Vec<Estimate> {
        line.estimates.iter().map(|e| Estimate {
            destination_abbr: line.abbreviation.clone(),
            minutes: e.minutes,
            cars: e.cars,
            bike: e.bike,
            platform: e.platform
        }).collect()
    }
}

/// An estimate the resolver has accepted onto a concrete segment, carrying
/// the segment's expected (average) transit minutes.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedEstimate {
    pub estimate: Estimate,
    pub expected: f64
}
