//! Mapping raw estimates onto directed segments.
//!
//! The feed only says "a train for destination D leaves origin O in N
//! minutes". The resolver turns that into "a train is somewhere on the
//! O → next-stop hop", using the static schedule to find the hop and the
//! travel-time model to reject estimates that are plausibly still several
//! segments up the line.

use log::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::errors::*;
use crate::model::{segment_key, TravelTimeModel};
use crate::types::{Estimate, Route, TrackedEstimate};

pub struct SegmentResolver {
    routes: Arc<Vec<Route>>,
    model: TravelTimeModel
}

impl SegmentResolver {
    pub fn new(routes: Arc<Vec<Route>>, model: TravelTimeModel) -> Self {
        Self { routes, model }
    }
    /// Resolves one (origin, destination) line to its directed segment key
    /// and expected transit minutes.
    ///
    /// Candidate routes are those with a scheduled train calling at the
    /// origin strictly before the destination; the first (lowest-numbered)
    /// candidate wins. Express and local variants sharing a number are not
    /// disambiguated.
    pub fn resolve(&self, origin: &str, dest: &str) -> WatchResult<(String, f64)> {
        let mut found = None;
        for route in self.routes.iter() {
            if let Some(train) = route.trains.iter().find(|t| t.visits_in_order(origin, dest)) {
                found = Some((route, train));
                break;
            }
        }
        let (route, train) = found
            .ok_or_else(|| WatchError::NoCandidateRoute {
                origin: origin.into(),
                dest: dest.into()
            })?;
        let next = train.stops.iter().position(|s| s.station == origin)
            .and_then(|i| train.stops.get(i + 1))
            .ok_or_else(|| WatchError::NoNextStop {
                origin: origin.into(),
                route: route.number
            })?;
        let key = segment_key(origin, &next.station);
        let avg = self.model.average(route.number, &key)
            .ok_or_else(|| WatchError::NoSegmentAverage {
                segment: key.clone(),
                route: route.number
            })?;
        Ok((key, avg))
    }
    /// One poll's worth of raw estimates mapped onto segments: segment key
    /// → accepted estimates, sorted nearest-first ([`crate::types::LEAVING`]
    /// at the front).
    ///
    /// A line that cannot be resolved is dropped with a warning; the rest
    /// of the poll is unaffected.
    pub fn assemble(&self, feed: &HashMap<String, Vec<Estimate>>) -> HashMap<String, Vec<TrackedEstimate>> {
        let mut segments: HashMap<String, Vec<TrackedEstimate>> = HashMap::new();
        for (origin, estimates) in feed {
            // Group back into per-destination lines; each line resolves to
            // one segment. BTreeMap so resolution failures log in a stable
            // order.
            let mut lines: BTreeMap<&str, Vec<&Estimate>> = BTreeMap::new();
            for est in estimates {
                lines.entry(&est.destination_abbr).or_insert_with(Vec::new).push(est);
            }
            for (dest, ests) in lines {
                let (key, avg) = match self.resolve(origin, dest) {
                    Ok(x) => x,
                    Err(e) => {
                        warn!("Dropping estimates from {} to {}: {}", origin, dest, e);
                        continue;
                    }
                };
                for est in ests {
                    // Estimates at or past the segment average are probably
                    // still on an earlier segment. LEAVING always passes.
                    if (est.minutes as f64) < avg {
                        segments.entry(key.clone())
                            .or_insert_with(Vec::new)
                            .push(TrackedEstimate {
                                estimate: est.clone(),
                                expected: avg
                            });
                    }
                }
            }
        }
        for list in segments.values_mut() {
            list.sort_by_key(|t| t.estimate.minutes);
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TravelTimeModel;
    use crate::types::{LEAVING, ScheduledTrain, Stop};
    use chrono::NaiveTime;

    fn stop(station: &str, minute: u32) -> Stop {
        Stop {
            station: station.into(),
            time: NaiveTime::from_hms(6, minute, 0),
            day_offset: 0,
            bike: true,
            load: None
        }
    }
    fn est(dest: &str, minutes: i32) -> Estimate {
        Estimate {
            destination_abbr: dest.into(),
            minutes,
            cars: 10,
            bike: true,
            platform: 1
        }
    }
    // Route 1: A -> B -> C, 4 and 6 minutes. Route 2: C -> B -> A.
    fn resolver() -> SegmentResolver {
        let routes = vec![
            Route {
                number: 1,
                name: "A - C".into(),
                abbr: "AC".into(),
                color: "RED".into(),
                trains: vec![ScheduledTrain {
                    id: "T1".into(),
                    stops: vec![stop("A", 0), stop("B", 4), stop("C", 10)]
                }]
            },
            Route {
                number: 2,
                name: "C - A".into(),
                abbr: "CA".into(),
                color: "RED".into(),
                trains: vec![ScheduledTrain {
                    id: "T2".into(),
                    stops: vec![stop("C", 0), stop("B", 6), stop("A", 10)]
                }]
            },
        ];
        let model = TravelTimeModel::build(&routes);
        SegmentResolver::new(Arc::new(routes), model)
    }

    #[test]
    fn resolves_to_next_stop_segment() {
        let r = resolver();
        let (key, avg) = r.resolve("A", "C").unwrap();
        assert_eq!(key, "A-B");
        assert_eq!(avg, 4.0);
        // Direction matters: towards A, the hop out of B is B-A.
        let (key, avg) = r.resolve("B", "A").unwrap();
        assert_eq!(key, "B-A");
        assert_eq!(avg, 4.0);
    }

    #[test]
    fn unreachable_destination_is_data_integrity() {
        let r = resolver();
        match r.resolve("A", "Z") {
            Err(WatchError::NoCandidateRoute { origin, dest }) => {
                assert_eq!(origin, "A");
                assert_eq!(dest, "Z");
            },
            other => panic!("expected NoCandidateRoute, got {:?}", other)
        }
    }

    #[test]
    fn assemble_filters_far_estimates_and_sorts() {
        let r = resolver();
        let mut feed = HashMap::new();
        // A-B averages 4 minutes: 2 accepted, 4 and 9 rejected, LEAVING
        // always accepted and sorted first.
        feed.insert("A".to_string(), vec![est("C", 9), est("C", 2), est("C", LEAVING), est("C", 4)]);
        let segments = r.assemble(&feed);
        let list = &segments["A-B"];
        let minutes: Vec<i32> = list.iter().map(|t| t.estimate.minutes).collect();
        assert_eq!(minutes, vec![LEAVING, 2]);
        assert!(list.iter().all(|t| t.expected == 4.0));
    }

    #[test]
    fn assemble_skips_bad_lines_but_keeps_the_rest() {
        let r = resolver();
        let mut feed = HashMap::new();
        // "Z" is not on any schedule: its line is dropped, C's survives.
        feed.insert("A".to_string(), vec![est("Z", 1), est("C", 2)]);
        let segments = r.assemble(&feed);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments["A-B"].len(), 1);
    }

    #[test]
    fn opposite_directions_resolve_to_distinct_segments() {
        let r = resolver();
        let mut feed = HashMap::new();
        feed.insert("C".to_string(), vec![est("A", 3)]);
        feed.insert("A".to_string(), vec![est("C", 1)]);
        let segments = r.assemble(&feed);
        assert!(segments.contains_key("A-B"));
        assert!(segments.contains_key("C-B"));
    }
}
