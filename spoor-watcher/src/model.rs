//! Average travel times between adjacent stations, from the static timetable.

use std::collections::HashMap;

use crate::types::Route;

/// Key for a directed station-to-next-station hop, e.g. "RICH-DELN".
pub fn segment_key(origin: &str, dest: &str) -> String {
    format!("{}-{}", origin, dest)
}

/// Expected transit minutes per directed segment, per route: the arithmetic
/// mean of the scheduled inter-stop times across every train on the route.
///
/// Built once per schedule load, not per poll. A route with no trains for
/// the loaded day contributes an empty map.
pub struct TravelTimeModel {
    averages: HashMap<u32, HashMap<String, f64>>
}

impl TravelTimeModel {
    pub fn build(routes: &[Route]) -> Self {
        let mut averages = HashMap::new();
        for route in routes {
            let mut sums: HashMap<String, (i64, u32)> = HashMap::new();
            for train in &route.trains {
                for pair in train.stops.windows(2) {
                    let key = segment_key(&pair[0].station, &pair[1].station);
                    let elapsed = pair[1].service_minutes() - pair[0].service_minutes();
                    let ent = sums.entry(key).or_insert((0, 0));
                    ent.0 += elapsed;
                    ent.1 += 1;
                }
            }
            let route_avgs = sums.into_iter()
                .map(|(key, (sum, count))| (key, sum as f64 / count as f64))
                .collect();
            averages.insert(route.number, route_avgs);
        }
        Self { averages }
    }
    /// Average minutes for `segment` on `route`, if the route's schedule
    /// defines that hop.
    pub fn average(&self, route: u32, segment: &str) -> Option<f64> {
        self.averages.get(&route)?.get(segment).copied()
    }
}
