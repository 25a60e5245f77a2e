//! The identity-preserving reconciliation engine.
//!
//! The feed never names a train. All it gives us, per origin, is an ordered
//! set of "minutes remaining" numbers that appear, shift and vanish between
//! polls. This module keeps a stable identity for each physical train
//! anyway, by treating position in the nearest-first per-segment list as a
//! surrogate key and diffing successive polls.

use chrono::{DateTime, Utc};
use log::*;
use serde_derive::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::model::segment_key;
use crate::types::TrackedEstimate;

pub type TrainId = u64;

/// One observed sample in a train's history.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HistorySample {
    pub timestamp: DateTime<Utc>,
    pub minutes: i32
}

/// Per-identity record of everything we've seen a train do on its segment.
///
/// The identity is process-local and opaque; it exists only so that the
/// same physical train keeps the same record across polls. Once retired a
/// record is dropped from live tracking and never mutated again.
pub struct TrainRecord {
    pub id: TrainId,
    pub origin: String,
    pub dest: String,
    pub cars: u32,
    /// The segment's expected (average) transit minutes at creation time.
    pub expected: f64,
    pub created: DateTime<Utc>,
    updates: Vec<HistorySample>
}

impl TrainRecord {
    fn new(id: TrainId, origin: &str, dest: &str, est: &TrackedEstimate, now: DateTime<Utc>) -> Self {
        let mut ret = Self {
            id,
            origin: origin.into(),
            dest: dest.into(),
            cars: est.estimate.cars,
            expected: est.expected,
            created: now,
            updates: vec![]
        };
        ret.update(now, est.estimate.minutes);
        ret
    }
    pub fn segment(&self) -> String {
        segment_key(&self.origin, &self.dest)
    }
    /// Appends a sample, unless the value hasn't changed since the last
    /// one. Returns whether anything was recorded.
    pub fn update(&mut self, now: DateTime<Utc>, minutes: i32) -> bool {
        if self.updates.last().map(|u| u.minutes) == Some(minutes) {
            return false;
        }
        self.updates.push(HistorySample { timestamp: now, minutes });
        true
    }
    pub fn latest_minutes(&self) -> Option<i32> {
        self.updates.last().map(|u| u.minutes)
    }
    pub fn history(&self) -> &[HistorySample] {
        &self.updates
    }
    /// Dumps the full history at debug level; done once when the train
    /// leaves tracking.
    pub fn log_history(&self) {
        debug!("stats for train {} ({}):", self.id, self.segment());
        let mut prev: Option<&HistorySample> = None;
        for upd in &self.updates {
            match prev {
                Some(p) => {
                    let gap = upd.timestamp.signed_duration_since(p.timestamp).num_seconds();
                    debug!("[{}] {}m (diff: {}s)", upd.timestamp.format("%m/%d@%H:%M:%S"), upd.minutes, gap);
                    if upd.minutes > p.minutes {
                        debug!("!!! train time increased ^^^");
                    }
                },
                None => {
                    debug!("[{}] {}m", upd.timestamp.format("%m/%d@%H:%M:%S"), upd.minutes);
                }
            }
            prev = Some(upd);
        }
    }
}

/// What one segment's diff decided.
#[derive(Debug, PartialEq)]
pub struct Reconciliation {
    /// Identities retired off the front of the queue.
    pub departed: Vec<TrainId>,
    /// The queue after retirement, order untouched. Arrivals are appended
    /// at the tail by the caller once identities are allocated.
    pub survivors: Vec<TrainId>,
    /// Positional minute updates for the overlapping prefix.
    pub updates: Vec<(TrainId, i32)>,
    /// Number of trailing entries in the current list with no existing
    /// identity.
    pub arrivals: usize
}

/// Diffs one segment's previous and current estimate lists against its slot
/// queue. Pure: no clock, no I/O, no shared state.
///
/// Both lists are sorted nearest-first, so every `LEAVING` entry sits at
/// the front. If fewer trains are reported leaving now than before, that
/// many have completed the segment: they come off the front of the queue.
/// Any growth at the tail is new arrivals.
///
/// Position is a sound surrogate for identity only while trains cannot
/// overtake on a segment. Plenty of BART has more than two tracks, so this
/// is known to be wrong sometimes; it is the accepted limitation of the
/// design, not something to paper over here.
pub fn reconcile(previous: &[TrackedEstimate], current: &[TrackedEstimate], queue: &[TrainId]) -> Reconciliation {
    if previous == current {
        return Reconciliation {
            departed: vec![],
            survivors: queue.to_vec(),
            updates: vec![],
            arrivals: 0
        };
    }
    let old_leaving = previous.iter().filter(|t| t.estimate.is_leaving()).count();
    let new_leaving = current.iter().filter(|t| t.estimate.is_leaving()).count();
    let departures = old_leaving.saturating_sub(new_leaving).min(queue.len());
    let departed = queue[..departures].to_vec();
    let survivors = queue[departures..].to_vec();
    let updates = survivors.iter()
        .zip(current.iter())
        .map(|(id, t)| (*id, t.estimate.minutes))
        .collect();
    let arrivals = current.len().saturating_sub(survivors.len());
    Reconciliation { departed, survivors, updates, arrivals }
}

/// Owns every live [`TrainRecord`] and slot queue. Single writer: exactly
/// one poll cycle calls [`Engine::apply`] at a time, and readers only ever
/// see the immutable snapshots it emits.
pub struct Engine {
    next_id: TrainId,
    trains: HashMap<TrainId, TrainRecord>,
    slots: HashMap<String, Vec<TrainId>>,
    last: HashMap<String, Vec<TrackedEstimate>>
}

impl Engine {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            trains: HashMap::new(),
            slots: HashMap::new(),
            last: HashMap::new()
        }
    }
    pub fn live_count(&self) -> usize {
        self.trains.len()
    }
    pub fn train(&self, id: TrainId) -> Option<&TrainRecord> {
        self.trains.get(&id)
    }
    pub fn slot_queue(&self, segment: &str) -> &[TrainId] {
        self.slots.get(segment).map(|q| &q[..]).unwrap_or(&[])
    }
    /// Applies one resolved poll, segment by segment, across the union of
    /// segments seen this cycle and last.
    pub fn apply(&mut self, now: DateTime<Utc>, snapshot: HashMap<String, Vec<TrackedEstimate>>) {
        let keys: BTreeSet<String> = self.last.keys()
            .chain(snapshot.keys())
            .cloned()
            .collect();
        let empty = vec![];
        for key in keys {
            let current = snapshot.get(&key).unwrap_or(&empty);
            let previous = self.last.get(&key).unwrap_or(&empty);
            let queue = self.slots.get(&key).cloned().unwrap_or_default();
            let rec = reconcile(previous, current, &queue);
            for id in rec.departed {
                self.retire(id);
            }
            for (id, minutes) in rec.updates {
                if let Some(train) = self.trains.get_mut(&id) {
                    train.update(now, minutes);
                }
            }
            let mut new_queue = rec.survivors;
            let first_arrival = current.len() - rec.arrivals;
            for est in &current[first_arrival..] {
                let id = self.add_train(&key, est, now);
                new_queue.push(id);
            }
            if new_queue.is_empty() {
                self.slots.remove(&key);
            }
            else {
                self.slots.insert(key, new_queue);
            }
        }
        self.last = snapshot;
    }
    fn add_train(&mut self, segment: &str, est: &TrackedEstimate, now: DateTime<Utc>) -> TrainId {
        let id = self.next_id;
        self.next_id += 1;
        let (origin, dest) = split_key(segment);
        debug!("tracking new train {} on {} ({}m)", id, segment, est.estimate.minutes);
        self.trains.insert(id, TrainRecord::new(id, origin, dest, est, now));
        id
    }
    fn retire(&mut self, id: TrainId) {
        if let Some(train) = self.trains.remove(&id) {
            debug!("invalidating train {} ({})", id, train.segment());
            train.log_history();
        }
    }
    /// Builds the immutable read view of everything currently live.
    pub fn snapshot(&self, generated: DateTime<Utc>) -> LiveSnapshot {
        let mut trains: Vec<TrainView> = self.trains.values()
            .map(TrainView::from)
            .collect();
        trains.sort_by_key(|t| t.id);
        LiveSnapshot {
            generated: Some(generated),
            trains
        }
    }
}

fn split_key(key: &str) -> (&str, &str) {
    let mut it = key.splitn(2, '-');
    (it.next().unwrap_or(""), it.next().unwrap_or(""))
}

/// Read-only view of one live train, as served to consumers.
#[derive(Serialize, Clone, Debug)]
pub struct TrainView {
    pub id: TrainId,
    pub origin_abbr: String,
    pub destination_abbr: String,
    pub cars: u32,
    pub average_minutes: f64,
    pub created: DateTime<Utc>,
    pub updates: Vec<HistorySample>
}
impl TrainView {
    pub fn latest_minutes(&self) -> Option<i32> {
        self.updates.last().map(|u| u.minutes)
    }
}
impl<'a> From<&'a TrainRecord> for TrainView {
    fn from(t: &'a TrainRecord) -> TrainView {
        TrainView {
            id: t.id,
            origin_abbr: t.origin.clone(),
            destination_abbr: t.dest.clone(),
            cars: t.cars,
            average_minutes: t.expected,
            created: t.created,
            updates: t.history().to_vec()
        }
    }
}

/// One complete, internally consistent poll cycle's worth of live trains.
/// Published whole; never mutated after publication.
#[derive(Serialize, Clone, Debug, Default)]
pub struct LiveSnapshot {
    pub generated: Option<DateTime<Utc>>,
    pub trains: Vec<TrainView>
}
impl LiveSnapshot {
    pub fn train(&self, id: TrainId) -> Option<&TrainView> {
        self.trains.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Estimate, LEAVING};
    use chrono::TimeZone;

    fn te(minutes: i32) -> TrackedEstimate {
        TrackedEstimate {
            estimate: Estimate {
                destination_abbr: "Y".into(),
                minutes,
                cars: 10,
                bike: true,
                platform: 1
            },
            expected: 10.0
        }
    }
    fn list(minutes: &[i32]) -> Vec<TrackedEstimate> {
        minutes.iter().cloned().map(te).collect()
    }
    fn snap(minutes: &[i32]) -> HashMap<String, Vec<TrackedEstimate>> {
        let mut map = HashMap::new();
        map.insert("X-Y".to_string(), list(minutes));
        map
    }
    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp(1_700_000_000 + secs, 0)
    }
    fn minutes_of(engine: &Engine, id: TrainId) -> Option<i32> {
        engine.train(id).and_then(|t| t.latest_minutes())
    }

    #[test]
    fn leaving_train_departs_and_tail_grows() {
        // previous [-1, 5] -> current [3, 8]: the leaving train is gone,
        // the 5-minute train has advanced to 3, and an 8-minute train has
        // come into range.
        let mut engine = Engine::new();
        engine.apply(at(0), snap(&[LEAVING, 5]));
        let (first, second) = (0, 1);
        assert_eq!(engine.slot_queue("X-Y"), &[first, second]);

        engine.apply(at(10), snap(&[3, 8]));
        assert!(engine.train(first).is_none());
        assert_eq!(minutes_of(&engine, second), Some(3));
        let third = 2;
        assert_eq!(minutes_of(&engine, third), Some(8));
        assert_eq!(engine.slot_queue("X-Y"), &[second, third]);
        assert_eq!(engine.live_count(), 2);
    }

    #[test]
    fn identical_snapshot_is_a_no_op() {
        let mut engine = Engine::new();
        engine.apply(at(0), snap(&[LEAVING, 4, 9]));
        let histories: Vec<usize> = (0..3)
            .map(|id| engine.train(id).map(|t| t.history().len()).unwrap_or(0))
            .collect();

        engine.apply(at(10), snap(&[LEAVING, 4, 9]));
        assert_eq!(engine.live_count(), 3);
        assert_eq!(engine.slot_queue("X-Y"), &[0, 1, 2]);
        for (id, before) in histories.into_iter().enumerate() {
            assert_eq!(engine.train(id as TrainId).map(|t| t.history().len()), Some(before));
        }
    }

    #[test]
    fn growth_without_departures_appends_only() {
        // previous [4] -> current [4, 7, 9]: no departures, the existing
        // record is untouched (same value), two arrivals at the tail.
        let mut engine = Engine::new();
        engine.apply(at(0), snap(&[4]));
        engine.apply(at(10), snap(&[4, 7, 9]));
        assert_eq!(engine.slot_queue("X-Y"), &[0, 1, 2]);
        assert_eq!(engine.train(0).map(|t| t.history().len()), Some(1));
        assert_eq!(minutes_of(&engine, 1), Some(7));
        assert_eq!(minutes_of(&engine, 2), Some(9));
    }

    #[test]
    fn queue_length_tracks_estimate_list_length() {
        let mut engine = Engine::new();
        let polls: Vec<Vec<i32>> = vec![
            vec![LEAVING, 2, 6],
            vec![LEAVING, LEAVING, 4, 8],
            vec![1, 5],
            vec![LEAVING, 3, 7, 11],
        ];
        for (i, poll) in polls.iter().enumerate() {
            engine.apply(at(i as i64 * 10), snap(poll));
            assert_eq!(engine.slot_queue("X-Y").len(), poll.len());
        }
    }

    #[test]
    fn surviving_order_is_never_permuted() {
        let mut engine = Engine::new();
        engine.apply(at(0), snap(&[LEAVING, LEAVING, 3, 6]));
        let queue_before: Vec<TrainId> = engine.slot_queue("X-Y").to_vec();

        // One of the two leaving trains departs; everyone else advances.
        engine.apply(at(10), snap(&[LEAVING, 2, 5]));
        let queue_after = engine.slot_queue("X-Y");
        // The survivors are exactly the old queue minus its head, in order.
        assert_eq!(queue_after, &queue_before[1..]);
    }

    #[test]
    fn departures_bounded_by_old_leaving_count() {
        // More leaving trains than before: nobody departs.
        let rec = reconcile(&list(&[LEAVING, 5]), &list(&[LEAVING, LEAVING, 4]), &[7, 8]);
        assert_eq!(rec.departed, Vec::<TrainId>::new());
        assert_eq!(rec.survivors, vec![7, 8]);
        assert_eq!(rec.arrivals, 1);

        // All leaving trains gone at once.
        let rec = reconcile(&list(&[LEAVING, LEAVING, 6]), &list(&[5]), &[1, 2, 3]);
        assert_eq!(rec.departed, vec![1, 2]);
        assert_eq!(rec.survivors, vec![3]);
        assert_eq!(rec.updates, vec![(3, 5)]);
        assert_eq!(rec.arrivals, 0);
    }

    #[test]
    fn history_never_repeats_consecutive_values() {
        let mut engine = Engine::new();
        engine.apply(at(0), snap(&[6]));
        engine.apply(at(10), snap(&[6, 9]));
        engine.apply(at(20), snap(&[5, 9]));
        engine.apply(at(30), snap(&[5, 8]));
        for id in 0..2 {
            let hist = engine.train(id).map(|t| t.history().to_vec()).unwrap_or_default();
            assert!(!hist.is_empty());
            for win in hist.windows(2) {
                assert_ne!(win[0].minutes, win[1].minutes);
            }
        }
        assert_eq!(minutes_of(&engine, 0), Some(5));
        assert_eq!(minutes_of(&engine, 1), Some(8));
    }

    #[test]
    fn segments_are_independent() {
        let mut engine = Engine::new();
        let mut map = HashMap::new();
        map.insert("X-Y".to_string(), list(&[LEAVING]));
        map.insert("Y-Z".to_string(), list(&[2]));
        engine.apply(at(0), map);

        let mut map = HashMap::new();
        // X-Y's leaving train departs; Y-Z just ticks down.
        map.insert("Y-Z".to_string(), list(&[1]));
        engine.apply(at(10), map);
        assert_eq!(engine.slot_queue("X-Y"), &[] as &[TrainId]);
        assert_eq!(engine.slot_queue("Y-Z").len(), 1);
        assert_eq!(engine.live_count(), 1);
    }

    #[test]
    fn snapshot_reflects_one_complete_cycle() {
        let mut engine = Engine::new();
        engine.apply(at(0), snap(&[LEAVING, 5]));
        let snap1 = engine.snapshot(at(0));
        assert_eq!(snap1.trains.len(), 2);

        engine.apply(at(10), snap(&[3, 8]));
        let snap2 = engine.snapshot(at(10));
        // The old snapshot is unaffected by the new cycle.
        assert_eq!(snap1.trains.len(), 2);
        assert_eq!(snap1.train(0).and_then(|t| t.latest_minutes()), Some(LEAVING));
        assert!(snap2.train(0).is_none());
        assert_eq!(snap2.train(1).and_then(|t| t.latest_minutes()), Some(3));
        assert_eq!(snap2.train(2).and_then(|t| t.latest_minutes()), Some(8));
    }
}
