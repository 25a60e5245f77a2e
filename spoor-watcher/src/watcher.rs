//! The poll loop: fetch, resolve, reconcile, publish.
//!
//! One cycle runs to completion before the next is scheduled, so the
//! engine only ever has a single writer. A failed fetch aborts the whole
//! cycle; previous state (and the previously published snapshot) stand
//! until the next successful poll.

use chrono::Utc;
use log::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::client::BartClient;
use crate::config::Config;
use crate::ctx::SharedSnapshot;
use crate::engine::Engine;
use crate::errors::*;
use crate::resolver::SegmentResolver;

/// Seconds between polls (default value).
static POLL_INTERVAL_SECS: u64 = 10;
/// Consecutive failed cycles before warnings escalate to errors.
static FAILURE_ESCALATION: u32 = 6;

pub struct Watcher {
    client: BartClient,
    resolver: SegmentResolver,
    engine: Engine,
    snapshot: SharedSnapshot,
    interval: Duration,
    failures: u32
}

impl Watcher {
    pub fn new(client: BartClient, resolver: SegmentResolver, snapshot: SharedSnapshot, cfg: &Config) -> Self {
        let interval = Duration::from_secs(cfg.poll_interval_secs.unwrap_or(POLL_INTERVAL_SECS));
        Self {
            client,
            resolver,
            engine: Engine::new(),
            snapshot,
            interval,
            failures: 0
        }
    }
    fn cycle(&mut self) -> WatchResult<()> {
        let feed = self.client.etds()?;
        let resolved = self.resolver.assemble(&feed);
        let now = Utc::now();
        self.engine.apply(now, resolved);
        debug!("cycle done; {} trains live", self.engine.live_count());
        let published = Arc::new(self.engine.snapshot(now));
        *self.snapshot.write().unwrap() = published;
        Ok(())
    }
    pub fn run(mut self) -> Result<()> {
        info!("Running ETD poll loop (every {:?})", self.interval);
        thread::Builder::new()
            .name("spoor-watcher: poll loop".into())
            .spawn(move || {
                loop {
                    match self.cycle() {
                        Ok(_) => {
                            self.failures = 0;
                        },
                        Err(e) => {
                            self.failures += 1;
                            if self.failures >= FAILURE_ESCALATION {
                                error!("ETD fetch still failing after {} attempts: {}", self.failures, e);
                            }
                            else {
                                warn!("ETD fetch failed, keeping previous state: {}", e);
                            }
                        }
                    }
                    thread::sleep(self.interval);
                }
            })?;
        Ok(())
    }
}
