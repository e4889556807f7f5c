use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::fusion::domain::messages::Stamped;
use crate::shared::constants::{DEFAULT_QUEUE_DEPTH, DEFAULT_SYNC_TOLERANCE_MS};

/// Queue bound and matching tolerance for [`ApproximateTimeSynchronizer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Messages kept per stream; the oldest is evicted beyond this.
    pub queue_depth: usize,
    /// Largest stamp spread allowed inside one emitted triple, in seconds.
    #[serde(serialize_with = "secs_out", deserialize_with = "secs_in")]
    pub tolerance: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_depth: DEFAULT_QUEUE_DEPTH,
            tolerance: Duration::from_millis(DEFAULT_SYNC_TOLERANCE_MS),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_depth == 0 {
            return Err("queue_depth must be at least 1".into());
        }
        Ok(())
    }
}

fn secs_out<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

fn secs_in<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(d)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

/// Pairs messages from three independently timed streams.
///
/// Each stream has its own stamp-ordered queue. After every push the
/// synchronizer looks for one message per stream whose stamps all lie
/// within `tolerance` of each other; among such triples the one with the
/// smallest total pairwise spread wins (earliest on ties). The winning
/// messages are removed, along with anything older in their queues, so a
/// message is emitted at most once and output stamps never go backwards.
pub struct ApproximateTimeSynchronizer<A, B, C> {
    config: SyncConfig,
    first: VecDeque<A>,
    second: VecDeque<B>,
    third: VecDeque<C>,
    discarded: usize,
}

impl<A: Stamped, B: Stamped, C: Stamped> ApproximateTimeSynchronizer<A, B, C> {
    pub fn new(config: SyncConfig) -> Self {
        let depth = config.queue_depth.max(1);
        Self {
            first: VecDeque::with_capacity(depth),
            second: VecDeque::with_capacity(depth),
            third: VecDeque::with_capacity(depth),
            config,
            discarded: 0,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn push_first(&mut self, msg: A) -> Option<(A, B, C)> {
        self.discarded += enqueue(&mut self.first, msg, self.config.queue_depth);
        self.try_match()
    }

    pub fn push_second(&mut self, msg: B) -> Option<(A, B, C)> {
        self.discarded += enqueue(&mut self.second, msg, self.config.queue_depth);
        self.try_match()
    }

    pub fn push_third(&mut self, msg: C) -> Option<(A, B, C)> {
        self.discarded += enqueue(&mut self.third, msg, self.config.queue_depth);
        self.try_match()
    }

    /// Pending messages per stream.
    pub fn queue_lens(&self) -> (usize, usize, usize) {
        (self.first.len(), self.second.len(), self.third.len())
    }

    /// Messages evicted or skipped without ever being emitted.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    fn try_match(&mut self) -> Option<(A, B, C)> {
        let tolerance = self.config.tolerance;
        let mut best: Option<(usize, usize, usize, Duration)> = None;

        for (i, a) in self.first.iter().enumerate() {
            let ta = a.stamp();
            for (j, b) in self.second.iter().enumerate() {
                let tb = b.stamp();
                if ta.abs_diff(tb) > tolerance {
                    continue;
                }
                for (k, c) in self.third.iter().enumerate() {
                    let tc = c.stamp();
                    if ta.abs_diff(tc) > tolerance || tb.abs_diff(tc) > tolerance {
                        continue;
                    }
                    let cost = ta.abs_diff(tb) + tb.abs_diff(tc) + ta.abs_diff(tc);
                    if best.map_or(true, |(.., lowest)| cost < lowest) {
                        best = Some((i, j, k, cost));
                    }
                }
            }
        }

        let (i, j, k, cost) = best?;
        self.discarded += i + j + k;
        let a = take_at(&mut self.first, i)?;
        let b = take_at(&mut self.second, j)?;
        let c = take_at(&mut self.third, k)?;
        log::debug!(
            "Matched triple at {} (pairwise spread {:?}, skipped {})",
            a.stamp(),
            cost,
            i + j + k
        );
        Some((a, b, c))
    }
}

/// Inserts in stamp order and evicts from the front past `depth`.
/// Returns how many messages were evicted.
fn enqueue<T: Stamped>(queue: &mut VecDeque<T>, msg: T, depth: usize) -> usize {
    let stamp = msg.stamp();
    let at = queue
        .iter()
        .rposition(|queued| queued.stamp() <= stamp)
        .map_or(0, |p| p + 1);
    queue.insert(at, msg);

    let mut evicted = 0;
    while queue.len() > depth.max(1) {
        queue.pop_front();
        evicted += 1;
    }
    if evicted > 0 {
        log::warn!("Sync queue full, evicted {evicted} message(s)");
    }
    evicted
}

/// Drops everything before `index` and pops the element at it.
fn take_at<T>(queue: &mut VecDeque<T>, index: usize) -> Option<T> {
    queue.drain(..index);
    queue.pop_front()
}
