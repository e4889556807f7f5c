use std::collections::BTreeMap;
use std::time::Instant;

/// Stages the display node times, in the order a triple passes them.
const STAGE_ORDER: [&str; 3] = ["sync", "annotate", "publish"];

/// Cross-cutting logger for display node events.
///
/// The node reports stage timings (`sync`, `annotate`, `publish`), queue
/// backlogs (`*_queue`) and per-frame content (`*_count`) through it.
pub trait NodeLogger: Send {
    /// Report that another annotated frame went out.
    fn published(&mut self, total: usize);

    /// Record how long a named stage took for one message.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullNodeLogger;

impl NodeLogger for NullNodeLogger {
    fn published(&mut self, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count, sum and peak of one series.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Series {
    pub count: usize,
    pub sum: f64,
    pub max: f64,
}

impl Series {
    fn record(&mut self, value: f64) {
        self.max = if self.count == 0 { value } else { self.max.max(value) };
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// CLI logger for the display node: logs every `throttle_frames`
/// published frames and reports latency, backlog and frame content when
/// the node shuts down.
pub struct StdoutNodeLogger {
    throttle_frames: usize,
    stages: BTreeMap<String, Series>,
    metrics: BTreeMap<String, Series>,
    start_time: Instant,
    total_published: usize,
}

impl StdoutNodeLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            total_published: 0,
        }
    }

    pub fn stage(&self, stage: &str) -> Option<Series> {
        self.stages.get(stage).copied()
    }

    pub fn series(&self, name: &str) -> Option<Series> {
        self.metrics.get(name).copied()
    }

    /// Returns the formatted summary, or `None` before the first message.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }
        let received = self.stage("sync").map_or(0, |s| s.count);

        let secs = self.start_time.elapsed().as_secs_f64();
        let published = self.total_published;
        let mut lines = vec![format!(
            "Display node: {published} annotated frames from {received} messages in {secs:.1}s"
        )];
        if published > 0 && secs > 0.0 {
            lines.push(format!("  rate: {:.1} frames/s", published as f64 / secs));
        }

        lines.push("  latency:".to_string());
        let ordered = STAGE_ORDER
            .iter()
            .filter_map(|&name| self.stages.get(name).map(|s| (name, s)));
        let extra = self
            .stages
            .iter()
            .filter(|(name, _)| !STAGE_ORDER.contains(&name.as_str()))
            .map(|(name, s)| (name.as_str(), s));
        for (name, s) in ordered.chain(extra) {
            lines.push(format!(
                "    {name:<9} avg {:.2}ms  worst {:.2}ms  ({} calls)",
                s.mean(),
                s.max,
                s.count
            ));
        }

        let sections = [("backlog", "_queue"), ("per frame", "_count")];
        for (title, suffix) in sections {
            let rows: Vec<String> = self
                .metrics
                .iter()
                .filter_map(|(name, s)| name.strip_suffix(suffix).map(|short| (short, s)))
                .map(|(short, s)| format!("    {short:<12} avg {:.1}  peak {:.0}", s.mean(), s.max))
                .collect();
            if !rows.is_empty() {
                lines.push(format!("  {title}:"));
                lines.extend(rows);
            }
        }

        let other: Vec<String> = self
            .metrics
            .iter()
            .filter(|(name, _)| !name.ends_with("_queue") && !name.ends_with("_count"))
            .map(|(name, s)| format!("    {name:<12} avg {:.1}  peak {:.0}", s.mean(), s.max))
            .collect();
        if !other.is_empty() {
            lines.push("  other:".to_string());
            lines.extend(other);
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutNodeLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl NodeLogger for StdoutNodeLogger {
    fn published(&mut self, total: usize) {
        self.total_published = total;
        if total % self.throttle_frames == 0 {
            log::info!("Published {total} annotated frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages.entry(stage.to_string()).or_default().record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
