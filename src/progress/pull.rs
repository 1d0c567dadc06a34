//! Per-layer progress aggregation for image pulls.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::message::{ProgressDetail, ProgressMessage};
use super::ProgressAggregator;

/// Layer status values that count a layer as finished.
pub const TERMINAL_LAYER_STATUSES: [&str; 3] = ["Download complete", "Pull complete", "Already exists"];

/// Default interval between speed recomputations.
pub const DEFAULT_SPEED_WINDOW: Duration = Duration::from_secs(1);

/// Last known state of one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerProgress {
    pub id: String,
    pub status: Option<String>,
    pub progress: Option<String>,
    pub progress_detail: Option<ProgressDetail>,
}

impl LayerProgress {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    /// Overwrite the fields present in `msg`, keep the rest.
    fn merge(&mut self, msg: &ProgressMessage) {
        if let Some(status) = &msg.status {
            self.status = Some(status.clone());
        }
        if let Some(progress) = &msg.progress {
            self.progress = Some(progress.clone());
        }
        if let Some(detail) = msg.progress_detail {
            self.progress_detail = Some(detail);
        }
    }

    /// Whether the layer reached one of [`TERMINAL_LAYER_STATUSES`].
    pub fn is_finished(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| TERMINAL_LAYER_STATUSES.contains(&s))
    }
}

/// Aggregate over all layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallProgress {
    /// 0..=100
    pub percent: u8,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    /// Bytes per second since the pull started
    pub speed: f64,
    pub completed_layers: usize,
    pub layer_count: usize,
}

/// Snapshot of a pull, handed to observers after every event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullStatus {
    pub layers: HashMap<String, LayerProgress>,
    pub overall: OverallProgress,
    pub error: Option<String>,
    pub completed: bool,
}

/// Folds pull events into a [`PullStatus`].
#[derive(Debug, Clone)]
pub struct PullAggregator {
    status: PullStatus,
    started_at: Instant,
    last_speed_at: Instant,
    speed_window: Duration,
}

impl PullAggregator {
    /// Start aggregating a pull that began at `started_at`.
    pub fn new(started_at: Instant) -> Self {
        Self {
            status: PullStatus::default(),
            started_at,
            last_speed_at: started_at,
            speed_window: DEFAULT_SPEED_WINDOW,
        }
    }

    /// Override the minimum interval between speed recomputations.
    pub fn with_speed_window(mut self, window: Duration) -> Self {
        self.speed_window = window;
        self
    }

    fn recompute_totals(&mut self, now: Instant) {
        let mut total_bytes: u64 = 0;
        let mut downloaded_bytes: u64 = 0;
        let mut completed_layers = 0;

        for layer in self.status.layers.values() {
            if let Some(detail) = layer.progress_detail {
                if let Some(total) = detail.total {
                    total_bytes = total_bytes.saturating_add(total.max(0) as u64);
                }
                if let Some(current) = detail.current {
                    downloaded_bytes = downloaded_bytes.saturating_add(current.max(0) as u64);
                }
            }
            if layer.is_finished() {
                completed_layers += 1;
            }
        }

        let layer_count = self.status.layers.len();
        let overall = &mut self.status.overall;
        overall.total_bytes = total_bytes;
        overall.downloaded_bytes = downloaded_bytes;
        overall.completed_layers = completed_layers;
        overall.layer_count = layer_count;

        if total_bytes > 0 {
            overall.percent = ratio_percent(downloaded_bytes as f64, total_bytes as f64);
        } else if layer_count > 0 {
            overall.percent = ratio_percent(completed_layers as f64, layer_count as f64);
        }

        if now.saturating_duration_since(self.last_speed_at) >= self.speed_window {
            let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
            if elapsed > 0.0 {
                overall.speed = downloaded_bytes as f64 / elapsed;
            }
            self.last_speed_at = now;
        }
    }
}

fn ratio_percent(part: f64, whole: f64) -> u8 {
    (part / whole * 100.0).round().clamp(0.0, 100.0) as u8
}

impl ProgressAggregator for PullAggregator {
    type Status = PullStatus;

    fn apply(&mut self, msg: &ProgressMessage, now: Instant) {
        if self.status.completed {
            tracing::debug!(?msg, "Ignoring pull event after completion");
            return;
        }

        if let Some(error) = msg.error_message() {
            tracing::warn!(%error, "Engine reported pull error");
            self.status.error = Some(error);
            return;
        }

        if let Some(id) = &msg.id {
            self.status
                .layers
                .entry(id.clone())
                .or_insert_with(|| LayerProgress::new(id))
                .merge(msg);
        }

        self.recompute_totals(now);
    }

    fn record_malformed(&mut self, raw: &str) {
        tracing::debug!(fragment = %raw, "Pull stream fragment could not be parsed");
    }

    fn status(&self) -> &PullStatus {
        &self.status
    }

    fn error(&self) -> Option<&str> {
        self.status.error.as_deref()
    }

    fn is_completed(&self) -> bool {
        self.status.completed
    }

    fn finish(&mut self, error: Option<String>) {
        if self.status.completed {
            return;
        }
        if error.is_some() {
            self.status.error = error;
        }
        self.status.completed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(json: &str) -> ProgressMessage {
        serde_json::from_str(json).unwrap()
    }

    fn downloading(id: &str, current: i64, total: i64) -> ProgressMessage {
        msg(&format!(
            r#"{{"id":"{}","status":"Downloading","progressDetail":{{"current":{},"total":{}}}}}"#,
            id, current, total
        ))
    }

    #[test]
    fn test_new_status_is_empty() {
        let agg = PullAggregator::new(Instant::now());
        assert!(agg.status().layers.is_empty());
        assert_eq!(agg.status().overall.percent, 0);
        assert!(!agg.is_completed());
        assert!(agg.error().is_none());
    }

    #[test]
    fn test_byte_based_percent() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);

        agg.apply(&downloading("a", 25, 100), start);
        agg.apply(&downloading("b", 0, 100), start);
        assert_eq!(agg.status().overall.total_bytes, 200);
        assert_eq!(agg.status().overall.downloaded_bytes, 25);
        assert_eq!(agg.status().overall.percent, 13);

        agg.apply(&downloading("b", 100, 100), start);
        assert_eq!(agg.status().overall.percent, 63);
    }

    #[test]
    fn test_shallow_merge_keeps_unspecified_fields() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);

        agg.apply(&downloading("a", 10, 50), start);
        agg.apply(&msg(r#"{"id":"a","progress":"[==>   ]"}"#), start);

        let layer = &agg.status().layers["a"];
        assert_eq!(layer.status.as_deref(), Some("Downloading"));
        assert_eq!(layer.progress.as_deref(), Some("[==>   ]"));
        assert_eq!(layer.progress_detail.and_then(|d| d.total), Some(50));
    }

    #[test]
    fn test_layer_count_fallback() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);

        agg.apply(&msg(r#"{"id":"a","status":"Already exists"}"#), start);
        agg.apply(&msg(r#"{"id":"b","status":"Waiting"}"#), start);
        agg.apply(&msg(r#"{"id":"c","status":"Pull complete"}"#), start);

        let overall = &agg.status().overall;
        assert_eq!(overall.layer_count, 3);
        assert_eq!(overall.completed_layers, 2);
        assert_eq!(overall.percent, 67);
    }

    #[test]
    fn test_percent_kept_without_layers() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);
        agg.apply(&msg(r#"{"status":"Pulling from library/nginx"}"#), start);
        assert_eq!(agg.status().overall.percent, 0);
        assert!(agg.status().layers.is_empty());
    }

    #[test]
    fn test_percent_never_exceeds_100() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);
        agg.apply(&downloading("a", 150, 100), start);
        assert_eq!(agg.status().overall.percent, 100);
    }

    #[test]
    fn test_percent_non_decreasing_for_growing_bytes() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);
        let mut last = 0;
        for current in (0..=1000).step_by(37) {
            agg.apply(&downloading("a", current, 1000), start);
            agg.apply(&downloading("b", current / 2, 500), start);
            let percent = agg.status().overall.percent;
            assert!(percent <= 100);
            assert!(percent >= last, "{} regressed to {}", last, percent);
            last = percent;
        }
    }

    #[test]
    fn test_error_event_skips_totals() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);
        agg.apply(&downloading("a", 10, 100), start);

        let mut failing = downloading("a", 90, 100);
        failing.error = Some("manifest unknown".to_string());
        agg.apply(&failing, start);

        assert_eq!(agg.error(), Some("manifest unknown"));
        assert_eq!(agg.status().overall.downloaded_bytes, 10);
    }

    #[test]
    fn test_speed_is_throttled() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);

        agg.apply(&downloading("a", 500, 4000), start + Duration::from_millis(500));
        assert_eq!(agg.status().overall.speed, 0.0);

        agg.apply(&downloading("a", 1000, 4000), start + Duration::from_secs(1));
        assert_eq!(agg.status().overall.speed, 1000.0);

        // Within the window: bytes move, speed does not
        agg.apply(&downloading("a", 3000, 4000), start + Duration::from_millis(1500));
        assert_eq!(agg.status().overall.speed, 1000.0);

        agg.apply(&downloading("a", 4000, 4000), start + Duration::from_secs(2));
        assert_eq!(agg.status().overall.speed, 2000.0);
    }

    #[test]
    fn test_custom_speed_window() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start).with_speed_window(Duration::from_millis(100));
        agg.apply(&downloading("a", 100, 400), start + Duration::from_millis(250));
        assert_eq!(agg.status().overall.speed, 400.0);
    }

    #[test]
    fn test_finish_is_monotonic() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);
        agg.finish(None);
        assert!(agg.is_completed());

        agg.finish(Some("late failure".to_string()));
        assert!(agg.is_completed());
        assert!(agg.error().is_none());

        agg.apply(&downloading("a", 1, 2), start);
        assert!(agg.status().layers.is_empty());
    }

    #[test]
    fn test_huge_totals_saturate() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);
        for id in ["a", "b", "c"] {
            agg.apply(&downloading(id, i64::MAX, i64::MAX), start);
        }
        assert_eq!(agg.status().overall.total_bytes, u64::MAX);
        assert_eq!(agg.status().overall.downloaded_bytes, u64::MAX);
        assert_eq!(agg.status().overall.percent, 100);
        assert_eq!(agg.status().overall.layer_count, 3);
    }

    #[test]
    fn test_negative_totals_are_ignored() {
        let start = Instant::now();
        let mut agg = PullAggregator::new(start);
        agg.apply(&downloading("a", 10, -1), start);
        assert_eq!(agg.status().overall.total_bytes, 0);
        assert_eq!(agg.status().overall.downloaded_bytes, 10);
    }
}
