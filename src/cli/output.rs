//! Terminal output for running operations.
//!
//! Printers remember what they already showed and only print what changed
//! since the previous snapshot.

use std::collections::HashMap;

use crate::engine::OperationObserver;
use crate::progress::{BuildStatus, PullStatus};

/// Prints layer status changes and overall percentage for a pull.
#[derive(Debug, Default)]
pub struct PullPrinter {
    layer_status: HashMap<String, String>,
    last_percent: Option<u8>,
}

impl PullPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines describing what changed since the last call.
    pub fn updates(&mut self, status: &PullStatus) -> Vec<String> {
        let mut lines = Vec::new();

        let mut ids: Vec<&String> = status.layers.keys().collect();
        ids.sort();
        for id in ids {
            let Some(text) = status.layers[id].status.as_deref() else {
                continue;
            };
            if self.layer_status.get(id).map(String::as_str) != Some(text) {
                self.layer_status.insert(id.clone(), text.to_string());
                lines.push(format!("{}: {}", id, text));
            }
        }

        let overall = &status.overall;
        if overall.layer_count > 0 && self.last_percent != Some(overall.percent) {
            self.last_percent = Some(overall.percent);
            lines.push(format!(
                "Progress: {}% ({}/{} layers, {}/s)",
                overall.percent,
                overall.completed_layers,
                overall.layer_count,
                format_bytes(overall.speed.max(0.0) as u64)
            ));
        }

        lines
    }
}

impl OperationObserver<PullStatus> for PullPrinter {
    fn on_progress(&mut self, status: &PullStatus) {
        for line in self.updates(status) {
            println!("{}", line);
        }
    }
}

/// Prints build log lines as they are appended.
#[derive(Debug, Default)]
pub struct BuildPrinter {
    printed: usize,
}

impl BuildPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log lines not yet returned by a previous call.
    pub fn updates<'a>(&mut self, status: &'a BuildStatus) -> &'a [String] {
        let start = self.printed.min(status.logs.len());
        self.printed = status.logs.len();
        &status.logs[start..]
    }

    fn flush(&mut self, status: &BuildStatus) {
        for line in self.updates(status) {
            println!("{}", line);
        }
    }
}

impl OperationObserver<BuildStatus> for BuildPrinter {
    fn on_progress(&mut self, status: &BuildStatus) {
        self.flush(status);
    }

    fn on_complete(&mut self, status: &BuildStatus) {
        self.flush(status);
    }

    fn on_error(&mut self, _error: &crate::error::BerthError, status: &BuildStatus) {
        self.flush(status);
    }
}

/// Human-readable byte count using binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{LayerProgress, OverallProgress};

    fn layer(id: &str, status: &str) -> (String, LayerProgress) {
        (
            id.to_string(),
            LayerProgress {
                id: id.to_string(),
                status: Some(status.to_string()),
                ..LayerProgress::default()
            },
        )
    }

    #[test]
    fn test_pull_printer_reports_changes_only() {
        let mut printer = PullPrinter::new();
        let mut status = PullStatus {
            layers: [layer("b", "Waiting"), layer("a", "Downloading")]
                .into_iter()
                .collect(),
            overall: OverallProgress {
                percent: 10,
                layer_count: 2,
                ..OverallProgress::default()
            },
            ..PullStatus::default()
        };

        assert_eq!(
            printer.updates(&status),
            vec![
                "a: Downloading".to_string(),
                "b: Waiting".to_string(),
                "Progress: 10% (0/2 layers, 0 B/s)".to_string(),
            ]
        );
        assert!(printer.updates(&status).is_empty());

        status.layers.insert("b".to_string(), layer("b", "Pull complete").1);
        status.overall.percent = 60;
        status.overall.completed_layers = 1;
        status.overall.speed = 2048.0;
        assert_eq!(
            printer.updates(&status),
            vec![
                "b: Pull complete".to_string(),
                "Progress: 60% (1/2 layers, 2.0 KiB/s)".to_string(),
            ]
        );
    }

    #[test]
    fn test_build_printer_returns_new_lines() {
        let mut printer = BuildPrinter::new();
        let mut status = BuildStatus::default();
        status.logs.push("one".to_string());
        assert_eq!(printer.updates(&status), ["one".to_string()]);

        status.logs.push("two".to_string());
        status.logs.push("three".to_string());
        assert_eq!(printer.updates(&status), ["two".to_string(), "three".to_string()]);
        assert!(printer.updates(&status).is_empty());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
