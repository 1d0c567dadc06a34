//! Flat log aggregation for image builds.

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::message::ProgressMessage;
use super::ProgressAggregator;
use crate::stream::unescape_unicode;

static SHORT_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9a-f]{12}\b").expect("Invalid short id regex"));

/// Visual tag prefixed to a build log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    Step,
    Built,
    Tagged,
    Running,
    Removed,
    LayerId,
    Arrow,
    Pulling,
    Downloaded,
    Extracting,
    PullComplete,
    AlreadyExists,
    UpToDate,
    Digest,
    PullStatus,
    /// Status line matching no marker
    Pending,
    Error,
    Complete,
    Unparsed,
    Unrecognized,
}

impl LogTag {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogTag::Step => "🔨",
            LogTag::Built => "✅",
            LogTag::Tagged => "🏷️",
            LogTag::Running => "⚙️",
            LogTag::Removed => "🧹",
            LogTag::LayerId => "📦",
            LogTag::Arrow => "➡️",
            LogTag::Pulling => "⬇️",
            LogTag::Downloaded => "📥",
            LogTag::Extracting => "📂",
            LogTag::PullComplete => "✔️",
            LogTag::AlreadyExists => "♻️",
            LogTag::UpToDate => "👌",
            LogTag::Digest => "🔑",
            LogTag::PullStatus => "ℹ️",
            LogTag::Pending => "⏳",
            LogTag::Error => "❌",
            LogTag::Complete => "🎉",
            LogTag::Unparsed => "⚠️",
            LogTag::Unrecognized => "❔",
        }
    }

    /// Render `text` with this tag in front.
    pub fn tag(&self, text: &str) -> String {
        format!("{} {}", self.prefix(), text)
    }
}

/// Markers for `stream` lines, checked in order.
const STREAM_MARKERS: [(&str, LogTag); 5] = [
    ("Step ", LogTag::Step),
    ("Successfully built", LogTag::Built),
    ("Successfully tagged", LogTag::Tagged),
    ("Running in", LogTag::Running),
    ("Removed intermediate container", LogTag::Removed),
];

/// Markers for pull-during-build `status` lines, checked in order.
const STATUS_MARKERS: [(&str, LogTag); 8] = [
    ("Pulling", LogTag::Pulling),
    ("Downloaded", LogTag::Downloaded),
    ("Extracting", LogTag::Extracting),
    ("Pull complete", LogTag::PullComplete),
    ("Already exists", LogTag::AlreadyExists),
    ("Image is up to date", LogTag::UpToDate),
    ("Digest:", LogTag::Digest),
    ("Status:", LogTag::PullStatus),
];

/// Classify a build output line. `None` means it is logged verbatim.
pub fn classify_stream_line(line: &str) -> Option<LogTag> {
    if let Some((_, tag)) = STREAM_MARKERS.iter().find(|(marker, _)| line.contains(marker)) {
        return Some(*tag);
    }
    if SHORT_ID_REGEX.is_match(line) {
        return Some(LogTag::LayerId);
    }
    if line.contains("---") {
        return Some(LogTag::Arrow);
    }
    None
}

/// Classify the status text of a pull line emitted during a build.
pub fn classify_status_line(status: &str) -> LogTag {
    STATUS_MARKERS
        .iter()
        .find(|(marker, _)| status.contains(marker))
        .map(|(_, tag)| *tag)
        .unwrap_or(LogTag::Pending)
}

/// Snapshot of a build, handed to observers after every event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatus {
    /// Append-only, in decode order
    pub logs: Vec<String>,
    pub error: Option<String>,
    pub completed: bool,
    /// Id from the final `aux` event, when the engine sent one
    pub image_id: Option<String>,
}

/// Folds build events into a [`BuildStatus`].
#[derive(Debug, Clone, Default)]
pub struct BuildAggregator {
    status: BuildStatus,
}

impl BuildAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, line: String) {
        tracing::debug!(%line, "Build log");
        self.status.logs.push(line);
    }
}

impl ProgressAggregator for BuildAggregator {
    type Status = BuildStatus;

    fn apply(&mut self, msg: &ProgressMessage, _now: Instant) {
        if self.status.completed {
            tracing::debug!(?msg, "Ignoring build event after completion");
            return;
        }

        if let Some(error) = msg.error_message() {
            tracing::warn!(%error, "Engine reported build error");
            self.push(LogTag::Error.tag(&format!("Error: {}", error)));
            self.status.error = Some(error);
            return;
        }

        if let Some(stream) = &msg.stream {
            let text = unescape_unicode(stream.trim());
            if text.is_empty() {
                return;
            }
            let line = match classify_stream_line(&text) {
                Some(tag) => tag.tag(&text),
                None => text,
            };
            self.push(line);
            return;
        }

        if let Some(status) = &msg.status {
            let mut line = match &msg.id {
                Some(id) => format!("{}: {}", id, status),
                None => status.clone(),
            };
            if let Some(progress) = msg.progress.as_deref().filter(|p| !p.is_empty()) {
                line.push(' ');
                line.push_str(progress);
            }
            let tagged = classify_status_line(status).tag(&line);
            self.push(tagged);
            return;
        }

        if let Some(image_id) = msg.built_image_id() {
            self.status.image_id = Some(image_id.to_string());
            self.push(LogTag::Complete.tag(&format!("Build complete: {}", image_id)));
            return;
        }

        // Whatever is left (id, progress detail, aux without ID, unknown
        // keys) is listed field by field.
        if let Ok(Value::Object(fields)) = serde_json::to_value(msg) {
            if fields.is_empty() {
                return;
            }
            let fields = fields
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join(", ");
            self.push(LogTag::Unrecognized.tag(&format!("Unrecognized event: {}", fields)));
        }
    }

    fn record_malformed(&mut self, raw: &str) {
        if self.status.completed {
            return;
        }
        self.push(LogTag::Unparsed.tag(&format!("Unparsed output: {}", raw)));
    }

    fn status(&self) -> &BuildStatus {
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
        if let Some(error) = error {
            if self.status.error.is_none() {
                self.push(LogTag::Error.tag(&format!("Error: {}", error)));
            }
            self.status.error = Some(error);
        }
        self.status.completed = true;
    }
}
