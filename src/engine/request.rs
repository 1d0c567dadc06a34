//! Request shapes for the engine's pull and build endpoints.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::{BerthError, BerthResult};

const DEFAULT_TAG: &str = "latest";

/// Repository plus tag (or digest) of an image to pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub repository: String,
    /// Tag, or a digest such as `sha256:...`
    pub tag: String,
}

impl ImageReference {
    /// Parse `repo`, `repo:tag` or `repo@digest`.
    ///
    /// A `:` before the last `/` belongs to a registry port, not a tag.
    pub fn parse(reference: &str) -> BerthResult<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(BerthError::config("image reference is empty"));
        }

        if let Some((repository, digest)) = reference.split_once('@') {
            if repository.is_empty() || digest.is_empty() {
                return Err(BerthError::config(format!(
                    "invalid image reference: {}",
                    reference
                )));
            }
            return Ok(Self {
                repository: repository.to_string(),
                tag: digest.to_string(),
            });
        }

        let name_start = reference.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (repository, tag) = match reference[name_start..].rfind(':') {
            Some(i) => {
                let split = name_start + i;
                (&reference[..split], &reference[split + 1..])
            }
            None => (reference, ""),
        };

        if repository.is_empty() || repository.ends_with('/') {
            return Err(BerthError::config(format!(
                "invalid image reference: {}",
                reference
            )));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: if tag.is_empty() { DEFAULT_TAG } else { tag }.to_string(),
        })
    }

    /// Whether `tag` holds a content digest rather than a tag.
    pub fn is_digest(&self) -> bool {
        self.tag.contains(':')
    }

    /// Path and query for `POST /images/create`.
    pub fn pull_path(&self) -> String {
        format!(
            "/images/create?fromImage={}&tag={}",
            urlencoding::encode(&self.repository),
            urlencoding::encode(&self.tag)
        )
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_digest() { '@' } else { ':' };
        write!(f, "{}{}{}", self.repository, sep, self.tag)
    }
}

/// One `--build-arg` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArg {
    pub key: String,
    pub value: String,
}

impl BuildArg {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `KEY=VALUE`. The value may itself contain `=`.
    pub fn parse(pair: &str) -> Option<Self> {
        let (key, value) = pair.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key, value))
    }
}

/// Everything needed to start a build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildRequest {
    /// Recipe document, shipped as the archive's `Dockerfile`
    pub recipe_text: String,
    /// Tag for the built image. Empty leaves it untagged.
    pub tag: String,
    pub build_args: Vec<BuildArg>,
    pub no_cache: bool,
    pub pull_latest: bool,
}

impl BuildRequest {
    pub fn new(recipe_text: impl Into<String>) -> Self {
        Self {
            recipe_text: recipe_text.into(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_build_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_args.push(BuildArg::new(key, value));
        self
    }

    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    pub fn with_pull_latest(mut self, pull_latest: bool) -> Self {
        self.pull_latest = pull_latest;
        self
    }

    /// Build args as a JSON object, or `None` when there are none.
    ///
    /// Blank keys are dropped and a repeated key keeps its last value.
    pub fn build_args_json(&self) -> Option<String> {
        let mut args = BTreeMap::new();
        for arg in &self.build_args {
            let key = arg.key.trim();
            if !key.is_empty() {
                args.insert(key, arg.value.as_str());
            }
        }

        if args.is_empty() {
            return None;
        }
        let map: Map<String, Value> = args
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        Some(Value::Object(map).to_string())
    }

    /// Path and query for `POST /build`.
    pub fn build_path(&self) -> String {
        let mut params = Vec::with_capacity(4);
        let tag = self.tag.trim();
        if !tag.is_empty() {
            params.push(format!("t={}", urlencoding::encode(tag)));
        }
        params.push(format!("nocache={}", self.no_cache));
        params.push(format!("pull={}", self.pull_latest));
        if let Some(args) = self.build_args_json() {
            params.push(format!("buildargs={}", urlencoding::encode(&args)));
        }
        format!("/build?{}", params.join("&"))
    }
}

/// Human-readable message for a non-2xx response body.
///
/// Prefers a JSON `message` field, then the trimmed body cut to `limit`
/// characters, then the bare status code.
pub fn extract_error_message(status: u16, body: &str, limit: usize) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            if !message.trim().is_empty() {
                return message.to_string();
            }
        }
    }

    let text = body.trim();
    if text.is_empty() {
        return format!("HTTP {}", status);
    }

    if text.chars().count() > limit {
        let truncated: String = text.chars().take(limit).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
