//! Build context synthesis from a recipe document.
//!
//! Only the recipe text is available, so files the recipe copies in are
//! stood in for by small placeholders chosen from a fixed table.

use once_cell::sync::Lazy;
use regex::Regex;

use super::tar::{ArchiveEntry, TarWriter};

/// Reserved archive name of the recipe document.
pub const RECIPE_FILE_NAME: &str = "Dockerfile";

/// `COPY <src> <dest>` at the start of a line.
static COPY_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*COPY[ \t]+(\S+)[ \t]+(\S+)").expect("Invalid copy directive regex")
});

const PLACEHOLDER_HTML: &str = "<!DOCTYPE html>\n<html>\n<head><title>Placeholder</title></head>\n<body><h1>Placeholder</h1></body>\n</html>\n";
const PLACEHOLDER_TEXT: &str = "placeholder\n";
const PLACEHOLDER_MANIFEST: &str = "{\n  \"name\": \"app\",\n  \"version\": \"1.0.0\",\n  \"private\": true\n}\n";
const PLACEHOLDER_REQUIREMENTS: &str = "# placeholder dependency list\n";

/// What a copied source looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Any path segment equal to the name.
    DirSegment(&'static str),
    /// File name equal to the name.
    FileName(&'static str),
    /// File name ending with the suffix, compared case-insensitively.
    Extension(&'static str),
}

/// How to fill in a matched source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Synthesis {
    /// A directory holding `index.html`.
    IndexPage,
    /// A file at the source path with fixed content.
    File(&'static str),
}

/// First matching row wins, so exact names sit above the `.txt` rule.
const HEURISTICS: &[(Rule, Synthesis)] = &[
    (Rule::DirSegment("dist"), Synthesis::IndexPage),
    (Rule::FileName("package.json"), Synthesis::File(PLACEHOLDER_MANIFEST)),
    (Rule::FileName("requirements.txt"), Synthesis::File(PLACEHOLDER_REQUIREMENTS)),
    (Rule::Extension(".html"), Synthesis::File(PLACEHOLDER_HTML)),
    (Rule::Extension(".htm"), Synthesis::File(PLACEHOLDER_HTML)),
    (Rule::Extension(".txt"), Synthesis::File(PLACEHOLDER_TEXT)),
];

impl Rule {
    fn matches(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match self {
            Rule::DirSegment(name) => path.split('/').any(|segment| segment == *name),
            Rule::FileName(name) => file_name == *name,
            Rule::Extension(ext) => {
                file_name.len() > ext.len() && file_name.to_ascii_lowercase().ends_with(ext)
            }
        }
    }
}

/// Source tokens of every copy directive, in order of appearance.
///
/// Flags are not parsed: in `COPY --chown=app package.json ./` the first
/// token after `COPY` is the flag, so `package.json` is not found.
pub fn copy_sources(recipe: &str) -> Vec<&str> {
    COPY_DIRECTIVE
        .captures_iter(recipe)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Relative means `./`-prefixed or free of any `/`.
fn relative_path(source: &str) -> Option<&str> {
    let path = if let Some(rest) = source.strip_prefix("./") {
        rest
    } else if source.contains('/') {
        return None;
    } else {
        source
    };

    let path = path.trim_end_matches('/');
    if path.is_empty() || path == "." || path.starts_with("--") {
        None
    } else {
        Some(path)
    }
}

/// Placeholder entry for one copy source, if the table knows it.
pub fn synthesize_entry(source: &str) -> Option<ArchiveEntry> {
    let path = relative_path(source)?;
    let (_, synthesis) = HEURISTICS.iter().find(|(rule, _)| rule.matches(path))?;

    Some(match synthesis {
        Synthesis::IndexPage => ArchiveEntry::new(format!("{}/index.html", path), PLACEHOLDER_HTML),
        Synthesis::File(content) => ArchiveEntry::new(path, *content),
    })
}

/// Entries for the build context: the recipe first, then one placeholder
/// per recognised copy source in discovery order. Repeated names are kept once.
pub fn context_entries(recipe: &str) -> Vec<ArchiveEntry> {
    let mut entries = vec![ArchiveEntry::new(RECIPE_FILE_NAME, recipe)];

    for source in copy_sources(recipe) {
        match synthesize_entry(source) {
            Some(entry) => {
                if entries.iter().any(|existing| existing.name == entry.name) {
                    continue;
                }
                tracing::debug!(source, name = %entry.name, "Synthesized build context entry");
                entries.push(entry);
            }
            None => tracing::debug!(source, "No placeholder for copy source"),
        }
    }

    entries
}

/// Serialized build context for `recipe`.
pub fn build_context(recipe: &str) -> Vec<u8> {
    TarWriter::new().write(&context_entries(recipe))
}
