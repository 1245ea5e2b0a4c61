// Tapkeys Compose Parser
// Builds the composition trie from an XCompose-style file

use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::transform::CompositionTrie;

/// Default composition trigger
pub const DEFAULT_TRIGGER: &str = "Multi_key";

/// Compose loading errors
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

fn line_regex() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r#"^<([^>\s]+)>((?:\s*<[^>\s]+>)*)\s*:\s*"((?:[^"\\]|\\.)*)""#)
            .expect("compose line regex")
    })
}

fn key_regex() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| Regex::new(r"<([^>\s]+)>").expect("compose key regex"))
}

/// One recognized compose entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeEntry {
    pub keys: Vec<String>,
    pub symbol: String,
}

/// Parse one line. Returns `None` for comments, `include` directives and
/// entries that do not start with `trigger`.
pub fn parse_compose_line(line: &str, trigger: &str) -> Option<ComposeEntry> {
    let captures = line_regex().captures(line.trim())?;
    if &captures[1] != trigger {
        return None;
    }

    let keys = key_regex()
        .captures_iter(&captures[2])
        .map(|key| key[1].to_string())
        .collect();

    Some(ComposeEntry {
        keys,
        symbol: unescape(&captures[3]),
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Build a trie from compose definitions.
///
/// Conflicting entries are logged and skipped.
pub fn parse_compose(content: &str, trigger: &str) -> CompositionTrie {
    let mut trie = CompositionTrie::new();
    let mut skipped = 0usize;

    for (number, line) in content.lines().enumerate() {
        let Some(entry) = parse_compose_line(line, trigger) else {
            continue;
        };
        if let Err(conflict) = trie.insert(&entry.keys, &entry.symbol) {
            log::warn!("compose line {}: {}", number + 1, conflict);
            skipped += 1;
        }
    }

    log::debug!(
        "loaded {} compose sequences ({} skipped)",
        trie.len(),
        skipped
    );
    trie
}

/// Load a compose file. A missing file yields an empty trie.
pub fn load_compose<P: AsRef<Path>>(path: P, trigger: &str) -> Result<CompositionTrie, ComposeError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_compose(&content, trigger)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!(
                "no compose file at {}, continuing without composition",
                path.display()
            );
            Ok(CompositionTrie::new())
        }
        Err(source) => Err(ComposeError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}
