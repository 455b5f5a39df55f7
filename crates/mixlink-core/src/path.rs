//! Segment-wildcard matching for patch paths.
//!
//! The client never interprets paths; consumers decide relevance by testing
//! each patch path against their own templates. A template is an exact
//! structural path in which any segment may be `*`, matching one segment of
//! any content (typically a device serial or channel name), e.g.
//! `/mixers/*/levels/volumes/Mic`.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A `/`-delimited path template with `*` wildcard segments.
#[derive(Debug, Serialize, Deserialize)]
pub struct PathPattern {
    /// The template, e.g. `/mixers/*/levels/volumes/*`
    pub template: String,
    /// Cached compiled regex
    #[serde(skip)]
    compiled: OnceLock<Option<regex::Regex>>,
}

impl Clone for PathPattern {
    fn clone(&self) -> Self {
        // Don't clone the cache - it will be lazily recompiled
        Self { template: self.template.clone(), compiled: OnceLock::new() }
    }
}

impl PathPattern {
    /// Create a pattern from a template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into(), compiled: OnceLock::new() }
    }

    /// Check whether a patch path matches this template.
    ///
    /// Segment counts must agree; `*` matches exactly one non-empty
    /// segment. A template that fails to compile matches nothing.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let regex = self.compiled.get_or_init(|| {
            let source = template_to_regex(&self.template);
            match regex::Regex::new(&source) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(template = %self.template, error = %e, "Invalid path template");
                    None
                }
            }
        });
        regex.as_ref().is_some_and(|re| re.is_match(path))
    }
}

/// Translate a template into an anchored regex, escaping every literal
/// segment and turning `*` into a single-segment wildcard.
fn template_to_regex(template: &str) -> String {
    let mut source = String::from("^");
    for segment in template.split('/').skip(1) {
        source.push('/');
        if segment == "*" {
            source.push_str("[^/]+");
        } else {
            source.push_str(&regex::escape(segment));
        }
    }
    source.push('$');
    source
}
