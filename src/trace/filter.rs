//! Include/exclude module patterns deciding which exceptions matter

use super::Frame;
use super::inspector::TracebackInspector;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use tracing::warn;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Collapse runs of `*` into one
///
/// Module names are not paths, so `**` means the same as `*`.
fn shell_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

fn matches_any(module: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match Pattern::new(&shell_pattern(pattern)) {
        Ok(p) => p.matches_with(module, MATCH_OPTIONS),
        Err(e) => {
            warn!("Ignoring invalid module pattern '{}': {}", pattern, e);
            false
        },
    })
}

/// Is an exception raised in `module` important?
///
/// Any exclude match wins; otherwise at least one include must match.
/// An unknown module is matched as the empty string.
pub fn is_important(module: Option<&str>, includes: &[String], excludes: &[String]) -> bool {
    let module = module.unwrap_or_default();
    if matches_any(module, excludes) {
        return false;
    }
    matches_any(module, includes)
}

/// Include and exclude module patterns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPolicy {
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl FilterPolicy {
    pub fn new(includes: Vec<String>, excludes: Vec<String>) -> Self {
        Self { includes, excludes }
    }

    /// Apply the policy to a module name
    pub fn is_important(&self, module: Option<&str>) -> bool {
        is_important(module, &self.includes, &self.excludes)
    }

    /// Apply the policy to the module of the innermost frame
    pub fn is_important_traceback(&self, frames: &[Frame], inspector: &TracebackInspector) -> bool {
        match inspector.innermost_frame(frames) {
            Ok(frame) => self.is_important(inspector.module_name(&frame.file).as_deref()),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_double_star_matches_like_single_star() {
        assert_eq!(shell_pattern("tools.**"), "tools.*");
        assert_eq!(shell_pattern("*.**.x"), "*.*.x");
        assert!(is_important(Some("tools.export"), &patterns(&["tools.**"]), &[]));
        assert!(is_important(Some("tools.export.csv"), &patterns(&["*.**"]), &[]));
        assert!(!is_important(Some("tools"), &patterns(&["*.**"]), &[]));
        assert!(!is_important(Some("tools.export"), &patterns(&["*"]), &patterns(&["tools.**"])));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let includes = patterns(&["tools.*"]);
        let excludes = patterns(&["tools.legacy.*"]);
        assert!(is_important(Some("tools.export"), &includes, &excludes));
        assert!(!is_important(Some("tools.legacy.export"), &includes, &excludes));
    }

    #[test]
    fn test_empty_includes_is_never_important() {
        for module in ["tools.export", "", "anything"] {
            assert!(!is_important(Some(module), &[], &[]));
            assert!(!is_important(Some(module), &[], &patterns(&["nothing"])));
        }
    }

    #[test]
    fn test_any_exclude_match_is_unimportant() {
        let includes = patterns(&["*", "tools.export"]);
        for excludes in [patterns(&["*"]), patterns(&["tools.ex?ort"]), patterns(&["x", "tools.*"])] {
            assert!(!is_important(Some("tools.export"), &includes, &excludes));
        }
    }

    #[test]
    fn test_wildcards_and_classes() {
        let includes = patterns(&["render_v[0-9].*", "comp_?"]);
        assert!(is_important(Some("render_v2.farm"), &includes, &[]));
        assert!(is_important(Some("comp_a"), &includes, &[]));
        assert!(!is_important(Some("comp_ab"), &includes, &[]));
        assert!(!is_important(Some("render_vX.farm"), &includes, &[]));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let includes = patterns(&["Tools.*"]);
        assert!(!is_important(Some("tools.export"), &includes, &[]));
    }

    #[test]
    fn test_invalid_pattern_never_matches() {
        let includes = patterns(&["[unclosed", "tools.*"]);
        assert!(is_important(Some("tools.export"), &includes, &[]));
        assert!(!is_important(Some("tools.export"), &patterns(&["[unclosed"]), &[]));
    }

    #[test]
    fn test_unknown_module_matches_empty_string() {
        assert!(is_important(None, &patterns(&["*"]), &[]));
        assert!(!is_important(None, &patterns(&["tools.*"]), &[]));
    }

    #[test]
    fn test_empty_traceback_is_unimportant() {
        let policy = FilterPolicy::new(patterns(&["*"]), vec![]);
        assert!(!policy.is_important_traceback(&[], &TracebackInspector::default()));
    }
}
