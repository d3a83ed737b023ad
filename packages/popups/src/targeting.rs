//! # Targeting
//!
//! Decides whether a popup may appear on a given page path.
//!
//! Patterns are plain substrings (`"/pricing"` matches `/pricing/annual`), or
//! regular expressions when written as `/body/flags` (`"/^\/blog\/.+$/i"`).
//! Only the JavaScript flag letters `dgimsuyv` are accepted after the closing
//! slash, so ordinary paths such as `/blog/post` stay literal.

use crate::definition::{Targeting, TargetingMode};
use regex::{Regex, RegexBuilder};
use tracing::warn;

const REGEX_FLAGS: &str = "dgimsuyv";

/// A parsed targeting pattern
#[derive(Debug, Clone)]
pub enum PathPattern {
    Literal(String),
    Regex(Regex),
    /// A `/…/` pattern that failed to compile; never matches
    Invalid(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        match split_regex_literal(pattern) {
            Some((body, flags)) => match build_regex(body, flags) {
                Ok(re) => PathPattern::Regex(re),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Ignoring malformed targeting regex");
                    PathPattern::Invalid(pattern.to_string())
                }
            },
            None => PathPattern::Literal(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Literal(needle) => path.contains(needle.as_str()),
            PathPattern::Regex(re) => re.is_match(path),
            PathPattern::Invalid(_) => false,
        }
    }
}

/// Test a single raw pattern against `path`
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    PathPattern::parse(pattern).matches(path)
}

/// Split `/body/flags` into its parts, `None` for literal patterns
fn split_regex_literal(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let (body, flags) = (&rest[..close], &rest[close + 1..]);

    if flags.chars().all(|c| REGEX_FLAGS.contains(c)) {
        Some((body, flags))
    } else {
        None
    }
}

fn build_regex(body: &str, flags: &str) -> Result<Regex, regex::Error> {
    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            // g, y, d, u, v have no effect on a single is_match test
            _ => {}
        }
    }
    builder.build()
}

impl Targeting {
    /// Whether a popup with these rules is eligible on `path`
    pub fn allows(&self, path: &str) -> bool {
        let excluded = self.exclude.iter().any(|p| pattern_matches(p, path));
        let included = if self.include.is_empty() {
            true
        } else {
            self.include.iter().any(|p| pattern_matches(p, path))
        };

        // `All` and `Exclude` evaluate the same way; they stay distinct so
        // documents keep the mode their author picked.
        match self.mode {
            TargetingMode::All => !excluded,
            TargetingMode::Include => included && !excluded,
            TargetingMode::Exclude => !excluded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targeting(mode: TargetingMode, include: &[&str], exclude: &[&str]) -> Targeting {
        Targeting {
            mode,
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_include_mode() {
        let t = targeting(TargetingMode::Include, &["/pricing"], &[]);
        assert!(t.allows("/pricing"));
        assert!(!t.allows("/about"));
    }

    #[test]
    fn test_all_mode_respects_exclude() {
        let t = targeting(TargetingMode::All, &[], &["/checkout"]);
        assert!(!t.allows("/checkout"));
        assert!(t.allows("/"));
    }

    #[test]
    fn test_all_and_exclude_modes_agree() {
        for path in ["/", "/checkout", "/pricing"] {
            let all = targeting(TargetingMode::All, &["/pricing"], &["/checkout"]);
            let exclude = targeting(TargetingMode::Exclude, &["/pricing"], &["/checkout"]);
            assert_eq!(all.allows(path), exclude.allows(path), "path {}", path);
        }
    }

    #[test]
    fn test_include_with_empty_list_allows_everything_not_excluded() {
        let t = targeting(TargetingMode::Include, &[], &["/admin"]);
        assert!(t.allows("/home"));
        assert!(!t.allows("/admin/users"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let t = targeting(TargetingMode::Include, &["/shop"], &["/shop/cart"]);
        assert!(t.allows("/shop/shoes"));
        assert!(!t.allows("/shop/cart"));
    }

    #[test]
    fn test_regex_patterns() {
        assert!(pattern_matches(r"/^\/blog\/\d+$/", "/blog/42"));
        assert!(!pattern_matches(r"/^\/blog\/\d+$/", "/blog/latest"));
        assert!(pattern_matches("/^/PRICING/i", "/pricing"));
    }

    #[test]
    fn test_paths_with_slashes_stay_literal() {
        assert!(matches!(PathPattern::parse("/blog/post"), PathPattern::Literal(_)));
        assert!(pattern_matches("/blog/post", "/blog/post/1"));
        assert!(matches!(PathPattern::parse("/pricing"), PathPattern::Literal(_)));
    }

    #[test]
    fn test_malformed_regex_never_matches() {
        let pattern = PathPattern::parse("/(unclosed/");
        assert!(matches!(pattern, PathPattern::Invalid(_)));
        assert!(!pattern.matches("/(unclosed"));

        let t = targeting(TargetingMode::All, &[], &["/(unclosed/"]);
        assert!(t.allows("/anything"));
    }
}
