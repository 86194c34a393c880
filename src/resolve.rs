//! Source resolution for user-supplied name tokens
//!
//! Pure functions for expanding configured group aliases and matching the
//! expanded names against the live pod list. Resolution happens once, before
//! any watcher starts; a failed resolution is fatal.

use std::collections::BTreeSet;
use std::collections::HashMap;

use thiserror::Error;

/// No live source matched any requested token.
///
/// Carries the full live set so the error message can show the user what
/// they could have asked for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no pods found for {requested:?}; available pods: {available:?}")]
pub struct ResolutionError {
    pub requested: Vec<String>,
    pub available: Vec<String>,
}

/// Expand user tokens against the configured name groups.
///
/// A token that names a configured group contributes the group's members; any
/// other token contributes itself. The result is the sorted, deduplicated
/// union across all tokens.
pub fn expand(tokens: &[String], groups: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut names = BTreeSet::new();

    for token in tokens {
        match groups.get(token) {
            Some(members) => names.extend(members.iter().cloned()),
            None => {
                names.insert(token.clone());
            }
        }
    }

    names.into_iter().collect()
}

/// Whether a live source id matches a requested name.
///
/// A match is exact equality or a `name-` prefix, so `frontend` matches the
/// replica `frontend-6b7f-x2x9` but not `frontends`. Case-sensitive.
pub fn matches(name: &str, source_id: &str) -> bool {
    source_id == name || source_id.starts_with(&format!("{name}-"))
}

/// Resolve user tokens to the sorted list of matched live source ids.
///
/// Tokens are expanded through `groups`, then each live id is kept if any
/// expanded name matches it. An empty result is a [`ResolutionError`].
pub fn resolve(
    tokens: &[String],
    groups: &HashMap<String, Vec<String>>,
    live: &[String],
) -> Result<Vec<String>, ResolutionError> {
    let names = expand(tokens, groups);

    let mut matched: Vec<String> = live
        .iter()
        .filter(|id| names.iter().any(|name| matches(name, id)))
        .cloned()
        .collect();
    matched.sort();

    if matched.is_empty() {
        let mut available: Vec<String> = live.to_vec();
        available.sort();
        return Err(ResolutionError {
            requested: tokens.to_vec(),
            available,
        });
    }

    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn expand_passes_raw_names_through() {
        let names = expand(&strings(&["web", "api"]), &HashMap::new());
        assert_eq!(names, strings(&["api", "web"]));
    }

    #[test]
    fn expand_replaces_group_alias_with_members() {
        let mut groups = HashMap::new();
        groups.insert("frontend".to_string(), strings(&["web", "ssr"]));

        let names = expand(&strings(&["frontend"]), &groups);

        assert_eq!(names, strings(&["ssr", "web"]));
    }

    #[test]
    fn expand_deduplicates_across_tokens_and_groups() {
        let mut groups = HashMap::new();
        groups.insert("frontend".to_string(), strings(&["web", "ssr"]));

        let names = expand(&strings(&["frontend", "web", "api"]), &groups);

        assert_eq!(names, strings(&["api", "ssr", "web"]));
    }

    #[test]
    fn matches_exact_name() {
        assert!(matches("web", "web"));
    }

    #[test]
    fn matches_dash_suffixed_replica() {
        assert!(matches("web", "web-6b7f9d-x2x9"));
    }

    #[test]
    fn rejects_plain_prefix_without_dash() {
        assert!(!matches("web", "webhook"));
        assert!(!matches("web", "website-abc"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!matches("Web", "web-abc"));
    }

    #[test]
    fn resolve_returns_sorted_matches() {
        let live = strings(&["api-zz", "web-bb", "web-aa"]);

        let matched = resolve(&strings(&["web"]), &HashMap::new(), &live).unwrap();

        assert_eq!(matched, strings(&["web-aa", "web-bb"]));
    }

    #[test]
    fn resolve_through_group_alias() {
        let mut groups = HashMap::new();
        groups.insert(
            "frontend".to_string(),
            strings(&["frontend-aa", "frontend-bb"]),
        );
        let live = strings(&["frontend-aa", "frontend-bb", "backend-cc"]);

        let matched = resolve(&strings(&["frontend"]), &groups, &live).unwrap();

        assert_eq!(matched, strings(&["frontend-aa", "frontend-bb"]));
    }

    #[test]
    fn resolve_fails_when_nothing_matches() {
        let live = strings(&["frontend-aa"]);

        let err = resolve(&strings(&["nonexistent"]), &HashMap::new(), &live).unwrap_err();

        assert_eq!(err.requested, strings(&["nonexistent"]));
        assert_eq!(err.available, strings(&["frontend-aa"]));
    }

    #[test]
    fn resolution_error_names_both_sets() {
        let err = ResolutionError {
            requested: strings(&["nope"]),
            available: strings(&["frontend-aa"]),
        };
        let message = err.to_string();
        assert!(message.contains("nope"));
        assert!(message.contains("frontend-aa"));
    }
}
