//! Route table normalization
//!
//! Route input is either shorthand (`"/users": "user:list"`, registered as `GET`)
//! or a per-verb object (`"/users": {"post": "user:create"}`). Malformed entries
//! are dropped rather than rejected.

use std::collections::{BTreeMap, HashMap, HashSet};

use axum::routing::MethodFilter;
use serde_json::Value;

pub const INDEX_ACTION: &str = "x_http:index";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 4] = [Verb::Get, Verb::Post, Verb::Put, Verb::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }

    pub fn method_filter(self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Delete => MethodFilter::DELETE,
        }
    }
}

pub type RouteEntry = BTreeMap<Verb, String>;
pub type RouteTable = BTreeMap<String, RouteEntry>;

pub fn normalize_routes(routes: &Value) -> RouteTable {
    let Some(routes) = routes.as_object() else {
        return RouteTable::new();
    };

    routes
        .iter()
        .filter(|(url, _)| !url.is_empty())
        .map(|(url, route)| (url.clone(), normalize_entry(route)))
        .collect()
}

fn normalize_entry(route: &Value) -> RouteEntry {
    let mut entry = RouteEntry::new();

    match route {
        Value::String(action) if !action.is_empty() => {
            entry.insert(Verb::Get, action.clone());
        }
        Value::Object(verbs) => {
            for verb in Verb::ALL {
                if let Some(Value::String(action)) = verbs.get(verb.as_str()) {
                    if !action.is_empty() {
                        entry.insert(verb, action.clone());
                    }
                }
            }
        }
        _ => {}
    }

    entry
}

/// Rewrites express-style segments into axum captures: `:name` becomes
/// `{name}`, a final `*name` becomes `{*name}` and a bare final `*` becomes
/// `{*0}`. Returns `None` for paths the router would refuse: relative URLs,
/// empty capture names, wildcards before the last segment and stray braces.
pub fn axum_path(url: &str) -> Option<String> {
    let rest = url.strip_prefix('/')?;
    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len() - 1;

    let translated = segments
        .iter()
        .enumerate()
        .map(|(index, segment)| translate_segment(segment, index == last))
        .collect::<Option<Vec<_>>>()?;

    Some(format!("/{}", translated.join("/")))
}

fn translate_segment(segment: &str, is_last: bool) -> Option<String> {
    if let Some(name) = segment.strip_prefix(':') {
        return is_capture_name(name).then(|| format!("{{{name}}}"));
    }

    if let Some(name) = segment.strip_prefix('*') {
        let name = if name.is_empty() { "0" } else { name };
        return (is_last && is_capture_name(name)).then(|| format!("{{*{name}}}"));
    }

    if let Some(inner) = segment.strip_prefix('{').and_then(|inner| inner.strip_suffix('}')) {
        return match inner.strip_prefix('*') {
            Some(name) => (is_last && is_capture_name(name)).then(|| segment.to_string()),
            None => is_capture_name(inner).then(|| segment.to_string()),
        };
    }

    (!segment.contains(['{', '}'])).then(|| segment.to_string())
}

fn is_capture_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['{', '}', ':', '*'])
}

/// `/users` for `/users/` and the reverse. The root and wildcard paths have none.
pub fn trailing_slash_variant(path: &str) -> Option<String> {
    if path == "/" || path.rsplit('/').next().is_some_and(|last| last.starts_with("{*")) {
        return None;
    }

    match path.strip_suffix('/') {
        Some(trimmed) => Some(trimmed.to_string()),
        None => Some(format!("{path}/")),
    }
}

/// Tracks registered axum paths so conflicting ones can be skipped instead of
/// making the router panic. A path conflicts with an earlier one when it is
/// identical, or when both put a different capture at the same position.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    paths: HashSet<String>,
    captures: HashMap<String, String>,
}

impl RouteRegistry {
    pub fn insert(&mut self, path: &str) -> bool {
        if self.paths.contains(path) {
            return false;
        }

        let mut prefix = String::new();
        let mut added = Vec::new();
        for segment in path.split('/') {
            if segment.starts_with('{') {
                match self.captures.get(&prefix) {
                    Some(existing) if existing != segment => return false,
                    Some(_) => {}
                    None => added.push((prefix.clone(), segment.to_string())),
                }
            }
            prefix.push_str(segment);
            prefix.push('/');
        }

        self.captures.extend(added);
        self.paths.insert(path.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn non_object_or_empty_input_yields_empty_table() {
        for input in [json!(null), json!("x"), json!(["/a"]), json!(3), json!({})] {
            assert!(normalize_routes(&input).is_empty());
        }
    }

    #[test]
    fn shorthand_registers_get() {
        let table = normalize_routes(&json!({"/a": "act:x"}));
        assert_eq!(table.len(), 1);
        assert_eq!(
            table["/a"],
            RouteEntry::from([(Verb::Get, "act:x".to_string())])
        );
    }

    #[test]
    fn full_syntax_keeps_only_configured_verbs() {
        let table = normalize_routes(&json!({"/b": {"post": "p", "delete": "d"}}));
        let entry = &table["/b"];
        assert_eq!(entry.get(&Verb::Post).map(String::as_str), Some("p"));
        assert_eq!(entry.get(&Verb::Delete).map(String::as_str), Some("d"));
        assert!(!entry.contains_key(&Verb::Get));
        assert!(!entry.contains_key(&Verb::Put));
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let table = normalize_routes(&json!({
            "": "act:root",
            "/empty": "",
            "/weird": {"get": 5, "put": "", "patch": "x"},
            "/nothing": null
        }));

        assert!(!table.contains_key(""));
        assert!(table["/empty"].is_empty());
        assert!(table["/weird"].is_empty());
        assert!(table["/nothing"].is_empty());
    }

    #[test]
    fn express_params_become_captures() {
        assert_eq!(axum_path("/users/:id").as_deref(), Some("/users/{id}"));
        assert_eq!(
            axum_path("/a/:x/b/:y").as_deref(),
            Some("/a/{x}/b/{y}")
        );
        assert_eq!(axum_path("/a/{x}").as_deref(), Some("/a/{x}"));
        assert_eq!(axum_path("/").as_deref(), Some("/"));
        assert_eq!(axum_path("users"), None);
    }

    #[test]
    fn trailing_wildcards_become_catch_all_captures() {
        assert_eq!(axum_path("/files/*").as_deref(), Some("/files/{*0}"));
        assert_eq!(axum_path("/a/*rest").as_deref(), Some("/a/{*rest}"));
        assert_eq!(axum_path("/a/{*rest}").as_deref(), Some("/a/{*rest}"));
    }

    #[test]
    fn unroutable_paths_are_rejected() {
        for url in ["/a/:", "/a/*rest/b", "/a/{", "/a/{}", "/a/x}", "/a/{*rest}/b", "/a/:b:c"] {
            assert_eq!(axum_path(url), None, "{url} should be rejected");
        }
    }

    #[test]
    fn trailing_slash_variants() {
        assert_eq!(trailing_slash_variant("/users").as_deref(), Some("/users/"));
        assert_eq!(trailing_slash_variant("/users/").as_deref(), Some("/users"));
        assert_eq!(trailing_slash_variant("/"), None);
        assert_eq!(trailing_slash_variant("/files/{*0}"), None);
    }

    #[test]
    fn registry_rejects_conflicting_captures() {
        let mut registry = RouteRegistry::default();
        assert!(registry.insert("/a/{id}"));
        assert!(registry.insert("/a/{id}/b"));
        assert!(registry.insert("/a/b"));
        assert!(!registry.insert("/a/{name}"));
        assert!(!registry.insert("/a/{*rest}"));
        assert!(!registry.insert("/a/{name}/c"));
        assert!(!registry.insert("/a/b"));
    }
}
