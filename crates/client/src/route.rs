//! Request classification.
//!
//! An ordered list of [`RoutePattern`]s is walked top to bottom and the first
//! matching pattern decides the route. Non-GET requests never reach the
//! pattern list, and anything no pattern matches is [`Route::Dynamic`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::AppConfig;
use url::Url;

/// How a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Not intercepted: straight to the network, never cached.
    Bypass,
    /// Cache-first from the static bucket.
    Static,
    /// Network-first, with the offline page as last cached resort.
    Document,
    /// Network-first.
    Dynamic,
}

/// Predicate over a request path and its Accept header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Path under `root` whose extension is one of `extensions`.
    Asset { root: String, extensions: Vec<String> },
    /// Path equals the given string.
    Exact(String),
    /// Path equals the given string or lies below it (`/admin`, `/admin/x`).
    Subtree(String),
    Prefix(String),
    Suffix(String),
    /// Accept header asks for HTML.
    AcceptsHtml,
}

impl Matcher {
    pub fn matches(&self, path: &str, accept: Option<&str>) -> bool {
        match self {
            Matcher::Asset { root, extensions } => {
                path.starts_with(root.as_str())
                    && extension(path).is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            }
            Matcher::Exact(expected) => path == expected,
            Matcher::Subtree(root) => {
                let root = root.trim_end_matches('/');
                path == root || path.strip_prefix(root).is_some_and(|rest| rest.starts_with('/'))
            }
            Matcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Matcher::Suffix(suffix) => path.ends_with(suffix.as_str()),
            Matcher::AcceptsHtml => accept.is_some_and(|a| a.to_ascii_lowercase().contains("text/html")),
        }
    }
}

fn extension(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next()?;
    let (stem, ext) = file.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}

/// One entry of the ordered route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pub matcher: Matcher,
    pub route: Route,
}

impl RoutePattern {
    pub fn new(matcher: Matcher, route: Route) -> Self {
        Self { matcher, route }
    }
}

/// Pure, total classifier over an ordered pattern list.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    patterns: Vec<RoutePattern>,
}

impl RouteClassifier {
    pub fn new(patterns: Vec<RoutePattern>) -> Self {
        Self { patterns }
    }

    /// Default table: static assets, the web manifest, HTML requests, then
    /// the configured document routes.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut patterns = vec![
            RoutePattern::new(
                Matcher::Asset { root: config.asset_root.clone(), extensions: config.asset_extensions.clone() },
                Route::Static,
            ),
            RoutePattern::new(Matcher::Exact(config.manifest_path.clone()), Route::Static),
            RoutePattern::new(Matcher::AcceptsHtml, Route::Document),
        ];

        for route in &config.document_routes {
            let matcher = if route == "/" { Matcher::Exact(route.clone()) } else { Matcher::Subtree(route.clone()) };
            patterns.push(RoutePattern::new(matcher, Route::Document));
        }

        Self { patterns }
    }

    pub fn classify(&self, method: &str, url: &Url, accept: Option<&str>) -> Route {
        if !method.eq_ignore_ascii_case("GET") {
            return Route::Bypass;
        }

        let path = url.path();
        self.patterns
            .iter()
            .find(|p| p.matcher.matches(path, accept))
            .map_or(Route::Dynamic, |p| p.route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("http://app.test").unwrap().join(path).unwrap()
    }

    fn classifier() -> RouteClassifier {
        RouteClassifier::from_config(&AppConfig::default())
    }

    #[test]
    fn test_non_get_bypasses() {
        let c = classifier();
        assert_eq!(c.classify("POST", &url("/"), Some("text/html")), Route::Bypass);
        assert_eq!(c.classify("DELETE", &url("/static/a.css"), None), Route::Bypass);
    }

    #[test]
    fn test_static_assets() {
        let c = classifier();
        assert_eq!(c.classify("GET", &url("/static/css/style.css"), None), Route::Static);
        assert_eq!(c.classify("get", &url("/static/icons/icon-192.PNG"), None), Route::Static);
        assert_eq!(c.classify("GET", &url("/static/fonts/x.woff2"), None), Route::Static);
        assert_eq!(c.classify("GET", &url("/static/manifest.json"), None), Route::Static);
    }

    #[test]
    fn test_asset_requires_root_and_extension() {
        let c = classifier();
        assert_eq!(c.classify("GET", &url("/app.js"), None), Route::Dynamic);
        assert_eq!(c.classify("GET", &url("/static/data.json"), None), Route::Dynamic);
        assert_eq!(c.classify("GET", &url("/static/.css"), None), Route::Dynamic);
    }

    #[test]
    fn test_documents() {
        let c = classifier();
        assert_eq!(c.classify("GET", &url("/"), None), Route::Document);
        assert_eq!(c.classify("GET", &url("/admin"), None), Route::Document);
        assert_eq!(c.classify("GET", &url("/admin/evento/crea"), None), Route::Document);
        assert_eq!(c.classify("GET", &url("/anything"), Some("text/html,application/xhtml+xml")), Route::Document);
    }

    #[test]
    fn test_subtree_does_not_match_sibling() {
        let c = classifier();
        assert_eq!(c.classify("GET", &url("/administrator"), None), Route::Dynamic);
    }

    #[test]
    fn test_default_is_dynamic() {
        let c = classifier();
        assert_eq!(c.classify("GET", &url("/api/eventi"), Some("application/json")), Route::Dynamic);
    }

    #[test]
    fn test_static_beats_html_accept() {
        let c = classifier();
        assert_eq!(c.classify("GET", &url("/static/js/app.js"), Some("text/html")), Route::Static);
    }

    #[test]
    fn test_first_match_wins() {
        let icons = RoutePattern::new(
            Matcher::Asset { root: "/static/".into(), extensions: vec!["png".into()] },
            Route::Static,
        );
        let broad = RoutePattern::new(Matcher::Prefix("/static/icons/".into()), Route::Document);
        let icons_first = RouteClassifier::new(vec![icons.clone(), broad.clone()]);
        let broad_first = RouteClassifier::new(vec![broad, icons]);

        let icon = url("/static/icons/icon-192.png");
        assert_eq!(icons_first.classify("GET", &icon, None), Route::Static);
        assert_eq!(broad_first.classify("GET", &icon, None), Route::Document);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier();
        let target = url("/admin/x");
        let first = c.classify("GET", &target, Some("text/html"));
        let second = c.classify("GET", &target, Some("text/html"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_suffix_matcher() {
        let m = Matcher::Suffix(".webmanifest".into());
        assert!(m.matches("/site.webmanifest", None));
        assert!(!m.matches("/site.json", None));
    }
}
