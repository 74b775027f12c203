use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

/// Canonical page category the host is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageContext {
    Home,
    Watch,
    Search,
    Channel,
    Playlist,
    Playlists,
    Subscriptions,
    Library,
    History,
    Trending,
    Music,
    Gaming,
    Other,
}

impl PageContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageContext::Home => "home",
            PageContext::Watch => "watch",
            PageContext::Search => "search",
            PageContext::Channel => "channel",
            PageContext::Playlist => "playlist",
            PageContext::Playlists => "playlists",
            PageContext::Subscriptions => "subscriptions",
            PageContext::Library => "library",
            PageContext::History => "history",
            PageContext::Trending => "trending",
            PageContext::Music => "music",
            PageContext::Gaming => "gaming",
            PageContext::Other => "other",
        }
    }
}

impl fmt::Display for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ctx = match s.trim().to_ascii_lowercase().as_str() {
            "home" => PageContext::Home,
            "watch" => PageContext::Watch,
            "search" => PageContext::Search,
            "channel" => PageContext::Channel,
            "playlist" => PageContext::Playlist,
            "playlists" => PageContext::Playlists,
            "subscriptions" => PageContext::Subscriptions,
            "library" => PageContext::Library,
            "history" => PageContext::History,
            "trending" => PageContext::Trending,
            "music" => PageContext::Music,
            "gaming" => PageContext::Gaming,
            "other" => PageContext::Other,
            other => return Err(format!("unknown page context `{other}`")),
        };
        Ok(ctx)
    }
}

/// Snapshot of the host's location: path, fragment and query, plus the full href.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    /// Fragment without the leading `#`. TV hosts route entirely inside it.
    pub hash: String,
    /// Query without the leading `?`.
    pub search: String,
    pub href: String,
}

impl Location {
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(href)?;
        Ok(Self {
            path: url.path().to_string(),
            hash: url.fragment().unwrap_or_default().to_string(),
            search: url.query().unwrap_or_default().to_string(),
            href: href.to_string(),
        })
    }

    /// Query-style parameters from both the real query and the fragment's own
    /// query (`#/browse?c=...`), fragment first.
    fn params(&self) -> Vec<(String, String)> {
        let hash_query = self.hash.split_once('?').map(|(_, q)| q).unwrap_or("");
        [hash_query, self.search.as_str()]
            .into_iter()
            .flat_map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned())
            .collect()
    }

    /// Route path: the fragment's path when it has one, otherwise the URL path.
    fn route(&self) -> String {
        let hash_path = self.hash.split('?').next().unwrap_or("");
        if hash_path.is_empty() {
            self.path.to_ascii_lowercase()
        } else {
            hash_path.to_ascii_lowercase()
        }
    }
}

/// How a rule inspects the location.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Browse id equal to the value.
    BrowseId(&'static str),
    /// Browse id starting with the value.
    BrowseIdPrefix(&'static str),
    /// Query parameter present with a non-empty value.
    Param(&'static str),
    /// Route path contains the segment.
    Route(&'static str),
    /// Route path is one of the root-like paths.
    RootRoute,
    /// Lowercased href, route and query contain the keyword.
    Keyword(&'static str),
}

struct Rule {
    matcher: Matcher,
    context: PageContext,
}

const fn rule(matcher: Matcher, context: PageContext) -> Rule {
    Rule { matcher, context }
}

/// Ordered rules; the first match wins. Browse ids first, then query
/// parameters, then path segments, then loose keywords.
const RULES: &[Rule] = &[
    rule(Matcher::BrowseId("FEsubscriptions"), PageContext::Subscriptions),
    rule(Matcher::BrowseId("VLWL"), PageContext::Playlist),
    rule(Matcher::BrowseId("VLLL"), PageContext::Playlist),
    rule(Matcher::BrowseId("FEplaylist_aggregation"), PageContext::Playlists),
    rule(Matcher::BrowseId("FEhistory"), PageContext::History),
    rule(Matcher::BrowseId("FElibrary"), PageContext::Library),
    rule(Matcher::BrowseId("FEmy_youtube"), PageContext::Library),
    rule(Matcher::BrowseId("FEtrending"), PageContext::Trending),
    rule(Matcher::BrowseIdPrefix("FEmusic"), PageContext::Music),
    rule(Matcher::BrowseIdPrefix("FEgaming"), PageContext::Gaming),
    rule(Matcher::BrowseId("FEwhat_to_watch"), PageContext::Home),
    rule(Matcher::BrowseIdPrefix("FEtopics"), PageContext::Home),
    rule(Matcher::BrowseIdPrefix("VL"), PageContext::Playlist),
    rule(Matcher::BrowseIdPrefix("UC"), PageContext::Channel),
    rule(Matcher::Param("list"), PageContext::Playlist),
    rule(Matcher::Param("search_query"), PageContext::Search),
    rule(Matcher::Route("/watch"), PageContext::Watch),
    rule(Matcher::Route("/results"), PageContext::Search),
    rule(Matcher::Route("/search"), PageContext::Search),
    rule(Matcher::Route("/@"), PageContext::Channel),
    rule(Matcher::Route("/channel/"), PageContext::Channel),
    rule(Matcher::Route("/c/"), PageContext::Channel),
    rule(Matcher::Route("/user/"), PageContext::Channel),
    rule(Matcher::Route("/feed/subscriptions"), PageContext::Subscriptions),
    rule(Matcher::Route("/feed/playlists"), PageContext::Playlists),
    rule(Matcher::Route("/playlist"), PageContext::Playlist),
    rule(Matcher::Route("/feed/history"), PageContext::History),
    rule(Matcher::Route("/feed/library"), PageContext::Library),
    rule(Matcher::Route("/feed/trending"), PageContext::Trending),
    rule(Matcher::Keyword("subscriptions"), PageContext::Subscriptions),
    rule(Matcher::Keyword("abos"), PageContext::Subscriptions),
    rule(Matcher::Keyword("library"), PageContext::Library),
    rule(Matcher::Keyword("mediathek"), PageContext::Library),
    rule(Matcher::Keyword("suche"), PageContext::Search),
    rule(Matcher::Keyword("music"), PageContext::Music),
    rule(Matcher::Keyword("gaming"), PageContext::Gaming),
    rule(Matcher::RootRoute, PageContext::Home),
];

const ROOT_ROUTES: &[&str] = &["", "/", "/tv", "/home", "/browse"];

impl Matcher {
    fn matches(&self, loc: &Location, browse_id: Option<&str>, params: &[(String, String)], route: &str) -> bool {
        match *self {
            Matcher::BrowseId(id) => browse_id == Some(id),
            Matcher::BrowseIdPrefix(prefix) => browse_id.is_some_and(|b| b.starts_with(prefix)),
            Matcher::Param(key) => params.iter().any(|(k, v)| k == key && !v.is_empty()),
            Matcher::Route(segment) => route.contains(segment),
            Matcher::RootRoute => ROOT_ROUTES.contains(&route.trim_end_matches('/')) || route == "/",
            Matcher::Keyword(word) => {
                let hay = format!("{} {} {}", route, loc.search, loc.hash).to_ascii_lowercase();
                hay.contains(word)
            }
        }
    }
}

/// Classify `loc`. Always recomputed; never cached.
pub fn classify(loc: &Location) -> PageContext {
    let params = loc.params();
    let browse_id = params
        .iter()
        .find(|(k, v)| (k == "c" || k == "browse_id") && !v.is_empty())
        .map(|(_, v)| v.as_str());
    let route = loc.route();

    RULES
        .iter()
        .find(|r| r.matcher.matches(loc, browse_id, &params, &route))
        .map(|r| r.context)
        .unwrap_or(PageContext::Other)
}

/// Source of the current location, read once per payload.
pub trait LocationSource: Send + Sync {
    fn location(&self) -> Location;
}

impl LocationSource for Location {
    fn location(&self) -> Location {
        self.clone()
    }
}

/// Location the host updates as it navigates.
#[derive(Debug, Clone, Default)]
pub struct SharedLocation {
    inner: Arc<RwLock<Location>>,
}

impl SharedLocation {
    pub fn new(location: Location) -> Self {
        Self { inner: Arc::new(RwLock::new(location)) }
    }

    pub fn set(&self, location: Location) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = location;
    }
}

impl LocationSource for SharedLocation {
    fn location(&self) -> Location {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Remembers the last (context, href) so changes are logged once.
#[derive(Debug, Default)]
pub struct ContextTracker {
    last: Mutex<Option<(PageContext, String)>>,
}

impl ContextTracker {
    /// Classify and log when the context or URL changed. Returns the fresh value.
    pub fn observe(&self, loc: &Location) -> PageContext {
        let ctx = classify(loc);
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let changed = match last.as_ref() {
            Some((prev_ctx, prev_href)) => *prev_ctx != ctx || *prev_href != loc.href,
            None => true,
        };
        if changed {
            info!(context = %ctx, href = %loc.href, "navigation context changed");
            *last = Some((ctx, loc.href.clone()));
        }
        ctx
    }

    pub fn last(&self) -> Option<PageContext> {
        self.last.lock().unwrap_or_else(|e| e.into_inner()).as_ref().map(|(c, _)| *c)
    }
}
