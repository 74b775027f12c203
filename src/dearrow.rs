//! Community-sourced title/thumbnail substitution (DeArrow).
//!
//! Fetches run in the background after the payload has been returned. Their
//! results go into a [`SubstitutionQueue`] keyed by the payload generation;
//! the host applies them to the tree it still holds with
//! [`apply_substitutions`], so a result can never land on a tree the host has
//! already replaced.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tracing::debug;

use crate::json;

pub const BRANDING_API: &str = "https://sponsor.ajay.app/api/branding";
pub const THUMBNAIL_API: &str = "https://dearrow-thumb.ajay.app/api/v1/getThumbnail";

/// Generations kept in the queue before the oldest unclaimed results are dropped.
const MAX_PENDING_GENERATIONS: usize = 64;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Branding {
    #[serde(default)]
    pub titles: Vec<BrandingTitle>,
    #[serde(default)]
    pub thumbnails: Vec<BrandingThumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandingTitle {
    pub title: String,
    #[serde(default)]
    pub votes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandingThumbnail {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub votes: i64,
}

#[async_trait]
pub trait BrandingSource: Send + Sync {
    async fn branding(&self, video_id: &str) -> Result<Branding>;
}

/// HTTP client for the public DeArrow branding API.
#[derive(Debug, Clone)]
pub struct DeArrowClient {
    http: reqwest::Client,
    api: String,
}

impl DeArrowClient {
    pub fn new() -> Result<Self> {
        Self::with_api(BRANDING_API)
    }

    pub fn with_api(api: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("reshelf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, api: api.to_string() })
    }
}

#[async_trait]
impl BrandingSource for DeArrowClient {
    async fn branding(&self, video_id: &str) -> Result<Branding> {
        let resp = self
            .http
            .get(&self.api)
            .query(&[("videoID", video_id)])
            .send()
            .await
            .with_context(|| format!("branding request for {video_id}"))?
            .error_for_status()?;
        Ok(resp.json::<Branding>().await?)
    }
}

pub fn thumbnail_url(video_id: &str, timestamp: f64) -> String {
    format!("{THUMBNAIL_API}?videoID={video_id}&time={timestamp}")
}

/// Replacement data for one content id.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub video_id: String,
    pub title: Option<String>,
    /// Replacement thumbnail list.
    pub thumbnails: Option<Value>,
}

impl Substitution {
    /// Pick the highest-voted title and, when wanted, the highest-voted
    /// timestamped thumbnail. Ties go to the later candidate.
    pub fn from_branding(video_id: &str, branding: &Branding, with_thumbnails: bool) -> Option<Self> {
        let title = best(&branding.titles, |t| t.votes).map(|t| t.title.clone());
        let thumbnails = if with_thumbnails {
            best(&branding.thumbnails, |t| t.votes)
                .and_then(|t| t.timestamp)
                .map(|ts| json!([{"url": thumbnail_url(video_id, ts), "width": 1280, "height": 640}]))
        } else {
            None
        };
        if title.is_none() && thumbnails.is_none() {
            return None;
        }
        Some(Self { video_id: video_id.to_string(), title, thumbnails })
    }
}

fn best<T>(list: &[T], votes: impl Fn(&T) -> i64) -> Option<&T> {
    list.iter().fold(None, |acc: Option<&T>, cur| match acc {
        Some(a) if votes(a) > votes(cur) => Some(a),
        _ => Some(cur),
    })
}

/// Finished substitutions waiting for the host to claim them.
#[derive(Debug, Default)]
pub struct SubstitutionQueue {
    pending: Mutex<Pending>,
}

#[derive(Debug, Default)]
struct Pending {
    by_generation: HashMap<u64, Vec<Substitution>>,
    order: VecDeque<u64>,
}

impl SubstitutionQueue {
    pub fn push(&self, generation: u64, sub: Substitution) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if !pending.by_generation.contains_key(&generation) {
            pending.order.push_back(generation);
            while pending.order.len() > MAX_PENDING_GENERATIONS {
                if let Some(old) = pending.order.pop_front() {
                    debug!(generation = old, "dropping unclaimed substitutions");
                    pending.by_generation.remove(&old);
                }
            }
        }
        pending.by_generation.entry(generation).or_default().push(sub);
    }

    /// Remove and return everything finished for `generation`.
    pub fn take(&self, generation: u64) -> Vec<Substitution> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.order.retain(|g| *g != generation);
        pending.by_generation.remove(&generation).unwrap_or_default()
    }

    pub fn len(&self, generation: u64) -> usize {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.by_generation.get(&generation).map_or(0, Vec::len)
    }
}

/// Schedules branding fetches on a runtime and collects their results.
#[derive(Clone)]
pub struct DeArrow {
    source: Arc<dyn BrandingSource>,
    runtime: Handle,
    queue: Arc<SubstitutionQueue>,
}

impl DeArrow {
    pub fn new(source: Arc<dyn BrandingSource>, runtime: Handle) -> Self {
        Self { source, runtime, queue: Arc::new(SubstitutionQueue::default()) }
    }

    pub fn queue(&self) -> &SubstitutionQueue {
        &self.queue
    }

    /// Fire-and-forget fetch for one content id. Failures are only logged.
    pub fn schedule(&self, generation: u64, video_id: String, with_thumbnails: bool) {
        let source = Arc::clone(&self.source);
        let queue = Arc::clone(&self.queue);
        self.runtime.spawn(async move {
            match source.branding(&video_id).await {
                Ok(branding) => {
                    if let Some(sub) = Substitution::from_branding(&video_id, &branding, with_thumbnails) {
                        queue.push(generation, sub);
                    }
                }
                Err(e) => debug!(video_id = %video_id, error = %e, "branding fetch failed"),
            }
        });
    }
}

/// Apply substitutions to every tile in `payload` whose content id matches.
/// Returns the number of tiles changed.
pub fn apply_substitutions(payload: &mut Value, subs: &[Substitution]) -> usize {
    if subs.is_empty() {
        return 0;
    }
    let by_id: HashMap<&str, &Substitution> = subs.iter().map(|s| (s.video_id.as_str(), s)).collect();
    let mut changed = 0;
    let mut stack = vec![payload];
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                if let Some(tile) = map.get_mut("tileRenderer") {
                    let id = tile.get("contentId").and_then(Value::as_str).map(str::to_string);
                    if let Some(sub) = id.as_deref().and_then(|id| by_id.get(id)) {
                        if apply_to_tile(tile, sub) {
                            changed += 1;
                        }
                    }
                }
                stack.extend(map.values_mut());
            }
            Value::Array(list) => stack.extend(list.iter_mut()),
            _ => {}
        }
    }
    changed
}

fn apply_to_tile(tile: &mut Value, sub: &Substitution) -> bool {
    let mut changed = false;
    if let Some(title) = &sub.title {
        if let Some(slot) = json::get_mut(tile, &["metadata", "tileMetadataRenderer", "title"]) {
            *slot = json!({"simpleText": title});
            changed = true;
        }
    }
    if let Some(thumbs) = &sub.thumbnails {
        if let Some(slot) = json::get_mut(tile, &["header", "tileHeaderRenderer", "thumbnail", "thumbnails"]) {
            *slot = thumbs.clone();
            changed = true;
        }
    }
    changed
}
