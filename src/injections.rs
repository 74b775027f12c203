use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Settings;
use crate::json;
use crate::renderers;

pub const HIGHLIGHT_CATEGORY: &str = "poi_highlight";
const HIGHLIGHT_BUTTON_TYPE: &str = "TRANSPORT_CONTROLS_BUTTON_TYPE_SPONSORBLOCK_HIGHLIGHT";
const SKIP_ICON: &str = "SKIP_NEXT";

const OVERLAY: json::Path = &["playerOverlays", "playerOverlayRenderer"];
const PROMOTED_ACTIONS: json::Path = &["transportControls", "transportControlsRenderer", "promotedActions"];

/// Videos the user queued through the long-press menu.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    pub videos: Vec<Value>,
    pub last_video_id: Option<String>,
}

/// A sponsor segment of the loaded video, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SponsorSegment {
    pub category: String,
    pub segment: [f64; 2],
}

impl SponsorSegment {
    pub fn start(&self) -> f64 {
        self.segment[0]
    }

    pub fn end(&self) -> f64 {
        self.segment[1]
    }
}

/// Host-owned state read during a rewrite. Everything defaults to empty.
pub trait HostState: Send + Sync {
    fn queued_videos(&self) -> QueueSnapshot {
        QueueSnapshot::default()
    }

    fn sponsor_segments(&self) -> Vec<SponsorSegment> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoHostState;

impl HostState for NoHostState {}

/// "Queued Videos" shelf led by a "Clear Queue" tile, focused on the last
/// queued video. `None` when the queue is empty.
pub fn queue_shelf(queue: &QueueSnapshot) -> Option<Value> {
    if queue.videos.is_empty() {
        return None;
    }
    let mut items = Vec::with_capacity(queue.videos.len() + 1);
    items.push(renderers::tile("Clear Queue", renderers::custom_action("CLEAR_QUEUE", None)));
    items.extend(queue.videos.iter().cloned());

    let selected = queue
        .last_video_id
        .as_deref()
        .and_then(|last| items.iter().position(|v| content_id(v) == Some(last)))
        .unwrap_or(0);
    Some(renderers::shelf("Queued Videos", items, selected))
}

fn content_id(item: &Value) -> Option<&str> {
    item.get("contentId")
        .and_then(Value::as_str)
        .or_else(|| json::get_str(item, &["tileRenderer", "contentId"]))
}

/// Rebuild the player overlay's timely skip actions from the segments.
pub fn sponsor_skips(payload: &mut Value, settings: &Settings, segments: &[SponsorSegment]) {
    let Some(overlay) = json::get_mut(payload, OVERLAY).and_then(Value::as_object_mut) else {
        return;
    };
    let categories = &settings.sponsor_block_manual_skips;
    if categories.is_empty() {
        overlay.insert("timelyActionRenderers".to_string(), json!([]));
        return;
    }
    if segments.is_empty() {
        return;
    }
    let actions: Vec<Value> = segments
        .iter()
        .filter(|s| categories.iter().any(|c| *c == s.category))
        .map(skip_action)
        .collect();
    debug!(count = actions.len(), "sponsor skip actions");
    overlay.insert("timelyActionRenderers".to_string(), Value::Array(actions));
}

fn skip_action(segment: &SponsorSegment) -> Value {
    let command = json!({
        "clickTrackingParams": null,
        "showEngagementPanelEndpoint": renderers::custom_action("SKIP", Some(json!({"time": segment.end()}))),
    });
    let trigger_ms = (segment.start() * 1000.0).round().max(0.0) as u64;
    let duration_ms = ((segment.end() - segment.start()) * 1000.0).round().max(0.0) as u64;
    renderers::timely_action(&format!("Skip {}", segment.category), SKIP_ICON, command, trigger_ms, duration_ms)
}

/// Append a "Skip to highlight" transport button when a highlight exists.
pub fn highlight_button(payload: &mut Value, settings: &Settings, segments: &[SponsorSegment]) {
    if !settings.enable_sponsor_block_highlight {
        return;
    }
    let Some(highlight) = segments.iter().find(|s| s.category == HIGHLIGHT_CATEGORY) else {
        return;
    };
    let Some(actions) = json::get_array_mut(payload, PROMOTED_ACTIONS) else {
        return;
    };
    if actions.iter().any(|a| a.get("type").and_then(Value::as_str) == Some(HIGHLIGHT_BUTTON_TYPE)) {
        return;
    }
    let mut command = renderers::custom_action("SKIP", Some(json!({"time": highlight.start()})));
    command["clickTrackingParams"] = Value::Null;
    let button = renderers::button("Skip to highlight", SKIP_ICON, command);
    actions.push(json!({"type": HIGHLIGHT_BUTTON_TYPE, "button": button}));
}

/// Player-facing injections that depend only on sponsor segments.
pub fn inject_player(payload: &mut Value, settings: &Settings, host: &dyn HostState) {
    let has_overlay = json::get(payload, OVERLAY).is_some();
    let has_controls = json::get(payload, PROMOTED_ACTIONS).is_some();
    if !has_overlay && !has_controls {
        return;
    }
    let segments = host.sponsor_segments();
    sponsor_skips(payload, settings, &segments);
    highlight_button(payload, settings, &segments);
}
