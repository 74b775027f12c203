use serde_json::Value;

use crate::json;
use crate::model::{self, ItemKind};

const SHORTS_LABEL: &str = "Shorts";
const SHORTS_STYLE: &str = "SHORTS";

/// Where a renderer keeps the URL its select/navigation command targets.
const NAVIGATION_URLS: &[json::Path] = &[
    &["navigationEndpoint", "commandMetadata", "webCommandMetadata", "url"],
    &["onSelectCommand", "commandMetadata", "webCommandMetadata", "url"],
];

pub fn is_short(item: &Value) -> bool {
    if ItemKind::of(item).is_reel() {
        return true;
    }
    if let Some(tile) = model::tile(item) {
        let content_type = tile.get("contentType").and_then(Value::as_str).unwrap_or_default();
        if content_type.contains(SHORTS_STYLE) {
            return true;
        }
        if json::get(tile, &["onSelectCommand", "reelWatchEndpoint"]).is_some_and(|v| !v.is_null()) {
            return true;
        }
    }

    let Some(video) = model::video_renderer(item) else {
        return false;
    };
    if has_shorts_badge(video) || has_shorts_overlay(video) {
        return true;
    }
    NAVIGATION_URLS
        .iter()
        .filter_map(|path| json::get_str(video, path))
        .any(|url| url.contains("/shorts/"))
}

fn has_shorts_badge(video: &Value) -> bool {
    json::get_array(video, &["badges"]).is_some_and(|badges| {
        badges.iter().any(|b| {
            let badge = b.get("metadataBadgeRenderer");
            let label = badge.and_then(|r| r.get("label")).and_then(Value::as_str);
            let style = badge.and_then(|r| r.get("style")).and_then(Value::as_str).unwrap_or_default();
            label == Some(SHORTS_LABEL) || style.contains(SHORTS_STYLE)
        })
    })
}

fn has_shorts_overlay(video: &Value) -> bool {
    let overlays = json::get_array(video, &["thumbnailOverlays"])
        .or_else(|| json::get_array(video, &["header", "tileHeaderRenderer", "thumbnailOverlays"]));
    overlays.is_some_and(|list| {
        list.iter().any(|o| {
            json::get_str(o, &["thumbnailOverlayTimeStatusRenderer", "style"]) == Some(SHORTS_STYLE)
        })
    })
}
