use serde_json::{json, Value};
use tracing::debug;

use crate::config::Settings;
use crate::dearrow::DeArrow;
use crate::json;
use crate::location::PageContext;
use crate::model::{self, ItemKind};
use crate::progress::watch_progress;
use crate::renderers;
use crate::shorts::is_short;

const HQ_THUMBNAIL_HOST: &str = "https://i.ytimg.com/vi";

/// Per-payload inputs shared by every pass.
pub struct PassContext<'a> {
    pub settings: &'a Settings,
    pub page: PageContext,
    /// Generation of the payload, used to key DeArrow results.
    pub generation: u64,
    pub dearrow: Option<&'a DeArrow>,
}

/// Run every pass over `items` in order. Augmentation runs before filtering
/// so the filters see fully annotated items.
pub fn run_all(items: &mut Vec<Value>, ctx: &PassContext<'_>, allow_previews: bool) {
    remove_ad_slots(items);
    schedule_dearrow(items, ctx);
    upscale_thumbnails(items, ctx.settings);
    augment_long_press(items, ctx.settings);
    if allow_previews {
        add_previews(items, ctx.settings);
    }
    filter_shorts(items, ctx.settings);
    filter_watched(items, ctx);
}

pub fn remove_ad_slots(items: &mut Vec<Value>) {
    items.retain(|item| ItemKind::of(item) != ItemKind::AdSlot);
}

pub fn schedule_dearrow(items: &[Value], ctx: &PassContext<'_>) {
    if !ctx.settings.enable_de_arrow {
        return;
    }
    let Some(dearrow) = ctx.dearrow else {
        debug!("dearrow enabled but no runtime configured, skipping");
        return;
    };
    for tile in items.iter().filter_map(model::tile) {
        if let Some(id) = tile.get("contentId").and_then(Value::as_str) {
            dearrow.schedule(ctx.generation, id.to_string(), ctx.settings.enable_de_arrow_thumbnails);
        }
    }
}

pub fn upscale_thumbnails(items: &mut [Value], settings: &Settings) {
    if !settings.enable_hq_thumbnails {
        return;
    }
    for tile in items.iter_mut().filter_map(model::tile_mut) {
        if !model::is_default_tile(tile) {
            continue;
        }
        let video_id = json::get_str(tile, &["onSelectCommand", "watchEndpoint", "videoId"])
            .or_else(|| json::get_str(tile, &["contentId"]))
            .map(str::to_string);
        let Some(video_id) = video_id else { continue };
        let Some(thumbs) = json::get_mut(tile, &["header", "tileHeaderRenderer", "thumbnail", "thumbnails"]) else {
            continue;
        };
        let query = thumbs
            .get(0)
            .and_then(|t| t.get("url"))
            .and_then(Value::as_str)
            .and_then(|url| url.split_once('?'))
            .map(|(_, q)| q.to_string())
            .filter(|q| !q.is_empty());
        let url = match query {
            Some(q) => format!("{HQ_THUMBNAIL_HOST}/{video_id}/sddefault.jpg?{q}"),
            None => format!("{HQ_THUMBNAIL_HOST}/{video_id}/sddefault.jpg"),
        };
        *thumbs = json!([{"url": url, "width": 640, "height": 480}]);
    }
}

pub fn augment_long_press(items: &mut [Value], settings: &Settings) {
    for item in items.iter_mut() {
        let Some(tile) = model::tile(item) else { continue };
        if !model::is_default_tile(tile) {
            continue;
        }
        if json::has(tile, "onLongPressCommand") {
            append_add_to_queue(item);
        } else if settings.enable_long_press {
            synthesize_long_press(item);
        }
    }
}

const MENU_ITEMS: json::Path = &["tileRenderer", "onLongPressCommand", "showMenuCommand", "menu", "menuRenderer", "items"];

fn append_add_to_queue(item: &mut Value) {
    let entry = renderers::add_to_queue_item(item);
    let Some(menu) = json::get_array_mut(item, MENU_ITEMS) else { return };
    let already = menu.iter().any(|m| {
        json::get_str(m, &["menuServiceItemRenderer", "serviceEndpoint", "playlistEditEndpoint", "customAction", "action"])
            == Some("ADD_TO_QUEUE")
    });
    if !already {
        menu.push(entry);
    }
}

fn synthesize_long_press(item: &mut Value) {
    let Some(tile) = model::tile(item) else { return };
    let Some(video_id) = tile.get("contentId").and_then(Value::as_str) else { return };
    let title = json::get(tile, &["metadata", "tileMetadataRenderer", "title"]).and_then(json::text).unwrap_or_default();
    let subtitle = json::get_array(tile, &["metadata", "tileMetadataRenderer", "lines"])
        .and_then(|lines| lines.first())
        .and_then(|line| json::get_array(line, &["lineRenderer", "items"]))
        .and_then(|items| items.first())
        .and_then(|li| json::get(li, &["lineItemRenderer", "text"]))
        .and_then(json::text)
        .unwrap_or_default();
    let thumbnails = json::get(tile, &["header", "tileHeaderRenderer", "thumbnail", "thumbnails"])
        .cloned()
        .unwrap_or_else(|| json!([]));
    let watch_endpoint = json::get(tile, &["onSelectCommand", "watchEndpoint"]).cloned();

    let command = renderers::long_press_command(renderers::LongPress {
        video_id,
        title: &title,
        subtitle: &subtitle,
        thumbnails,
        watch_endpoint,
        item,
    });
    if let Some(tile) = model::tile_mut(item).and_then(Value::as_object_mut) {
        tile.insert("onLongPressCommand".to_string(), command);
    }
}

pub fn add_previews(items: &mut [Value], settings: &Settings) {
    if !settings.enable_previews {
        return;
    }
    for tile in items.iter_mut().filter_map(model::tile_mut) {
        let has_preview = tile.get("onFocusCommand").is_some_and(|c| {
            json::has(c, "startInlinePlaybackCommand") || json::has(c, "playbackEndpoint")
        });
        if has_preview {
            continue;
        }
        let Some(select) = tile.get("onSelectCommand").filter(|c| !c.is_null()).cloned() else { continue };
        if let Some(obj) = tile.as_object_mut() {
            obj.insert("onFocusCommand".to_string(), renderers::inline_playback_command(select));
        }
    }
}

pub fn filter_shorts(items: &mut Vec<Value>, settings: &Settings) {
    if settings.enable_shorts {
        return;
    }
    items.retain(|item| !is_short(item));
}

/// Whether watched filtering is active on `page` under `settings`.
pub fn watched_filter_applies(settings: &Settings, page: PageContext) -> bool {
    if !settings.enable_hide_watched_videos {
        return false;
    }
    let pages = &settings.hide_watched_videos_pages;
    if !pages.is_empty() && !pages.iter().any(|p| p.eq_ignore_ascii_case(page.as_str())) {
        return false;
    }
    if page == PageContext::Playlist && !settings.enable_hide_watched_in_playlists {
        return false;
    }
    true
}

pub fn filter_watched(items: &mut Vec<Value>, ctx: &PassContext<'_>) {
    if !watched_filter_applies(ctx.settings, ctx.page) {
        return;
    }
    let threshold = ctx.settings.hide_watched_videos_threshold;
    items.retain(|item| match watch_progress(item) {
        Some(pct) => pct < threshold,
        None => true,
    });
}
