//! Adapters for the external schema: which renderer an item carries and where
//! each known shelf shape keeps its items.
//!
//! The shapes are reverse-engineered and keep changing between service
//! revisions. Support for a new shape belongs in these tables, not in the
//! passes.

use serde_json::Value;

use crate::json::{self, Path};

/// Renderer variant an item is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Tile,
    GridVideo,
    CompactVideo,
    Video,
    PlaylistVideo,
    RichItemVideo,
    RichItemReel,
    Reel,
    ShortsLockup,
    AdSlot,
    Unknown,
}

/// Item kinds in probe order with the path to their renderer object.
const ITEM_RENDERERS: &[(ItemKind, Path)] = &[
    (ItemKind::AdSlot, &["adSlotRenderer"]),
    (ItemKind::Tile, &["tileRenderer"]),
    (ItemKind::GridVideo, &["gridVideoRenderer"]),
    (ItemKind::CompactVideo, &["compactVideoRenderer"]),
    (ItemKind::Video, &["videoRenderer"]),
    (ItemKind::PlaylistVideo, &["playlistVideoRenderer"]),
    (ItemKind::RichItemVideo, &["richItemRenderer", "content", "videoRenderer"]),
    (ItemKind::RichItemReel, &["richItemRenderer", "content", "reelItemRenderer"]),
    (ItemKind::ShortsLockup, &["richItemRenderer", "content", "shortsLockupViewModel"]),
    (ItemKind::Reel, &["reelItemRenderer"]),
    (ItemKind::ShortsLockup, &["shortsLockupViewModel"]),
];

impl ItemKind {
    pub fn of(item: &Value) -> ItemKind {
        ITEM_RENDERERS
            .iter()
            .find(|(_, path)| json::get(item, path).is_some_and(|v| !v.is_null()))
            .map(|(kind, _)| *kind)
            .unwrap_or(ItemKind::Unknown)
    }

    pub fn is_reel(&self) -> bool {
        matches!(self, ItemKind::Reel | ItemKind::RichItemReel | ItemKind::ShortsLockup)
    }
}

/// Renderers that describe a regular video, in the order they are probed.
pub const VIDEO_RENDERERS: &[Path] = &[
    &["videoRenderer"],
    &["compactVideoRenderer"],
    &["gridVideoRenderer"],
    &["richItemRenderer", "content", "videoRenderer"],
    &["tileRenderer"],
];

/// First regular-video renderer object present on the item.
pub fn video_renderer(item: &Value) -> Option<&Value> {
    VIDEO_RENDERERS.iter().find_map(|path| json::get(item, path).filter(|v| v.is_object()))
}

/// Tile renderer, the shape the TV client renders and the passes augment.
pub fn tile(item: &Value) -> Option<&Value> {
    item.get("tileRenderer").filter(|v| v.is_object())
}

pub fn tile_mut(item: &mut Value) -> Option<&mut Value> {
    item.get_mut("tileRenderer").filter(|v| v.is_object())
}

pub const DEFAULT_TILE_STYLE: &str = "TILE_STYLE_YTLR_DEFAULT";

/// True for regular video tiles (not channels, playlists or custom tiles).
pub fn is_default_tile(tile: &Value) -> bool {
    tile.get("style").and_then(Value::as_str) == Some(DEFAULT_TILE_STYLE)
}

/// Known collection wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfKind {
    Grid,
    HorizontalList,
    VerticalList,
    RichShelf,
    /// A rich section wrapping a single rich shelf; dropping it drops the section.
    RichSection,
    PlaylistVideoList,
}

const SHELF_SHAPES: &[(ShelfKind, Path)] = &[
    (ShelfKind::Grid, &["gridRenderer", "items"]),
    (ShelfKind::HorizontalList, &["shelfRenderer", "content", "horizontalListRenderer", "items"]),
    (ShelfKind::VerticalList, &["shelfRenderer", "content", "verticalListRenderer", "items"]),
    (ShelfKind::RichShelf, &["richShelfRenderer", "content", "richGridRenderer", "contents"]),
    (
        ShelfKind::RichSection,
        &["richSectionRenderer", "content", "richShelfRenderer", "content", "richGridRenderer", "contents"],
    ),
    (ShelfKind::PlaylistVideoList, &["playlistVideoListRenderer", "contents"]),
];

impl ShelfKind {
    /// Which known shape `shelf` has, if any.
    pub fn detect(shelf: &Value) -> Option<ShelfKind> {
        SHELF_SHAPES
            .iter()
            .find(|(_, path)| json::get_array(shelf, path).is_some())
            .map(|(kind, _)| *kind)
    }

    pub fn items_path(&self) -> Path {
        SHELF_SHAPES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, path)| *path)
            .unwrap_or(&[])
    }

    pub fn items<'a>(&self, shelf: &'a Value) -> Option<&'a Vec<Value>> {
        json::get_array(shelf, self.items_path())
    }

    /// Take the items out of the shelf, leaving an empty list in place.
    pub fn extract(&self, shelf: &mut Value) -> Option<Vec<Value>> {
        json::get_array_mut(shelf, self.items_path()).map(std::mem::take)
    }

    /// Put items back where `extract` found them.
    pub fn reinsert(&self, shelf: &mut Value, items: Vec<Value>) {
        if let Some(slot) = json::get_array_mut(shelf, self.items_path()) {
            *slot = items;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_kinds() {
        assert_eq!(ItemKind::of(&json!({"tileRenderer": {}})), ItemKind::Tile);
        assert_eq!(ItemKind::of(&json!({"adSlotRenderer": {}})), ItemKind::AdSlot);
        assert_eq!(
            ItemKind::of(&json!({"richItemRenderer": {"content": {"reelItemRenderer": {}}}})),
            ItemKind::RichItemReel
        );
        assert_eq!(ItemKind::of(&json!({"somethingNew": {}})), ItemKind::Unknown);
        assert!(ItemKind::RichItemReel.is_reel());
    }

    #[test]
    fn detects_each_shelf_shape() {
        let cases = [
            (json!({"gridRenderer": {"items": []}}), ShelfKind::Grid),
            (json!({"shelfRenderer": {"content": {"horizontalListRenderer": {"items": []}}}}), ShelfKind::HorizontalList),
            (json!({"shelfRenderer": {"content": {"verticalListRenderer": {"items": []}}}}), ShelfKind::VerticalList),
            (json!({"richShelfRenderer": {"content": {"richGridRenderer": {"contents": []}}}}), ShelfKind::RichShelf),
            (
                json!({"richSectionRenderer": {"content": {"richShelfRenderer": {"content": {"richGridRenderer": {"contents": []}}}}}}),
                ShelfKind::RichSection,
            ),
            (json!({"playlistVideoListRenderer": {"contents": []}}), ShelfKind::PlaylistVideoList),
        ];
        for (shelf, kind) in cases {
            assert_eq!(ShelfKind::detect(&shelf), Some(kind));
        }
        assert_eq!(ShelfKind::detect(&json!({"gridRenderer": {}})), None);
    }

    #[test]
    fn extract_then_reinsert_keeps_shape() {
        let mut shelf = json!({"gridRenderer": {"items": [1, 2, 3], "title": "x"}});
        let kind = ShelfKind::detect(&shelf).unwrap();
        let mut items = kind.extract(&mut shelf).unwrap();
        assert_eq!(kind.items(&shelf).map(Vec::len), Some(0));
        items.remove(1);
        kind.reinsert(&mut shelf, items);
        assert_eq!(shelf, json!({"gridRenderer": {"items": [1, 3], "title": "x"}}));
    }
}
