use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::panic_message;
use crate::guard::ProcessedGuard;
use crate::json;
use crate::model::{ItemKind, ShelfKind};
use crate::passes::{self, PassContext};
use crate::shorts::is_short;

const BROWSE_SECTIONS: json::Path = &[
    "contents",
    "tvBrowseRenderer",
    "content",
    "tvSurfaceContentRenderer",
    "content",
    "sectionListRenderer",
    "contents",
];
const SECTION_LIST: json::Path = &["contents", "sectionListRenderer", "contents"];
const SECTION_CONTINUATION: json::Path = &["continuationContents", "sectionListContinuation", "contents"];
const SECONDARY_NAV_SECTIONS: json::Path =
    &["contents", "tvBrowseRenderer", "content", "tvSecondaryNavRenderer", "sections"];
const TAB_SECTIONS: json::Path = &[
    "tabRenderer",
    "content",
    "tvSurfaceContentRenderer",
    "content",
    "sectionListRenderer",
    "contents",
];
pub(crate) const WATCH_NEXT_PIVOT: json::Path =
    &["contents", "singleColumnWatchNextResults", "pivot", "sectionListRenderer", "contents"];

/// Bare item lists delivered as continuations. Passes run, the container stays.
const ITEM_CONTINUATIONS: &[json::Path] = &[
    &["continuationContents", "horizontalListContinuation", "items"],
    &["continuationContents", "gridContinuation", "items"],
];

/// Process a sequence of shelf nodes in place. Shelves left without items,
/// and all-short shelves while shorts are hidden, are removed.
pub fn process_shelves(shelves: &mut Vec<Value>, ctx: &PassContext<'_>, allow_previews: bool) {
    process_shelves_with(shelves, ctx, allow_previews, passes::run_all);
}

type Passes = fn(&mut Vec<Value>, &PassContext<'_>, bool);

fn process_shelves_with(shelves: &mut Vec<Value>, ctx: &PassContext<'_>, allow_previews: bool, run: Passes) {
    for idx in (0..shelves.len()).rev() {
        if !process_shelf(&mut shelves[idx], ctx, allow_previews, run) {
            shelves.remove(idx);
        }
    }
}

/// Returns whether the shelf should stay in its parent.
fn process_shelf(shelf: &mut Value, ctx: &PassContext<'_>, allow_previews: bool, run: Passes) -> bool {
    let Some(kind) = ShelfKind::detect(shelf) else {
        return true;
    };
    let Some(mut items) = kind.extract(shelf) else {
        return true;
    };

    if !ctx.settings.enable_shorts && !items.is_empty() && items.iter().all(is_short) {
        debug!(?kind, "dropping shorts-only shelf");
        return false;
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| run(&mut items, ctx, allow_previews)));
    if let Err(panic) = outcome {
        warn!(?kind, error = %panic_message(panic.as_ref()), "shelf processing failed");
    }

    let keep = !items.is_empty();
    if keep {
        kind.reinsert(shelf, items);
    } else {
        debug!(?kind, "dropping empty shelf");
    }
    keep
}

/// Walk every known entry point of `payload`. `pivot_prefix` is prepended
/// to the watch-next pivot after its shelves are processed. Returns the
/// number of collections processed.
pub fn walk(
    payload: &mut Value,
    ctx: &PassContext<'_>,
    guard: &ProcessedGuard,
    pivot_prefix: Option<Value>,
) -> usize {
    let mut processed = 0;

    if let Some(sections) = json::get_mut(payload, BROWSE_SECTIONS) {
        if ctx.settings.enable_ad_block {
            if let Some(list) = sections.as_array_mut() {
                list.retain(|shelf| ItemKind::of(shelf) != ItemKind::AdSlot);
            }
        }
        processed += guarded_shelves(sections, ctx, guard, true) as usize;
    }

    for path in [SECTION_LIST, SECTION_CONTINUATION] {
        if let Some(sections) = json::get_mut(payload, path) {
            processed += guarded_shelves(sections, ctx, guard, true) as usize;
        }
    }

    for path in ITEM_CONTINUATIONS {
        if let Some(items) = json::get_mut(payload, path) {
            let ran = guard.process_once(items, |items| {
                if let Some(list) = items.as_array_mut() {
                    let outcome = catch_unwind(AssertUnwindSafe(|| passes::run_all(list, ctx, true)));
                    if let Err(panic) = outcome {
                        warn!(error = %panic_message(panic.as_ref()), "continuation processing failed");
                    }
                }
            });
            processed += ran as usize;
        }
    }

    if let Some(nav_sections) = json::get_array_mut(payload, SECONDARY_NAV_SECTIONS) {
        for section in nav_sections.iter_mut() {
            let Some(tabs) = json::get_array_mut(section, &["tvSecondaryNavSectionRenderer", "tabs"]) else {
                continue;
            };
            for tab in tabs.iter_mut() {
                if let Some(sections) = json::get_mut(tab, TAB_SECTIONS) {
                    processed += guarded_shelves(sections, ctx, guard, true) as usize;
                }
            }
        }
    }

    if let Some(pivot) = json::get_mut(payload, WATCH_NEXT_PIVOT) {
        let ran = guard.process_once(pivot, |pivot| {
            if let Some(list) = pivot.as_array_mut() {
                process_shelves(list, ctx, false);
                if let Some(shelf) = pivot_prefix {
                    list.insert(0, shelf);
                }
            }
        });
        processed += ran as usize;
    }

    processed
}

fn guarded_shelves(sections: &mut Value, ctx: &PassContext<'_>, guard: &ProcessedGuard, allow_previews: bool) -> bool {
    guard.process_once(sections, |sections| {
        if let Some(list) = sections.as_array_mut() {
            process_shelves(list, ctx, allow_previews);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::location::PageContext;
    use serde_json::json;

    fn ctx(settings: &Settings) -> PassContext<'_> {
        PassContext { settings, page: PageContext::Home, generation: 0, dearrow: None }
    }

    fn no_shorts() -> Settings {
        Settings { enable_shorts: false, ..Settings::default() }
    }

    fn video(id: &str) -> Value {
        json!({"tileRenderer": {"contentId": id, "contentType": "TILE_CONTENT_TYPE_VIDEO"}})
    }

    fn short(id: &str) -> Value {
        json!({"tileRenderer": {"contentId": id, "contentType": "TILE_CONTENT_TYPE_SHORTS"}})
    }

    fn hlist(items: Vec<Value>) -> Value {
        json!({"shelfRenderer": {"content": {"horizontalListRenderer": {"items": items}}}})
    }

    fn content_ids(shelf: &Value) -> Vec<String> {
        ShelfKind::detect(shelf)
            .and_then(|k| k.items(shelf))
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| json::get_str(i, &["tileRenderer", "contentId"]))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn explode_on_marker(items: &mut Vec<Value>, ctx: &PassContext<'_>, allow_previews: bool) {
        if items.iter().any(|i| json::get_str(i, &["tileRenderer", "contentId"]) == Some("boom")) {
            panic!("malformed item");
        }
        passes::run_all(items, ctx, allow_previews);
    }

    #[test]
    fn failing_shelf_does_not_stop_siblings() {
        let settings = no_shorts();
        let mut shelves = vec![
            hlist(vec![short("s1"), video("a")]),
            hlist(vec![video("boom"), short("s2")]),
            hlist(vec![video("b"), short("s3")]),
        ];
        process_shelves_with(&mut shelves, &ctx(&settings), true, explode_on_marker);
        assert_eq!(shelves.len(), 3);
        assert_eq!(content_ids(&shelves[0]), vec!["a"]);
        assert_eq!(content_ids(&shelves[1]), vec!["boom", "s2"]);
        assert_eq!(content_ids(&shelves[2]), vec!["b"]);
    }

    #[test]
    fn mixed_shelf_keeps_normal_items() {
        let settings = no_shorts();
        let mut shelves = vec![hlist(vec![short("s1"), video("n1"), short("s2")])];
        process_shelves(&mut shelves, &ctx(&settings), true);
        assert_eq!(shelves.len(), 1);
        assert_eq!(content_ids(&shelves[0]), vec!["n1"]);
    }

    #[test]
    fn all_short_shelf_is_dropped() {
        let settings = no_shorts();
        let mut shelves = vec![video_shelf("keep"), hlist(vec![short("s1"), short("s2"), short("s3")])];
        process_shelves(&mut shelves, &ctx(&settings), true);
        assert_eq!(shelves.len(), 1);
        assert_eq!(content_ids(&shelves[0]), vec!["keep"]);
    }

    fn video_shelf(id: &str) -> Value {
        hlist(vec![video(id)])
    }

    #[test]
    fn rich_section_drops_the_parent_node() {
        let settings = no_shorts();
        let section = json!({"richSectionRenderer": {"content": {"richShelfRenderer": {"content": {
            "richGridRenderer": {"contents": [
                {"richItemRenderer": {"content": {"reelItemRenderer": {"videoId": "a"}}}},
                {"richItemRenderer": {"content": {"reelItemRenderer": {"videoId": "b"}}}}
            ]}
        }}}}});
        let mut shelves = vec![section, video_shelf("v")];
        process_shelves(&mut shelves, &ctx(&settings), true);
        assert_eq!(shelves.len(), 1);
        assert!(shelves[0].get("richSectionRenderer").is_none());
    }

    #[test]
    fn empty_shelves_never_survive() {
        let settings = Settings::default();
        let mut shelves = vec![
            hlist(vec![]),
            json!({"gridRenderer": {"items": [{"adSlotRenderer": {}}]}}),
            video_shelf("a"),
            json!({"unknownShelfRenderer": {"items": []}}),
        ];
        process_shelves(&mut shelves, &ctx(&settings), true);
        assert_eq!(shelves.len(), 2);
        assert_eq!(content_ids(&shelves[0]), vec!["a"]);
        assert!(shelves[1].get("unknownShelfRenderer").is_some());
        for shelf in &shelves {
            if let Some(items) = ShelfKind::detect(shelf).and_then(|k| k.items(shelf)) {
                assert!(!items.is_empty());
            }
        }
    }

    #[test]
    fn order_of_surviving_shelves_is_preserved() {
        let settings = no_shorts();
        let mut shelves = vec![
            video_shelf("a"),
            hlist(vec![short("x")]),
            video_shelf("b"),
            hlist(vec![short("y")]),
            video_shelf("c"),
        ];
        process_shelves(&mut shelves, &ctx(&settings), true);
        let firsts: Vec<String> = shelves.iter().flat_map(content_ids).collect();
        assert_eq!(firsts, vec!["a", "b", "c"]);
    }

    #[test]
    fn walks_browse_and_removes_masthead() {
        let settings = no_shorts();
        let guard = ProcessedGuard::default();
        let mut payload = json!({"contents": {"tvBrowseRenderer": {"content": {"tvSurfaceContentRenderer": {
            "content": {"sectionListRenderer": {"contents": [
                {"adSlotRenderer": {}},
                hlist(vec![short("s"), video("v")])
            ]}}
        }}}}});
        assert_eq!(walk(&mut payload, &ctx(&settings), &guard, None), 1);
        let sections = json::get_array(&payload, BROWSE_SECTIONS).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(content_ids(&sections[0]), vec!["v"]);
    }

    #[test]
    fn second_walk_is_a_no_op() {
        let settings = Settings::default();
        let guard = ProcessedGuard::default();
        let mut payload = json!({"contents": {"sectionListRenderer": {"contents": [
            hlist(vec![json!({"tileRenderer": {
                "style": "TILE_STYLE_YTLR_DEFAULT",
                "contentId": "a",
                "onLongPressCommand": {"showMenuCommand": {"menu": {"menuRenderer": {"items": []}}}}
            }})])
        ]}}});
        assert_eq!(walk(&mut payload, &ctx(&settings), &guard, None), 1);
        let once = payload.clone();
        assert_eq!(walk(&mut payload, &ctx(&settings), &guard, None), 0);
        assert_eq!(payload, once);
    }

    #[test]
    fn continuations_keep_their_container() {
        let settings = no_shorts();
        let guard = ProcessedGuard::default();
        let mut payload = json!({"continuationContents": {"gridContinuation": {"items": [short("s")]}}});
        walk(&mut payload, &ctx(&settings), &guard, None);
        assert_eq!(payload["continuationContents"]["gridContinuation"]["items"], json!([]));
    }

    #[test]
    fn secondary_nav_tabs_are_processed() {
        let settings = no_shorts();
        let guard = ProcessedGuard::default();
        let tab = |id: &str| {
            json!({"tabRenderer": {"content": {"tvSurfaceContentRenderer": {"content": {"sectionListRenderer": {
                "contents": [hlist(vec![short("s"), video(id)])]
            }}}}}})
        };
        let mut payload = json!({"contents": {"tvBrowseRenderer": {"content": {"tvSecondaryNavRenderer": {
            "sections": [{"tvSecondaryNavSectionRenderer": {"tabs": [tab("a"), tab("b")]}}]
        }}}}});
        assert_eq!(walk(&mut payload, &ctx(&settings), &guard, None), 2);
        let tabs = json::get_array(&payload["contents"]["tvBrowseRenderer"]["content"]["tvSecondaryNavRenderer"]["sections"][0], &["tvSecondaryNavSectionRenderer", "tabs"]).unwrap();
        let second = json::get_array(&tabs[1], TAB_SECTIONS).unwrap();
        assert_eq!(content_ids(&second[0]), vec!["b"]);
    }

    #[test]
    fn watch_next_pivot_gets_prefix_and_no_previews() {
        let settings = Settings { enable_previews: true, ..Settings::default() };
        let guard = ProcessedGuard::default();
        let mut item = video("a");
        item["tileRenderer"]["onSelectCommand"] = json!({"watchEndpoint": {"videoId": "a"}});
        let mut payload = json!({"contents": {"singleColumnWatchNextResults": {"pivot": {"sectionListRenderer": {
            "contents": [hlist(vec![item])]
        }}}}});
        walk(&mut payload, &ctx(&settings), &guard, Some(json!({"queued": true})));
        let pivot = json::get_array(&payload, WATCH_NEXT_PIVOT).unwrap();
        assert_eq!(pivot.len(), 2);
        assert_eq!(pivot[0], json!({"queued": true}));
        let items = ShelfKind::HorizontalList.items(&pivot[1]).unwrap();
        assert!(items[0]["tileRenderer"].get("onFocusCommand").is_none());
    }
}
