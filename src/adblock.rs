use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Settings;
use crate::json;

enum Action {
    /// Replace the field with a fresh value.
    Replace(fn() -> Value),
    /// Keep only array entries for which the predicate holds.
    Retain(fn(&Value) -> bool),
}

struct Rule {
    field: &'static str,
    enabled: fn(&Settings) -> bool,
    action: Action,
}

const RULES: &[Rule] = &[
    Rule { field: "adPlacements", enabled: |s| s.enable_ad_block, action: Action::Replace(|| Value::Array(vec![])) },
    Rule { field: "playerAds", enabled: |s| s.enable_ad_block, action: Action::Replace(|| Value::Bool(false)) },
    Rule { field: "adSlots", enabled: |s| s.enable_ad_block, action: Action::Replace(|| Value::Array(vec![])) },
    Rule {
        field: "paidContentOverlay",
        enabled: |s| !s.enable_paid_promotion_overlay,
        action: Action::Replace(|| Value::Null),
    },
    Rule { field: "endscreen", enabled: |s| s.enable_hide_end_screen_cards, action: Action::Replace(|| Value::Null) },
    Rule {
        field: "messages",
        enabled: |s| !s.enable_you_there_renderer,
        action: Action::Retain(|msg| !json::has(msg, "youThereRenderer")),
    },
    Rule {
        field: "entries",
        enabled: |s| s.enable_ad_block,
        action: Action::Retain(|entry| {
            !json::truthy(json::get(entry, &["command", "reelWatchEndpoint", "adClientParams", "isAd"]))
        }),
    },
];

/// Apply every enabled stripping rule to the top level of `payload`.
/// Returns the number of fields changed.
pub fn strip(payload: &mut Value, settings: &Settings) -> usize {
    let Some(root) = payload.as_object_mut() else {
        return 0;
    };
    let mut changed = 0;
    for rule in RULES {
        if !(rule.enabled)(settings) {
            continue;
        }
        if apply(root, rule) {
            debug!(field = rule.field, "stripped");
            changed += 1;
        }
    }
    if filter_formats(root, &settings.video_preferred_codec) {
        changed += 1;
    }
    changed
}

fn apply(root: &mut Map<String, Value>, rule: &Rule) -> bool {
    let Some(field) = root.get_mut(rule.field) else {
        return false;
    };
    match &rule.action {
        Action::Replace(fresh) => {
            if !json::truthy(Some(field)) {
                return false;
            }
            *field = fresh();
            true
        }
        Action::Retain(keep) => {
            let Some(list) = field.as_array_mut() else {
                return false;
            };
            let before = list.len();
            list.retain(|v| keep(v));
            list.len() != before
        }
    }
}

/// Keep audio formats plus video formats in the preferred codec, provided
/// at least one format carries it.
fn filter_formats(root: &mut Map<String, Value>, codec: &str) -> bool {
    if codec.is_empty() || codec == "any" {
        return false;
    }
    let Some(formats) = root
        .get_mut("streamingData")
        .and_then(|s| s.get_mut("adaptiveFormats"))
        .and_then(Value::as_array_mut)
    else {
        return false;
    };
    let mime = |f: &Value| f.get("mimeType").and_then(Value::as_str).unwrap_or_default().to_string();
    if !formats.iter().any(|f| mime(f).contains(codec)) {
        debug!(codec, "no format in preferred codec, keeping all");
        return false;
    }
    let before = formats.len();
    formats.retain(|f| {
        let m = mime(f);
        m.starts_with("audio/") || m.contains(codec)
    });
    formats.len() != before
}
