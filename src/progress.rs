use serde_json::Value;

use crate::json::{self, Path};

/// Renderers that may carry progress, probed in order.
const CANDIDATE_RENDERERS: &[Path] = &[
    &["tileRenderer"],
    &["playlistVideoRenderer"],
    &["compactVideoRenderer"],
    &["gridVideoRenderer"],
    &["videoRenderer"],
    &["richItemRenderer", "content", "videoRenderer"],
    &["richItemRenderer", "content", "reelItemRenderer"],
    &["videoWithContextRenderer"],
    &["commandVideoRenderer"],
];

/// Where a renderer keeps its thumbnail overlays.
const OVERLAY_ARRAYS: &[Path] = &[
    &["thumbnailOverlays"],
    &["header", "tileHeaderRenderer", "thumbnailOverlays"],
    &["thumbnail", "thumbnailOverlays"],
];

const RESUME_FIELDS: &[&str] = &["percentDurationWatched", "percent", "progressPercent", "resumePlaybackPercent", "width"];

const SCALAR_FIELDS: &[&str] =
    &["percentDurationWatched", "progressPercent", "resumePlaybackPercent", "percentWatched", "progress"];

/// Percentage watched in `[0, 100]`, or `None` when the item carries no
/// progress data. `None` must never be read as zero progress.
pub fn watch_progress(item: &Value) -> Option<f64> {
    CANDIDATE_RENDERERS
        .iter()
        .filter_map(|path| json::get(item, path).filter(|r| r.is_object()))
        .find_map(renderer_progress)
}

fn renderer_progress(renderer: &Value) -> Option<f64> {
    let overlays = OVERLAY_ARRAYS.iter().find_map(|path| json::get_array(renderer, path));
    if let Some(pct) = overlays.and_then(|list| list.iter().find_map(overlay_progress)) {
        return Some(pct);
    }
    SCALAR_FIELDS.iter().find_map(|f| renderer.get(*f).and_then(to_percent))
}

fn overlay_progress(overlay: &Value) -> Option<f64> {
    if let Some(resume) = overlay.get("thumbnailOverlayResumePlaybackRenderer") {
        if let Some(pct) = RESUME_FIELDS.iter().find_map(|f| resume.get(*f).and_then(to_percent)) {
            return Some(pct);
        }
    }
    json::get(overlay, &["style", "width"]).and_then(to_percent)
}

/// Normalize a percent-like value. Values in (0, 1] are fractions and get
/// scaled, larger numbers pass through, strings may carry a trailing `%`
/// (taken literally).
pub fn to_percent(value: &Value) -> Option<f64> {
    let pct = match value {
        Value::Number(n) => scale_fraction(n.as_f64()?),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(literal) => literal.trim().parse::<f64>().ok()?,
                None => scale_fraction(s.parse::<f64>().ok()?),
            }
        }
        _ => return None,
    };
    if pct.is_finite() {
        Some(pct.clamp(0.0, 100.0))
    } else {
        None
    }
}

fn scale_fraction(n: f64) -> f64 {
    if n > 0.0 && n <= 1.0 {
        n * 100.0
    } else {
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tile_with_overlay(overlay: Value) -> Value {
        json!({"tileRenderer": {"header": {"tileHeaderRenderer": {"thumbnailOverlays": [
            {"thumbnailOverlayTimeStatusRenderer": {"text": {"simpleText": "10:00"}}},
            overlay
        ]}}}})
    }

    #[test]
    fn no_progress_data() {
        assert_eq!(watch_progress(&json!({})), None);
        assert_eq!(watch_progress(&json!({"tileRenderer": {"contentId": "x"}})), None);
        assert_eq!(watch_progress(&json!({"videoRenderer": {"thumbnailOverlays": []}})), None);
    }

    #[test]
    fn tile_resume_overlay() {
        let item = tile_with_overlay(json!({"thumbnailOverlayResumePlaybackRenderer": {"percentDurationWatched": 42}}));
        assert_eq!(watch_progress(&item), Some(42.0));
    }

    #[test]
    fn resume_value_of_one_is_fully_watched() {
        let item = tile_with_overlay(json!({"thumbnailOverlayResumePlaybackRenderer": {"percentDurationWatched": "1"}}));
        assert_eq!(watch_progress(&item), Some(100.0));
    }

    #[test]
    fn rich_item_and_scalar_fields() {
        let item = json!({"richItemRenderer": {"content": {"videoRenderer": {
            "thumbnailOverlays": [{"thumbnailOverlayResumePlaybackRenderer": {"percent": "75%"}}]
        }}}});
        assert_eq!(watch_progress(&item), Some(75.0));

        let scalar = json!({"playlistVideoRenderer": {"percentWatched": 0.5}});
        assert_eq!(watch_progress(&scalar), Some(50.0));
    }

    #[test]
    fn style_width_overlay() {
        let item = json!({"gridVideoRenderer": {"thumbnailOverlays": [{"style": {"width": "30%"}}]}});
        assert_eq!(watch_progress(&item), Some(30.0));
    }

    #[test]
    fn first_candidate_wins() {
        let item = json!({
            "tileRenderer": {"progress": 10},
            "videoRenderer": {"progress": 90}
        });
        assert_eq!(watch_progress(&item), Some(10.0));
    }

    #[test]
    fn normalization() {
        assert_eq!(to_percent(&json!(100)), Some(100.0));
        assert_eq!(to_percent(&json!(1)), Some(100.0));
        assert_eq!(to_percent(&json!("1")), Some(100.0));
        assert_eq!(to_percent(&json!(2)), Some(2.0));
        assert_eq!(to_percent(&json!(0)), Some(0.0));
        assert_eq!(to_percent(&json!(0.25)), Some(25.0));
        assert_eq!(to_percent(&json!("0.5%")), Some(0.5));
        assert_eq!(to_percent(&json!(" 12 ")), Some(12.0));
        assert_eq!(to_percent(&json!(250)), Some(100.0));
        assert_eq!(to_percent(&json!("abc")), None);
        assert_eq!(to_percent(&json!(null)), None);
        assert_eq!(to_percent(&json!(true)), None);
    }

    #[test]
    fn unparsable_overlay_falls_through_to_scalar() {
        let item = json!({"compactVideoRenderer": {
            "thumbnailOverlays": [{"thumbnailOverlayResumePlaybackRenderer": {"percent": "n/a"}}],
            "progressPercent": 60
        }});
        assert_eq!(watch_progress(&item), Some(60.0));
    }
}
