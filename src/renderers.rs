use serde_json::{json, Value};

/// Custom action understood by the host's command resolver.
pub fn custom_action(action: &str, parameters: Option<Value>) -> Value {
    match parameters {
        Some(p) => json!({"customAction": {"action": action, "parameters": p}}),
        None => json!({"customAction": {"action": action}}),
    }
}

pub fn menu_service_item(text: &str, service_endpoint: Value) -> Value {
    json!({
        "menuServiceItemRenderer": {
            "text": {"runs": [{"text": text}]},
            "serviceEndpoint": service_endpoint
        }
    })
}

pub fn menu_navigation_item(text: &str, navigation_endpoint: Value) -> Value {
    json!({
        "menuNavigationItemRenderer": {
            "text": {"runs": [{"text": text}]},
            "navigationEndpoint": navigation_endpoint
        }
    })
}

/// "Add to Queue" entry carrying the whole item for the host's queue.
pub fn add_to_queue_item(item: &Value) -> Value {
    menu_service_item(
        "Add to Queue",
        json!({
            "clickTrackingParams": null,
            "playlistEditEndpoint": custom_action("ADD_TO_QUEUE", Some(item.clone()))
        }),
    )
}

/// Data a synthesized long-press menu is built from.
pub struct LongPress<'a> {
    pub video_id: &'a str,
    pub title: &'a str,
    pub subtitle: &'a str,
    pub thumbnails: Value,
    pub watch_endpoint: Option<Value>,
    pub item: &'a Value,
}

pub fn long_press_command(data: LongPress<'_>) -> Value {
    let mut menu = vec![add_to_queue_item(data.item)];
    if let Some(endpoint) = data.watch_endpoint {
        menu.push(menu_navigation_item("Play", json!({"watchEndpoint": endpoint})));
    }
    json!({
        "clickTrackingParams": null,
        "showMenuCommand": {
            "contentId": data.video_id,
            "thumbnail": {"thumbnails": data.thumbnails},
            "title": {"simpleText": data.title},
            "subtitle": {"simpleText": data.subtitle},
            "menu": {"menuRenderer": {"items": menu}}
        }
    })
}

/// Focus-triggered inline preview built from a tile's select command.
pub fn inline_playback_command(playback_endpoint: Value) -> Value {
    json!({
        "startInlinePlaybackCommand": {
            "blockAdoption": true,
            "caption": false,
            "delayMs": 3000,
            "durationMs": 40000,
            "muted": true,
            "restartPlaybackBeforeSeconds": 10,
            "resumeVideo": true,
            "playbackEndpoint": playback_endpoint
        }
    })
}

pub fn tile(title: &str, on_select_command: Value) -> Value {
    json!({
        "tileRenderer": {
            "style": "TILE_STYLE_YTLR_DEFAULT",
            "header": {"tileHeaderRenderer": {"thumbnail": {"thumbnails": []}}},
            "metadata": {"tileMetadataRenderer": {"title": {"simpleText": title}, "lines": []}},
            "onSelectCommand": on_select_command
        }
    })
}

/// Horizontal-list shelf focused on `selected_index`.
pub fn shelf(title: &str, items: Vec<Value>, selected_index: usize) -> Value {
    json!({
        "shelfRenderer": {
            "headerRenderer": {"shelfHeaderRenderer": {"title": {"simpleText": title}}},
            "content": {
                "horizontalListRenderer": {
                    "items": items,
                    "selectedIndex": selected_index,
                    "visibleItemCount": 4
                }
            }
        }
    })
}

pub fn button(text: &str, icon: &str, command: Value) -> Value {
    json!({
        "buttonRenderer": {
            "isDisabled": false,
            "text": {"simpleText": text},
            "icon": {"iconType": icon},
            "command": command
        }
    })
}

/// Overlay action shown from `trigger_ms` for `duration_ms`.
pub fn timely_action(text: &str, icon: &str, command: Value, trigger_ms: u64, duration_ms: u64) -> Value {
    json!({
        "timelyActionRenderer": {
            "actionButtons": [button(text, icon, command)],
            "triggerTimeMs": trigger_ms.to_string(),
            "timeoutMs": duration_ms.to_string(),
            "type": ""
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_action_parameters_are_optional() {
        assert_eq!(custom_action("CLEAR_QUEUE", None), json!({"customAction": {"action": "CLEAR_QUEUE"}}));
        assert_eq!(
            custom_action("SKIP", Some(json!({"time": 3}))),
            json!({"customAction": {"action": "SKIP", "parameters": {"time": 3}}})
        );
    }

    #[test]
    fn long_press_without_endpoint_has_only_queue_entry() {
        let item = json!({"tileRenderer": {"contentId": "a"}});
        let cmd = long_press_command(LongPress {
            video_id: "a",
            title: "T",
            subtitle: "S",
            thumbnails: json!([]),
            watch_endpoint: None,
            item: &item,
        });
        let menu = cmd["showMenuCommand"]["menu"]["menuRenderer"]["items"].as_array().unwrap();
        assert_eq!(menu.len(), 1);
        let action = &menu[0]["menuServiceItemRenderer"]["serviceEndpoint"]["playlistEditEndpoint"]["customAction"];
        assert_eq!(action["action"], "ADD_TO_QUEUE");
        assert_eq!(action["parameters"], item);
    }

    #[test]
    fn timely_action_times_are_strings() {
        let action = timely_action("Skip intro", "SKIP_NEXT", json!({}), 1500, 2500);
        assert_eq!(action["timelyActionRenderer"]["triggerTimeMs"], "1500");
        assert_eq!(action["timelyActionRenderer"]["timeoutMs"], "2500");
        assert_eq!(action["timelyActionRenderer"]["actionButtons"][0]["buttonRenderer"]["icon"]["iconType"], "SKIP_NEXT");
    }
}
