//! Layout stabilizer script.
//!
//! Keeps the map surface filling the viewport while the embedded document
//! keeps mutating itself: hides every sibling along the map's ancestor chain,
//! flattens that chain, silences videos and hides configured overlays. An
//! element related to the map root (ancestor or descendant) is never hidden.
//! One pass runs immediately, then the pass repeats on a capped interval.

use serde::Serialize;

use crate::config::Integration;
use crate::error::BridgeError;
use crate::script::{Script, ScriptKind, render_template};

const TEMPLATE: &str = include_str!("scripts/stabilizer.js");

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StabilizerParams<'a> {
    map: &'a str,
    canvas: &'a str,
    overlays: &'a [String],
    interval_ms: u64,
    max_attempts: u32,
}

pub fn stabilizer_script(integration: &Integration) -> Result<Script, BridgeError> {
    let surface = &integration.surface;
    let params = StabilizerParams {
        map: &surface.map,
        canvas: &surface.canvas,
        overlays: &surface.overlays,
        interval_ms: integration.stabilizer.interval_ms,
        max_attempts: integration.stabilizer.max_attempts,
    };

    Ok(Script {
        kind: ScriptKind::Stabilizer,
        source: render_template(TEMPLATE, &params)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::eval_in_document;

    #[test]
    fn overlay_list_and_schedule_are_embedded() {
        let integration = Integration::from_json(
            r##"{
                "url": "https://maps.example.com",
                "stabilizer": {"interval_ms": 750, "max_attempts": 4},
                "surface": {"map": "#leaflet", "overlays": [".promo", "#gdpr"]},
                "toggles": []
            }"##,
        )
        .expect("manifest");

        let script = stabilizer_script(&integration).expect("render stabilizer");

        assert_eq!(script.kind, ScriptKind::Stabilizer);
        assert!(!script.source.contains("__MAP_BRIDGE_CONFIG__"));
        assert!(script.source.contains(r##""map":"#leaflet""##));
        assert!(script.source.contains(r##""overlays":[".promo","#gdpr"]"##));
        assert!(script.source.contains(r#""intervalMs":750"#));
        assert!(script.source.contains(r#""maxAttempts":4"#));
    }

    #[test]
    fn pass_runs_once_before_the_capped_loop() {
        let integration =
            Integration::from_json(r#"{"url": "https://maps.example.com", "toggles": []}"#)
                .expect("manifest");
        let source = stabilizer_script(&integration)
            .expect("render stabilizer")
            .source;

        let immediate = source.find("  normalize();\n").expect("immediate pass");
        let interval = source.find("setInterval").expect("retry loop");
        assert!(immediate < interval);
        assert!(source.contains("if (runs >= cfg.maxAttempts)"));
    }

    #[test]
    fn map_relatives_are_never_hidden() {
        let integration =
            Integration::from_json(r#"{"url": "https://maps.example.com", "toggles": []}"#)
                .expect("manifest");
        let source = stabilizer_script(&integration)
            .expect("render stabilizer")
            .source;

        assert!(source.contains("node === mapRoot || node.contains(mapRoot) || mapRoot.contains(node)"));
        assert!(source.contains("if (mapRoot && related(node, mapRoot))"));
    }

    const PAGE: &str = r##"
        var page = el("div", { id: "page" });
        var sidebar = el("aside", {}, page);
        var main = el("main", {}, page);
        var slot = el("div", { "class": "slot" }, main);
        var map = el("div", { id: "map" }, main);
        var canvas = el("canvas", {}, map);
        var legend = el("div", { "class": "promo" }, map);
        var inline = el("script", {}, main);
        var footer = el("footer", {});
    "##;

    fn page_stabilizer() -> String {
        let integration = Integration::from_json(
            r##"{
                "url": "https://maps.example.com",
                "stabilizer": {"interval_ms": 10, "max_attempts": 3},
                "surface": {"map": "#map", "canvas": "#map canvas", "overlays": [".promo", "main .slot"]},
                "toggles": []
            }"##,
        )
        .expect("manifest");
        stabilizer_script(&integration)
            .expect("render stabilizer")
            .source
    }

    #[test]
    fn siblings_along_the_ancestor_chain_are_hidden() {
        let stabilizer = page_stabilizer();

        let result: serde_json::Value = serde_json::from_str(&eval_in_document(&[
            PAGE,
            stabilizer.as_str(),
            r#"JSON.stringify({
                sidebar: hidden(sidebar),
                slot: hidden(slot),
                footer: hidden(footer),
                page: hidden(page),
                main: hidden(main),
                map: hidden(map),
                legend: hidden(legend),
                inline: hidden(inline),
                position: map.style.props.position,
                canvasWidth: canvas.style.props.width
            })"#,
        ]))
        .expect("result is json");

        for hidden in ["sidebar", "slot", "footer"] {
            assert_eq!(result[hidden], true, "{hidden} should be hidden");
        }
        for kept in ["page", "main", "map", "legend", "inline"] {
            assert_eq!(result[kept], false, "{kept} should stay visible");
        }
        assert_eq!(result["position"], "fixed");
        assert_eq!(result["canvasWidth"], "100%");
    }

    #[test]
    fn repeat_loop_stops_at_the_cap() {
        let stabilizer = page_stabilizer();

        let live = eval_in_document(&[
            PAGE,
            stabilizer.as_str(),
            "runTimers(2)",
            "var midway = liveTimers()",
            "runTimers(5)",
            "midway + ',' + liveTimers()",
        ]);

        assert_eq!(live, "1,0");
    }
}
