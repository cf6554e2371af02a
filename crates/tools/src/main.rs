use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use foundation::math::{Position, Vec2, Viewport};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use spider::feature::{Cluster, ClusterId, Feature};
use spider::host::{LayerKind, SourceKind};
use spider::layout::{LayoutMode, LayoutParams, compute_layout};
use spider::memory::{MemoryMap, MemorySource, run_until_idle};
use spider::{
    Hit, MapEvent, MouseEvent, OptionsPatch, SpiderClusterManager, SpiderEvent, SpiderOptions,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect spider cluster layouts without a map renderer")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the pixel offsets for a cluster of COUNT members
    Layout {
        #[arg(long)]
        count: usize,

        /// Pixel center as X,Y
        #[arg(long, default_value = "0,0")]
        center: String,

        /// Largest member count still laid out on a circle
        #[arg(long)]
        switchover: Option<usize>,

        #[arg(long)]
        min_circle_length: Option<f64>,

        #[arg(long)]
        spiral_distance_factor: Option<f64>,

        #[arg(long)]
        min_spiral_angle_separation: Option<f64>,
    },

    /// Click a cluster from a scenario file and print what the map ends up showing
    Expand {
        /// Scenario JSON (see demos/)
        #[arg(long)]
        input: PathBuf,

        /// Override the scenario's camera zoom
        #[arg(long)]
        zoom: Option<f64>,

        /// Override the scenario's maximum zoom
        #[arg(long)]
        max_zoom: Option<f64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Args::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main(args: Args) -> Result<(), String> {
    match args.command {
        Command::Layout {
            count,
            center,
            switchover,
            min_circle_length,
            spiral_distance_factor,
            min_spiral_angle_separation,
        } => {
            let patch = OptionsPatch {
                circle_spiral_switchover: switchover,
                min_circle_length,
                spiral_distance_factor,
                min_spiral_angle_separation,
                ..OptionsPatch::default()
            };
            cmd_layout(count, parse_center(&center)?, patch)
        }
        Command::Expand {
            input,
            zoom,
            max_zoom,
        } => cmd_expand(&input, zoom, max_zoom),
    }
}

#[derive(Debug, Serialize)]
struct LegOut {
    index: usize,
    angle: f64,
    length: f64,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize)]
struct LayoutOut {
    mode: LayoutMode,
    count: usize,
    center: [f64; 2],
    legs: Vec<LegOut>,
}

fn cmd_layout(count: usize, center: Vec2, patch: OptionsPatch) -> Result<(), String> {
    let mut options = SpiderOptions::default();
    let changed = options.apply(patch);
    debug!(?changed, "options applied");

    let layout = compute_layout(center, count, &LayoutParams::from(&options));
    info!(count, mode = ?layout.mode, "computed layout");

    let out = LayoutOut {
        mode: layout.mode,
        count: layout.len(),
        center: [center.x, center.y],
        legs: layout
            .legs
            .iter()
            .enumerate()
            .map(|(index, leg)| LegOut {
                index,
                angle: leg.angle,
                length: leg.length,
                x: leg.offset.x,
                y: leg.offset.y,
            })
            .collect(),
    };
    print_json(&out)
}

fn parse_center(raw: &str) -> Result<Vec2, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("center must be X,Y: {raw}"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("center x: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("center y: {e}"))?;
    Ok(Vec2::new(x, y))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    center: [f64; 2],
    #[serde(default = "default_zoom")]
    zoom: f64,
    #[serde(default = "default_max_zoom")]
    max_zoom: f64,
    #[serde(default = "default_width")]
    width: f64,
    #[serde(default = "default_height")]
    height: f64,
    /// Render unclustered points as bubbles instead of symbols.
    #[serde(default)]
    bubbles: bool,
    #[serde(default)]
    options: Option<Value>,
    clusters: Vec<ScenarioCluster>,
    /// Id of the cluster to click; the first one when absent.
    #[serde(default)]
    click: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioCluster {
    id: u64,
    position: [f64; 2],
    expansion_zoom: f64,
    leaves: Vec<Feature>,
}

fn default_zoom() -> f64 {
    16.0
}

fn default_max_zoom() -> f64 {
    20.0
}

fn default_width() -> f64 {
    1024.0
}

fn default_height() -> f64 {
    768.0
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CameraOut {
    center: [f64; 2],
    zoom: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpandOut {
    cluster: u64,
    open: bool,
    members: usize,
    camera: Option<CameraOut>,
    events: Vec<&'static str>,
    features: Value,
}

fn cmd_expand(input: &Path, zoom: Option<f64>, max_zoom: Option<f64>) -> Result<(), String> {
    let text = fs::read_to_string(input).map_err(|e| format!("read {input:?}: {e}"))?;
    let scenario: Scenario =
        serde_json::from_str(&text).map_err(|e| format!("scenario json: {e}"))?;

    let viewport = Viewport::new(
        Position::from(scenario.center),
        zoom.unwrap_or(scenario.zoom),
        scenario.width,
        scenario.height,
    );
    let mut map = MemoryMap::new(viewport, max_zoom.unwrap_or(scenario.max_zoom));
    let data = map.add_data_source(SourceKind::GeoJson);
    let cluster_layer = map.add_user_layer(data, LayerKind::Bubble);
    let unclustered_kind = if scenario.bubbles {
        LayerKind::Bubble
    } else {
        LayerKind::Symbol
    };
    let unclustered_layer = map.add_user_layer(data, unclustered_kind);

    let click = scenario
        .click
        .or_else(|| scenario.clusters.first().map(|c| c.id))
        .ok_or("scenario has no clusters")?;
    let mut source = MemorySource::new();
    let mut target = None;
    for c in scenario.clusters {
        let cluster = Cluster::new(ClusterId(c.id), Position::from(c.position), c.leaves.len());
        if c.id == click {
            target = Some(cluster);
        }
        source.insert_cluster(ClusterId(c.id), c.expansion_zoom, c.leaves);
    }
    let target = target.ok_or_else(|| format!("scenario has no cluster {click}"))?;

    let options = scenario
        .options
        .as_ref()
        .map(OptionsPatch::from_json)
        .unwrap_or_default();
    let mut manager =
        SpiderClusterManager::new(map, source, cluster_layer, unclustered_layer, options)
            .map_err(|e| e.to_string())?;

    manager.handle_event(MapEvent::LayerClick {
        layer: cluster_layer.id,
        event: MouseEvent::new(vec![Hit::new(Some(data), target.feature.clone())]),
    });
    run_until_idle(&mut manager);

    let state = manager.state();
    let camera = manager.host().camera_moves().last().map(|m| CameraOut {
        center: m.center.as_array(),
        zoom: m.zoom,
    });
    match &camera {
        Some(c) => info!(zoom = c.zoom, "cluster breaks apart by zooming in"),
        None => info!(members = state.members().len(), "cluster expanded in place"),
    }

    let spider_source = manager.layers().spider_feature_layer.source;
    let out = ExpandOut {
        cluster: target.id.0,
        open: state.is_open(),
        members: state.members().len(),
        camera,
        events: manager
            .events()
            .iter()
            .map(|e| match e.payload {
                SpiderEvent::FeatureSelected { .. } => "featureSelected",
                SpiderEvent::FeatureUnselected => "featureUnselected",
            })
            .collect(),
        features: json!({
            "type": "FeatureCollection",
            "features": manager.host().features(spider_source),
        }),
    };
    print_json(&out)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Scenario, parse_center};
    use foundation::math::Vec2;

    #[test]
    fn center_is_a_pixel_pair() {
        assert_eq!(parse_center("12.5, -3"), Ok(Vec2::new(12.5, -3.0)));
        assert!(parse_center("12.5").is_err());
        assert!(parse_center("a,b").is_err());
    }

    #[test]
    fn demo_scenario_parses() {
        let text = include_str!("../../../demos/harbor.json");
        let scenario: Scenario = serde_json::from_str(text).expect("scenario");
        let click = scenario.click.expect("click");
        assert!(scenario.clusters.iter().any(|c| c.id == click));
        assert!(scenario.clusters.iter().all(|c| !c.leaves.is_empty()));
    }
}
