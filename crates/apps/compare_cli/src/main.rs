use std::path::{Path, PathBuf};
use std::rc::Rc;

use catalog::{InMemorySceneCatalog, SceneCatalog, SceneQuery, default_pair};
use clap::{Parser, Subcommand};
use compare::{
    ComparisonSelection, ComparisonView, HeadlessProvider, ViewerConfig, ViewportRole,
};
use foundation::bounds::ScreenRect;
use foundation::time::CalendarDate;
use foundation::view::ViewState;
use layers::fallback::error_tile_data_url;
use layers::{BasemapRegistry, ImageryType};
use runtime::scope::RecordingHost;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless before/after satellite imagery comparison")]
struct Args {
    /// Viewer config (JSON); missing keys use defaults, COMPARE_* env vars override
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List imagery products and basemaps
    Layers,

    /// Build a comparison and print the pane layout and tile URLs
    Compare {
        /// Imagery id (modis, viirs, landsat-true, landsat-ndvi, landsat-temp, night-lights)
        #[arg(long)]
        imagery: String,

        /// Before date (yyyy-mm-dd)
        #[arg(long)]
        start: CalendarDate,

        /// After date (yyyy-mm-dd)
        #[arg(long)]
        end: CalendarDate,

        /// Basemap id (esri, osm, light, dark)
        #[arg(long)]
        basemap: Option<String>,

        #[arg(long)]
        lat: Option<f64>,

        #[arg(long)]
        lon: Option<f64>,

        #[arg(long)]
        zoom: Option<f64>,

        /// Container width in pixels
        #[arg(long, default_value_t = 1280.0)]
        width: f64,

        /// Container height in pixels
        #[arg(long, default_value_t = 720.0)]
        height: f64,

        /// Slider position in percent; simulated as a drag
        #[arg(long)]
        slider: Option<f64>,

        /// Tile URLs to print per layer
        #[arg(long, default_value_t = 4)]
        max_tiles: usize,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// Search a scene list and show the default before/after pick
    Scenes {
        /// Scene list: { "<dataset>": [scene, ...] }
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        dataset: Option<String>,

        #[arg(long)]
        start: CalendarDate,

        #[arg(long)]
        end: CalendarDate,

        /// Maximum cloud cover in percent
        #[arg(long, default_value_t = catalog::DEFAULT_MAX_CLOUD_COVER)]
        max_cloud: f64,

        #[arg(long, default_value_t = catalog::DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },
}

struct CompareArgs {
    imagery: String,
    start: CalendarDate,
    end: CalendarDate,
    basemap: Option<String>,
    center: (Option<f64>, Option<f64>, Option<f64>),
    size: [f64; 2],
    slider: Option<f64>,
    max_tiles: usize,
    json: bool,
}

#[derive(Serialize)]
struct Report {
    imagery: String,
    basemap: &'static str,
    view: ViewState,
    slider_position: f64,
    layout: LayoutReport,
    panes: Vec<PaneReport>,
    warnings: Vec<String>,
    metrics: Vec<(&'static str, u64)>,
    gauges: Vec<(&'static str, i64)>,
}

#[derive(Serialize)]
struct LayoutReport {
    container_width: f64,
    boundary_px: f64,
    before_width: f64,
    after_width: f64,
    before_clip: String,
    after_clip: String,
    handle_left: String,
}

#[derive(Serialize)]
struct PaneReport {
    role: &'static str,
    layers: Vec<LayerReport>,
}

#[derive(Serialize)]
struct LayerReport {
    id: String,
    attribution: String,
    tile_count: usize,
    tiles: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Layers => {
            cmd_layers(&config);
            Ok(())
        }
        Command::Compare {
            imagery,
            start,
            end,
            basemap,
            lat,
            lon,
            zoom,
            width,
            height,
            slider,
            max_tiles,
            json,
        } => cmd_compare(
            config,
            CompareArgs {
                imagery,
                start,
                end,
                basemap,
                center: (lat, lon, zoom),
                size: [width, height],
                slider,
                max_tiles,
                json,
            },
        ),
        Command::Scenes {
            catalog,
            dataset,
            start,
            end,
            max_cloud,
            max_results,
        } => {
            let mut query = SceneQuery::new(start, end)
                .with_max_cloud_cover(max_cloud)
                .with_max_results(max_results);
            if let Some(dataset) = dataset {
                query = query.with_dataset(dataset);
            }
            cmd_scenes(&catalog, &query)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig, String> {
    let config = match path {
        Some(p) => ViewerConfig::load(p).map_err(|e| e.to_string())?,
        None => ViewerConfig::default(),
    }
    .with_env_overrides();
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn cmd_layers(config: &ViewerConfig) {
    let factory = config.tile_factory();
    println!("imagery ({}):", factory.endpoint());
    for t in ImageryType::ALL {
        println!("  {:<13} {:<40} {}", t.id(), t.label(), t.layer_name());
    }
    let basemaps: BasemapRegistry = config.basemaps();
    println!("basemaps (default {}):", basemaps.default_id());
    for (id, name) in basemaps.entries() {
        println!("  {id:<13} {name}");
    }
    println!("error tile: {}", error_tile_data_url());
}

fn cmd_compare(config: ViewerConfig, args: CompareArgs) -> Result<(), String> {
    let [width, height] = args.size;
    if !(width > 0.0 && height > 0.0) {
        return Err(format!("container size must be positive, got {width}x{height}"));
    }

    let surfaces = HeadlessProvider::new(args.size);
    let host = Rc::new(RecordingHost::new());
    let mut view = ComparisonView::new(config, Box::new(surfaces.clone()), host.clone());
    if view.viewport_count() == 0 {
        return Err("no render surface available".to_string());
    }

    if let Some(id) = &args.basemap {
        let resolved = view.switch_basemap(id);
        if resolved != id.as_str() {
            warn!(requested = %id, using = resolved, "unknown basemap");
        }
    }

    let current = view.active_view_state();
    let (lat, lon, zoom) = args.center;
    let start_view = ViewState::new(
        lat.unwrap_or(current.center_latitude),
        lon.unwrap_or(current.center_longitude),
        zoom.unwrap_or(current.zoom_level),
    );
    view.set_view_state(ViewportRole::Single, start_view);

    let selection = ComparisonSelection::new(args.imagery.clone(), args.start, args.end);
    let warnings = view
        .enter_comparison_mode(selection)
        .map_err(|e| e.to_string())?;

    view.set_container(ScreenRect::new(0.0, 0.0, width, height));
    if let Some(p) = args.slider {
        view.pointer_down();
        view.pointer_move(width * p / 100.0);
        view.pointer_up();
    }

    let split = view.layout();
    let mut panes = Vec::new();
    for role in [ViewportRole::Before, ViewportRole::After] {
        let Some(frame) = surfaces.latest(role).and_then(|log| log.last_frame) else {
            continue;
        };
        let layers = frame
            .layers
            .iter()
            .map(|l| LayerReport {
                id: l.layer.to_string(),
                attribution: l.attribution.clone(),
                tile_count: l.tiles.len(),
                tiles: l.tiles.iter().take(args.max_tiles).map(|t| t.url.clone()).collect(),
            })
            .collect();
        panes.push(PaneReport {
            role: role.label(),
            layers,
        });
    }

    let snapshot = view.metrics();
    let report = Report {
        imagery: args.imagery,
        basemap: view.basemap_id(),
        view: view.active_view_state(),
        slider_position: view.slider_position(),
        layout: LayoutReport {
            container_width: split.container_width,
            boundary_px: split.boundary_px,
            before_width: split.before.width,
            after_width: split.after.width,
            before_clip: split.before_clip_css(),
            after_clip: split.after_clip_css(),
            handle_left: split.handle_left_css(),
        },
        panes,
        warnings: warnings.iter().map(|w| w.to_string()).collect(),
        metrics: snapshot.counters,
        gauges: snapshot.gauges,
    };
    info!(
        panes = report.panes.len(),
        listeners_live = host.live_count(),
        "comparison built"
    );

    if args.json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!(
        "{} on {} at ({:.4}, {:.4}) z{}",
        report.imagery,
        report.basemap,
        report.view.center_latitude,
        report.view.center_longitude,
        report.view.zoom_level
    );
    for w in &report.warnings {
        println!("warning: {w}");
    }
    let l = &report.layout;
    println!(
        "slider {}%: before {}px | after {}px (of {}px)",
        report.slider_position, l.before_width, l.after_width, l.container_width
    );
    println!("  before clip-path: {}", l.before_clip);
    println!("  after clip-path:  {}", l.after_clip);
    for (name, value) in &report.gauges {
        println!("{name}: {value}");
    }
    for pane in &report.panes {
        println!("[{}]", pane.role);
        for layer in &pane.layers {
            println!("  {} ({} tiles, {})", layer.id, layer.tile_count, layer.attribution);
            for url in &layer.tiles {
                println!("    {url}");
            }
        }
    }
}

fn cmd_scenes(path: &Path, query: &SceneQuery) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let catalog = InMemorySceneCatalog::from_json(&text).map_err(|e| e.to_string())?;
    let scenes = catalog.search(query).map_err(|e| e.to_string())?;

    println!(
        "{} scene(s) in {} between {} and {} (cloud <= {}%)",
        scenes.len(),
        query.dataset,
        query.start,
        query.end,
        query.max_cloud_cover
    );
    for s in &scenes {
        let cover = s
            .cloud_cover
            .map_or_else(|| "?".to_string(), |c| format!("{c:.1}%"));
        println!("  {}  {}  {}", s.acquisition_date, s.display_id, cover);
    }
    if let Some((before, after)) = default_pair(&scenes) {
        println!("before: {} ({})", before.display_id, before.acquisition_date);
        println!("after:  {} ({})", after.display_id, after.acquisition_date);
    }
    Ok(())
}
