//! graphlens - lays out a KDL graph model and renders the visible part to SVG

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use graphlens_layout::{AppearanceTable, Dimensions, LayoutMode, LayoutSettings, Position};
use graphview::{GraphSession, ViewportConfig};
use serde::Deserialize;
use svg::Document;

mod model;
mod render;

#[derive(Parser)]
#[command(name = "graphlens")]
#[command(about = "Lay out a graph model and render the visible part to SVG")]
#[command(version)]
struct Cli {
    /// Path to a .kdl graph model
    model: PathBuf,

    /// Layout mode (force, force-atlas2, open-ord, circle, radial, hierarchy, fast)
    #[arg(short, long, default_value = "force")]
    layout: LayoutMode,

    /// Upper bound on simulation frames
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    #[arg(long, default_value_t = 900.0)]
    width: f64,

    #[arg(long, default_value_t = 530.0)]
    height: f64,

    /// Zoom factor applied around the canvas center after fitting
    #[arg(short, long, default_value_t = 1.0)]
    zoom: f64,

    /// Keep the identity transform instead of fitting the content
    #[arg(long)]
    no_fit: bool,

    /// JSON settings file (layout, viewport and appearance sections)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Output SVG path
    #[arg(short, long, default_value = "graph.svg")]
    out: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViewerSettings {
    layout: LayoutSettings,
    viewport: ViewportConfig,
    appearance: AppearanceTable,
}

fn load_settings(path: Option<&Path>) -> Result<ViewerSettings> {
    let Some(path) = path else {
        return Ok(ViewerSettings::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid settings in {}", path.display()))
}

/// Lays out `content` and draws the resulting view.
fn render_model(cli: &Cli, settings: ViewerSettings, content: &str) -> Result<Document> {
    let model = model::parse_model(content, &settings.appearance)?;
    let canvas = Dimensions::new(cli.width, cli.height);
    let mut session = GraphSession::new(settings.layout, settings.viewport, canvas)?;
    session.set_graph(model.nodes, model.edges, cli.layout)?;

    let mut frames = 0;
    while frames < cli.frames {
        session.frame()?;
        frames += 1;
        if !session.dispatcher().is_running() {
            break;
        }
    }
    tracing::info!(
        mode = %cli.layout,
        frames,
        settled = !session.dispatcher().is_running(),
        "layout finished"
    );

    if !cli.no_fit {
        session.fit_to_content();
    }
    if cli.zoom != 1.0 {
        session.zoom_at(Position::new(cli.width / 2.0, cli.height / 2.0), cli.zoom);
    }
    let transform = session.viewport().transform();
    let set = session.render();
    tracing::info!(
        nodes = set.nodes.len(),
        edges = set.edges.len(),
        tier = ?set.tier,
        "render set ready"
    );

    let document = render::render_svg(set, transform, cli.width, cli.height);
    session.shutdown();
    Ok(document)
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.settings.as_deref())?;
    let content = fs::read_to_string(&cli.model)
        .with_context(|| format!("failed to read model {}", cli.model.display()))?;
    let document = render_model(&cli, settings, &content)?;
    render::write_svg(&cli.out, &document)?;
    println!("wrote {}", cli.out.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse())
}
