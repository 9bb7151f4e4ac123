use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use roadpath::animation::{AnimationOptions, DEFAULT_ANIMATION_SPEED};
use roadpath::osm::{self, RoadDataProvider};
use roadpath::session::{Session, SessionConfig};
use roadpath::{Coordinates, Route, SearchMode, SearchOptions};
use serde_json::json;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct DataLoadError(PathBuf, #[source] osm::Error);

#[derive(Parser)]
struct Cli {
    /// Latitude of the start point
    start_lat: f64,

    /// Longitude of the start point
    start_lon: f64,

    /// Latitude of the end point
    end_lat: f64,

    /// Longitude of the end point
    end_lon: f64,

    /// Radius (in meters) around the start point to load roads from
    #[arg(long, default_value_t = osm::DEFAULT_RADIUS)]
    radius: f64,

    /// Read road data from a saved Overpass response or OSM file instead of querying Overpass
    #[arg(long)]
    input: Option<PathBuf>,

    /// Overpass API interpreter endpoint
    #[arg(long, default_value = osm::DEFAULT_OVERPASS_URL)]
    overpass_url: String,

    /// Give up on Overpass requests taking longer than this many seconds
    #[arg(long, default_value_t = osm::DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Reopen already expanded nodes if a shorter path to them is found
    #[arg(long)]
    strict: bool,

    /// Don't output the exploration trace
    #[arg(long)]
    no_trace: bool,

    /// Stream animation frames as JSON lines instead of printing a GeoJSON document
    #[arg(long)]
    animate: bool,

    /// Animation delay multiplier, higher values mean a slower animation
    #[arg(long, default_value_t = DEFAULT_ANIMATION_SPEED)]
    speed: f64,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> SessionConfig {
        SessionConfig {
            radius: self.radius,
            animation: AnimationOptions {
                speed: self.speed,
                visualize: !self.no_trace,
            },
            search: SearchOptions {
                mode: if self.strict {
                    SearchMode::Strict
                } else {
                    SearchMode::BestFirst
                },
                ..SearchOptions::default()
            },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    colog::default_builder()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    match &cli.input {
        Some(path) => run(load_data(path)?, &cli).await,
        None => {
            let timeout = Duration::from_secs(cli.timeout);
            let client = osm::OverpassClient::with_timeout(cli.overpass_url.as_str(), timeout)?;
            run(client, &cli).await
        }
    }
}

async fn run<P: RoadDataProvider>(provider: P, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let session = Session::new(provider, cli.config());
    session
        .pick_start(Coordinates::new(cli.start_lat, cli.start_lon))
        .await?;
    session.pick_destination(Coordinates::new(cli.end_lat, cli.end_lon))?;
    let route = session.solve()?;

    if cli.animate {
        let (tx, mut rx) = mpsc::unbounded_channel();
        session.play(&route, tx);
        while let Some(frame) = rx.recv().await {
            println!("{}", serde_json::to_string(&frame)?);
        }
    } else {
        let document = geojson(&route, !cli.no_trace);
        println!("{}", serde_json::to_string_pretty(&document)?);
    }

    Ok(())
}

fn load_data(path: &Path) -> Result<osm::StaticProvider, DataLoadError> {
    osm::StaticProvider::from_file(osm::FileFormat::Unknown, path)
        .map_err(|e| DataLoadError(path.to_path_buf(), e))
}

fn geojson(route: &Route, with_trace: bool) -> serde_json::Value {
    let position = |c: &Coordinates| json!([c.lon, c.lat]);

    let mut features = vec![json!({
        "type": "Feature",
        "properties": {
            "kind": "path",
            "nodes": route.nodes,
            "distance_km": route.distance,
        },
        "geometry": {
            "type": "LineString",
            "coordinates": route.path.iter().map(position).collect::<Vec<_>>(),
        },
    })];

    if with_trace {
        let segments: Vec<_> = route
            .trace
            .iter()
            .map(|s| json!([position(&s.from), position(&s.to)]))
            .collect();
        features.push(json!({
            "type": "Feature",
            "properties": { "kind": "trace" },
            "geometry": {
                "type": "MultiLineString",
                "coordinates": segments,
            },
        }));
    }

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

