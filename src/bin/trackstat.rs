//! Trackstat CLI - compute statistics over tracked time-series data
//!
//! Commands:
//! - compute: evaluate one graph or stat from a JSON dataset
//! - inspect: print a feature's labels and sample properties

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;

use trackstat::sampling::{DataSampler, RawPointObserver};
use trackstat::store::{DataStore, InMemoryStore};
use trackstat::types::{
    AverageTimeBetweenConfig, GraphOrStat, GraphStatId, LineGraphConfig, PieChartConfig,
    RawDataPoint, TimeSinceLastConfig, Tracker,
};
use trackstat::viewdata::ViewData;
use trackstat::{GraphStatEngine, SystemClock, TimeHelper, TRACKSTAT_VERSION};

/// Trackstat - statistics compute engine for tracked time-series features
#[derive(Parser)]
#[command(name = "trackstat")]
#[command(version = TRACKSTAT_VERSION)]
#[command(about = "Compute statistics over tracked time-series data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one graph or stat from a JSON dataset
    Compute {
        /// Dataset file path
        #[arg(short, long)]
        data: PathBuf,

        /// Graph or stat id to compute
        #[arg(short, long)]
        stat: GraphStatId,

        /// Include every sampled raw point in the output
        #[arg(long)]
        show_points: bool,

        /// Pretty-print the output (default when stdout is a terminal)
        #[arg(long)]
        pretty: bool,
    },

    /// Print a feature's labels and sample properties
    Inspect {
        /// Dataset file path
        #[arg(short, long)]
        data: PathBuf,

        /// Feature id to inspect
        #[arg(short, long)]
        feature: u64,

        /// Pretty-print the output (default when stdout is a terminal)
        #[arg(long)]
        pretty: bool,
    },
}

/// On-disk dataset: trackers, rows and stat configurations.
#[derive(Deserialize)]
struct Dataset {
    #[serde(default)]
    trackers: Vec<Tracker>,
    #[serde(default)]
    data_points: Vec<RawDataPoint>,
    #[serde(default)]
    graph_stats: Vec<GraphOrStat>,
    #[serde(default)]
    time_since_last: HashMap<GraphStatId, TimeSinceLastConfig>,
    #[serde(default)]
    average_time_between: HashMap<GraphStatId, AverageTimeBetweenConfig>,
    #[serde(default)]
    line_graphs: HashMap<GraphStatId, LineGraphConfig>,
    #[serde(default)]
    pie_charts: HashMap<GraphStatId, PieChartConfig>,
}

fn load_store(path: &PathBuf) -> Result<Arc<InMemoryStore>, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let dataset: Dataset = serde_json::from_str(&text)
        .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;

    let store = InMemoryStore::new();
    for tracker in dataset.trackers {
        store.insert_tracker(tracker);
    }
    for point in dataset.data_points {
        store.insert_data_point(point);
    }
    for graph_stat in dataset.graph_stats {
        store.insert_graph_stat(graph_stat);
    }
    for (id, config) in dataset.time_since_last {
        store.insert_time_since_last(id, config);
    }
    for (id, config) in dataset.average_time_between {
        store.insert_average_time_between(id, config);
    }
    for (id, config) in dataset.line_graphs {
        store.insert_line_graph(id, config);
    }
    for (id, config) in dataset.pie_charts {
        store.insert_pie_chart(id, config);
    }
    Ok(Arc::new(store))
}

fn view_data_json(view_data: &ViewData) -> serde_json::Value {
    let graph_stat = view_data.graph_stat();
    match view_data {
        ViewData::Loading { .. } => json!({
            "state": "loading",
            "graph_stat": graph_stat,
        }),
        ViewData::TimeSinceLast(data) => json!({
            "state": "ready",
            "kind": "time_since_last",
            "graph_stat": graph_stat,
            "last_point": &data.last_point,
        }),
        ViewData::AverageTimeBetween(data) => json!({
            "state": "ready",
            "kind": "average_time_between",
            "graph_stat": graph_stat,
            "average_millis": data.average_millis,
        }),
        ViewData::LineGraph(data) => json!({
            "state": "ready",
            "kind": "line_graph",
            "graph_stat": graph_stat,
            "end_time": data.end_time.to_rfc3339(),
            "y_range": [data.y_range.0, data.y_range.1],
            "duration_based_range": data.duration_based_range,
            "series": data.series.iter().map(|series| json!({
                "name": &series.name,
                "points": series.points.iter().map(|point| json!({
                    "timestamp": point.timestamp.to_rfc3339(),
                    "value": point.value,
                })).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        }),
        ViewData::PieChart(data) => json!({
            "state": "ready",
            "kind": "pie_chart",
            "graph_stat": graph_stat,
            "segments": data.segments.iter().map(|segment| json!({
                "label": &segment.label,
                "value": segment.value,
                "percentage": segment.percentage,
            })).collect::<Vec<_>>(),
        }),
        ViewData::Error { error, .. } => json!({
            "state": "error",
            "graph_stat": graph_stat,
            "error": error.to_string(),
        }),
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) {
    let pretty = pretty || atty::is(atty::Stream::Stdout);
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to render output: {e}"),
    }
}

async fn run_compute(
    data: PathBuf,
    stat: GraphStatId,
    show_points: bool,
    pretty: bool,
) -> ExitCode {
    let store = match load_store(&data) {
        Ok(store) => store,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    let engine = GraphStatEngine::new(store, Arc::new(SystemClock), TimeHelper::utc());

    let sampled = Arc::new(Mutex::new(Vec::<RawDataPoint>::new()));
    let sink = Arc::clone(&sampled);
    let observer: RawPointObserver = Arc::new(move |rows| {
        if let Ok(mut sampled) = sink.lock() {
            sampled.extend(rows.iter().cloned());
        }
    });

    match engine.view_data(stat, observer).await {
        Ok(view_data) => {
            let mut output = view_data_json(&view_data);
            if show_points {
                if let (Some(object), Ok(sampled)) = (output.as_object_mut(), sampled.lock()) {
                    object.insert("sampled_points".to_string(), json!(&*sampled));
                }
            }
            print_json(&output, pretty);
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("failed to compute stat {stat}: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run_inspect(data: PathBuf, feature: u64, pretty: bool) -> ExitCode {
    let store = match load_store(&data) {
        Ok(store) => store,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    let sampler = DataSampler::new(store as Arc<dyn DataStore>);
    let labels = match sampler.labels_for_feature(feature).await {
        Ok(labels) => labels,
        Err(error) => {
            eprintln!("failed to read labels for feature {feature}: {error}");
            return ExitCode::FAILURE;
        }
    };
    let properties = match sampler.sample_properties_for_feature(feature).await {
        Ok(properties) => properties,
        Err(error) => {
            eprintln!("failed to read properties for feature {feature}: {error}");
            return ExitCode::FAILURE;
        }
    };
    print_json(
        &json!({
            "feature_id": feature,
            "labels": labels,
            "properties": properties,
        }),
        pretty,
    );
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compute {
            data,
            stat,
            show_points,
            pretty,
        } => run_compute(data, stat, show_points, pretty).await,
        Commands::Inspect {
            data,
            feature,
            pretty,
        } => run_inspect(data, feature, pretty).await,
    }
}
