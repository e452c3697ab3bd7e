use anyhow::Context;
use clap::Parser;
use spatial_rtree::compute::validation::coordinate;
use spatial_rtree::filter::GeometriesMode;
use spatial_rtree::ingest::{IndexMode, index_paths_into};
use spatial_rtree::{
    CancellationToken, QueryOutcome, SharedFilter, SpatialDatabase, SprFilter, SprInputs,
    new_spatial_database,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Index Who's On First documents and report which features contain a point.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// How PATH arguments are read: geojson, featurecollection or directory.
    #[arg(long, default_value = "geojson")]
    mode: IndexMode,

    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,

    #[arg(long, allow_hyphen_values = true)]
    longitude: f64,

    #[arg(long)]
    placetype: Vec<String>,

    #[arg(long, allow_hyphen_values = true)]
    is_current: Vec<i64>,

    #[arg(long, allow_hyphen_values = true)]
    is_ceased: Vec<i64>,

    #[arg(long, allow_hyphen_values = true)]
    is_deprecated: Vec<i64>,

    #[arg(long, allow_hyphen_values = true)]
    is_superseded: Vec<i64>,

    #[arg(long, allow_hyphen_values = true)]
    is_superseding: Vec<i64>,

    /// Only return alternate geometries with one of these labels.
    #[arg(long)]
    alternate_geometry: Vec<String>,

    #[arg(long, default_value = "all")]
    geometries: GeometriesMode,

    #[arg(long, default_value = "rtree://")]
    spatial_database_uri: String,

    /// Give up after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Report bounding-box candidates instead of containing features.
    #[arg(long)]
    candidates: bool,

    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let coord = coordinate(args.latitude, args.longitude)?;
    let filter = SprFilter::from_inputs(&SprInputs {
        placetypes: args.placetype,
        is_current: args.is_current,
        is_ceased: args.is_ceased,
        is_deprecated: args.is_deprecated,
        is_superseded: args.is_superseded,
        is_superseding: args.is_superseding,
        alternate_geometries: args.alternate_geometry,
        geometries: args.geometries,
    })?;
    let filters: Vec<SharedFilter> = vec![Arc::new(filter)];

    let db = new_spatial_database(&args.spatial_database_uri)
        .with_context(|| format!("Failed to open {}", args.spatial_database_uri))?;

    let indexed = index_paths_into(db.as_ref(), args.mode, &args.paths).await?;
    log::info!("Indexed {} features", indexed);

    let cancel = CancellationToken::new();
    if let Some(ms) = args.timeout_ms {
        let timer = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            timer.cancel();
        });
    }

    let output = if args.candidates {
        match db.point_in_polygon_candidates(coord, &filters, &cancel).await? {
            QueryOutcome::Complete(candidates) => serde_json::to_string_pretty(&candidates)?,
            QueryOutcome::Cancelled => anyhow::bail!("Query timed out"),
        }
    } else {
        match db.point_in_polygon(coord, &filters, &cancel).await? {
            QueryOutcome::Complete(results) => serde_json::to_string_pretty(&results)?,
            QueryOutcome::Cancelled => anyhow::bail!("Query timed out"),
        }
    };

    println!("{}", output);
    db.close().await?;

    Ok(())
}
