//! Ottobasin CLI - basin delineation over ottobacia catchment layers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo::{Area, Point};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ottobasin_algorithms::hydrology::{
    find_basin, grant_criticality, outlets_from_features, reference_flows, CriticalityParams,
    CriticalityReport, FindBasinParams,
};
use ottobasin_core::io::{read_layer, read_points, write_polygons};
use ottobasin_core::{AttributeValue, BoundingBox, Feature, MemorySource, RecordSource};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ottobasin")]
#[command(author, version, about = "Basin delineation over ottobacia catchment layers", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a catchment layer
    Info {
        /// Input layer (GeoJSON)
        input: PathBuf,
    },
    /// Delineate the basin upstream of an outlet point
    Delineate {
        /// Catchment layer (GeoJSON)
        input: PathBuf,
        /// Outlet X coordinate, in the layer's CRS
        #[arg(short, long, allow_negative_numbers = true)]
        x: f64,
        /// Outlet Y coordinate, in the layer's CRS
        #[arg(short, long, allow_negative_numbers = true)]
        y: f64,
        /// Watercourse (reach) code field
        #[arg(long, default_value = "cocursodag")]
        reach_field: String,
        /// Hierarchical basin code field
        #[arg(long, default_value = "cobacia")]
        basin_field: String,
        /// Area field to sum over the basin
        #[arg(long)]
        area_field: Option<String>,
        /// Output basin polygon (GeoJSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Grant criticality: granted flow per basin against Q95
    Criticality {
        /// Catchment layer (GeoJSON)
        input: PathBuf,
        /// Outlet points with granted flows (GeoJSON)
        outlets: PathBuf,
        /// Reference flow layer keyed by basin code (GeoJSON)
        reference: PathBuf,
        /// Output summary with basin polygons (GeoJSON)
        #[arg(short, long)]
        output: PathBuf,
        /// Watercourse (reach) code field
        #[arg(long, default_value = "cocursodag")]
        reach_field: String,
        /// Hierarchical basin code field
        #[arg(long, default_value = "cobacia")]
        basin_field: String,
        /// Area field to sum over each basin
        #[arg(long, default_value = "nuareacont")]
        area_field: String,
        /// Outlet field with the declared flow
        #[arg(long, default_value = "VAZAO_OUTO")]
        flow_field: String,
        /// Outlet field with an identifier, falling back to the feature id
        #[arg(long, default_value = "OBJECTID")]
        outlet_id_field: String,
        /// Outlet field with the reference basin code
        #[arg(long, default_value = "COD_OTTO")]
        outlet_basin_field: String,
        /// Reference layer key field
        #[arg(long, default_value = "cobacia")]
        reference_key_field: String,
        /// Reference layer Q95 field
        #[arg(long, default_value = "areamont_Q")]
        reference_flow_field: String,
        /// Declared flows are divided by this factor (3.6: m3/h to l/s)
        #[arg(long, default_value = "3.6")]
        conversion_factor: f64,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message(msg.to_string());
    pb
}

fn read_catchments(path: &PathBuf) -> Result<MemorySource> {
    let pb = spinner("Reading layer...");
    let layer = read_layer(path)
        .with_context(|| format!("Failed to read layer {}", path.display()))?;
    pb.finish_and_clear();
    info!("Layer: {} records, {} fields", layer.len(), layer.fields().len());
    Ok(layer)
}

fn write_result(features: &[Feature], path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_polygons(path, features).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn layer_bounds(layer: &MemorySource) -> BoundingBox {
    layer.iter().fold(BoundingBox::empty(), |mut bb, r| {
        bb.expand(&r.shape.bbox);
        bb
    })
}

fn report_features(report: &CriticalityReport, reach_field: &str) -> Vec<Feature> {
    report
        .rows
        .iter()
        .map(|row| {
            let mut f = Feature::from(row.basin.clone());
            f.id = Some(row.outlet_id.clone());
            f.set_property("Longitude", AttributeValue::Float(row.x));
            f.set_property("Latitude", AttributeValue::Float(row.y));
            f.set_property(reach_field.to_uppercase(), AttributeValue::from(row.reach_code.as_str()));
            f.set_property("Q_Outorga (l/s)", AttributeValue::Float(row.granted_flow));
            f.set_property("Q95 (l/s)", AttributeValue::Float(row.q95));
            f.set_property("Q_Max (l/s)", AttributeValue::Float(row.q_max));
            f.set_property("Fator de Capacidade", AttributeValue::Float(row.capacity_factor));
            if let Some(area) = row.drainage_area {
                f.set_property("Area", AttributeValue::Float(area));
            }
            f
        })
        .collect()
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let layer = read_catchments(&input)?;
            let bounds = layer_bounds(&layer);

            println!("File: {}", input.display());
            println!("Records: {}", layer.len());
            println!("Fields: {}", layer.fields().join(", "));
            if bounds.is_empty() {
                println!("Bounds: empty");
            } else {
                println!(
                    "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                    bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
                );
            }
            let parts: usize = layer.iter().map(|r| r.shape.num_parts()).sum();
            println!("Parts: {}", parts);
        }

        // ── Delineate ────────────────────────────────────────────────
        Commands::Delineate {
            input,
            x,
            y,
            reach_field,
            basin_field,
            area_field,
            output,
        } => {
            let layer = read_catchments(&input)?;
            let params = FindBasinParams {
                reach_field,
                basin_field,
                area_field,
                return_reach: true,
            };

            let pb = progress_bar(100, "Delineating");
            let mut on_progress = |p: u8| pb.set_position(p as u64);
            let start = Instant::now();
            let result = find_basin(&layer, &Point::new(x, y), &params, Some(&mut on_progress))
                .context("Failed to delineate basin")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            let Some(basin) = result else {
                anyhow::bail!("Outlet ({}, {}) is outside every catchment", x, y);
            };

            println!("Seed catchment: {} (basin {})", basin.seed.record, basin.seed.basin_code);
            println!("Reach: {}", basin.reach_code.as_deref().unwrap_or(""));
            println!("Catchments: {}", basin.matched);
            println!("Polygon area: {:.6}", basin.polygon.unsigned_area());
            if let Some(area) = basin.area {
                println!("Area attribute sum: {:.4}", area);
            }

            match output {
                Some(path) => {
                    let mut feature = Feature::from(basin.polygon);
                    if let Some(reach) = basin.reach_code {
                        feature.set_property(params.reach_field.as_str(), AttributeValue::from(reach));
                    }
                    feature.set_property(params.basin_field.as_str(), AttributeValue::from(basin.seed.basin_code));
                    if let Some(area) = basin.area {
                        feature.set_property("area", AttributeValue::Float(area));
                    }
                    write_result(&[feature], &path)?;
                    done("Basin", &path, elapsed);
                }
                None => println!("  Processing time: {:.2?}", elapsed),
            }
        }

        // ── Criticality ──────────────────────────────────────────────
        Commands::Criticality {
            input,
            outlets,
            reference,
            output,
            reach_field,
            basin_field,
            area_field,
            flow_field,
            outlet_id_field,
            outlet_basin_field,
            reference_key_field,
            reference_flow_field,
            conversion_factor,
        } => {
            if conversion_factor <= 0.0 {
                anyhow::bail!("Conversion factor must be positive, got {}", conversion_factor);
            }

            let layer = read_catchments(&input)?;
            let points = read_points(&outlets)
                .with_context(|| format!("Failed to read outlets {}", outlets.display()))?;
            let outlet_list = outlets_from_features(
                &points,
                Some(outlet_id_field.as_str()),
                &flow_field,
                &outlet_basin_field,
            )
            .context("Invalid outlet attributes")?;
            let reference_layer = read_layer(&reference)
                .with_context(|| format!("Failed to read reference {}", reference.display()))?;
            let table = reference_flows(&reference_layer, &reference_key_field, &reference_flow_field)
                .context("Invalid reference flows")?;
            info!("{} outlets, {} reference flows", outlet_list.len(), table.len());

            let params = CriticalityParams {
                basin: FindBasinParams {
                    reach_field: reach_field.clone(),
                    basin_field,
                    area_field: Some(area_field),
                    return_reach: true,
                },
                conversion_factor,
            };

            let pb = progress_bar(outlet_list.len() as u64, "Outlets");
            let mut on_progress = |done: usize, _total: usize| pb.set_position(done as u64);
            let start = Instant::now();
            let report = grant_criticality(&layer, &outlet_list, &table, &params, Some(&mut on_progress))
                .context("Failed to compute grant criticality")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            for row in &report.rows {
                println!(
                    "{:>8}  reach {:<12} Q_outorga {:>10.2}  Q_max {:>10.2}  factor {:>6.2}",
                    row.outlet_id, row.reach_code, row.granted_flow, row.q_max, row.capacity_factor
                );
            }
            for skipped in &report.unresolved {
                println!("{:>8}  skipped: {:?}", skipped.outlet_id, skipped.reason);
            }

            write_result(&report_features(&report, &reach_field), &output)?;
            done("Criticality summary", &output, elapsed);
        }
    }

    Ok(())
}
