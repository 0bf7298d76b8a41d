use gpkg_provider::{GpkgProvider, ProviderConfig};
use tracing_subscriber::EnvFilter;
use wkt::to_wkt::write_geometry;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("gpkg_features failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or("Usage: gpkg_features <path-to-gpkg> [layer] [target-srid]")?;
    let layer_filter = args.next();
    let target_srid = match args.next() {
        Some(srid) => srid.parse::<i32>()?,
        None => gpkg_provider::DEFAULT_TARGET_SRID,
    };

    let provider = GpkgProvider::open(&ProviderConfig::new(path).with_target_srid(target_srid))?;

    for layer in provider.layers() {
        if layer_filter
            .as_deref()
            .is_some_and(|name| name != layer.layer_name)
        {
            continue;
        }
        println!("layer: {layer}");

        let collection = provider.features(&layer.layer_name)?;
        for feature in &collection {
            let mut wkt = String::new();
            write_geometry(&mut wkt, &feature.geometry)?;
            println!("  {} {}={wkt}", feature.id, layer.geometry_column);
        }

        let report = &collection.report;
        println!(
            "  {} of {} rows, {} skipped, {} reprojected",
            report.features_accepted,
            report.rows_in_table,
            report.diagnostics.len(),
            report.reprojected
        );
        for skipped in &report.diagnostics {
            println!("  skipped {}: {}", skipped.id, skipped.reason);
        }
    }

    Ok(())
}
