use oci_moogsoft_shipper::config::Config;
use oci_moogsoft_shipper::Error;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    oci_moogsoft_shipper::set_up_logging();

    info!(
        "Initializing {} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::load_from_env()?;
    let exporter = oci_moogsoft_shipper::set_up_moogsoft_exporter(&config)?;

    // Local debugging mode: replay a line-delimited JSON metrics file (for
    // example one exported from the monitoring service's UI or CLI) through
    // the full transform/forward path, one invocation per line.
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "oci-metrics-test-file.json".to_string());
    info!("local testing started with {}", path);

    let contents = tokio::fs::read_to_string(&path).await?;
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let report =
            oci_moogsoft_shipper::function_handler(exporter.clone(), &config, line.as_bytes())
                .await?;
        debug!(
            "transformed {} records, delivered {}",
            report.records.len(),
            report.delivered
        );
    }

    info!("local testing completed");
    Ok(())
}
