//! Prometheus exporter.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::{net::SocketAddr, time::Duration};
use tracing::info;

/// Installs the global Prometheus recorder and serves it over HTTP on `metrics_addr`.
///
/// Must be called from within a tokio runtime.
pub fn setup_exporter(metrics_addr: impl Into<SocketAddr>) -> eyre::Result<PrometheusHandle> {
    let addr: SocketAddr = metrics_addr.into();
    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .upkeep_timeout(Duration::from_secs(5))
        .build()?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|_| eyre::eyre!("a metrics recorder is already installed"))?;
    tokio::spawn(exporter);

    info!(%addr, "Started metrics server");

    Ok(handle)
}
