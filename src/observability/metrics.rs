//! Prometheus metrics.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Address the exporter binds for `port`.
fn listen_addr(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
}

/// Installs the global Prometheus recorder.
///
/// Returns `false` when metrics are disabled: nothing is installed and
/// every `metrics` macro stays a no-op. With `expose` the exporter also
/// serves scrapes on `0.0.0.0:<port>`, on its own background runtime when
/// none is running.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener
/// cannot be bound.
pub fn install_prometheus(settings: &MetricsSettings, expose: bool) -> Result<bool> {
    if !settings.enabled {
        return Ok(false);
    }

    let builder = PrometheusBuilder::new();
    if expose {
        builder
            .with_http_listener(listen_addr(settings.port))
            .install()
            .map_err(|e| Error::internal("metrics_exporter_install", e))?;
        tracing::info!(port = settings.port, "Prometheus exporter listening");
    } else {
        builder
            .install_recorder()
            .map_err(|e| Error::internal("metrics_recorder_install", e))?;
    }

    Ok(true)
}
