//! Metrics collection and export for the Discard client.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use discard_core::Dispatch;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const FRAMES_ROUTED_TOTAL: &str = "discard_frames_routed_total";
    pub const FRAMES_DROPPED_TOTAL: &str = "discard_frames_dropped_total";
    pub const RECONNECTS_TOTAL: &str = "discard_reconnects_total";
    pub const ONLINE_USERS: &str = "discard_online_users";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::FRAMES_ROUTED_TOTAL,
        "Inbound frames routed to observers, by frame type"
    );
    metrics::describe_counter!(
        names::FRAMES_DROPPED_TOTAL,
        "Inbound frames dropped as malformed or unknown"
    );
    metrics::describe_counter!(names::RECONNECTS_TOTAL, "Reconnect attempts");
    metrics::describe_gauge!(names::ONLINE_USERS, "Users currently online");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the exporter cannot be installed.
pub fn start_metrics_server(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record the outcome of dispatching one frame.
pub fn record_dispatch(outcome: Dispatch) {
    match outcome {
        Dispatch::Routed(kind) => {
            counter!(names::FRAMES_ROUTED_TOTAL, "kind" => kind.as_str()).increment(1);
        }
        Dispatch::Dropped => counter!(names::FRAMES_DROPPED_TOTAL).increment(1),
    }
}

/// Record a reconnect attempt.
pub fn record_reconnect() {
    counter!(names::RECONNECTS_TOTAL).increment(1);
}

/// Update the online user count.
pub fn set_online_users(count: usize) {
    gauge!(names::ONLINE_USERS).set(count as f64);
}
