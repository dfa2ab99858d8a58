use std::net::SocketAddr;

use crate::sql::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total queries executed. Labels: command.
pub const QUERIES_TOTAL: &str = "slotd_queries_total";

/// Histogram: query latency in seconds.
pub const QUERY_DURATION_SECONDS: &str = "slotd_query_duration_seconds";

/// Counter: availability decisions handed out. Labels: outcome.
pub const DECISIONS_TOTAL: &str = "slotd_decisions_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "slotd_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "slotd_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "slotd_connections_rejected_total";

/// Gauge: number of active shops (loaded engines).
pub const SHOPS_ACTIVE: &str = "slotd_shops_active";

/// Counter: startup/auth failures.
pub const AUTH_FAILURES_TOTAL: &str = "slotd_auth_failures_total";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "slotd_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "slotd_wal_flush_batch_size";

/// Counter: WAL compactions completed.
pub const WAL_COMPACTIONS_TOTAL: &str = "slotd_wal_compactions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::CreateEmployee { .. } => "insert_employee",
        Command::UpdateEmployee { .. } => "update_employee",
        Command::CreateService { .. } => "insert_service",
        Command::UpdateService { .. } => "update_service",
        Command::BookAppointment { .. } => "insert_booking",
        Command::SetBookingStatus { .. } => "update_booking",
        Command::CheckAvailability { .. } => "select_availability",
        Command::ListSlots { .. } => "select_slots",
        Command::ListEmployees { .. } => "select_employees",
        Command::ListServices { .. } => "select_services",
        Command::ListBookings { .. } => "select_bookings",
        Command::RecentBookings => "select_recent_bookings",
        Command::Listen { .. } => "listen",
        Command::Unlisten { .. } => "unlisten",
    }
}
