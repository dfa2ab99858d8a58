//! Appointment scheduling for small businesses, served over the PostgreSQL
//! wire protocol.
//!
//! Per-shop booking state lives in memory, backed by a write-ahead log. One
//! availability module decides every booking: business hours 09:00-21:00
//! plus a 60-minute setup buffer after each existing appointment.

pub mod auth;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod shop;
pub mod sql;
pub mod tls;
pub mod wal;
pub mod wire;
