//! # Elektra - Energy hardware control loop
//!
//! Elektra integrates heterogeneous energy-hardware endpoints into a single
//! control loop: an EVSE charge controller spoken to over a register-based
//! protocol (Modbus TCP) and a battery inverter queried over HTTP/JSON. Raw
//! telemetry is normalized into domain readings, instantaneous battery power
//! is integrated into cumulative energy totals, and a forecast of electricity
//! prices is reduced to the cheapest hours during which the vehicle should
//! actually be charged.
//!
//! ## Architecture
//!
//! The application follows a modular architecture with clear separation of
//! concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `modbus`: Modbus TCP register access behind the `RegisterClient` seam
//! - `evse`: Charge-controller protocol/state adapter
//! - `simcount`: Energy accounting by integrating power over elapsed time
//! - `tariff`: Tariff-window optimization over a price series
//! - `battery`: Battery inverter HTTP ingestion
//! - `fault`: Per-component fault bookkeeping
//! - `store`: Last-write-wins store of normalized readings
//! - `driver`: The polling control loop tying everything together

pub mod battery;
pub mod config;
pub mod driver;
pub mod error;
pub mod evse;
pub mod fault;
pub mod logging;
pub mod modbus;
pub mod simcount;
pub mod store;
pub mod tariff;

// Re-export commonly used types
pub use config::Config;
pub use driver::{DriverCommand, SiteDriver};
pub use error::{ElektraError, Result};
