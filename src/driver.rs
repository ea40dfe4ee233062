//! Core control loop for Elektra
//!
//! The driver owns the EVSE adapter (and with it the serial register link),
//! the battery client, the fault tracker, and the value store. A periodic
//! tick polls both devices and publishes normalized readings; a command
//! channel delivers fresh price series and manual overrides. Nothing in the
//! loop retries in-line; a failed cycle is logged and the next tick is the
//! retry.

use crate::battery::BatteryClient;
use crate::config::Config;
use crate::error::{ElektraError, Result};
use crate::evse::Evse;
use crate::fault::FaultTracker;
use crate::logging::get_logger;
use crate::modbus::ModbusClient;
use crate::store::ValueStore;
use crate::tariff::{LoadingWindow, PriceSeries, select_loading_hours};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, interval};

/// Component identity of the charge controller in store and fault tracker
pub const EVSE_COMPONENT: &str = "evse";

/// Component identity of the battery inverter
pub const BATTERY_COMPONENT: &str = "battery";

/// Commands accepted by the driver from external components
#[derive(Debug, Clone)]
pub enum DriverCommand {
    /// Replace the price series and recompute the charge plan
    UpdatePrices(PriceSeries),

    /// Manual current override in whole amperes, bypassing the plan
    SetCurrent(u16),

    /// Stop the control loop
    Shutdown,
}

/// Main driver tying the adapters, accounting, and scheduling together
pub struct SiteDriver {
    config: Config,
    evse: Evse<ModbusClient>,
    battery: BatteryClient,
    store: Arc<ValueStore>,
    faults: FaultTracker,
    planned_hours: Vec<i64>,
    manual_current: Option<u16>,
    last_commanded_current: Option<u16>,
    cmd_rx: mpsc::UnboundedReceiver<DriverCommand>,
    logger: crate::logging::StructuredLogger,
}

impl SiteDriver {
    /// Create a new driver from configuration
    pub fn new(config: Config, cmd_rx: mpsc::UnboundedReceiver<DriverCommand>) -> Result<Self> {
        config.validate()?;
        let logger = get_logger("driver");
        let modbus = ModbusClient::new(&config.evse);
        let evse = Evse::new(modbus, config.evse.unit_id);
        let battery = BatteryClient::new(&config.battery)?;

        Ok(Self {
            config,
            evse,
            battery,
            store: Arc::new(ValueStore::new()),
            faults: FaultTracker::new(),
            planned_hours: Vec::new(),
            manual_current: None,
            last_commanded_current: None,
            cmd_rx,
            logger,
        })
    }

    /// Shared handle to the value store
    pub fn store(&self) -> Arc<ValueStore> {
        Arc::clone(&self.store)
    }

    /// Run the control loop until a shutdown command arrives
    pub async fn run(&mut self) -> Result<()> {
        self.probe_device().await?;

        let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms));
        self.logger.info(&format!(
            "Polling every {} ms",
            self.config.poll_interval_ms
        ));

        loop {
            tokio::select! {
                command = self.cmd_rx.recv() => {
                    match command {
                        Some(DriverCommand::UpdatePrices(series)) => self.update_charge_plan(&series),
                        Some(DriverCommand::SetCurrent(amps)) => {
                            self.logger.info(&format!("Manual current override: {} A", amps));
                            self.manual_current = Some(amps);
                            self.last_commanded_current = None;
                        }
                        Some(DriverCommand::Shutdown) | None => {
                            self.logger.info("Shutting down control loop");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.poll_cycle().await;
                }
            }
        }

        self.evse.client_mut().disconnect().await;
        Ok(())
    }

    /// Connect the register link and publish the static device info once
    async fn probe_device(&mut self) -> Result<()> {
        self.evse.client_mut().connect().await?;
        let firmware = self.evse.firmware_version().await?;
        let max_current = self.evse.max_current().await?;
        self.logger.info(&format!(
            "Charge controller firmware {}, max current {} A",
            firmware, max_current
        ));
        self.store
            .set(
                "evse/info",
                &json!({ "firmware_version": firmware, "max_current_a": max_current }),
            )
            .await
    }

    /// One poll cycle over both devices; errors end the cycle, not the loop
    async fn poll_cycle(&mut self) {
        match self.evse.read_plug_charge_state().await {
            Ok(reading) => {
                self.faults.clear(EVSE_COMPONENT);
                if let Err(e) = self.store.set(EVSE_COMPONENT, &reading).await {
                    self.logger.error(&format!("Failed to publish reading: {}", e));
                }
                self.apply_charge_plan().await;
            }
            Err(err @ ElektraError::Protocol { .. }) => {
                self.faults.raise(EVSE_COMPONENT, &err.to_string());
            }
            Err(e) => {
                self.logger
                    .warn(&format!("EVSE poll failed, retrying next cycle: {}", e));
            }
        }

        match self.battery.poll().await {
            Ok(reading) => {
                self.faults.clear(BATTERY_COMPONENT);
                if let Err(e) = self.store.set(BATTERY_COMPONENT, &reading).await {
                    self.logger.error(&format!("Failed to publish reading: {}", e));
                }
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Battery poll failed, retrying next cycle: {}", e));
            }
        }
    }

    /// Recompute the cheapest charging hours from a fresh price series
    fn update_charge_plan(&mut self, series: &PriceSeries) {
        let now = chrono::Utc::now().timestamp();
        let window = planning_window(now, &self.config);
        self.planned_hours = select_loading_hours(series, &window);
        self.manual_current = None;
        self.last_commanded_current = None;
        self.logger.info(&format!(
            "Charge plan updated: {} of {} requested hours selected",
            self.planned_hours.len(),
            window.duration_hours
        ));
    }

    /// Drive the setpoint register toward the planned state
    async fn apply_charge_plan(&mut self) {
        let now = chrono::Utc::now().timestamp();
        let target = self.manual_current.unwrap_or_else(|| {
            target_current(&self.planned_hours, now, self.config.evse.charge_current_a)
        });

        if self.last_commanded_current == Some(target) {
            return;
        }
        match self.evse.set_current(target).await {
            Ok(()) => {
                self.logger.info(&format!("Set current to {} A", target));
                self.last_commanded_current = Some(target);
            }
            Err(e) => {
                // Leave last_commanded_current unset so the write is retried
                // next cycle; a partial write leaves the device state unknown.
                self.logger.warn(&format!("Failed to set current: {}", e));
                self.last_commanded_current = None;
            }
        }
    }

}

/// Truncate a timestamp to the start of its hour
pub fn hour_start(timestamp: i64) -> i64 {
    timestamp - timestamp.rem_euclid(3600)
}

/// Eligible charging window starting at the current hour
fn planning_window(now: i64, config: &Config) -> LoadingWindow {
    let start = hour_start(now);
    LoadingWindow {
        start,
        end: start + i64::from(config.tariff.window_hours) * 3600,
        duration_hours: config.tariff.duration_hours,
    }
}

/// Current setpoint for this moment: the configured charge current during a
/// planned hour, 0 A otherwise
pub fn target_current(planned_hours: &[i64], now: i64, charge_current_a: u16) -> u16 {
    if planned_hours.contains(&hour_start(now)) {
        charge_current_a
    } else {
        0
    }
}
