//! Charge-controller adapter for the EVSE register protocol
//!
//! This module translates raw holding-register values into domain state and
//! drives the control registers for the current setpoint and the
//! precision-current mode. The adapter is a pure decoder of device state; all
//! transitions are made by the device itself. It owns exclusive access to its
//! register client, so callers must serialize through it.

use crate::error::{ElektraError, Result};
use crate::logging::{LogContext, get_logger_with_context};
use crate::modbus::RegisterClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Base address of the set-current / reserved / state register block
pub const REG_CHARGE_STATE: u16 = 1000;

/// Firmware version register
pub const REG_FIRMWARE_VERSION: u16 = 1005;

/// Mode flag register; bit 7 selects 0.01 A current encoding
pub const REG_MODE_FLAGS: u16 = 2005;

/// Maximum configurable current register
pub const REG_MAX_CURRENT: u16 = 2007;

/// Bit in the mode flag register that enables 0.01 A current steps
pub const PRECISE_CURRENT_BIT: u16 = 1 << 7;

/// Minimum spacing between register accesses on the link
const REGISTER_SPACING: Duration = Duration::from_millis(100);

/// Settling time the controller needs after a mode flag write
const MODE_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Device state reported by the charge controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvseState {
    /// No vehicle connected
    Ready,

    /// Vehicle connected, charging not enabled
    EvPresent,

    /// Vehicle connected and charging enabled
    Charging,

    /// Charging enabled with ventilation requested
    ChargingWithVentilation,

    /// Device reports a failure; plug and enable flags are undefined
    Failure,
}

impl EvseState {
    /// Decode a raw status code; codes outside 1-5 are unrepresentable
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Ready),
            2 => Some(Self::EvPresent),
            3 => Some(Self::Charging),
            4 => Some(Self::ChargingWithVentilation),
            5 => Some(Self::Failure),
            _ => None,
        }
    }

    /// Fixed `(plugged, charge_enabled)` pair for the state; `None` for Failure
    pub fn attributes(&self) -> Option<(bool, bool)> {
        match self {
            Self::Ready => Some((false, false)),
            Self::EvPresent => Some((true, false)),
            Self::Charging | Self::ChargingWithVentilation => Some((true, true)),
            Self::Failure => None,
        }
    }
}

/// Normalized plug/charge telemetry, built fresh on every poll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeReading {
    /// Whether a vehicle is plugged in
    pub plugged: bool,

    /// Whether current is actually allowed to flow
    pub charging: bool,

    /// Current setpoint in amperes
    pub set_current_a: f64,
}

/// Adapter over the charge controller's register protocol
pub struct Evse<C: RegisterClient> {
    client: C,
    last_access: Option<Instant>,
    logger: crate::logging::StructuredLogger,
}

impl<C: RegisterClient> Evse<C> {
    /// Create a new adapter owning the given register client
    pub fn new(client: C, unit_id: u8) -> Self {
        let logger = get_logger_with_context(LogContext::new("evse").with_unit_id(unit_id));
        Self {
            client,
            last_access: None,
            logger,
        }
    }

    /// Mutable access to the underlying client, e.g. for connection setup
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Enforce the minimum inter-call spacing before touching the link
    async fn pace(&mut self) {
        if let Some(last) = self.last_access {
            let elapsed = last.elapsed();
            if elapsed < REGISTER_SPACING {
                sleep(REGISTER_SPACING - elapsed).await;
            }
        }
        self.last_access = Some(Instant::now());
    }

    /// Read the set-current / state register block and decode it
    ///
    /// Fails with a protocol fault when the controller reports the failure
    /// state or an unrepresentable status code; the error carries the raw
    /// set-current and state code for diagnostics. Callers must treat every
    /// poll as potentially failing and must not reuse a previous reading
    /// across an error cycle.
    pub async fn read_plug_charge_state(&mut self) -> Result<ChargeReading> {
        self.pace().await;
        let regs = self.client.read_holding_registers(REG_CHARGE_STATE, 3).await?;
        if regs.len() < 3 {
            return Err(ElektraError::transport(format!(
                "Short register response: expected 3 values, got {}",
                regs.len()
            )));
        }
        let set_current = regs[0];
        let state_code = regs[2];
        self.logger.debug(&format!(
            "Set current raw {}, state code {}",
            set_current, state_code
        ));

        let state = EvseState::from_code(state_code)
            .ok_or_else(|| ElektraError::protocol(set_current, state_code))?;
        let Some((plugged, charge_enabled)) = state.attributes() else {
            return Err(ElektraError::protocol(set_current, state_code));
        };

        let charging = charge_enabled && set_current > 0;
        // Raw values above 32 are encoded in 0.01 A steps, values up to 32 in
        // whole amps. The encoding is inferred from the magnitude rather than
        // from the precision-mode bit, matching the controller's observed
        // behavior; a sub-0.33 A setpoint in precision mode would be misread.
        let set_current_a = if set_current > 32 {
            f64::from(set_current) / 100.0
        } else {
            f64::from(set_current)
        };

        Ok(ChargeReading {
            plugged,
            charging,
            set_current_a,
        })
    }

    /// Read the firmware version register
    pub async fn firmware_version(&mut self) -> Result<u16> {
        self.pace().await;
        let regs = self
            .client
            .read_holding_registers(REG_FIRMWARE_VERSION, 1)
            .await?;
        regs.first()
            .copied()
            .ok_or_else(|| ElektraError::transport("Empty firmware version response"))
    }

    /// Whether the 0.01 A current encoding is active
    pub async fn is_precise_current_active(&mut self) -> Result<bool> {
        let flags = self.read_mode_flags().await?;
        let active = flags & PRECISE_CURRENT_BIT != 0;
        self.logger.debug(&format!(
            "Precise current mode {}",
            if active { "active" } else { "inactive" }
        ));
        Ok(active)
    }

    /// Enable the 0.01 A current encoding; no-op if already active
    pub async fn activate_precise_current(&mut self) -> Result<()> {
        let flags = self.read_mode_flags().await?;
        if flags & PRECISE_CURRENT_BIT != 0 {
            return Ok(());
        }
        self.logger.debug("Setting precise current mode bit");
        self.write_mode_flags(flags ^ PRECISE_CURRENT_BIT).await
    }

    /// Disable the 0.01 A current encoding; no-op if already inactive
    pub async fn deactivate_precise_current(&mut self) -> Result<()> {
        let flags = self.read_mode_flags().await?;
        if flags & PRECISE_CURRENT_BIT == 0 {
            return Ok(());
        }
        self.logger.debug("Clearing precise current mode bit");
        self.write_mode_flags(flags ^ PRECISE_CURRENT_BIT).await
    }

    /// Write the current setpoint in amperes
    pub async fn set_current(&mut self, amps: u16) -> Result<()> {
        self.pace().await;
        self.client.write_register(REG_CHARGE_STATE, amps).await
    }

    /// Read the maximum configurable current in amperes
    pub async fn max_current(&mut self) -> Result<u16> {
        self.pace().await;
        let regs = self
            .client
            .read_holding_registers(REG_MAX_CURRENT, 1)
            .await?;
        regs.first()
            .copied()
            .ok_or_else(|| ElektraError::transport("Empty max current response"))
    }

    async fn read_mode_flags(&mut self) -> Result<u16> {
        self.pace().await;
        let regs = self
            .client
            .read_holding_registers(REG_MODE_FLAGS, 1)
            .await?;
        regs.first()
            .copied()
            .ok_or_else(|| ElektraError::transport("Empty mode flag response"))
    }

    /// Write the mode flag register and give the controller time to apply it.
    /// The settling delay is required before the device can be trusted to
    /// reflect the new mode; do not re-read immediately to verify. A failed
    /// write leaves the mode bit unknown, so re-read before trusting it again.
    async fn write_mode_flags(&mut self, value: u16) -> Result<()> {
        self.pace().await;
        self.client.write_register(REG_MODE_FLAGS, value).await?;
        sleep(MODE_SETTLE_DELAY).await;
        Ok(())
    }
}
