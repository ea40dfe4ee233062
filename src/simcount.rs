//! Simulated energy counting for power-only devices
//!
//! Some components report instantaneous power but no energy counters. The
//! [`SimCounter`] integrates power over the wall-clock interval between
//! samples and keeps monotonically non-decreasing imported/exported totals.
//! Each counter is owned by exactly one component poll path; if that path is
//! concurrent, calls must be externally serialized.

use crate::logging::{LogContext, get_logger_with_context};
use serde::{Deserialize, Serialize};

/// Energy attributed to a single integration step, in watt hours
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyDelta {
    /// Energy drawn into the component during the step
    pub imported_wh: f64,

    /// Energy delivered by the component during the step
    pub exported_wh: f64,
}

/// Running energy totals for a metered component, in watt hours
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyTotals {
    /// Cumulative imported energy
    pub imported_wh: f64,

    /// Cumulative exported energy
    pub exported_wh: f64,
}

/// Integrates instantaneous power into cumulative energy totals
pub struct SimCounter {
    totals: EnergyTotals,
    last_sample_epoch: Option<f64>,
    logger: crate::logging::StructuredLogger,
}

impl SimCounter {
    /// Create a fresh counter for the given component
    pub fn new(component: &str) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("simcount").with_field("device", component.to_string()),
        );
        Self {
            totals: EnergyTotals::default(),
            last_sample_epoch: None,
            logger,
        }
    }

    /// Integrate a power sample taken now
    ///
    /// Positive power counts as energy leaving the component (export),
    /// negative power as energy entering it (import).
    pub fn sample(&mut self, power_w: f64) -> EnergyDelta {
        self.sample_at(power_w, now_epoch_seconds())
    }

    /// Integrate a power sample taken at `now` (Unix seconds)
    ///
    /// The first sample only establishes the reference point and yields a
    /// zero delta, as does a non-positive elapsed interval (clock skew,
    /// back-to-back calls). Totals never decrease.
    pub fn sample_at(&mut self, power_w: f64, now: f64) -> EnergyDelta {
        let delta = match self.last_sample_epoch {
            None => EnergyDelta::default(),
            Some(last) => {
                let elapsed = now - last;
                if elapsed <= 0.0 {
                    EnergyDelta::default()
                } else {
                    let energy_wh = power_w.abs() * elapsed / 3600.0;
                    if power_w >= 0.0 {
                        EnergyDelta {
                            imported_wh: 0.0,
                            exported_wh: energy_wh,
                        }
                    } else {
                        EnergyDelta {
                            imported_wh: energy_wh,
                            exported_wh: 0.0,
                        }
                    }
                }
            }
        };

        self.last_sample_epoch = Some(now);
        self.totals.imported_wh += delta.imported_wh;
        self.totals.exported_wh += delta.exported_wh;
        self.logger.trace(&format!(
            "power={:.1}W imported={:.3}Wh exported={:.3}Wh",
            power_w, self.totals.imported_wh, self.totals.exported_wh
        ));
        delta
    }

    /// Current running totals
    pub fn totals(&self) -> EnergyTotals {
        self.totals
    }
}

fn now_epoch_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_else(|_| std::time::Duration::from_secs(0))
        .as_secs_f64()
}
