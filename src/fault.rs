//! Per-component fault bookkeeping
//!
//! Components raise a fault when a device reports an unrepresentable state
//! and the poll loop clears it again after the next successful read. The
//! tracker only records the condition; scheduling the retry stays with the
//! polling cadence.

use crate::logging::get_logger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A recorded fault condition for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultRecord {
    /// Component identity the fault belongs to
    pub component: String,

    /// Human-readable description of the condition
    pub message: String,

    /// Whether the fault is currently active
    pub active: bool,
}

/// Tracks the latest fault condition per component
pub struct FaultTracker {
    records: HashMap<String, FaultRecord>,
    logger: crate::logging::StructuredLogger,
}

impl FaultTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            logger: get_logger("fault"),
        }
    }

    /// Record an active fault for the component
    pub fn raise(&mut self, component: &str, message: &str) {
        let was_active = self.is_active(component);
        self.records.insert(
            component.to_string(),
            FaultRecord {
                component: component.to_string(),
                message: message.to_string(),
                active: true,
            },
        );
        if !was_active {
            self.logger
                .warn(&format!("Fault raised for {}: {}", component, message));
        }
    }

    /// Clear the component's fault after a successful read
    pub fn clear(&mut self, component: &str) {
        if let Some(record) = self.records.get_mut(component)
            && record.active
        {
            record.active = false;
            self.logger.info(&format!("Fault cleared for {}", component));
        }
    }

    /// Whether the component currently has an active fault
    pub fn is_active(&self, component: &str) -> bool {
        self.records
            .get(component)
            .is_some_and(|record| record.active)
    }

    /// Latest record for the component, active or not
    pub fn record(&self, component: &str) -> Option<&FaultRecord> {
        self.records.get(component)
    }
}

impl Default for FaultTracker {
    fn default() -> Self {
        Self::new()
    }
}
