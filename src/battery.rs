//! Battery inverter telemetry over HTTP/JSON
//!
//! Polls the inverter's power-flow endpoint, normalizes the battery power
//! sign convention (positive = power leaving the battery), and feeds the
//! sample through a [`SimCounter`] to maintain energy totals. An inverter
//! that is off or in standby answers with null fields; those degrade to zero
//! values rather than failing the poll, since the absence itself is the
//! standby signal.

use crate::config::BatteryConfig;
use crate::error::Result;
use crate::logging::get_logger;
use crate::simcount::SimCounter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Normalized battery state published to the value store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    /// Battery power in watts; positive = discharging into the load side
    pub power_w: f64,

    /// State of charge in percent
    pub soc_percent: f64,

    /// Cumulative energy charged into the battery
    pub imported_wh: f64,

    /// Cumulative energy discharged from the battery
    pub exported_wh: f64,
}

/// Extract battery power from a power-flow payload
///
/// The meter reports charge power as positive into the battery; the domain
/// convention flips the sign. A missing or null `P_Akku` means the inverter
/// is off or in standby and substitutes 0.
pub fn extract_power(payload: &Value) -> f64 {
    payload
        .pointer("/Body/Data/Site/P_Akku")
        .and_then(Value::as_f64)
        .map_or(0.0, |p| -p)
}

/// Extract the state of charge from a power-flow payload
///
/// Inverter topologies differ: systems with an `Inverters` map carry the SOC
/// there, others expose it per meter id under `Controller`. The inverter path
/// is preferred when present. Missing or null values substitute 0.
pub fn extract_soc(payload: &Value, meter_id: u8) -> f64 {
    let data = payload.pointer("/Body/Data");
    let soc = match data {
        Some(data) if data.get("Inverters").is_some() => {
            data.pointer("/Inverters/1/SOC").and_then(Value::as_f64)
        }
        Some(data) => data
            .pointer(&format!("/{}/Controller/StateOfCharge_Relative", meter_id))
            .and_then(Value::as_f64),
        None => None,
    };
    soc.unwrap_or(0.0)
}

/// HTTP client for one battery inverter, owning its energy counter
pub struct BatteryClient {
    endpoint: String,
    meter_id: u8,
    http: reqwest::Client,
    sim_counter: SimCounter,
    logger: crate::logging::StructuredLogger,
}

impl BatteryClient {
    /// Create a new client for the configured inverter
    pub fn new(config: &BatteryConfig) -> Result<Self> {
        let logger = get_logger("battery");
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            endpoint: format!(
                "http://{}/solar_api/v1/GetPowerFlowRealtimeData.fcgi",
                config.ip_address
            ),
            meter_id: config.meter_id,
            http,
            sim_counter: SimCounter::new("battery"),
            logger,
        })
    }

    /// Fetch one telemetry sample and update the energy totals
    ///
    /// A timeout or malformed response surfaces as a single failed poll
    /// cycle; the caller's polling cadence is the retry.
    pub async fn poll(&mut self) -> Result<BatteryReading> {
        let payload: Value = self
            .http
            .get(&self.endpoint)
            .query(&[("Scope", "System")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(self.ingest(&payload))
    }

    /// Normalize a power-flow payload and integrate the power sample
    pub fn ingest(&mut self, payload: &Value) -> BatteryReading {
        let power_w = extract_power(payload);
        let soc_percent = extract_soc(payload, self.meter_id);
        self.sim_counter.sample(power_w);
        let totals = self.sim_counter.totals();

        self.logger.debug(&format!(
            "Battery power {:.1} W, SOC {:.1} %",
            power_w, soc_percent
        ));

        BatteryReading {
            power_w,
            soc_percent,
            imported_wh: totals.imported_wh,
            exported_wh: totals.exported_wh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_with_inverters(p_akku: Value) -> Value {
        json!({
            "Body": {
                "Data": {
                    "Site": { "P_Akku": p_akku },
                    "Inverters": { "1": { "SOC": 55.5 } }
                }
            }
        })
    }

    #[test]
    fn power_sign_is_flipped() {
        // Meter reports 1200 W charging into the battery
        let payload = payload_with_inverters(json!(1200.0));
        assert!((extract_power(&payload) + 1200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_power_degrades_to_zero() {
        let payload = payload_with_inverters(Value::Null);
        assert_eq!(extract_power(&payload), 0.0);

        let empty = json!({});
        assert_eq!(extract_power(&empty), 0.0);
    }

    #[test]
    fn inverter_soc_path_is_preferred() {
        let payload = json!({
            "Body": {
                "Data": {
                    "Site": { "P_Akku": -500.0 },
                    "Inverters": { "1": { "SOC": 81.0 } },
                    "0": { "Controller": { "StateOfCharge_Relative": 12.0 } }
                }
            }
        });
        assert!((extract_soc(&payload, 0) - 81.0).abs() < f64::EPSILON);
    }

    #[test]
    fn controller_soc_path_used_without_inverters_map() {
        let payload = json!({
            "Body": {
                "Data": {
                    "Site": { "P_Akku": -500.0 },
                    "0": { "Controller": { "StateOfCharge_Relative": 12.5 } }
                }
            }
        });
        assert!((extract_soc(&payload, 0) - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_soc_degrades_to_zero() {
        let payload = json!({ "Body": { "Data": { "Site": {} } } });
        assert_eq!(extract_soc(&payload, 0), 0.0);
        assert_eq!(extract_soc(&json!({}), 0), 0.0);
    }

    #[test]
    fn ingest_builds_reading_with_totals() {
        let config = BatteryConfig::default();
        let mut client = BatteryClient::new(&config).unwrap();
        let reading = client.ingest(&payload_with_inverters(json!(250.0)));
        assert!((reading.power_w + 250.0).abs() < f64::EPSILON);
        assert!((reading.soc_percent - 55.5).abs() < f64::EPSILON);
        // First sample only establishes the integration reference
        assert_eq!(reading.imported_wh, 0.0);
        assert_eq!(reading.exported_wh, 0.0);
    }
}
