//! Modbus TCP register access for the EVSE charge controller
//!
//! This module provides async Modbus TCP communication with the charge
//! controller, with bounded connect/operation timeouts and error mapping.
//! The [`RegisterClient`] trait is the seam the adapter is written against;
//! request/response framing on the link has no multiplexing, so a client
//! instance must only ever be driven by a single owner.

use crate::config::EvseConfig;
use crate::error::{ElektraError, Result};
use crate::logging::get_logger;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tokio_modbus::client::tcp;
use tokio_modbus::prelude::*;

/// Read/write access to fixed-width holding registers on one unit
#[async_trait]
pub trait RegisterClient: Send {
    /// Read `count` consecutive 16-bit holding registers starting at `address`
    async fn read_holding_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>>;

    /// Write a single 16-bit holding register
    async fn write_register(&mut self, address: u16, value: u16) -> Result<()>;
}

/// Modbus TCP client for the charge controller link
pub struct ModbusClient {
    /// Modbus TCP client connection
    client: Option<tokio_modbus::client::Context>,

    /// Configuration
    config: EvseConfig,

    /// Connection timeout
    connection_timeout: Duration,

    /// Operation timeout
    operation_timeout: Duration,

    /// Logger
    logger: crate::logging::StructuredLogger,
}

impl ModbusClient {
    /// Create a new Modbus client
    pub fn new(config: &EvseConfig) -> Self {
        let logger = get_logger("modbus");
        Self {
            client: None,
            config: config.clone(),
            connection_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(2),
            logger,
        }
    }

    /// Connect to the Modbus server
    pub async fn connect(&mut self) -> Result<()> {
        let address = format!("{}:{}", self.config.ip, self.config.port);

        self.logger
            .info(&format!("Connecting to Modbus server at {}", address));

        let socket_addr: std::net::SocketAddr = address
            .parse()
            .map_err(|e| ElektraError::transport(format!("Invalid socket address: {}", e)))?;

        let slave = Slave(self.config.unit_id);
        match timeout(self.connection_timeout, tcp::connect_slave(socket_addr, slave)).await {
            Ok(Ok(client)) => {
                self.client = Some(client);
                self.logger.info("Successfully connected to Modbus server");
                Ok(())
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to connect to Modbus server: {}", e);
                self.logger.error(&error_msg);
                Err(ElektraError::transport(error_msg))
            }
            Err(_) => {
                let error_msg = "Connection timeout".to_string();
                self.logger.error(&error_msg);
                Err(ElektraError::timeout(error_msg))
            }
        }
    }

    /// Disconnect from the Modbus server
    pub async fn disconnect(&mut self) {
        if self.client.take().is_some() {
            self.logger.info("Disconnecting from Modbus server");
        }
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Get client reference or error if not connected
    fn get_client(&mut self) -> Result<&mut tokio_modbus::client::Context> {
        self.client
            .as_mut()
            .ok_or_else(|| ElektraError::transport("Not connected to Modbus server"))
    }
}

#[async_trait]
impl RegisterClient for ModbusClient {
    async fn read_holding_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>> {
        let timeout_duration = self.operation_timeout;

        // Log before borrowing client
        self.logger.debug(&format!(
            "Reading {} registers from address {} on unit {}",
            count, address, self.config.unit_id
        ));

        let client = self.get_client()?;
        let request = client.read_holding_registers(address, count);

        match timeout(timeout_duration, request).await {
            Ok(Ok(Ok(response))) => {
                self.logger.trace(&format!(
                    "Read {} registers: {:?}",
                    response.len(),
                    response
                ));
                Ok(response)
            }
            Ok(Ok(Err(exception))) => {
                let error_msg = format!("Device rejected register read: {}", exception);
                self.logger.error(&error_msg);
                Err(ElektraError::transport(error_msg))
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to read holding registers: {}", e);
                self.logger.error(&error_msg);
                Err(ElektraError::transport(error_msg))
            }
            Err(_) => {
                let error_msg = "Read operation timeout".to_string();
                self.logger.error(&error_msg);
                Err(ElektraError::timeout(error_msg))
            }
        }
    }

    async fn write_register(&mut self, address: u16, value: u16) -> Result<()> {
        let timeout_duration = self.operation_timeout;

        // Log before borrowing client
        self.logger.debug(&format!(
            "Writing value {} to register {} on unit {}",
            value, address, self.config.unit_id
        ));

        let client = self.get_client()?;
        let request = client.write_single_register(address, value);

        match timeout(timeout_duration, request).await {
            Ok(Ok(Ok(()))) => {
                self.logger.debug("Successfully wrote single register");
                Ok(())
            }
            Ok(Ok(Err(exception))) => {
                let error_msg = format!("Device rejected register write: {}", exception);
                self.logger.error(&error_msg);
                Err(ElektraError::transport(error_msg))
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to write single register: {}", e);
                self.logger.error(&error_msg);
                Err(ElektraError::transport(error_msg))
            }
            Err(_) => {
                let error_msg = "Write operation timeout".to_string();
                self.logger.error(&error_msg);
                Err(ElektraError::timeout(error_msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvseConfig;

    #[test]
    fn test_modbus_config() {
        let config = EvseConfig::default();
        assert_eq!(config.port, 502);
        assert_eq!(config.unit_id, 1);
    }

    #[test]
    fn test_modbus_client_creation() {
        let config = EvseConfig::default();
        let client = ModbusClient::new(&config);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_a_no_op() {
        let config = EvseConfig::default();
        let mut client = ModbusClient::new(&config);
        client.disconnect().await;
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_read_without_connection_fails() {
        let config = EvseConfig::default();
        let mut client = ModbusClient::new(&config);
        let err = client.read_holding_registers(1000, 3).await.unwrap_err();
        assert!(matches!(err, ElektraError::Transport { .. }));
    }
}
