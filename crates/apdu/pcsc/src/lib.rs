//! PC/SC transport implementation for APDU operations
//!
//! This crate provides an implementation of the `CardTransport` trait from
//! `secrets-apdu-core` using the PC/SC API for communication with smart cards.
//!
//! Transactions are implemented by reconnecting to the card in exclusive share
//! mode, so a session keeps the card for itself until it ends the transaction
//! or the transport is dropped.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use secrets_apdu_core::prelude::*;
//! use secrets_apdu_transport_pcsc::{PcscConfig, PcscDeviceManager};
//!
//! // Create a PC/SC device manager
//! let manager = PcscDeviceManager::new()?;
//!
//! // List available readers
//! let readers = manager.list_readers()?;
//! let Some(reader) = readers.iter().find(|r| r.has_card()) else {
//!     println!("No card found");
//!     return Ok(());
//! };
//!
//! let transport = manager.open_reader_with_config(reader.name(), PcscConfig::default())?;
//! let mut executor = CardExecutor::new(transport);
//!
//! // Send a SELECT command
//! let aid = [0xA0, 0x00, 0x00, 0x05, 0x27, 0x21, 0x01];
//! let select = Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, aid.to_vec(), 256);
//! let response = executor.execute(&select)?;
//! println!("Response: {:?}", response);
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod config;
mod error;
mod manager;
mod reader;
mod transport;
mod util;

pub use config::{ConnectStrategy, PcscConfig, ShareMode};
pub use error::PcscError;
pub use manager::PcscDeviceManager;
pub use reader::PcscReader;
pub use transport::PcscTransport;

// Re-export some pcsc types for convenience
pub use pcsc::{Protocol, Protocols};
