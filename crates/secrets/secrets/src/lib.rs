//! Client for the secrets applet of Nitrokey 3 devices
//!
//! The applet stores HOTP, TOTP, reverse HOTP and HMAC challenge-response
//! credentials, optionally together with password safe entries (login,
//! password and metadata). Credentials can be protected by a PIN, in which
//! case the applet encrypts them and hides them until the PIN is verified.
//!
//! The main entry point is [`Card`], which wraps any
//! [`CardTransport`](secrets_apdu_core::CardTransport):
//!
//! ```no_run
//! # fn run(transport: impl secrets_apdu_core::CardTransport) -> trussed_secrets::Result<()> {
//! use trussed_secrets::{Algorithm, Card, Kind, Properties};
//!
//! let mut card = Card::new(transport)?;
//! let info = card.select()?;
//! println!("applet version {}", info.version);
//!
//! card.put("mail", Algorithm::Sha1, Kind::Totp, 6, b"12345678901234567890", Properties::empty(), 0)?;
//! println!("{}", card.calculate("mail")?.otp());
//! card.close()?;
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod application;
pub mod commands;
mod constants;
mod crypto;
mod error;
pub mod tlv;
mod types;

pub use application::{Card, Clock};
pub use commands::Instruction;
pub use constants::*;
pub use crypto::{derive_access_key, hmac};
pub use error::{Error, Result};
pub use types::*;
