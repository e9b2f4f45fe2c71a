//! Utility functions for the secrets CLI

use anyhow::Context;
use clap::{Args, ValueEnum};
use trussed_secrets::{Algorithm, Kind, Properties};

pub mod reader;
pub mod session;

/// PIN for credentials stored encrypted on the card
#[derive(Args, Debug, Clone, Default)]
pub struct PinArgs {
    /// PIN to verify before the operation
    #[arg(long, env = "SECRETS_PIN", hide_env_values = true)]
    pub pin: Option<String>,
}

/// Protection flags of a new credential
#[derive(Args, Debug, Clone, Default)]
pub struct ProtectionArgs {
    /// Require a touch on the device before the credential is used
    #[arg(long)]
    pub touch: bool,

    /// Encrypt the credential with the PIN
    #[arg(long)]
    pub pin_encrypted: bool,
}

impl ProtectionArgs {
    pub fn properties(&self) -> Properties {
        let mut properties = Properties::empty();
        properties.set(Properties::TOUCH_REQUIRED, self.touch);
        properties.set(Properties::PIN_ENCRYPTED, self.pin_encrypted);
        properties
    }
}

/// HMAC algorithm as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AlgorithmArg {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Sha1 => Self::Sha1,
            AlgorithmArg::Sha256 => Self::Sha256,
            AlgorithmArg::Sha512 => Self::Sha512,
        }
    }
}

/// Credential kind as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum KindArg {
    Hotp,
    #[default]
    Totp,
    /// HOTP codes checked by the device
    HotpReverse,
    /// HMAC challenge-response
    Hmac,
}

impl From<KindArg> for Kind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Hotp => Self::Hotp,
            KindArg::Totp => Self::Totp,
            KindArg::HotpReverse => Self::HotpReverse,
            KindArg::Hmac => Self::Hmac,
        }
    }
}

/// Decode a hex string, tolerating a 0x prefix and whitespace
pub fn parse_hex(input: &str) -> anyhow::Result<Vec<u8>> {
    let cleaned: String = input
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(&cleaned).with_context(|| format!("Invalid hex string: {input}"))
}
