//! Commands for the PIN and the access key

use anyhow::Context;
use secrets_apdu_transport_pcsc::PcscTransport;
use tracing::{info, warn};
use trussed_secrets::derive_access_key;

use crate::utils::session::Session;

/// Set the PIN for encrypted credentials
pub fn set_pin_command(transport: PcscTransport, pin: &str) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;
    session.card().set_pin(pin.as_bytes())?;

    println!("PIN set successfully");
    session.close()
}

/// Change the PIN
pub fn change_pin_command(
    transport: PcscTransport,
    current_pin: &str,
    new_pin: &str,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;
    session
        .card()
        .change_pin(current_pin.as_bytes(), new_pin.as_bytes())?;

    println!("PIN changed successfully");
    session.close()
}

/// Verify the PIN and report the remaining attempts on failure
pub fn verify_pin_command(transport: PcscTransport, pin: &str) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;

    if let Err(e) = session.card().unlock(pin.as_bytes()) {
        if e.status_word().is_some_and(|sw| sw.is_verification_failed()) {
            let info = session.card().select()?;
            warn!(remaining = info.pin_counter(), "Wrong PIN");
        }
        return Err(e).context("PIN verification failed");
    }

    println!("PIN verified successfully");
    session.close()
}

/// Protect the card with an access key derived from a password
pub fn set_code_command(
    transport: PcscTransport,
    access_password: Option<&str>,
    new_password: &str,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, access_password)?;
    let salt = session
        .info()
        .salt
        .clone()
        .context("The card did not report a salt for the access key")?;

    let key = derive_access_key(new_password.as_bytes(), &salt);
    session.authorized()?.set_code(key.as_slice())?;

    info!("Access key set, pass --access-password to replace or remove it");
    println!("Access key set successfully");
    session.close()
}

/// Remove the access key
pub fn clear_code_command(
    transport: PcscTransport,
    access_password: Option<&str>,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, access_password)?;
    if !session.info().supports_challenge_response() {
        println!("No access key set");
        return session.close();
    }

    session.authorized()?.clear_code()?;

    println!("Access key removed successfully");
    session.close()
}

/// Check the access password against the card
pub fn validate_command(
    transport: PcscTransport,
    access_password: Option<&str>,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, access_password)?;
    if !session.info().supports_challenge_response() {
        println!("No access key set");
        return session.close();
    }

    session.authorized()?;

    println!("Access password accepted");
    session.close()
}
