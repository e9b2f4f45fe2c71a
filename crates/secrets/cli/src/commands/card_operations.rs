//! Commands for basic card operations

use anyhow::bail;
use secrets_apdu_transport_pcsc::PcscTransport;
use tracing::info;

use crate::utils::session::Session;

/// Select the secrets application and display info
pub fn info_command(transport: PcscTransport) -> anyhow::Result<()> {
    let session = Session::open(transport, None)?;
    let info = session.info();

    info!("Secrets application selected successfully.");
    println!("Version: {}", info.version);
    if let Some(serial) = &info.serial {
        println!("Serial number: {}", hex::encode(serial));
    }
    match info.pin_counter {
        Some(attempts) => println!("PIN: set, {attempts} attempts remaining"),
        None => println!("PIN: not set"),
    }
    println!(
        "Access key: {}",
        if info.supports_challenge_response() {
            "set"
        } else {
            "not set"
        }
    );
    println!(
        "Password safe: {}",
        if info.supports_password_storage() {
            "supported"
        } else {
            "not supported"
        }
    );
    println!(
        "Encrypted storage: {}",
        if info.has_encrypted_storage() {
            "supported"
        } else {
            "not supported"
        }
    );

    session.close()
}

/// Remove all credentials, the PIN and the access key
pub fn reset_command(transport: PcscTransport, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        bail!("Resetting deletes all credentials, pass --yes to confirm");
    }

    let mut session = Session::open(transport, None)?;
    session.card().reset()?;

    println!("Secrets application reset successfully");
    session.close()
}
