//! Commands for OTP and password safe credentials

use std::time::{Duration, UNIX_EPOCH};

use anyhow::Context;
use secrets_apdu_transport_pcsc::PcscTransport;
use tracing::{debug, info};
use trussed_secrets::{Credential, challenge_totp};

use crate::utils::session::Session;
use crate::utils::{AlgorithmArg, KindArg, PinArgs, ProtectionArgs, parse_hex};

/// List the credentials visible in the current PIN state
pub fn list_command(
    transport: PcscTransport,
    pin: &PinArgs,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;
    session.unlock(pin)?;

    let items = session.card().list()?;
    if items.is_empty() {
        println!("No credentials stored");
    }
    for item in &items {
        println!("{item}");
    }

    session.close()
}

/// Calculate an OTP code
pub fn code_command(
    transport: PcscTransport,
    pin: &PinArgs,
    id: &str,
    challenge: Option<&str>,
    time: Option<u64>,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;
    session.unlock(pin)?;

    let card = session.card();
    info!("Calculating code for {id}, touch the device if it asks for it");
    let code = match (challenge, time) {
        (Some(challenge), _) => card.calculate_with_challenge(id, &parse_hex(challenge)?)?,
        (None, Some(seconds)) => {
            let challenge =
                challenge_totp(UNIX_EPOCH + Duration::from_secs(seconds), card.time_step());
            debug!(challenge = %hex::encode(challenge), "Using explicit time");
            card.calculate_with_challenge(id, &challenge)?
        }
        (None, None) => card.calculate(id)?,
    };

    println!("{code}");
    session.close()
}

/// Let the card check a reverse HOTP code
pub fn verify_command(
    transport: PcscTransport,
    pin: &PinArgs,
    id: &str,
    code: u32,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;
    session.unlock(pin)?;

    session
        .card()
        .verify_code(id, code)
        .context("Code rejected")?;

    println!("Code accepted");
    session.close()
}

/// Store a new OTP credential
#[allow(clippy::too_many_arguments)]
pub fn add_command(
    transport: PcscTransport,
    pin: &PinArgs,
    id: &str,
    secret: &str,
    algorithm: AlgorithmArg,
    kind: KindArg,
    digits: u8,
    counter: u32,
    protection: &ProtectionArgs,
) -> anyhow::Result<()> {
    let secret = parse_hex(secret)?;

    let mut session = Session::open(transport, None)?;
    session.unlock(pin)?;

    session.card().put(
        id,
        algorithm.into(),
        kind.into(),
        digits,
        &secret,
        protection.properties(),
        counter,
    )?;

    println!("Credential '{id}' stored successfully");
    session.close()
}

/// Store a new password safe entry
#[allow(clippy::too_many_arguments)]
pub fn add_password_command(
    transport: PcscTransport,
    pin: &PinArgs,
    id: &str,
    login: Option<&str>,
    password: Option<&str>,
    metadata: Option<&str>,
    protection: &ProtectionArgs,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;
    session.unlock(pin)?;

    session
        .card()
        .put_password(id, protection.properties())?;

    let fields = fields(id, login, password, metadata);
    if fields != Credential::new(id) {
        // The card forgets the PIN after every other command
        session.unlock(pin)?;
        session.card().update(id, &fields)?;
    }

    println!("Password entry '{id}' stored successfully");
    session.close()
}

/// Show a stored credential
pub fn get_command(
    transport: PcscTransport,
    pin: &PinArgs,
    id: &str,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;
    session.unlock(pin)?;

    let credential = session.card().get(id)?;

    println!("Name: {}", credential.id);
    if let Some(kind) = credential.kind {
        println!("Kind: {kind}");
    }
    if let Some(algorithm) = credential.algorithm {
        println!("Algorithm: {algorithm}");
    }
    if let Some(properties) = credential.properties {
        println!("Properties: {properties}");
    }
    if let Some(login) = &credential.login {
        println!("Login: {login}");
    }
    if let Some(password) = &credential.password {
        println!("Password: {password}");
    }
    if let Some(metadata) = &credential.metadata {
        println!("Metadata: {metadata}");
    }

    session.close()
}

/// Change the password safe fields of a credential
pub fn update_command(
    transport: PcscTransport,
    pin: &PinArgs,
    id: &str,
    login: Option<&str>,
    password: Option<&str>,
    metadata: Option<&str>,
) -> anyhow::Result<()> {
    let fields = fields(id, login, password, metadata);
    if fields == Credential::new(id) {
        anyhow::bail!("Nothing to update, pass --login, --password or --metadata");
    }

    let mut session = Session::open(transport, None)?;
    session.unlock(pin)?;

    session.card().update(id, &fields)?;

    println!("Credential '{id}' updated successfully");
    session.close()
}

/// Rename a credential
pub fn rename_command(
    transport: PcscTransport,
    pin: &PinArgs,
    old: &str,
    new: &str,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;
    session.unlock(pin)?;

    session.card().rename(old, new)?;

    println!("Credential '{old}' renamed to '{new}'");
    session.close()
}

/// Delete a credential
pub fn delete_command(
    transport: PcscTransport,
    pin: &PinArgs,
    id: &str,
) -> anyhow::Result<()> {
    let mut session = Session::open(transport, None)?;
    session.unlock(pin)?;

    session.card().delete(id)?;

    println!("Credential '{id}' deleted successfully");
    session.close()
}

fn fields(
    id: &str,
    login: Option<&str>,
    password: Option<&str>,
    metadata: Option<&str>,
) -> Credential {
    let mut credential = Credential::new(id);
    credential.login = login.map(str::to_owned);
    credential.password = password.map(str::to_owned);
    credential.metadata = metadata.map(str::to_owned);
    credential
}
