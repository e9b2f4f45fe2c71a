use clap::{Parser, Subcommand};
use secrets_apdu_transport_pcsc::{PcscConfig, PcscDeviceManager};
use tracing::info;

mod commands;
mod utils;

use commands::*;
use utils::{AlgorithmArg, KindArg, PinArgs, ProtectionArgs, reader};

#[derive(Parser)]
#[command(
    version,
    about = "Manage OTP and password safe credentials on a Nitrokey"
)]
struct Cli {
    /// Optional reader name to use (will auto-detect if not specified)
    #[arg(short, long)]
    reader: Option<String>,

    /// Trace level output
    #[arg(short, long)]
    verbose: bool,

    /// Password for the access key, needed to replace or remove it
    #[arg(long, global = true, env = "SECRETS_ACCESS_PASSWORD", hide_env_values = true)]
    access_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available readers
    Readers,

    /// Select the secrets application and show info
    Info,

    /// List stored credentials
    List {
        #[command(flatten)]
        pin: PinArgs,
    },

    /// Calculate an OTP code
    Code {
        /// Credential name
        #[arg(required = true)]
        id: String,

        /// Challenge to send instead of the current time, as a hex string
        #[arg(long, conflicts_with = "time")]
        challenge: Option<String>,

        /// Unix time to calculate a TOTP code for
        #[arg(long)]
        time: Option<u64>,

        #[command(flatten)]
        pin: PinArgs,
    },

    /// Verify a reverse HOTP code on the device
    Verify {
        /// Credential name
        #[arg(required = true)]
        id: String,

        /// Code to check
        #[arg(required = true)]
        code: u32,

        #[command(flatten)]
        pin: PinArgs,
    },

    /// Store an OTP or HMAC credential
    Add {
        /// Credential name
        #[arg(required = true)]
        id: String,

        /// Shared secret, as a hex string
        #[arg(required = true)]
        secret: String,

        /// HMAC algorithm
        #[arg(long, value_enum, default_value_t)]
        algorithm: AlgorithmArg,

        /// Credential kind
        #[arg(long, value_enum, default_value_t)]
        kind: KindArg,

        /// Number of digits of the generated codes
        #[arg(long, default_value_t = 6)]
        digits: u8,

        /// Initial HOTP counter
        #[arg(long, default_value_t = 0)]
        counter: u32,

        #[command(flatten)]
        protection: ProtectionArgs,

        #[command(flatten)]
        pin: PinArgs,
    },

    /// Store a password safe entry
    AddPassword {
        /// Entry name
        #[arg(required = true)]
        id: String,

        /// Login
        #[arg(long)]
        login: Option<String>,

        /// Password
        #[arg(long)]
        password: Option<String>,

        /// Metadata, e.g. a URL
        #[arg(long)]
        metadata: Option<String>,

        #[command(flatten)]
        protection: ProtectionArgs,

        #[command(flatten)]
        pin: PinArgs,
    },

    /// Show a stored credential
    Get {
        /// Credential name
        #[arg(required = true)]
        id: String,

        #[command(flatten)]
        pin: PinArgs,
    },

    /// Update the password safe fields of a credential
    Update {
        /// Credential name
        #[arg(required = true)]
        id: String,

        /// New login
        #[arg(long)]
        login: Option<String>,

        /// New password
        #[arg(long)]
        password: Option<String>,

        /// New metadata
        #[arg(long)]
        metadata: Option<String>,

        #[command(flatten)]
        pin: PinArgs,
    },

    /// Rename a credential
    Rename {
        /// Current name
        #[arg(required = true)]
        old: String,

        /// New name
        #[arg(required = true)]
        new: String,

        #[command(flatten)]
        pin: PinArgs,
    },

    /// Delete a credential
    Delete {
        /// Credential name
        #[arg(required = true)]
        id: String,

        #[command(flatten)]
        pin: PinArgs,
    },

    /// Factory reset the secrets application
    Reset {
        /// Confirm that all credentials are deleted
        #[arg(long)]
        yes: bool,
    },

    /// Set the PIN
    SetPin {
        /// New PIN
        #[arg(required = true)]
        pin: String,
    },

    /// Change the PIN
    ChangePin {
        /// Current PIN
        #[arg(required = true)]
        current_pin: String,

        /// New PIN
        #[arg(required = true)]
        new_pin: String,
    },

    /// Verify the PIN
    VerifyPin {
        /// PIN code
        #[arg(required = true)]
        pin: String,
    },

    /// Protect the card with an access password
    SetCode {
        /// New access password
        #[arg(required = true)]
        password: String,
    },

    /// Remove the access password
    ClearCode,

    /// Check the access password
    Validate,
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    // Create a PC/SC device manager
    let manager = PcscDeviceManager::new()?;

    if let Commands::Readers = cli.command {
        return reader::list_readers(&manager);
    }

    let reader = match &cli.reader {
        Some(reader_name) => reader::find_reader_by_name(&manager, reader_name)?,
        None => reader::find_reader_with_card(&manager)?,
    };

    info!("Using reader: {}", reader.name());

    let config = PcscConfig::default();
    let transport = manager.open_reader_with_config(reader.name(), config)?;
    let access = cli.access_password.as_deref();

    match &cli.command {
        Commands::Readers => unreachable!(), // Already handled above
        Commands::Info => info_command(transport),
        Commands::List { pin } => list_command(transport, pin),
        Commands::Code {
            id,
            challenge,
            time,
            pin,
        } => code_command(transport, pin, id, challenge.as_deref(), *time),
        Commands::Verify { id, code, pin } => verify_command(transport, pin, id, *code),
        Commands::Add {
            id,
            secret,
            algorithm,
            kind,
            digits,
            counter,
            protection,
            pin,
        } => add_command(
            transport, pin, id, secret, *algorithm, *kind, *digits, *counter, protection,
        ),
        Commands::AddPassword {
            id,
            login,
            password,
            metadata,
            protection,
            pin,
        } => add_password_command(
            transport,
            pin,
            id,
            login.as_deref(),
            password.as_deref(),
            metadata.as_deref(),
            protection,
        ),
        Commands::Get { id, pin } => get_command(transport, pin, id),
        Commands::Update {
            id,
            login,
            password,
            metadata,
            pin,
        } => update_command(
            transport,
            pin,
            id,
            login.as_deref(),
            password.as_deref(),
            metadata.as_deref(),
        ),
        Commands::Rename { old, new, pin } => rename_command(transport, pin, old, new),
        Commands::Delete { id, pin } => delete_command(transport, pin, id),
        Commands::Reset { yes } => reset_command(transport, *yes),
        Commands::SetPin { pin } => set_pin_command(transport, pin),
        Commands::ChangePin {
            current_pin,
            new_pin,
        } => change_pin_command(transport, current_pin, new_pin),
        Commands::VerifyPin { pin } => verify_pin_command(transport, pin),
        Commands::SetCode { password } => set_code_command(transport, access, password),
        Commands::ClearCode => clear_code_command(transport, access),
        Commands::Validate => validate_command(transport, access),
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(true)
        .init();
}
