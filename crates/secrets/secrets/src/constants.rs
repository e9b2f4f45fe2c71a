use std::time::Duration;

/// Application identifier of the secrets applet (shared with YKOATH)
pub const SECRETS_AID: &[u8] = b"\xA0\x00\x00\x05\x27\x21\x01";

/// Default TOTP time step
pub const DEFAULT_TIME_STEP: Duration = Duration::from_secs(30);

/// Keys shorter than this are left-padded with zeros before upload
pub const HMAC_MINIMUM_KEY_SIZE: usize = 14;

/// Longest credential identifier accepted by the applet, in bytes
pub const MAX_ID_LENGTH: usize = 64;

/// P1/P2 guard bytes the applet expects on RESET
pub const RESET_CONFIRMATION: [u8; 2] = [0xDE, 0xAD];

/// Version byte sent with LIST to request the extended entry layout
pub const LIST_VERSION: u8 = 0x01;

/// Iteration count used to derive access keys from a password
pub const ACCESS_KEY_ROUNDS: u32 = 1000;

/// Length of a derived access key
pub const ACCESS_KEY_LENGTH: usize = 16;

/// Length of the host challenge sent with VALIDATE
pub const VALIDATE_CHALLENGE_LENGTH: usize = 8;

/// Expected response length for every secrets command
pub const EXPECTED_LENGTH: u32 = 256;
