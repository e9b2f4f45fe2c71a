//! APDU commands of the secrets applet
//!
//! All commands except SELECT share the same shape: class `00`, a TLV encoded
//! body and a TLV encoded response. `secrets_command!` generates the
//! `ApduCommand` plumbing, each module adds the builders for its instruction.

use secrets_apdu_core::Response;

use crate::tlv::{self, TagValue};
use crate::Result;

pub mod calculate;
pub use calculate::*;
pub mod credential;
pub use credential::*;
pub mod delete;
pub use delete::*;
pub mod list;
pub use list::*;
pub mod pin;
pub use pin::*;
pub mod put;
pub use put::*;
pub mod reset;
pub use reset::*;
pub mod select;
pub use select::*;
pub mod set_code;
pub use set_code::*;
pub mod validate;
pub use validate::*;
pub mod verify_code;
pub use verify_code::*;

/// Class byte of every secrets command
pub const CLA: u8 = 0x00;

byte_enum! {
    /// Instructions understood by the secrets applet
    pub enum Instruction {
        /// Register a new credential
        Put = 0x01,
        /// Delete a credential
        Delete = 0x02,
        /// Set the access code for challenge-response authentication
        SetCode = 0x03,
        /// Remove all credentials and the PIN
        Reset = 0x04,
        /// List stored credentials
        List = 0xA1,
        /// Calculate an OTP code for a credential
        Calculate = 0xA2,
        /// Challenge-response authentication
        Validate = 0xA3,
        /// Fetch the rest of a chunked response
        SendRemaining = 0xA5,
        /// Verify an incoming HOTP code
        VerifyCode = 0xB1,
        /// Authenticate with the PIN
        VerifyPin = 0xB2,
        /// Change the PIN
        ChangePin = 0xB3,
        /// Set the PIN, only allowed directly after a reset
        SetPin = 0xB4,
        /// Read a password safe entry
        GetCredential = 0xB5,
        /// Update or rename a credential
        UpdateCredential = 0xB7,
    }
}

/// Check the status word and decode the TLV body of a response
pub(crate) fn parse_entries(response: Response) -> Result<Vec<TagValue>> {
    let payload = response.into_payload()?;
    tlv::decode(&payload)
}
