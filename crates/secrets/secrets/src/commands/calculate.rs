use crate::tlv::{Tag, TagValue};

use super::Instruction;

secrets_command! {
    /// CALCULATE command: compute an OTP code
    pub struct CalculateCommand => Instruction::Calculate;
}

impl CalculateCommand {
    /// Calculate the code of `id` for the given challenge
    ///
    /// P2 asks for a truncated response. The applet only honours it for
    /// HOTP and TOTP credentials.
    pub fn with_challenge(id: &str, challenge: &[u8]) -> Self {
        Self::from_entries(
            0x00,
            0x01,
            &[
                TagValue::new(Tag::CredentialId, id.as_bytes().to_vec()),
                TagValue::new(Tag::Challenge, challenge.to_vec()),
            ],
        )
    }
}
