use crate::tlv::{Tag, TagValue};

use super::Instruction;

secrets_command! {
    /// VALIDATE command: mutual challenge-response authentication
    pub struct ValidateCommand => Instruction::Validate;
}

impl ValidateCommand {
    /// Answer the card challenge with `response` and send our own `challenge`
    pub fn new(response: &[u8], challenge: &[u8]) -> Self {
        Self::from_entries(
            0x00,
            0x00,
            &[
                TagValue::new(Tag::Response, response.to_vec()),
                TagValue::new(Tag::Challenge, challenge.to_vec()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use secrets_apdu_core::ApduCommand;

    #[test]
    fn test_validate() {
        let cmd = ValidateCommand::new(&hex!("AABB"), &hex!("0102"));
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), &hex!("00 A3 00 00 08 75 02 AABB 74 02 0102 00"));
    }
}
