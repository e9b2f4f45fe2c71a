use crate::tlv::{Tag, TagValue};

use super::Instruction;

secrets_command! {
    /// SET PIN command, only accepted directly after a reset
    pub struct SetPinCommand => Instruction::SetPin;
}

secrets_command! {
    /// CHANGE PIN command
    pub struct ChangePinCommand => Instruction::ChangePin;
}

secrets_command! {
    /// VERIFY PIN command
    pub struct VerifyPinCommand => Instruction::VerifyPin;
}

impl SetPinCommand {
    /// Set the initial PIN
    pub fn with_pin(pin: &[u8]) -> Self {
        Self::from_entries(0x00, 0x00, &[TagValue::new(Tag::Password, pin.to_vec())])
    }
}

impl ChangePinCommand {
    /// Replace `old` with `new`
    pub fn with_pins(old: &[u8], new: &[u8]) -> Self {
        Self::from_entries(
            0x00,
            0x00,
            &[
                TagValue::new(Tag::Password, old.to_vec()),
                TagValue::new(Tag::NewPassword, new.to_vec()),
            ],
        )
    }
}

impl VerifyPinCommand {
    /// Authenticate with `pin`
    pub fn with_pin(pin: &[u8]) -> Self {
        Self::from_entries(0x00, 0x00, &[TagValue::new(Tag::Password, pin.to_vec())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use secrets_apdu_core::ApduCommand;

    #[test]
    fn test_pin_commands() {
        assert_eq!(
            SetPinCommand::with_pin(b"1234").to_bytes().unwrap().as_ref(),
            &hex!("00 B4 00 00 06 80 04 31323334 00")
        );
        assert_eq!(
            ChangePinCommand::with_pins(b"1234", b"98765").data().unwrap(),
            &hex!("80 04 31323334 81 05 3938373635")
        );
        assert_eq!(VerifyPinCommand::with_pin(b"1234").instruction(), 0xB2);
    }
}
