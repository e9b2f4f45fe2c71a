use crate::tlv::{Tag, TagValue};

use super::Instruction;

secrets_command! {
    /// DELETE command: remove a credential
    pub struct DeleteCommand => Instruction::Delete;
}

impl DeleteCommand {
    /// Delete the credential with the given identifier
    pub fn with_id(id: &str) -> Self {
        Self::from_entries(
            0x00,
            0x00,
            &[TagValue::new(Tag::CredentialId, id.as_bytes().to_vec())],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use secrets_apdu_core::ApduCommand;

    #[test]
    fn test_delete() {
        let cmd = DeleteCommand::with_id("mail");
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), &hex!("00 02 00 00 06 71 04 6d61696c 00"));
    }
}
