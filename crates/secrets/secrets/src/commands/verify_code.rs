use crate::tlv::{Tag, TagValue};

use super::Instruction;

secrets_command! {
    /// VERIFY CODE command: check a HOTP code against a reverse HOTP credential
    pub struct VerifyCodeCommand => Instruction::VerifyCode;
}

impl VerifyCodeCommand {
    /// Verify `code` for the credential `id`
    pub fn new(id: &str, code: u32) -> Self {
        Self::from_entries(
            0x00,
            0x00,
            &[
                TagValue::new(Tag::CredentialId, id.as_bytes().to_vec()),
                TagValue::new(Tag::Response, code.to_be_bytes().to_vec()),
            ],
        )
    }
}
