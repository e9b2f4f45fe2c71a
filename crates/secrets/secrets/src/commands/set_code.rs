use bytes::{BufMut, BytesMut};

use crate::tlv::{Tag, TagValue};
use crate::{Algorithm, Kind};

use super::Instruction;

secrets_command! {
    /// SET CODE command: configure the challenge-response access key
    pub struct SetCodeCommand => Instruction::SetCode;
}

impl SetCodeCommand {
    /// Set `key` as access key
    ///
    /// The card checks `response` against HMAC(`key`, `challenge`) before
    /// storing the key, which proves the key arrived intact.
    pub fn new(algorithm: Algorithm, key: &[u8], challenge: &[u8], response: &[u8]) -> Self {
        let mut key_value = BytesMut::with_capacity(1 + key.len());
        key_value.put_u8(u8::from(Kind::Totp) | u8::from(algorithm));
        key_value.put_slice(key);

        Self::from_entries(
            0x00,
            0x00,
            &[
                TagValue::new(Tag::Key, key_value.freeze()),
                TagValue::new(Tag::Challenge, challenge.to_vec()),
                TagValue::new(Tag::Response, response.to_vec()),
            ],
        )
    }

    /// Remove the access key
    pub fn clear() -> Self {
        Self::from_entries(0x00, 0x00, &[TagValue::new(Tag::Key, Vec::new())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use secrets_apdu_core::ApduCommand;

    #[test]
    fn test_set_code() {
        let cmd = SetCodeCommand::new(Algorithm::Sha1, &hex!("0102"), &hex!("AA"), &hex!("BB"));
        assert_eq!(cmd.data().unwrap(), &hex!("73 03 21 0102 74 01 AA 75 01 BB"));
    }

    #[test]
    fn test_clear_code() {
        assert_eq!(SetCodeCommand::clear().to_bytes().unwrap().as_ref(), &hex!("00 03 00 00 02 73 00 00"));
    }
}
