use bytes::{BufMut, BytesMut};

use crate::constants::MAX_ID_LENGTH;
use crate::crypto::{pad_key, prepare_key};
use crate::tlv::{Tag, TagValue};
use crate::{Algorithm, Error, Kind, Properties, Result};

use super::Instruction;

secrets_command! {
    /// PUT command: register a new credential
    pub struct PutCommand => Instruction::Put;
}

impl PutCommand {
    /// Create a PUT command for an OTP credential
    ///
    /// The identifier is limited to 64 bytes, the digit count must be 6 or 8
    /// unless the credential is a raw HMAC one, and SHA-512 is rejected as
    /// the firmware does not implement it. The initial counter is only sent
    /// for HOTP credentials.
    pub fn otp(
        id: &str,
        algorithm: Algorithm,
        kind: Kind,
        digits: u8,
        secret: &[u8],
        properties: Properties,
        counter: u32,
    ) -> Result<Self> {
        if id.len() > MAX_ID_LENGTH {
            return Err(Error::NameTooLong(id.len()));
        }

        if kind != Kind::Hmac && digits != 6 && digits != 8 {
            return Err(Error::InvalidDigitCount(digits));
        }

        if matches!(algorithm, Algorithm::Sha512 | Algorithm::Unknown(_)) {
            return Err(Error::UnsupportedAlgorithm(algorithm));
        }

        let key = prepare_key(algorithm, secret)?;

        let mut key_value = BytesMut::with_capacity(2 + key.len());
        key_value.put_u8(u8::from(algorithm) | u8::from(kind));
        key_value.put_u8(digits);
        key_value.put_slice(&key);

        let mut entries = vec![
            TagValue::new(Tag::CredentialId, id.as_bytes().to_vec()),
            TagValue::new(Tag::Key, key_value.freeze()),
            properties.tag_value(true),
        ];

        if counter > 0 && kind == Kind::Hotp {
            entries.push(TagValue::new(
                Tag::InitialCounter,
                counter.to_be_bytes().to_vec(),
            ));
        }

        Ok(Self::from_entries(0x00, 0x00, &entries))
    }

    /// Create a PUT command for a password safe entry
    ///
    /// Password safe entries carry no OTP secret. The login, password and
    /// metadata are added afterwards with UPDATE CREDENTIAL.
    pub fn password(id: &str, properties: Properties) -> Result<Self> {
        Self::otp(
            id,
            Algorithm::Sha1,
            Kind::NotSet,
            6,
            &pad_key(&[]),
            properties,
            0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use secrets_apdu_core::ApduCommand;

    #[test]
    fn test_put_totp() {
        let cmd = PutCommand::otp(
            "ab",
            Algorithm::Sha256,
            Kind::Totp,
            8,
            b"12345678901234567890",
            Properties::TOUCH_REQUIRED,
            0,
        )
        .unwrap();

        assert_eq!(
            cmd.to_bytes().unwrap().as_ref(),
            &hex!(
                "00 01 00 00 1E"
                "71 02 6162"
                "73 16 22 08 3132333435363738393031323334353637383930"
                "78 02"
                "00"
            )
        );
    }

    #[test]
    fn test_put_hotp_counter() {
        let cmd =
            PutCommand::otp("c", Algorithm::Sha1, Kind::Hotp, 6, &[0x01; 14], Properties::empty(), 5)
                .unwrap();
        assert!(cmd.data().unwrap().ends_with(&hex!("78 00 7A 04 00000005")));

        // The counter is only meaningful for HOTP
        let cmd =
            PutCommand::otp("c", Algorithm::Sha1, Kind::Totp, 6, &[0x01; 14], Properties::empty(), 5)
                .unwrap();
        assert!(cmd.data().unwrap().ends_with(&hex!("78 00")));
    }

    #[test]
    fn test_put_validation() {
        let long_id = "x".repeat(65);
        assert!(matches!(
            PutCommand::otp(&long_id, Algorithm::Sha1, Kind::Totp, 6, b"k", Properties::empty(), 0),
            Err(Error::NameTooLong(65))
        ));
        assert!(matches!(
            PutCommand::otp("id", Algorithm::Sha1, Kind::Totp, 7, b"k", Properties::empty(), 0),
            Err(Error::InvalidDigitCount(7))
        ));
        assert!(matches!(
            PutCommand::otp("id", Algorithm::Sha512, Kind::Totp, 6, b"k", Properties::empty(), 0),
            Err(Error::UnsupportedAlgorithm(Algorithm::Sha512))
        ));
        // Raw HMAC credentials ignore the digit count
        assert!(
            PutCommand::otp("id", Algorithm::Sha1, Kind::Hmac, 0, b"k", Properties::empty(), 0)
                .is_ok()
        );
    }

    #[test]
    fn test_put_password() {
        let cmd = PutCommand::password("pw", Properties::PIN_ENCRYPTED).unwrap();
        assert_eq!(
            cmd.data().unwrap(),
            &hex!("71 02 7077 73 10 F1 06 0000000000000000000000000000 78 04")
        );
    }
}
