//! SELECT command for the secrets applet

use bytes::Bytes;
use secrets_apdu_core::{ApduCommand, ExpectedLength, Response};

use crate::constants::{EXPECTED_LENGTH, SECRETS_AID};
use crate::{Error, Result, Select};

/// ISO 7816-4 SELECT instruction
pub const INS_SELECT: u8 = 0xA4;
/// Select by DF name
pub const SELECT_BY_NAME: u8 = 0x04;

/// SELECT command: activate the applet and read its identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectCommand {
    aid: Bytes,
}

impl SelectCommand {
    /// Select the secrets applet
    pub const fn secrets() -> Self {
        Self::with_aid(Bytes::from_static(SECRETS_AID))
    }

    /// Select an application by its AID
    pub const fn with_aid(aid: Bytes) -> Self {
        Self { aid }
    }
}

impl ApduCommand for SelectCommand {
    type Success = Select;
    type Error = Error;

    fn convert_error(error: secrets_apdu_core::Error) -> Self::Error {
        Error::from(error)
    }

    fn class(&self) -> u8 {
        super::CLA
    }

    fn instruction(&self) -> u8 {
        INS_SELECT
    }

    fn p1(&self) -> u8 {
        SELECT_BY_NAME
    }

    fn p2(&self) -> u8 {
        0x00
    }

    fn data(&self) -> Option<&[u8]> {
        Some(&self.aid)
    }

    fn expected_length(&self) -> Option<ExpectedLength> {
        Some(EXPECTED_LENGTH)
    }

    fn parse_response(response: Response) -> Result<Select> {
        let payload = response.into_payload()?;
        Select::parse(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Version;
    use hex_literal::hex;

    #[test]
    fn test_select_bytes() {
        assert_eq!(
            SelectCommand::secrets().to_bytes().unwrap().as_ref(),
            &hex!("00 A4 04 00 07 A0000005272101 00")
        );
    }

    #[test]
    fn test_select_response() {
        let select =
            SelectCommand::parse_response_raw(Bytes::from_static(&hex!("79 03 040b00 90 00")))
                .unwrap();
        assert_eq!(select.version, Version::new(4, 11, 0));

        let error =
            SelectCommand::parse_response_raw(Bytes::from_static(&hex!("6A 82"))).unwrap_err();
        assert!(error.status_word().unwrap().is_file_not_found());
    }
}
