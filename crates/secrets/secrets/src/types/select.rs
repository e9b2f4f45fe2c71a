use bytes::Bytes;

use crate::tlv::{self, Tag};
use crate::{Algorithm, Error, Result, Version};

/// First version with properties in LIST entries
const EXTENDED_LIST_SINCE: Version = Version::new(4, 11, 0);
/// First version with password safe entries
const PASSWORD_STORAGE_SINCE: Version = Version::new(4, 11, 0);
/// First version encrypting PIN protected credentials
const ENCRYPTED_STORAGE_SINCE: Version = Version::new(4, 10, 0);
/// Version that always asks for the PIN
const ALWAYS_PIN_VERSION: Version = Version::new(4, 7, 0);
/// Version reported by very old applets
const LEGACY_APPLICATION_VERSION: Version = Version::new(0x34, 0x34, 0x34);

/// Response to SELECT: applet identity and capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Select {
    /// Applet version
    pub version: Version,
    /// Remaining PIN attempts, absent when no PIN is configured
    pub pin_counter: Option<u32>,
    /// Salt for deriving the access key
    pub salt: Option<Bytes>,
    /// Challenge for challenge-response authentication
    pub challenge: Option<Bytes>,
    /// Algorithm for challenge-response authentication
    pub algorithm: Option<Bytes>,
    /// Device serial number
    pub serial: Option<Bytes>,
}

impl Select {
    /// Parse a SELECT response
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut select = Self::default();

        for entry in tlv::decode(data)? {
            match entry.tag {
                Tag::Version => select.version = Version::try_from(entry.value.as_ref())?,
                Tag::PinCounter => {
                    let value = entry.value.as_ref();
                    if value.len() > 4 {
                        return Err(Error::WrongLength);
                    }
                    let mut buf = [0u8; 4];
                    buf[4 - value.len()..].copy_from_slice(value);
                    select.pin_counter = Some(u32::from_be_bytes(buf));
                }
                Tag::CredentialId => select.salt = Some(entry.value),
                Tag::Challenge => select.challenge = Some(entry.value),
                Tag::Algorithm => select.algorithm = Some(entry.value),
                Tag::SerialNumber => select.serial = Some(entry.value),
                tag => return Err(Error::UnknownTag(tag)),
            }
        }

        Ok(select)
    }

    /// Remaining PIN attempts, zero when no PIN is configured
    pub fn pin_counter(&self) -> u32 {
        self.pin_counter.unwrap_or(0)
    }

    /// Algorithm announced for challenge-response authentication
    ///
    /// Defaults to HMAC-SHA1 when the applet does not announce one.
    pub fn authentication_algorithm(&self) -> Algorithm {
        self.algorithm
            .as_ref()
            .and_then(|value| value.first())
            .map_or(Algorithm::Sha1, |byte| Algorithm::from_type_byte(*byte))
    }

    /// Whether any PIN attempts are left
    pub fn has_healthy_pin(&self) -> bool {
        self.pin_counter() != 0
    }

    /// Whether the applet stores password safe entries
    pub fn supports_password_storage(&self) -> bool {
        self.version.at_least(PASSWORD_STORAGE_SINCE)
    }

    /// Whether LIST entries carry a trailing properties byte
    pub fn supports_extended_list(&self) -> bool {
        self.version.at_least(EXTENDED_LIST_SINCE)
    }

    /// Whether PIN protected credentials are encrypted at rest
    pub fn has_encrypted_storage(&self) -> bool {
        self.version.at_least(ENCRYPTED_STORAGE_SINCE)
    }

    /// Whether the applet predates versioned releases
    pub fn is_legacy_application(&self) -> bool {
        self.version == LEGACY_APPLICATION_VERSION
    }

    /// Whether the applet asks for the PIN on every operation
    pub fn requires_always_pin(&self) -> bool {
        self.version == ALWAYS_PIN_VERSION
    }

    /// Whether the applet expects challenge-response authentication
    pub const fn supports_challenge_response(&self) -> bool {
        self.challenge.is_some()
    }

    /// Whether the applet is protected by a PIN
    pub fn has_active_pin(&self) -> bool {
        self.challenge.is_none() && self.pin_counter() > 0
    }
}

impl TryFrom<&[u8]> for Select {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        Self::parse(data)
    }
}
