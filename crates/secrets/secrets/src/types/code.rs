use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::{Error, Result};

/// Most digits an OTP can have
const MAX_DIGITS: u8 = 8;

/// Result of a CALCULATE command
///
/// Holds either a digest truncated by the applet (four bytes) or a full HMAC
/// that is truncated on the client as described in RFC 4226.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    digest: Bytes,
    digits: u8,
    truncated: bool,
}

impl Code {
    /// Create a code, checking that an OTP can be derived from the digest
    pub fn new(digest: impl Into<Bytes>, digits: u8, truncated: bool) -> Result<Self> {
        let digest = digest.into();

        if digits > MAX_DIGITS {
            return Err(Error::InvalidDigitCount(digits));
        }

        let valid = match digest.last() {
            _ if truncated => digest.len() >= 4,
            Some(last) => (last & 0x0F) as usize + 4 <= digest.len(),
            None => false,
        };
        if !valid {
            return Err(Error::WrongLength);
        }

        Ok(Self {
            digest,
            digits,
            truncated,
        })
    }

    /// Raw digest as returned by the card
    pub const fn digest(&self) -> &Bytes {
        &self.digest
    }

    /// Number of digits of the OTP
    pub const fn digits(&self) -> u8 {
        self.digits
    }

    /// Whether the applet already truncated the digest
    pub const fn truncated(&self) -> bool {
        self.truncated
    }

    /// Truncated 31-bit value before reduction to the digit count
    pub fn value(&self) -> u32 {
        let bytes = if self.truncated {
            &self.digest[self.digest.len() - 4..]
        } else {
            let offset = (self.digest[self.digest.len() - 1] & 0x0F) as usize;
            &self.digest[offset..offset + 4]
        };

        let value = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if self.truncated {
            value
        } else {
            value & 0x7FFF_FFFF
        }
    }

    /// Decimal OTP, left-padded with zeros to the digit count
    pub fn otp(&self) -> String {
        let code = self.value() % 10u32.pow(self.digits as u32);
        let padded = format!("{code:08}");
        padded[padded.len() - self.digits as usize..].to_string()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.otp())
    }
}

/// TOTP challenge for `time`: the number of elapsed `step`s as 8 big-endian bytes
pub fn challenge_totp(time: SystemTime, step: Duration) -> [u8; 8] {
    let seconds = time.duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_secs());
    let counter = seconds / step.as_secs().max(1);
    counter.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_rfc4226_dynamic_truncation() {
        // RFC 4226 section 5.4
        let digest = hex!("1f8698690e02ca16618550ef7f19da8e945b555a");
        let code = Code::new(digest.to_vec(), 6, false).unwrap();

        assert_eq!(code.value(), 0x50ef7f19);
        assert_eq!(code.otp(), "872921");
    }

    #[test]
    fn test_truncated_uses_last_four_bytes() {
        let code = Code::new(hex!("0059 9fc5").to_vec(), 8, true).unwrap();
        assert_eq!(code.otp(), "05873605");

        let code = Code::new(hex!("FF 0000 0007").to_vec(), 6, true).unwrap();
        assert_eq!(code.otp(), "000007");
    }

    #[test]
    fn test_invalid_codes() {
        assert!(matches!(
            Code::new(hex!("00000001").to_vec(), 9, true),
            Err(Error::InvalidDigitCount(9))
        ));
        assert!(matches!(Code::new(hex!("0001").to_vec(), 6, true), Err(Error::WrongLength)));
        // Offset 0x0F needs 19 bytes
        assert!(matches!(Code::new(vec![0x0F; 8], 6, false), Err(Error::WrongLength)));
        assert!(matches!(Code::new(Vec::new(), 6, false), Err(Error::WrongLength)));
    }

    #[test]
    fn test_challenge_totp() {
        let at = |secs| UNIX_EPOCH + Duration::from_secs(secs);

        assert_eq!(challenge_totp(at(59), Duration::from_secs(30)), hex!("0000000000000001"));
        assert_eq!(
            challenge_totp(at(1_111_111_109), Duration::from_secs(30)),
            hex!("00000000023523EC")
        );
        assert_eq!(challenge_totp(at(10), Duration::from_secs(60)), [0; 8]);
    }
}
