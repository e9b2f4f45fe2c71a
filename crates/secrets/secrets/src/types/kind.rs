use std::fmt;

byte_enum! {
    /// Kind of a credential, the high nibble of the key type byte
    pub enum Kind {
        /// HOTP against the counter stored on the card
        Hotp = 0x10,
        /// TOTP against the challenge sent by the client
        Totp = 0x20,
        /// HOTP verified by the card against a code sent by the client
        HotpReverse = 0x30,
        /// Raw HMAC challenge-response
        Hmac = 0x40,
        /// Password safe entries without OTP
        NotSet = 0xF0,
    }
}

impl Kind {
    /// Mask selecting the kind from a key type byte
    pub const MASK: u8 = 0xF0;

    /// Extract the kind from a combined algorithm and kind byte
    pub fn from_type_byte(byte: u8) -> Self {
        Self::from(byte & Self::MASK)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hotp => f.write_str("HOTP"),
            Self::Totp => f.write_str("TOTP"),
            Self::HotpReverse => f.write_str("Reverse HOTP"),
            Self::Hmac => f.write_str("HMAC"),
            Self::NotSet => f.write_str("Not set"),
            Self::Unknown(value) => write!(f, "unknown {value:02x}"),
        }
    }
}
