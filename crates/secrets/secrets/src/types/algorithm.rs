use std::fmt;

byte_enum! {
    /// HMAC algorithm of a credential, the low nibble of the key type byte
    pub enum Algorithm {
        /// HMAC with SHA-1
        Sha1 = 0x01,
        /// HMAC with SHA-256
        Sha256 = 0x02,
        /// HMAC with SHA-512, not supported by the firmware yet
        Sha512 = 0x03,
    }
}

impl Algorithm {
    /// Mask selecting the algorithm from a key type byte
    pub const MASK: u8 = 0x0F;

    /// Extract the algorithm from a combined algorithm and kind byte
    pub fn from_type_byte(byte: u8) -> Self {
        Self::from(byte & Self::MASK)
    }

    /// Block size of the underlying hash function
    pub const fn block_size(&self) -> Option<usize> {
        match self {
            Self::Sha1 | Self::Sha256 => Some(64),
            Self::Sha512 => Some(128),
            Self::Unknown(_) => None,
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => f.write_str("HMAC-SHA1"),
            Self::Sha256 => f.write_str("HMAC-SHA256"),
            Self::Sha512 => f.write_str("HMAC-SHA512"),
            Self::Unknown(value) => write!(f, "unknown {value:02x}"),
        }
    }
}
