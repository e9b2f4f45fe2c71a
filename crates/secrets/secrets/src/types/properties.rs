use std::fmt;

use bitflags::bitflags;

use crate::tlv::{Tag, TagValue};

bitflags! {
    /// Credential properties as reported by the applet
    ///
    /// This is the layout of LIST entries and GET CREDENTIAL responses.
    /// Commands that create or update a credential use a different layout,
    /// see [`Properties::wire_byte`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Properties: u8 {
        /// The card asks for a touch before using the credential
        const TOUCH_REQUIRED = 0x01;
        /// The credential is encrypted with the PIN
        const PIN_ENCRYPTED = 0x02;
        /// The credential carries password safe data
        const PWS_DATA_EXISTS = 0x04;
    }
}

impl Properties {
    const WIRE_TOUCH_REQUIRED: u8 = 0x02;
    const WIRE_PIN_ENCRYPTED: u8 = 0x04;

    /// Properties from a byte reported by the card, keeping unknown bits
    pub const fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    /// Byte sent to the applet in PUT and UPDATE CREDENTIAL
    pub const fn wire_byte(&self) -> u8 {
        let mut byte = 0;
        if self.contains(Self::TOUCH_REQUIRED) {
            byte |= Self::WIRE_TOUCH_REQUIRED;
        }
        if self.contains(Self::PIN_ENCRYPTED) {
            byte |= Self::WIRE_PIN_ENCRYPTED;
        }
        byte
    }

    /// TLV entry carrying the properties
    ///
    /// PUT sends the entry without a length byte, UPDATE CREDENTIAL with one.
    pub fn tag_value(&self, skip_length: bool) -> TagValue {
        let value = vec![self.wire_byte()];
        if skip_length {
            TagValue::implicit(Tag::Properties, value)
        } else {
            TagValue::new(Tag::Properties, value)
        }
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::PIN_ENCRYPTED, "pin-encrypted"),
            (Self::PWS_DATA_EXISTS, "password-safe"),
            (Self::TOUCH_REQUIRED, "touch-required"),
        ];

        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
