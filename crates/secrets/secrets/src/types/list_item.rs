use std::fmt;

use crate::{Algorithm, Error, Kind, Properties, Result};

/// An entry of the LIST response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Credential identifier
    pub id: String,
    /// OTP kind
    pub kind: Kind,
    /// HMAC algorithm
    pub algorithm: Algorithm,
    /// Properties, empty for applets without the extended list format
    pub properties: Properties,
}

impl ListItem {
    /// Decode a name list entry
    ///
    /// The first byte combines algorithm and kind. With the extended format
    /// the last byte holds the properties and the identifier sits between them.
    pub fn from_entry(value: &[u8], extended: bool) -> Result<Self> {
        let (&type_byte, rest) = value.split_first().ok_or(Error::WrongLength)?;

        let (id, properties) = if extended {
            let (&props, id) = rest.split_last().ok_or(Error::WrongLength)?;
            (id, Properties::from_byte(props))
        } else {
            (rest, Properties::empty())
        };

        Ok(Self {
            id: String::from_utf8_lossy(id).into_owned(),
            kind: Kind::from_type_byte(type_byte),
            algorithm: Algorithm::from_type_byte(type_byte),
            properties,
        })
    }
}

impl fmt::Display for ListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {}", self.id, self.algorithm, self.kind)?;
        if !self.properties.is_empty() {
            write!(f, ", {}", self.properties)?;
        }
        f.write_str(")")
    }
}
