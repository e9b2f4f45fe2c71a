//! Simple TLV codec used by the secrets applet
//!
//! Every entry is a single tag byte, a length and the value. Lengths below
//! `0x80` take one byte, longer ones are prefixed with `0x80 | n` followed by
//! `n` big-endian length bytes. Some fields are sent with an implicit length
//! of one byte and no length field at all, see [`TagValue::implicit`].

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result};

byte_enum! {
    /// Tags understood by the secrets applet
    pub enum Tag {
        /// Credential identifier, also carries the salt in the select response
        CredentialId = 0x71,
        /// One entry of a LIST response
        NameList = 0x72,
        /// Algorithm and kind, digits and secret of a new credential
        Key = 0x73,
        /// Challenge for CALCULATE and VALIDATE
        Challenge = 0x74,
        /// Full HMAC response
        Response = 0x75,
        /// Response truncated by the applet
        Truncated = 0x76,
        /// Credential properties
        Properties = 0x78,
        /// Applet version
        Version = 0x79,
        /// Initial HOTP counter
        InitialCounter = 0x7A,
        /// Algorithm used for challenge-response authentication
        Algorithm = 0x7B,
        /// PIN
        Password = 0x80,
        /// Replacement PIN for CHANGE PIN
        NewPassword = 0x81,
        /// Remaining PIN attempts
        PinCounter = 0x82,
        /// Password safe login
        PwsLogin = 0x83,
        /// Password safe password
        PwsPassword = 0x84,
        /// Password safe metadata
        PwsMetadata = 0x85,
        /// Device serial number
        SerialNumber = 0x8F,
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", u8::from(*self))
    }
}

/// A single TLV entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    /// Tag of the entry
    pub tag: Tag,
    /// Raw value
    pub value: Bytes,
    /// Whether the entry is encoded without a length field
    pub skip_length: bool,
}

impl TagValue {
    /// Create an entry with an explicit length field
    pub fn new(tag: Tag, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
            skip_length: false,
        }
    }

    /// Create an entry whose length is implied by the tag
    ///
    /// The receiver has to know the length out of band, it cannot be
    /// recovered from the encoding.
    pub fn implicit(tag: Tag, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
            skip_length: true,
        }
    }

    /// Value interpreted as UTF-8, replacing invalid sequences
    pub fn value_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }

    fn encoded_len(&self) -> usize {
        let header = match (self.skip_length, self.value.len()) {
            (true, _) => 1,
            (false, len) if len < 0x80 => 2,
            (false, len) => 2 + length_bytes(len),
        };
        header + self.value.len()
    }
}

fn length_bytes(len: usize) -> usize {
    (usize::BITS - len.leading_zeros()).div_ceil(8) as usize
}

/// Encode entries into their wire representation
pub fn encode(entries: &[TagValue]) -> Bytes {
    let mut buffer = BytesMut::with_capacity(entries.iter().map(TagValue::encoded_len).sum());

    for entry in entries {
        buffer.put_u8(entry.tag.into());

        if !entry.skip_length {
            let len = entry.value.len();
            if len < 0x80 {
                buffer.put_u8(len as u8);
            } else {
                let n = length_bytes(len);
                buffer.put_u8(0x80 | n as u8);
                buffer.put_slice(&len.to_be_bytes()[size_of::<usize>() - n..]);
            }
        }

        buffer.put_slice(&entry.value);
    }

    buffer.freeze()
}

/// Decode a response into its entries
pub fn decode(data: &[u8]) -> Result<Vec<TagValue>> {
    decode_with_implicit(data, &[])
}

/// Decode entries, treating `implicit` tags as one byte values without a length field
pub fn decode_with_implicit(data: &[u8], implicit: &[Tag]) -> Result<Vec<TagValue>> {
    let mut entries = Vec::new();
    let mut rest = data;

    while let Some((&tag, tail)) = rest.split_first() {
        let tag = Tag::from(tag);

        if implicit.contains(&tag) {
            let (value, tail) = tail
                .split_at_checked(1)
                .ok_or(Error::MalformedTlv("missing implicit value"))?;
            entries.push(TagValue::implicit(tag, Bytes::copy_from_slice(value)));
            rest = tail;
            continue;
        }

        let (len, tail) = read_length(tail)?;
        let (value, tail) = tail
            .split_at_checked(len)
            .ok_or(Error::MalformedTlv("value exceeds remaining input"))?;

        entries.push(TagValue::new(tag, Bytes::copy_from_slice(value)));
        rest = tail;
    }

    Ok(entries)
}

fn read_length(data: &[u8]) -> Result<(usize, &[u8])> {
    let (&first, rest) = data
        .split_first()
        .ok_or(Error::MalformedTlv("missing length"))?;

    if first < 0x80 {
        return Ok((first as usize, rest));
    }

    let n = (first & 0x7F) as usize;
    if n == 0 || n > 4 {
        return Err(Error::MalformedTlv("unsupported length encoding"));
    }

    let (bytes, rest) = rest
        .split_at_checked(n)
        .ok_or(Error::MalformedTlv("truncated length"))?;
    let len = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);

    Ok((len, rest))
}

/// First entry carrying `tag`
pub fn find(entries: &[TagValue], tag: Tag) -> Option<&TagValue> {
    entries.iter().find(|entry| entry.tag == tag)
}
