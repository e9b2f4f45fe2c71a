//! APDU command definitions and traits
//!
//! This module provides types and traits for working with APDU commands
//! according to ISO/IEC 7816-4, in both short and extended length form.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Response};

/// Expected response length (Ne) of an APDU command, in bytes
///
/// In short form both `0` and `256` are encoded as `00`; in extended form
/// `65536` is encoded as `00 00`.
pub type ExpectedLength = u32;

/// Largest Ne that can be requested with a short Le field
pub const MAX_LEN_RESP_DATA_STANDARD: ExpectedLength = 256;

/// Largest Ne that can be requested with an extended Le field
pub const MAX_LEN_RESP_DATA_EXTENDED: ExpectedLength = 65536;

/// Largest Nc that fits into a short Lc field
pub const MAX_LEN_CMD_DATA_STANDARD: usize = 255;

/// Largest Nc that fits into an extended Lc field
pub const MAX_LEN_CMD_DATA_EXTENDED: usize = 65535;

/// Core trait for APDU commands
pub trait ApduCommand {
    /// Success response type
    type Success;

    /// Error response type
    type Error: fmt::Debug;

    /// Convert core Error to command-specific error type
    fn convert_error(error: Error) -> Self::Error;

    /// Command class (CLA)
    fn class(&self) -> u8;

    /// Instruction code (INS)
    fn instruction(&self) -> u8;

    /// First parameter (P1)
    fn p1(&self) -> u8;

    /// Second parameter (P2)
    fn p2(&self) -> u8;

    /// Command payload data (optional)
    fn data(&self) -> Option<&[u8]>;

    /// Expected response length (optional)
    fn expected_length(&self) -> Option<ExpectedLength>;

    /// Whether this command needs the extended length encoding
    fn is_extended(&self) -> bool {
        self.data().is_some_and(|data| data.len() > MAX_LEN_CMD_DATA_STANDARD)
            || self
                .expected_length()
                .is_some_and(|ne| ne > MAX_LEN_RESP_DATA_STANDARD)
    }

    /// Convert to raw APDU bytes
    ///
    /// Fails with [`Error::DataTooLong`] when the payload does not fit into an
    /// extended Lc field.
    fn to_bytes(&self) -> Result<Bytes, Error> {
        let data = self.data().filter(|data| !data.is_empty());
        if let Some(len) = data.map(<[u8]>::len).filter(|&len| len > MAX_LEN_CMD_DATA_EXTENDED) {
            return Err(Error::DataTooLong(len));
        }

        let mut buffer = BytesMut::with_capacity(self.command_length());
        let extended = self.is_extended();

        // Header: CLA, INS, P1, P2
        buffer.put_u8(self.class());
        buffer.put_u8(self.instruction());
        buffer.put_u8(self.p1());
        buffer.put_u8(self.p2());

        // Add Lc and data if present
        if let Some(data) = data {
            if extended {
                buffer.put_u8(0x00);
                buffer.put_u16(data.len() as u16);
            } else {
                buffer.put_u8(data.len() as u8);
            }
            buffer.put_slice(data);
        }

        // Add Le if present
        if let Some(ne) = self.expected_length() {
            if extended {
                // Without data the extended Le carries its own 00 marker
                if data.is_none() {
                    buffer.put_u8(0x00);
                }
                buffer.put_u16(if ne >= MAX_LEN_RESP_DATA_EXTENDED {
                    0
                } else {
                    ne as u16
                });
            } else {
                buffer.put_u8(if ne >= MAX_LEN_RESP_DATA_STANDARD {
                    0
                } else {
                    ne as u8
                });
            }
        }

        Ok(buffer.freeze())
    }

    /// Calculate length of serialized command
    fn command_length(&self) -> usize {
        // Header (CLA, INS, P1, P2) is always 4 bytes
        let mut length = 4;
        let extended = self.is_extended();
        let data_len = self.data().map_or(0, <[u8]>::len);

        if data_len > 0 {
            length += if extended { 3 } else { 1 } + data_len;
        }

        if self.expected_length().is_some() {
            length += match (extended, data_len > 0) {
                (false, _) => 1,
                (true, true) => 2,
                (true, false) => 3,
            };
        }

        length
    }

    /// Convert to a generic Command
    fn to_command(&self) -> Command {
        Command {
            cla: self.class(),
            ins: self.instruction(),
            p1: self.p1(),
            p2: self.p2(),
            data: self.data().map(Bytes::copy_from_slice),
            le: self.expected_length(),
        }
    }

    /// Parse response into the command's response type
    fn parse_response(response: Response) -> Result<Self::Success, Self::Error>;

    /// Parse raw bytes into the command's response type
    fn parse_response_raw(bytes: Bytes) -> Result<Self::Success, Self::Error> {
        let response = Response::from_bytes(&bytes)
            .map_err(|e| Self::convert_error(Error::Response(e)))?;
        Self::parse_response(response)
    }
}

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected length (optional)
    pub le: Option<ExpectedLength>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with expected response length (Ne)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: ExpectedLength) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
        }
    }

    /// Create a new command with data payload
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Some(data.into()),
            le: None,
        }
    }

    /// Create a new command with both data and expected length
    pub fn new_with_data_and_le<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
        le: ExpectedLength,
    ) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Some(data.into()),
            le: Some(le),
        }
    }

    /// Set the data field
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: ExpectedLength) -> Self {
        self.le = Some(le);
        self
    }

    /// Parse a command from raw bytes
    ///
    /// Accepts all four ISO 7816-4 cases in both short and extended form.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let invalid = || Error::InvalidCommandLength(data.len());

        let (header, body) = match data.split_at_checked(4) {
            Some(parts) => parts,
            None => return Err(invalid()),
        };

        let mut command = Self::new(header[0], header[1], header[2], header[3]);

        match body {
            // Case 1
            [] => {}
            // Case 2S
            [le] => command.le = Some(short_ne(*le)),
            // Extended cases start with a zero byte and carry two-byte lengths
            [0x00, hi, lo, rest @ ..] if !rest.is_empty() || body.len() == 3 => {
                let len = u16::from_be_bytes([*hi, *lo]) as usize;
                if rest.is_empty() {
                    // Case 2E
                    command.le = Some(extended_ne(*hi, *lo));
                } else if rest.len() == len {
                    // Case 3E
                    command.data = Some(Bytes::copy_from_slice(rest));
                } else if rest.len() == len + 2 {
                    // Case 4E
                    command.data = Some(Bytes::copy_from_slice(&rest[..len]));
                    command.le = Some(extended_ne(rest[len], rest[len + 1]));
                } else {
                    return Err(invalid());
                }
            }
            [lc, rest @ ..] if *lc != 0 => {
                let lc = *lc as usize;
                if rest.len() == lc {
                    // Case 3S
                    command.data = Some(Bytes::copy_from_slice(rest));
                } else if rest.len() == lc + 1 {
                    // Case 4S
                    command.data = Some(Bytes::copy_from_slice(&rest[..lc]));
                    command.le = Some(short_ne(rest[lc]));
                } else {
                    return Err(invalid());
                }
            }
            _ => return Err(invalid()),
        }

        Ok(command)
    }
}

const fn short_ne(le: u8) -> ExpectedLength {
    if le == 0 {
        MAX_LEN_RESP_DATA_STANDARD
    } else {
        le as ExpectedLength
    }
}

const fn extended_ne(hi: u8, lo: u8) -> ExpectedLength {
    match u16::from_be_bytes([hi, lo]) {
        0 => MAX_LEN_RESP_DATA_EXTENDED,
        ne => ne as ExpectedLength,
    }
}

impl ApduCommand for Command {
    type Success = Response;
    type Error = Error;

    fn convert_error(error: Error) -> Self::Error {
        error
    }

    fn class(&self) -> u8 {
        self.cla
    }

    fn instruction(&self) -> u8 {
        self.ins
    }

    fn p1(&self) -> u8 {
        self.p1
    }

    fn p2(&self) -> u8 {
        self.p2
    }

    fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    fn expected_length(&self) -> Option<ExpectedLength> {
        self.le
    }

    fn parse_response(response: Response) -> Result<Self::Success, Self::Error> {
        Ok(response)
    }
}
