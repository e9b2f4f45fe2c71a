//! Command processors for APDU transformations
//!
//! This module provides abstractions for processing APDU commands on their way to a
//! card transport. A processor decides how a single logical command maps onto one or
//! more raw exchanges, e.g. following `61xx` chains until the full response is read.

use std::fmt;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::command::{ApduCommand, Command, ExpectedLength, MAX_LEN_RESP_DATA_STANDARD};
use crate::response::{ApduResponse, Response};
use crate::transport::CardTransport;
use crate::{Error, Result, ResultExt};

/// Trait for command processors which transform commands
/// before sending them to the transport
pub trait CommandProcessor: Send + Sync + fmt::Debug {
    /// Process a command through this processor
    ///
    /// This method takes a command, potentially transforms it, sends it through
    /// the transport, and potentially transforms the response.
    fn process_command(
        &self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response> {
        trace!(
            ins = format_args!("{:#04x}", command.ins),
            processor = std::any::type_name::<Self>(),
            "Processing command"
        );

        let result = self.do_process_command(command, transport);

        match &result {
            Ok(response) => {
                trace!(
                    status = %response.status(),
                    payload_len = response.payload().len(),
                    "Processed response"
                );
            }
            Err(e) => {
                debug!(error = ?e, "Error during command processing");
            }
        }

        result
    }

    /// Internal implementation of process_command
    fn do_process_command(
        &self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response>;
}

/// Identity processor
///
/// This processor passes commands through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProcessor;

impl CommandProcessor for IdentityProcessor {
    fn do_process_command(
        &self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response> {
        let response_bytes = transport
            .transmit_raw(&command.to_bytes()?)
            .context("Failed to transmit command")?;
        Response::from_bytes(&response_bytes).context("Failed to parse response")
    }
}

/// Response chaining processor
///
/// This processor automatically handles status codes that indicate
/// more data is available (61xx) by sending "get remaining" commands
/// to retrieve the rest of the data. The ISO default is GET RESPONSE (`C0`),
/// applets with their own continuation instruction configure it via [`Self::with_instruction`].
#[derive(Clone, Copy)]
pub struct GetResponseProcessor {
    /// Maximum number of chained responses to handle
    pub max_chain: usize,
    /// Class byte for the continuation command
    pub cla: u8,
    /// Instruction byte for the continuation command
    pub ins: u8,
}

impl GetResponseProcessor {
    /// ISO 7816-4 GET RESPONSE instruction
    pub const GET_RESPONSE: u8 = 0xC0;

    /// Create a processor using the given continuation instruction
    pub const fn with_instruction(ins: u8) -> Self {
        Self {
            max_chain: 10,
            cla: 0x00,
            ins,
        }
    }

    /// Set the maximum number of continuation commands to send
    pub const fn with_max_chain(mut self, max_chain: usize) -> Self {
        self.max_chain = max_chain;
        self
    }
}

impl Default for GetResponseProcessor {
    fn default() -> Self {
        Self::with_instruction(Self::GET_RESPONSE)
    }
}

impl fmt::Debug for GetResponseProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetResponseProcessor")
            .field("max_chain", &self.max_chain)
            .field("cla", &format_args!("{:#04x}", self.cla))
            .field("ins", &format_args!("{:#04x}", self.ins))
            .finish()
    }
}

impl CommandProcessor for GetResponseProcessor {
    fn do_process_command(
        &self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response> {
        let response_bytes = transport
            .transmit_raw(&command.to_bytes()?)
            .context("Failed to transmit command")?;
        let mut response =
            Response::from_bytes(&response_bytes).context("Failed to parse response")?;

        if !response.status().is_more_data_available() {
            return Ok(response);
        }

        let mut buffer = BytesMut::from(response.payload().as_ref());
        let mut chain_count = 0;

        while let Some(remaining) = response.status().remaining_bytes() {
            if chain_count >= self.max_chain {
                return Err(Error::ChainLimitExceeded);
            }

            let le = match remaining {
                0 => MAX_LEN_RESP_DATA_STANDARD,
                n => n as ExpectedLength,
            };

            trace!(remaining = le, chain_count = chain_count + 1, "Requesting remaining data");

            let next = Command::new_with_le(self.cla, self.ins, 0x00, 0x00, le);
            let response_bytes = transport
                .transmit_raw(&next.to_bytes()?)
                .context("Failed to transmit continuation command")?;
            response = Response::from_bytes(&response_bytes)
                .context("Failed to parse continuation response")?;

            buffer.extend_from_slice(response.payload());
            chain_count += 1;
        }

        trace!(
            total_data_len = buffer.len(),
            final_sw = %response.status(),
            "Completed response chaining"
        );

        Ok(Response::new(buffer.freeze(), response.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use bytes::Bytes;
    use hex_literal::hex;

    #[test]
    fn test_identity_processor() {
        let mut transport = MockTransport::with_response(Bytes::from_static(&[0x90, 0x00]));
        let processor = IdentityProcessor;

        let command = Command::new(0x00, 0xA4, 0x04, 0x00);
        let response = processor.process_command(&command, &mut transport).unwrap();

        assert_eq!(response.status().to_u16(), 0x9000);
        assert_eq!(transport.commands[0], command.to_bytes().unwrap());
    }

    #[test]
    fn test_get_response_processor_custom_instruction() {
        let mut transport = MockTransport::new(vec![
            Bytes::from_static(&hex!("01 02 61 03")),
            Bytes::from_static(&hex!("03 04 05 90 00")),
        ]);

        let processor = GetResponseProcessor::with_instruction(0xA5);

        let command = Command::new_with_le(0x00, 0xA1, 0x00, 0x00, 256);
        let response = processor.process_command(&command, &mut transport).unwrap();

        // Should have the combined data with final status
        assert_eq!(response.payload().as_ref(), &hex!("01 02 03 04 05"));
        assert!(response.is_success());

        // Should have sent the original command and one continuation command
        assert_eq!(transport.commands.len(), 2);
        assert_eq!(transport.commands[1].as_ref(), &hex!("00 A5 00 00 03"));
    }

    #[test]
    fn test_get_response_processor_chain_limit() {
        // The single response is repeated forever
        let mut transport = MockTransport::with_response(Bytes::from_static(&hex!("AA 61 01")));
        let processor = GetResponseProcessor::default().with_max_chain(3);

        let command = Command::new(0x00, 0xB0, 0x00, 0x00);
        let result = processor.process_command(&command, &mut transport);

        assert!(matches!(result, Err(Error::ChainLimitExceeded)));
        assert_eq!(transport.commands.len(), 4);
    }

    #[test]
    fn test_get_response_processor_keeps_final_error_status() {
        let mut transport = MockTransport::new(vec![
            Bytes::from_static(&hex!("01 61 00")),
            Bytes::from_static(&hex!("6A 82")),
        ]);
        let processor = GetResponseProcessor::default();

        let command = Command::new(0x00, 0xB0, 0x00, 0x00);
        let response = processor.process_command(&command, &mut transport).unwrap();

        assert_eq!(response.status().to_u16(), 0x6A82);
        assert_eq!(response.payload().as_ref(), &[0x01]);
        assert_eq!(transport.commands[1].as_ref(), &hex!("00 C0 00 00 00"));
    }
}
