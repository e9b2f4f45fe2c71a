//! Executor for APDU command execution
//!
//! This module provides executors that combine card transports with
//! command processors to handle APDU command execution.

use std::fmt;

use tracing::{debug, instrument, trace};

use crate::command::{ApduCommand, Command};
use crate::processor::CommandProcessor;
use crate::response::{ApduResponse, Response};
use crate::transport::CardTransport;
use crate::{Error, Result};

/// Trait for APDU command execution
pub trait Executor: Send + Sync + fmt::Debug {
    /// Transmit an APDU command
    ///
    /// This method handles protocol details including routing through
    /// command processors.
    #[instrument(level = "trace", skip_all, fields(ins = command.ins))]
    fn transmit(&mut self, command: &Command) -> Result<Response> {
        let bytes = command.to_bytes()?;
        trace!(command = %hex::encode(&bytes), "Transmitting command");
        let response = self.do_transmit(command);
        match &response {
            Ok(response) => {
                trace!(
                    status = %response.status(),
                    payload = %hex::encode(response.payload()),
                    "Received response"
                );
            }
            Err(err) => {
                debug!(error = ?err, "Error during transmission");
            }
        }
        response
    }

    /// Internal implementation of transmit
    fn do_transmit(&mut self, command: &Command) -> Result<Response>;

    /// Execute a typed APDU command
    fn execute<C: ApduCommand>(&mut self, command: &C) -> core::result::Result<C::Success, C::Error>
    where
        Self: Sized,
    {
        let response = self
            .transmit(&command.to_command())
            .map_err(C::convert_error)?;
        C::parse_response(response)
    }

    /// Reset the executor, including the transport
    fn reset(&mut self) -> Result<()>;
}

/// Card executor implementation that combines a transport with optional command processors
#[derive(Debug)]
pub struct CardExecutor<T: CardTransport> {
    /// The transport used for communication
    transport: T,
    /// Command processors chain (last one processes first)
    processors: Vec<Box<dyn CommandProcessor>>,
    /// The last response received
    last_response: Option<Response>,
}

impl<T: CardTransport> CardExecutor<T> {
    /// Create a new card executor with the given transport
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            processors: Vec::new(),
            last_response: None,
        }
    }

    /// Create a new card executor with transport and the ISO GET RESPONSE handler
    pub fn new_with_defaults(transport: T) -> Self {
        let mut executor = Self::new(transport);
        executor.add_processor(Box::new(crate::processor::GetResponseProcessor::default()));
        executor
    }

    /// Get a reference to the underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Take ownership of the transport and return it
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Add a command processor to the chain
    pub fn add_processor(&mut self, processor: Box<dyn CommandProcessor>) {
        self.processors.push(processor);
    }

    /// Get the active command processors
    pub fn processors(&self) -> &[Box<dyn CommandProcessor>] {
        &self.processors
    }

    /// Remove all command processors
    pub fn clear_processors(&mut self) {
        self.processors.clear();
    }

    /// Get the last response received
    pub const fn last_response(&self) -> Option<&Response> {
        self.last_response.as_ref()
    }
}

impl<T: CardTransport> Executor for CardExecutor<T> {
    fn do_transmit(&mut self, command: &Command) -> Result<Response> {
        let response = match self.processors.last() {
            Some(processor) => processor.process_command(command, &mut self.transport)?,
            None => {
                let bytes = self
                    .transport
                    .transmit_raw(&command.to_bytes()?)
                    .map_err(Error::Transport)?;
                Response::from_bytes(&bytes)?
            }
        };

        self.last_response = Some(response.clone());
        Ok(response)
    }

    fn reset(&mut self) -> Result<()> {
        self.transport.reset()?;
        self.last_response = None;
        Ok(())
    }
}
