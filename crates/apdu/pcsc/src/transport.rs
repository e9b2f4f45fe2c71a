//! PC/SC transport implementation

use std::{ffi::CString, fmt};

use bytes::Bytes;
use pcsc::{Card, Context, Disposition};
use secrets_apdu_core::{CardTransport, TransportError};
use tracing::{debug, warn};

use crate::{
    config::{PcscConfig, ShareMode},
    error::PcscError,
};

/// Transport implementation using PC/SC
pub struct PcscTransport {
    /// PC/SC context
    context: Context,
    /// Card connection, if established
    card: Option<Card>,
    /// Reader name
    reader_name: String,
    /// Configuration
    config: PcscConfig,
    /// Whether the card is held in exclusive mode
    transaction_active: bool,
}

impl fmt::Debug for PcscTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscTransport")
            .field("reader_name", &self.reader_name)
            .field("has_card", &self.card.is_some())
            .field("config", &self.config)
            .field("transaction_active", &self.transaction_active)
            .finish()
    }
}

impl PcscTransport {
    /// Create a new PC/SC transport for the specified reader
    pub(crate) fn new(
        context: Context,
        reader_name: &str,
        config: PcscConfig,
    ) -> Result<Self, PcscError> {
        let mut transport = Self {
            context,
            card: None,
            reader_name: reader_name.to_string(),
            config,
            transaction_active: false,
        };

        if let Err(e) = transport.connect_card() {
            debug!(reader = %transport.reader_name, error = %e, "Card not connected yet");
        }

        Ok(transport)
    }

    fn connect_card(&mut self) -> Result<(), PcscError> {
        let mode = if self.transaction_active {
            ShareMode::Exclusive
        } else {
            self.config.share_mode
        };
        self.connect_with(mode)
    }

    fn connect_with(&mut self, mode: ShareMode) -> Result<(), PcscError> {
        if self.card.is_some() {
            return Ok(());
        }

        let reader_cstr = CString::new(self.reader_name.as_str())
            .map_err(|_| PcscError::ReaderNotFound(self.reader_name.clone()))?;

        match self
            .context
            .connect(&reader_cstr, mode.into(), self.config.protocols)
        {
            Ok(card) => {
                debug!(reader = %self.reader_name, "Connected to card");
                self.card = Some(card);
                Ok(())
            }
            Err(pcsc::Error::NoSmartcard) => Err(PcscError::NoCard(self.reader_name.clone())),
            Err(pcsc::Error::UnknownReader) => {
                Err(PcscError::ReaderNotFound(self.reader_name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the ATR of the current card
    pub fn atr(&self) -> Result<Vec<u8>, PcscError> {
        let card = self
            .card
            .as_ref()
            .ok_or_else(|| PcscError::NoCard(self.reader_name.clone()))?;
        Ok(card.get_attribute_owned(pcsc::Attribute::AtrString)?)
    }

    /// Get the reader name
    pub fn reader_name(&self) -> &str {
        &self.reader_name
    }

    /// Check if the transport is connected to a card
    pub const fn has_card(&self) -> bool {
        self.card.is_some()
    }

    /// Check if the card is currently held exclusively
    pub const fn in_transaction(&self) -> bool {
        self.transaction_active
    }

    fn reconnect(&mut self, mode: ShareMode) -> Result<(), PcscError> {
        self.connect_card()?;
        let card = self
            .card
            .as_mut()
            .ok_or_else(|| PcscError::NoCard(self.reader_name.clone()))?;
        card.reconnect(mode.into(), self.config.protocols, Disposition::LeaveCard)?;
        Ok(())
    }

    fn transmit_command(&mut self, command: &[u8], retry: bool) -> Result<Bytes, PcscError> {
        self.connect_card()?;

        let card = self
            .card
            .as_mut()
            .ok_or_else(|| PcscError::NoCard(self.reader_name.clone()))?;

        let mut response_buffer = [0u8; pcsc::MAX_BUFFER_SIZE_EXTENDED];

        match card.transmit(command, &mut response_buffer) {
            Ok(response) => Ok(Bytes::copy_from_slice(response)),
            Err(e @ (pcsc::Error::ResetCard | pcsc::Error::RemovedCard)) => {
                // The card handle is stale after a reset or removal
                self.card = None;

                let recovery = match e {
                    pcsc::Error::ResetCard => ResetRecovery::new(
                        retry && self.config.auto_reconnect,
                        self.transaction_active,
                    ),
                    _ => ResetRecovery::Fail,
                };

                match recovery {
                    ResetRecovery::Retry => {
                        warn!(reader = %self.reader_name, "Card was reset, reconnecting");
                        self.connect_card()?;
                        self.transmit_command(command, false)
                    }
                    ResetRecovery::Restore => {
                        warn!(
                            reader = %self.reader_name,
                            "Card was reset during a transaction, reacquiring exclusive access"
                        );
                        if let Err(reconnect) = self.connect_with(ShareMode::Exclusive) {
                            self.transaction_active = false;
                            return Err(reconnect);
                        }
                        Err(e.into())
                    }
                    ResetRecovery::Fail => {
                        self.transaction_active = false;
                        Err(e.into())
                    }
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// How to continue after the card handle went stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetRecovery {
    /// Reconnect and send the command again
    Retry,
    /// Reconnect exclusively and report the reset, the applet state is lost
    Restore,
    /// Report the error and drop the connection
    Fail,
}

impl ResetRecovery {
    const fn new(auto_reconnect: bool, transaction_active: bool) -> Self {
        match (auto_reconnect, transaction_active) {
            (true, true) => Self::Restore,
            (true, false) => Self::Retry,
            (false, _) => Self::Fail,
        }
    }
}

impl CardTransport for PcscTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.transmit_command(command, true)
            .map_err(TransportError::from)
    }

    fn is_connected(&self) -> bool {
        self.card.is_some()
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.transaction_active = false;

        if let Some(card) = self.card.take() {
            if let Err((_, e)) = card.disconnect(Disposition::ResetCard) {
                debug!(error = %e, "Failed to reset card on disconnect");
            }
        }

        self.connect_card().map_err(Into::into)
    }

    fn begin_transaction(&mut self) -> Result<(), TransportError> {
        if self.transaction_active {
            return Err(PcscError::TransactionInProgress.into());
        }

        self.reconnect(ShareMode::Exclusive)?;
        self.transaction_active = true;
        debug!(reader = %self.reader_name, "Acquired exclusive access to card");
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<(), TransportError> {
        if !self.transaction_active {
            return Err(PcscError::NoTransaction.into());
        }

        self.transaction_active = false;
        self.reconnect(self.config.share_mode)?;
        debug!(reader = %self.reader_name, "Released exclusive access to card");
        Ok(())
    }
}

impl Drop for PcscTransport {
    fn drop(&mut self) {
        self.transaction_active = false;

        if let Some(card) = self.card.take() {
            if let Err((_, e)) = card.disconnect(Disposition::LeaveCard) {
                debug!(error = %e, "Failed to disconnect card");
            }
        }
    }
}
