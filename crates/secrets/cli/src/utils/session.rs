//! Session management for the secrets CLI

use anyhow::{Context, bail};
use secrets_apdu_transport_pcsc::PcscTransport;
use trussed_secrets::{Card, Select};
use tracing::debug;

use super::PinArgs;

/// Selected secrets application together with the credentials to unlock it
#[derive(Debug)]
pub struct Session {
    card: Card<PcscTransport>,
    info: Select,
    access_password: Option<String>,
}

impl Session {
    /// Open the card and select the secrets application
    pub fn open(transport: PcscTransport, access_password: Option<&str>) -> anyhow::Result<Self> {
        let mut card = Card::new(transport)?;
        let info = card
            .select()
            .context("Failed to select the secrets application")?;
        debug!(version = %info.version, "Secrets application selected");

        Ok(Self {
            card,
            info,
            access_password: access_password.map(str::to_owned),
        })
    }

    /// Result of the initial SELECT
    pub const fn info(&self) -> &Select {
        &self.info
    }

    /// Card handle for commands that need no authorization
    pub const fn card(&mut self) -> &mut Card<PcscTransport> {
        &mut self.card
    }

    /// Verify the PIN when one was given
    pub fn unlock(&mut self, pin: &PinArgs) -> anyhow::Result<()> {
        if let Some(pin) = &pin.pin {
            self.card
                .unlock(pin.as_bytes())
                .context("PIN verification failed")?;
            debug!("PIN verified");
        }
        Ok(())
    }

    /// Card handle authorized for exactly one command
    ///
    /// The card only asks for the access key before it is replaced or
    /// removed. The authorization lapses after the next command, so call
    /// this right before that command and never between [`Self::unlock`]
    /// and the command it unlocks.
    pub fn authorized(&mut self) -> anyhow::Result<&mut Card<PcscTransport>> {
        if !self.info.supports_challenge_response() {
            return Ok(&mut self.card);
        }

        let Some(password) = &self.access_password else {
            bail!("The card is protected by an access key, pass --access-password");
        };

        // Every validation attempt consumes the challenge of the last SELECT
        self.info = self.card.select()?;
        self.card
            .validate_password(password.as_bytes())
            .context("Access key validation failed")?;

        Ok(&mut self.card)
    }

    /// End the card transaction
    pub fn close(self) -> anyhow::Result<()> {
        self.card.close()?;
        Ok(())
    }
}
