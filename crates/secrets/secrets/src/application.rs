//! Secrets application implementation
//!
//! [`Card`] owns the session with the applet: the executor, the exclusive
//! transaction and the result of the last SELECT. Every operation is a single
//! request/response exchange, nothing is cached apart from the SELECT result.

use std::fmt;
use std::time::{Duration, SystemTime};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use secrets_apdu_core::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::commands::*;
use crate::constants::{DEFAULT_TIME_STEP, VALIDATE_CHALLENGE_LENGTH};
use crate::crypto::{self, derive_access_key};
use crate::tlv::{self, Tag, TagValue};
use crate::{
    Algorithm, Code, Credential, Error, Kind, ListItem, Properties, Result, Select,
    challenge_totp,
};

/// Type for the function providing the current time
pub type Clock = Box<dyn Fn() -> SystemTime + Send + Sync>;

/// Session with the secrets applet
pub struct Card<T: CardTransport> {
    /// Command executor
    executor: CardExecutor<T>,
    /// Result of the last SELECT
    info: Option<Select>,
    /// Source of the current time for TOTP
    clock: Clock,
    /// TOTP time step
    time_step: Duration,
    /// Randomness for authentication challenges
    rng: Box<dyn RngCore + Send>,
    /// Whether the transaction is still held
    in_transaction: bool,
}

impl<T: CardTransport> fmt::Debug for Card<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("executor", &self.executor)
            .field("info", &self.info)
            .field("time_step", &self.time_step)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl<T: CardTransport> Card<T> {
    /// Open a session on `transport`
    ///
    /// The transport is held exclusively until [`Self::close`] is called or
    /// the session is dropped.
    pub fn new(transport: T) -> Result<Self> {
        let mut executor = CardExecutor::new(transport);
        executor.add_processor(Box::new(GetResponseProcessor::with_instruction(
            Instruction::SendRemaining.into(),
        )));

        executor.transport_mut().begin_transaction()?;
        debug!("Started card transaction");

        Ok(Self {
            executor,
            info: None,
            clock: Box::new(SystemTime::now),
            time_step: DEFAULT_TIME_STEP,
            rng: Box::new(StdRng::from_os_rng()),
            in_transaction: true,
        })
    }

    /// Use `clock` instead of the system time for TOTP
    pub fn with_clock(mut self, clock: impl Fn() -> SystemTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Use a different TOTP time step
    pub const fn with_time_step(mut self, time_step: Duration) -> Self {
        self.time_step = time_step;
        self
    }

    /// Use `rng` for authentication challenges
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Result of the last SELECT, if any
    pub const fn info(&self) -> Option<&Select> {
        self.info.as_ref()
    }

    /// TOTP time step
    pub const fn time_step(&self) -> Duration {
        self.time_step
    }

    /// Underlying transport
    pub const fn transport(&self) -> &T {
        self.executor.transport()
    }

    fn selected(&self) -> Result<&Select> {
        self.info.as_ref().ok_or(Error::NotSelected)
    }

    fn send<C>(&mut self, command: &C) -> Result<Vec<TagValue>>
    where
        C: ApduCommand<Success = Vec<TagValue>, Error = Error>,
    {
        let ins = Instruction::from(command.instruction());
        debug!(?ins, "Sending command");

        self.executor.execute(command).inspect_err(|e| {
            if let Some(sw) = e.status_word() {
                if sw.tracing_level() == tracing::Level::WARN {
                    warn!(?ins, status = %sw, "Card rejected command: {}", sw.description());
                } else {
                    info!(?ins, status = %sw, "Card returned {}", sw.description());
                }
            }
        })
    }

    /// Select the applet and refresh the session capabilities
    #[instrument(skip(self))]
    pub fn select(&mut self) -> Result<Select> {
        let select = self.executor.execute(&SelectCommand::secrets())?;
        debug!(
            version = %select.version,
            pin_counter = ?select.pin_counter,
            serial = ?select.serial.as_ref().map(hex::encode),
            "Selected applet"
        );

        self.info = Some(select.clone());
        Ok(select)
    }

    /// Remove all credentials and the PIN
    pub fn reset(&mut self) -> Result<()> {
        self.send(&ResetCommand::confirmed())?;
        Ok(())
    }

    /// Register an OTP credential
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, secret))]
    pub fn put(
        &mut self,
        id: &str,
        algorithm: Algorithm,
        kind: Kind,
        digits: u8,
        secret: &[u8],
        properties: Properties,
        counter: u32,
    ) -> Result<()> {
        let command = PutCommand::otp(id, algorithm, kind, digits, secret, properties, counter)?;
        self.send(&command)?;
        Ok(())
    }

    /// Register a password safe entry
    ///
    /// Login, password and metadata are set afterwards with [`Self::update`].
    pub fn put_password(&mut self, id: &str, properties: Properties) -> Result<()> {
        self.send(&PutCommand::password(id, properties)?)?;
        Ok(())
    }

    /// Read the password safe fields of a credential
    pub fn get(&mut self, id: &str) -> Result<Credential> {
        let entries = self.send(&GetCredentialCommand::with_id(id))?;
        Credential::from_tag_values(&entries)
    }

    /// Rename a credential
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        self.send(&UpdateCredentialCommand::rename(old, new))?;
        Ok(())
    }

    /// Update the fields of `id` that are set in `credential`
    pub fn update(&mut self, id: &str, credential: &Credential) -> Result<()> {
        self.send(&UpdateCredentialCommand::update(id, credential))?;
        Ok(())
    }

    /// Delete a credential
    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.send(&DeleteCommand::with_id(id))?;
        Ok(())
    }

    /// List stored credentials
    ///
    /// Requires a prior [`Self::select`], the entry layout depends on the
    /// applet version.
    pub fn list(&mut self) -> Result<Vec<ListItem>> {
        let extended = self.selected()?.supports_extended_list();
        let entries = self.send(&ListCommand::new())?;

        entries
            .iter()
            .map(|entry| match entry.tag {
                Tag::NameList => ListItem::from_entry(&entry.value, extended),
                tag => Err(Error::UnknownTag(tag)),
            })
            .collect()
    }

    /// Calculate the code of `id` for the current time
    pub fn calculate(&mut self, id: &str) -> Result<Code> {
        let challenge = challenge_totp((self.clock)(), self.time_step);
        self.calculate_with_challenge(id, &challenge)
    }

    /// Calculate the code of `id` for an explicit challenge
    pub fn calculate_with_challenge(&mut self, id: &str, challenge: &[u8]) -> Result<Code> {
        let entries = self.send(&CalculateCommand::with_challenge(id, challenge))?;
        let entry = entries.first().ok_or(Error::NoValuesFound)?;

        match entry.tag {
            Tag::Response | Tag::Truncated => {
                let (&digits, _) = entry.value.split_first().ok_or(Error::WrongLength)?;
                Code::new(entry.value.slice(1..), digits, entry.tag == Tag::Truncated)
            }
            tag => Err(Error::UnknownTag(tag)),
        }
    }

    /// Let the card verify a code of a reverse HOTP credential
    pub fn verify_code(&mut self, id: &str, code: u32) -> Result<()> {
        self.send(&VerifyCodeCommand::new(id, code))?;
        Ok(())
    }

    /// Set the PIN, only allowed once after a reset
    pub fn set_pin(&mut self, pin: &[u8]) -> Result<()> {
        self.send(&SetPinCommand::with_pin(pin))?;
        Ok(())
    }

    /// Change the PIN
    pub fn change_pin(&mut self, old: &[u8], new: &[u8]) -> Result<()> {
        self.send(&ChangePinCommand::with_pins(old, new))?;
        Ok(())
    }

    /// Authenticate with the PIN for the rest of the session
    pub fn verify_pin(&mut self, pin: &[u8]) -> Result<()> {
        self.send(&VerifyPinCommand::with_pin(pin))?;
        Ok(())
    }

    /// Verify the PIN if the last SELECT reported one
    ///
    /// Fails with [`Error::NoPinConfigured`] instead of sending the PIN to a
    /// card that has none.
    pub fn unlock(&mut self, pin: &[u8]) -> Result<()> {
        if self.selected()?.pin_counter.is_none() {
            return Err(Error::NoPinConfigured);
        }
        self.verify_pin(pin)
    }

    /// Mutual challenge-response authentication with the access key
    #[instrument(skip_all)]
    pub fn validate(&mut self, key: &[u8]) -> Result<()> {
        let info = self.selected()?;
        let card_challenge = info
            .challenge
            .clone()
            .ok_or(Error::NotSupported("challenge-response authentication"))?;
        let algorithm = info.authentication_algorithm();

        let response = crypto::hmac(algorithm, key, &card_challenge)?;
        let mut challenge = [0u8; VALIDATE_CHALLENGE_LENGTH];
        self.rng.fill_bytes(&mut challenge);

        let entries = self.send(&ValidateCommand::new(&response, &challenge))?;
        let card_response = tlv::find(&entries, Tag::Response).ok_or(Error::NoValuesFound)?;

        crypto::verify_hmac(algorithm, key, &challenge, &card_response.value)?;
        debug!("Card proved knowledge of the access key");
        Ok(())
    }

    /// [`Self::validate`] with a key derived from `password` and the session salt
    pub fn validate_password(&mut self, password: &[u8]) -> Result<()> {
        let salt = self
            .selected()?
            .salt
            .clone()
            .ok_or(Error::NotSupported("access key without salt"))?;
        let key = derive_access_key(password, &salt);
        self.validate(key.as_slice())
    }

    /// Configure the access key for challenge-response authentication
    ///
    /// When a key is already set, the session has to [`Self::validate`] first.
    pub fn set_code(&mut self, key: &[u8]) -> Result<()> {
        let mut challenge = [0u8; VALIDATE_CHALLENGE_LENGTH];
        self.rng.fill_bytes(&mut challenge);
        let response = crypto::hmac(Algorithm::Sha1, key, &challenge)?;

        self.send(&SetCodeCommand::new(Algorithm::Sha1, key, &challenge, &response))?;
        Ok(())
    }

    /// Remove the access key
    pub fn clear_code(&mut self) -> Result<()> {
        self.send(&SetCodeCommand::clear())?;
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }

        self.in_transaction = false;
        self.executor.transport_mut().end_transaction()?;
        debug!("Ended card transaction");
        Ok(())
    }

    /// End the session, releasing the transaction
    pub fn close(mut self) -> Result<()> {
        self.end_transaction()
    }
}

impl<T: CardTransport> Drop for Card<T> {
    fn drop(&mut self) {
        if let Err(e) = self.end_transaction() {
            warn!(error = %e, "Failed to end card transaction");
        }
    }
}

