//! In-memory secrets applet for driving [`trussed_secrets::Card`] in tests
//!
//! Implements the card side of the protocol closely enough for the client:
//! credential store, HOTP counters, the PIN state machine, challenge-response
//! authentication and `61xx` chunked responses continued with SEND REMAINING.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use hex_literal::hex;
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use secrets_apdu_core::prelude::status;
use secrets_apdu_core::{CardTransport, Command, StatusWord, TransportError};
use sha1::Sha1;
use sha2::Sha256;
use trussed_secrets::tlv::{self, Tag, TagValue};
use trussed_secrets::{Algorithm, Instruction, Kind, Properties, SECRETS_AID, Version};

/// Salt reported in the SELECT response
pub const SALT: [u8; 8] = hex!("5d26ffbf5e5b8c40");
/// Serial number reported in the SELECT response
pub const SERIAL: [u8; 4] = hex!("1a2b3c4d");
/// PIN attempts after setting or successfully verifying the PIN
pub const PIN_ATTEMPTS: u8 = 8;
/// Largest payload sent in one response before chunking
pub const CHUNK_SIZE: usize = 64;

const INS_SELECT: u8 = 0xA4;
const VERIFY_CODE_WINDOW: u64 = 9;

type Reply = Result<Vec<u8>, StatusWord>;

#[derive(Debug, Clone)]
struct Entry {
    kind: Kind,
    algorithm: Algorithm,
    digits: u8,
    secret: Vec<u8>,
    properties: Properties,
    counter: u64,
    login: Option<Bytes>,
    password: Option<Bytes>,
    metadata: Option<Bytes>,
}

impl Entry {
    fn list_properties(&self) -> Properties {
        let mut properties = self.properties;
        if self.login.is_some() || self.password.is_some() || self.metadata.is_some() {
            properties |= Properties::PWS_DATA_EXISTS;
        }
        properties
    }
}

#[derive(Debug)]
struct State {
    version: Version,
    entries: BTreeMap<Vec<u8>, Entry>,
    pin: Option<Vec<u8>>,
    pin_attempts: u8,
    pin_verified: bool,
    access_key: Option<Vec<u8>>,
    challenge: [u8; 8],
    challenges_issued: u64,
    authorized: bool,
    pending: Bytes,
    log: Vec<Command>,
    transactions_begun: usize,
    transactions_ended: usize,
    in_transaction: bool,
}

/// Shared handle to a virtual secrets applet
///
/// Clones share the same card, so a test can hand one clone to `Card` and
/// inspect the applet through another.
#[derive(Debug, Clone)]
pub struct VirtualApplet {
    state: Arc<Mutex<State>>,
}

impl Default for VirtualApplet {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualApplet {
    /// Empty applet reporting version 4.11.0
    pub fn new() -> Self {
        Self::with_version(Version::new(4, 11, 0))
    }

    /// Empty applet reporting `version`
    pub fn with_version(version: Version) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                version,
                entries: BTreeMap::new(),
                pin: None,
                pin_attempts: PIN_ATTEMPTS,
                pin_verified: false,
                access_key: None,
                challenge: [0; 8],
                challenges_issued: 0,
                authorized: false,
                pending: Bytes::new(),
                log: Vec::new(),
                transactions_begun: 0,
                transactions_ended: 0,
                in_transaction: false,
            })),
        }
    }

    /// Power cycle: forget the session state but keep the stored data
    pub fn reboot(&self) {
        let mut state = self.state.lock();
        state.pin_verified = false;
        state.authorized = false;
        state.pending = Bytes::new();
    }

    /// Instructions received so far, including SELECT and SEND REMAINING
    pub fn instructions(&self) -> Vec<u8> {
        self.state.lock().log.iter().map(|c| c.ins).collect()
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<Command> {
        self.state.lock().log.clone()
    }

    /// Number of stored credentials, including encrypted ones
    pub fn credential_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Remaining PIN attempts
    pub fn pin_attempts(&self) -> u8 {
        self.state.lock().pin_attempts
    }

    /// Whether an access key for challenge-response authentication is set
    pub fn has_access_key(&self) -> bool {
        self.state.lock().access_key.is_some()
    }

    /// Whether a transaction is currently held
    pub fn in_transaction(&self) -> bool {
        self.state.lock().in_transaction
    }

    /// Number of transactions begun and ended
    pub fn transactions(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.transactions_begun, state.transactions_ended)
    }
}

impl CardTransport for VirtualApplet {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        let command =
            Command::from_bytes(command).map_err(|e| TransportError::other(e.to_string()))?;
        Ok(self.state.lock().process(command))
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.reboot();
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.in_transaction {
            return Err(TransportError::transaction("transaction already active"));
        }
        state.in_transaction = true;
        state.transactions_begun += 1;
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.in_transaction {
            return Err(TransportError::transaction("no active transaction"));
        }
        state.in_transaction = false;
        state.transactions_ended += 1;
        Ok(())
    }
}

fn respond(payload: &[u8], sw: StatusWord) -> Bytes {
    let mut bytes = payload.to_vec();
    bytes.extend_from_slice(&sw.to_u16().to_be_bytes());
    Bytes::from(bytes)
}

fn hmac(algorithm: Algorithm, key: &[u8], message: &[u8]) -> Result<Vec<u8>, StatusWord> {
    fn compute<M: Mac + hmac::digest::KeyInit>(key: &[u8], message: &[u8]) -> Vec<u8> {
        let mut mac = <M as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }

    match algorithm {
        Algorithm::Sha1 => Ok(compute::<Hmac<Sha1>>(key, message)),
        Algorithm::Sha256 => Ok(compute::<Hmac<Sha256>>(key, message)),
        _ => Err(status::INCORRECT_DATA),
    }
}

fn truncate(digest: &[u8]) -> u32 {
    let offset = (digest[digest.len() - 1] & 0x0F) as usize;
    let bytes: [u8; 4] = digest[offset..offset + 4].try_into().expect("four bytes");
    u32::from_be_bytes(bytes) & 0x7FFF_FFFF
}

fn find<'a>(entries: &'a [TagValue], tag: Tag) -> Result<&'a [u8], StatusWord> {
    tlv::find(entries, tag)
        .map(|entry| entry.value.as_ref())
        .ok_or(status::INCORRECT_DATA)
}

fn be_u64(value: &[u8]) -> Result<u64, StatusWord> {
    if value.len() > 8 {
        return Err(status::INCORRECT_DATA);
    }
    let mut buf = [0u8; 8];
    buf[8 - value.len()..].copy_from_slice(value);
    Ok(u64::from_be_bytes(buf))
}

fn push_tlv(out: &mut Vec<u8>, tag: Tag, value: &[u8]) {
    out.extend_from_slice(&tlv::encode(&[TagValue::new(tag, value.to_vec())]));
}

impl State {
    fn process(&mut self, command: Command) -> Bytes {
        self.log.push(command.clone());

        if command.ins == u8::from(Instruction::SendRemaining) {
            return self.send_remaining();
        }
        self.pending = Bytes::new();

        let data = command.data.clone().unwrap_or_default();
        let reply = if command.ins == INS_SELECT {
            self.select(&command, &data)
        } else {
            self.dispatch(&command, &data)
        };

        match reply {
            Ok(payload) => self.chunk(Bytes::from(payload)),
            Err(sw) => respond(&[], sw),
        }
    }

    fn chunk(&mut self, payload: Bytes) -> Bytes {
        if payload.len() <= CHUNK_SIZE {
            return respond(&payload, status::SUCCESS);
        }

        let rest = payload.slice(CHUNK_SIZE..);
        let remaining = u8::try_from(rest.len()).unwrap_or(0);
        self.pending = rest;
        respond(&payload[..CHUNK_SIZE], StatusWord::new(0x61, remaining))
    }

    fn send_remaining(&mut self) -> Bytes {
        if self.pending.is_empty() {
            return respond(&[], status::CONDITIONS_NOT_SATISFIED);
        }
        let pending = std::mem::take(&mut self.pending);
        self.chunk(pending)
    }

    fn next_challenge(&mut self) {
        self.challenges_issued += 1;
        self.challenge = self.challenges_issued.to_be_bytes();
    }

    fn select(&mut self, command: &Command, data: &[u8]) -> Reply {
        if command.p1 != 0x04 || data != SECRETS_AID {
            return Err(status::FILE_NOT_FOUND);
        }

        self.authorized = false;
        self.next_challenge();

        let version = [self.version.major, self.version.minor, self.version.patch];
        let mut out = Vec::new();
        push_tlv(&mut out, Tag::Version, &version);
        if self.pin.is_some() {
            push_tlv(&mut out, Tag::PinCounter, &[self.pin_attempts]);
        }
        push_tlv(&mut out, Tag::CredentialId, &SALT);
        if self.access_key.is_some() {
            push_tlv(&mut out, Tag::Challenge, &self.challenge);
            push_tlv(
                &mut out,
                Tag::Algorithm,
                &[u8::from(Kind::Totp) | u8::from(Algorithm::Sha1)],
            );
        }
        push_tlv(&mut out, Tag::SerialNumber, &SERIAL);
        Ok(out)
    }

    fn dispatch(&mut self, command: &Command, data: &[u8]) -> Reply {
        let ins = Instruction::from(command.ins);

        // Authorization from VALIDATE only covers the next command, and only
        // replacing or clearing the access key asks for it
        let authorized = std::mem::take(&mut self.authorized);
        if matches!(ins, Instruction::SetCode) && self.access_key.is_some() && !authorized {
            return Err(status::CONDITIONS_NOT_SATISFIED);
        }

        // LIST carries a raw version byte, PUT an implicit length properties entry
        let entries = match ins {
            Instruction::List => Ok(Vec::new()),
            Instruction::Put => tlv::decode_with_implicit(data, &[Tag::Properties]),
            _ => tlv::decode(data),
        }
        .map_err(|_| status::INCORRECT_DATA)?;

        match ins {
            Instruction::Put => self.put(&entries),
            Instruction::Delete => self.delete(&entries),
            Instruction::SetCode => self.set_code(&entries),
            Instruction::Reset => self.reset(command),
            Instruction::List => self.list(data),
            Instruction::Calculate => self.calculate(&entries),
            Instruction::Validate => self.validate(&entries),
            Instruction::VerifyCode => self.verify_code(&entries),
            Instruction::VerifyPin => self.verify_pin(&entries),
            Instruction::ChangePin => self.change_pin(&entries),
            Instruction::SetPin => self.set_pin(&entries),
            Instruction::GetCredential => self.get_credential(&entries),
            Instruction::UpdateCredential => self.update_credential(&entries),
            _ => Err(status::INVALID_INSTRUCTION),
        }
    }

    fn visible(&self, entry: &Entry) -> bool {
        !entry.properties.contains(Properties::PIN_ENCRYPTED) || self.pin_verified
    }

    fn entry_mut(&mut self, id: &[u8]) -> Result<&mut Entry, StatusWord> {
        let pin_verified = self.pin_verified;
        self.entries
            .get_mut(id)
            .filter(|entry| !entry.properties.contains(Properties::PIN_ENCRYPTED) || pin_verified)
            .ok_or(status::FILE_NOT_FOUND)
    }

    fn reset(&mut self, command: &Command) -> Reply {
        if [command.p1, command.p2] != [0xDE, 0xAD] {
            return Err(status::INCORRECT_P1P2);
        }

        self.entries.clear();
        self.pin = None;
        self.pin_attempts = PIN_ATTEMPTS;
        self.pin_verified = false;
        self.access_key = None;
        Ok(Vec::new())
    }

    fn put(&mut self, entries: &[TagValue]) -> Reply {
        let id = find(entries, Tag::CredentialId)?.to_vec();
        let key = find(entries, Tag::Key)?;
        let [type_byte, digits, secret @ ..] = key else {
            return Err(status::INCORRECT_DATA);
        };

        let wire = tlv::find(entries, Tag::Properties)
            .and_then(|entry| entry.value.first().copied())
            .unwrap_or_default();
        let mut properties = Properties::empty();
        if wire & 0x02 != 0 {
            properties |= Properties::TOUCH_REQUIRED;
        }
        if wire & 0x04 != 0 {
            properties |= Properties::PIN_ENCRYPTED;
        }

        if properties.contains(Properties::PIN_ENCRYPTED) && !self.pin_verified {
            return Err(status::SECURITY_CONDITION_NOT_SATISFIED);
        }

        let counter = match tlv::find(entries, Tag::InitialCounter) {
            Some(entry) => be_u64(&entry.value)?,
            None => 0,
        };

        self.entries.insert(
            id,
            Entry {
                kind: Kind::from_type_byte(*type_byte),
                algorithm: Algorithm::from_type_byte(*type_byte),
                digits: *digits,
                secret: secret.to_vec(),
                properties,
                counter,
                login: None,
                password: None,
                metadata: None,
            },
        );
        Ok(Vec::new())
    }

    fn delete(&mut self, entries: &[TagValue]) -> Reply {
        let id = find(entries, Tag::CredentialId)?;
        self.entry_mut(id)?;
        self.entries.remove(id);
        Ok(Vec::new())
    }

    fn list(&self, data: &[u8]) -> Reply {
        let extended = data == [0x01] && self.version.at_least(Version::new(4, 11, 0));

        let mut out = Vec::new();
        for (id, entry) in self.entries.iter().filter(|(_, e)| self.visible(e)) {
            let mut value = vec![u8::from(entry.kind) | u8::from(entry.algorithm)];
            value.extend_from_slice(id);
            if extended {
                value.push(entry.list_properties().bits());
            }
            push_tlv(&mut out, Tag::NameList, &value);
        }
        Ok(out)
    }

    fn calculate(&mut self, entries: &[TagValue]) -> Reply {
        let id = find(entries, Tag::CredentialId)?.to_vec();
        let challenge = find(entries, Tag::Challenge)?.to_vec();
        let entry = self.entry_mut(&id)?;

        let message = match entry.kind {
            Kind::Totp => challenge,
            Kind::Hotp => {
                let counter = entry.counter;
                entry.counter += 1;
                counter.to_be_bytes().to_vec()
            }
            _ => return Err(status::CONDITIONS_NOT_SATISFIED),
        };

        let digest = hmac(entry.algorithm, &entry.secret, &message)?;
        let mut value = vec![entry.digits];
        value.extend_from_slice(&truncate(&digest).to_be_bytes());

        let mut out = Vec::new();
        push_tlv(&mut out, Tag::Truncated, &value);
        Ok(out)
    }

    fn verify_code(&mut self, entries: &[TagValue]) -> Reply {
        let id = find(entries, Tag::CredentialId)?.to_vec();
        let code = u32::try_from(be_u64(find(entries, Tag::Response)?)?)
            .map_err(|_| status::INCORRECT_DATA)?;
        let entry = self.entry_mut(&id)?;

        if entry.kind != Kind::HotpReverse {
            return Err(status::CONDITIONS_NOT_SATISFIED);
        }

        let modulus = 10u32.pow(entry.digits as u32);
        for counter in entry.counter..=entry.counter + VERIFY_CODE_WINDOW {
            let digest = hmac(entry.algorithm, &entry.secret, &counter.to_be_bytes())?;
            if truncate(&digest) % modulus == code {
                entry.counter = counter + 1;
                return Ok(Vec::new());
            }
        }

        Err(status::VERIFICATION_FAILED)
    }

    fn set_pin(&mut self, entries: &[TagValue]) -> Reply {
        if self.pin.is_some() {
            return Err(status::SECURITY_CONDITION_NOT_SATISFIED);
        }
        self.pin = Some(find(entries, Tag::Password)?.to_vec());
        self.pin_attempts = PIN_ATTEMPTS;
        Ok(Vec::new())
    }

    fn check_pin(&mut self, pin: &[u8]) -> Result<(), StatusWord> {
        if self.pin_attempts == 0 {
            return Err(status::AUTHENTICATION_BLOCKED);
        }
        if self.pin.as_deref() != Some(pin) {
            self.pin_attempts -= 1;
            return Err(status::VERIFICATION_FAILED);
        }
        self.pin_attempts = PIN_ATTEMPTS;
        Ok(())
    }

    fn verify_pin(&mut self, entries: &[TagValue]) -> Reply {
        if self.pin.is_none() {
            return Err(status::SECURITY_CONDITION_NOT_SATISFIED);
        }
        self.pin_verified = false;
        self.check_pin(find(entries, Tag::Password)?)?;
        self.pin_verified = true;
        Ok(Vec::new())
    }

    fn change_pin(&mut self, entries: &[TagValue]) -> Reply {
        if self.pin.is_none() {
            return Err(status::SECURITY_CONDITION_NOT_SATISFIED);
        }
        self.check_pin(find(entries, Tag::Password)?)?;
        self.pin = Some(find(entries, Tag::NewPassword)?.to_vec());
        Ok(Vec::new())
    }

    fn get_credential(&mut self, entries: &[TagValue]) -> Reply {
        let id = find(entries, Tag::CredentialId)?.to_vec();
        let entry = self.entry_mut(&id)?.clone();

        // The properties tag carries the key type byte in this reply
        let mut out = Vec::new();
        push_tlv(
            &mut out,
            Tag::Properties,
            &[u8::from(entry.kind) | u8::from(entry.algorithm)],
        );
        push_tlv(&mut out, Tag::CredentialId, &id);
        for (tag, value) in [
            (Tag::PwsLogin, &entry.login),
            (Tag::PwsPassword, &entry.password),
            (Tag::PwsMetadata, &entry.metadata),
        ] {
            if let Some(value) = value {
                push_tlv(&mut out, tag, value);
            }
        }
        Ok(out)
    }

    fn update_credential(&mut self, entries: &[TagValue]) -> Reply {
        let mut ids = entries.iter().filter(|e| e.tag == Tag::CredentialId);
        let id = ids.next().ok_or(status::INCORRECT_DATA)?.value.to_vec();
        let new_id = ids.next().map(|e| e.value.to_vec());

        let entry = self.entry_mut(&id)?;
        for update in entries {
            match update.tag {
                Tag::PwsLogin => entry.login = Some(update.value.clone()),
                Tag::PwsPassword => entry.password = Some(update.value.clone()),
                Tag::PwsMetadata => entry.metadata = Some(update.value.clone()),
                Tag::Properties => {
                    let wire = update.value.first().copied().unwrap_or_default();
                    entry.properties.set(Properties::TOUCH_REQUIRED, wire & 0x02 != 0);
                    entry.properties.set(Properties::PIN_ENCRYPTED, wire & 0x04 != 0);
                }
                _ => {}
            }
        }

        if let Some(new_id) = new_id {
            if self.entries.contains_key(&new_id) {
                return Err(status::CONDITIONS_NOT_SATISFIED);
            }
            if let Some(entry) = self.entries.remove(&id) {
                self.entries.insert(new_id, entry);
            }
        }
        Ok(Vec::new())
    }

    fn validate(&mut self, entries: &[TagValue]) -> Reply {
        let key = self.access_key.clone().ok_or(status::CONDITIONS_NOT_SATISFIED)?;
        let response = find(entries, Tag::Response)?;
        let challenge = find(entries, Tag::Challenge)?;

        let expected = hmac(Algorithm::Sha1, &key, &self.challenge)?;
        self.next_challenge();
        if expected != response {
            return Err(status::INCORRECT_DATA);
        }

        self.authorized = true;
        let mut out = Vec::new();
        push_tlv(&mut out, Tag::Response, &hmac(Algorithm::Sha1, &key, challenge)?);
        Ok(out)
    }

    fn set_code(&mut self, entries: &[TagValue]) -> Reply {
        let key = find(entries, Tag::Key)?;
        let Some((_, key)) = key.split_first() else {
            self.access_key = None;
            return Ok(Vec::new());
        };

        let challenge = find(entries, Tag::Challenge)?;
        let response = find(entries, Tag::Response)?;
        if hmac(Algorithm::Sha1, key, challenge)? != response {
            return Err(status::INCORRECT_DATA);
        }

        self.access_key = Some(key.to_vec());
        self.next_challenge();
        Ok(Vec::new())
    }
}
