use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::tlv::{Tag, TagValue};
use crate::{Algorithm, Error, Kind, Properties, Result};

/// A credential stored on the card
///
/// Optional fields are only sent to the card when set, so a `Credential`
/// doubles as a partial update for [`crate::Card::update`].
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    /// Identifier
    pub id: String,
    /// Password safe login
    pub login: Option<String>,
    /// Password safe password
    pub password: Option<String>,
    /// Password safe metadata
    pub metadata: Option<String>,
    /// OTP kind
    #[zeroize(skip)]
    pub kind: Option<Kind>,
    /// HMAC algorithm
    #[zeroize(skip)]
    pub algorithm: Option<Algorithm>,
    /// Properties
    #[zeroize(skip)]
    pub properties: Option<Properties>,
}

impl Credential {
    /// Create an empty credential with the given identifier
    pub fn new(id: impl Into<String>) -> Self {
        let mut credential = Self::default();
        credential.id = id.into();
        credential
    }

    /// Set the password safe login
    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    /// Set the password safe password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the password safe metadata
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Set the properties
    pub const fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Read a credential from a GET CREDENTIAL response
    ///
    /// The properties tag either holds protection flags or, when its high
    /// nibble is set, the combined kind and algorithm byte of the entry.
    /// Tags that do not describe a credential are ignored.
    pub fn from_tag_values(entries: &[TagValue]) -> Result<Self> {
        let mut credential = Self::default();

        for entry in entries {
            match entry.tag {
                Tag::CredentialId => credential.id = entry.value_lossy(),
                Tag::PwsLogin => credential.login = Some(entry.value_lossy()),
                Tag::PwsPassword => credential.password = Some(entry.value_lossy()),
                Tag::PwsMetadata => credential.metadata = Some(entry.value_lossy()),
                Tag::Properties => match entry.value.as_ref() {
                    // Newer applets report the key type byte here instead
                    [byte] if byte & Kind::MASK != 0 => {
                        credential.kind = Some(Kind::from_type_byte(*byte));
                        credential.algorithm = Some(Algorithm::from_type_byte(*byte));
                    }
                    [byte] => credential.properties = Some(Properties::from_byte(*byte)),
                    _ => return Err(Error::WrongLength),
                },
                _ => {}
            }
        }

        Ok(credential)
    }

    /// Entries for the fields that are set, excluding the identifier
    pub fn tag_values(&self) -> Vec<TagValue> {
        let strings = [
            (Tag::PwsLogin, &self.login),
            (Tag::PwsPassword, &self.password),
            (Tag::PwsMetadata, &self.metadata),
        ];

        strings
            .into_iter()
            .filter_map(|(tag, value)| {
                value
                    .as_ref()
                    .map(|value| TagValue::new(tag, value.as_bytes().to_vec()))
            })
            .chain(self.properties.map(|props| props.tag_value(false)))
            .collect()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("metadata", &self.metadata)
            .field("kind", &self.kind)
            .field("algorithm", &self.algorithm)
            .field("properties", &self.properties)
            .finish()
    }
}
