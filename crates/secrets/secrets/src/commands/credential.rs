use crate::Credential;
use crate::tlv::{Tag, TagValue};

use super::Instruction;

secrets_command! {
    /// GET CREDENTIAL command: read the password safe fields of a credential
    pub struct GetCredentialCommand => Instruction::GetCredential;
}

secrets_command! {
    /// UPDATE CREDENTIAL command: rename a credential or change its fields
    pub struct UpdateCredentialCommand => Instruction::UpdateCredential;
}

fn id_entry(id: &str) -> TagValue {
    TagValue::new(Tag::CredentialId, id.as_bytes().to_vec())
}

impl GetCredentialCommand {
    /// Read the credential `id`
    pub fn with_id(id: &str) -> Self {
        Self::from_entries(0x00, 0x00, &[id_entry(id)])
    }
}

impl UpdateCredentialCommand {
    /// Rename `old` to `new`
    ///
    /// A second identifier entry in the body is the new name.
    pub fn rename(old: &str, new: &str) -> Self {
        Self::from_entries(0x00, 0x00, &[id_entry(old), id_entry(new)])
    }

    /// Update the fields of `id` that are set in `credential`
    pub fn update(id: &str, credential: &Credential) -> Self {
        let mut entries = vec![id_entry(id)];
        entries.extend(credential.tag_values());
        Self::from_entries(0x00, 0x00, &entries)
    }
}
