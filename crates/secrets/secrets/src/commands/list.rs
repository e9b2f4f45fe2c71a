use bytes::Bytes;

use crate::constants::LIST_VERSION;

use super::Instruction;

secrets_command! {
    /// LIST command: enumerate stored credentials
    pub struct ListCommand => Instruction::List;
}

impl ListCommand {
    /// Request the list, asking for properties in each entry
    ///
    /// The body is a bare version byte rather than a TLV structure.
    pub const fn new() -> Self {
        Self::from_raw(0x00, 0x00, Bytes::from_static(&[LIST_VERSION]))
    }
}

impl Default for ListCommand {
    fn default() -> Self {
        Self::new()
    }
}
