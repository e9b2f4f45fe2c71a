use bytes::Bytes;

use crate::constants::RESET_CONFIRMATION;

use super::Instruction;

secrets_command! {
    /// RESET command: wipe all credentials and the PIN
    pub struct ResetCommand => Instruction::Reset;
}

impl ResetCommand {
    /// Create a RESET command carrying the confirmation bytes
    pub const fn confirmed() -> Self {
        let [p1, p2] = RESET_CONFIRMATION;
        Self::from_raw(p1, p2, Bytes::new())
    }
}
