/// 8-byte globally-unique board identity.
///
/// Read once at boot from the platform's unique-id source and never changed
/// afterwards. The all-ones value is reserved for the address-granting
/// controller and must not be used by any responder board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardId([u8; 8]);

impl BoardId {
    /// Reserved identity of the address-granting controller.
    pub const CONTROLLER: BoardId = BoardId([0xff; 8]);

    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}
