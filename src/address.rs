#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// The well-known address every board observes, assigned or not.
    /// Wire value 0; never granted to a responder.
    GeneralCall,
    Device(u8),
}

impl Address {
    pub fn from_u8(addr: u8) -> Address {
        if addr == 0 {
            Self::GeneralCall
        } else {
            Self::Device(addr)
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::GeneralCall => 0,
            Self::Device(addr) => *addr,
        }
    }
}
