use crate::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The target did not acknowledge the transfer.
    Nack,
    /// Lost bus arbitration to another board mid-transfer.
    ArbitrationLost,
    /// The transport rejected the target or listen address.
    InvalidAddress,
    Other,
}

/// Raw bus transport this board sits on.
///
/// Sending and listening are independent: a board may initiate transfers as
/// a bus controller while also listening for addressed transfers as a
/// responder. `try_send` is a single non-blocking attempt; retries are the
/// caller's business.
pub trait BusTransport {
    fn try_send(&mut self, dst: Address, command: u8, payload: &[u8]) -> Result<(), BusError>;

    /// Enables the responder role at `address`.
    fn listen(&mut self, address: Address) -> Result<(), BusError>;

    /// Disables the responder role at `address`.
    fn stop_listening(&mut self, address: Address) -> Result<(), BusError>;
}

/// Downstream device driver the dispatcher forwards decoded commands to.
///
/// `module` indexes one of the cascaded device modules; its range and the
/// meaning of `command`/`value` are the driver's concern alone.
pub trait DeviceDriver {
    fn execute(&mut self, module: u8, command: u8, value: u32);
}

/// Visual status indicator, used for the fatal blink diagnostic and the
/// application heartbeat.
pub trait StatusIndicator {
    fn on(&mut self);
    fn off(&mut self);
    fn toggle(&mut self);
}
