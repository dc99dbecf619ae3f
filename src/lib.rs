//! Bus address assignment and device command routing for peer boards
//! sharing a half-duplex serial bus.
//!
//! One board on the bus is the address-granting controller; every other
//! board boots as an unassigned responder. A responder discovers the
//! controller from its `Hello` announcement on the general call, asks to be
//! noticed with its own `Hello`, and receives a `SetAddress` grant naming
//! its 8-byte board identity. Once assigned, `DeviceCommand` frames are
//! forwarded to the downstream device driver through the [`Dispatcher`].
//!
//! Everything runs inside a single polling loop: feed raw frames in with
//! [`ProtocolDriver::push_inbound`], drain decoded messages with
//! [`ProtocolDriver::pop_message`], and while unassigned re-issue
//! [`ProtocolDriver::send_hello`] each iteration. The loop's own sleep is
//! the only timing mechanism; nothing here blocks or retries internally.
//!
//! The raw transport, device driver, and status indicator are consumed
//! through the seams in [`traits`]; setup failures end in the diagnostic
//! blink loop of [`fault`].

#![cfg_attr(not(test), no_std)]

mod address;
mod board_id;
mod dispatch;
mod driver;
mod message;

pub mod fault;
pub mod led;
pub mod traits;

pub use address::Address;
pub use board_id::BoardId;
pub use dispatch::Dispatcher;
pub use driver::{ProtocolDriver, INBOUND_DEPTH, MAX_FRAME_LEN};
pub use message::{MalformedPayload, Message, MessageKind, MAX_PAYLOAD_LEN};
