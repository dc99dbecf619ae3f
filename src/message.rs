use crate::address::Address;
use crate::board_id::BoardId;

// Wire command codes.
pub const CMD_HELLO: u8 = 0x01;
pub const CMD_SET_ADDRESS: u8 = 0x02;
pub const CMD_DEVICE_COMMAND: u8 = 0x03;

/// Largest fixed payload in the catalog (`SetAddress`).
pub const MAX_PAYLOAD_LEN: usize = 9;

/// A known payload arrived with the wrong length. The message is dropped as
/// a whole; no fields are extracted from a size-mismatched payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MalformedPayload {
    pub kind: MessageKind,
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    Hello,
    SetAddress,
    DeviceCommand,
}

impl MessageKind {
    fn from_command(command: u8) -> Option<MessageKind> {
        match command {
            CMD_HELLO => Some(Self::Hello),
            CMD_SET_ADDRESS => Some(Self::SetAddress),
            CMD_DEVICE_COMMAND => Some(Self::DeviceCommand),
            _ => None,
        }
    }

    /// Fixed payload size of this kind on the wire.
    pub const fn wire_size(&self) -> usize {
        match self {
            Self::Hello => 8,
            Self::SetAddress => 9,
            Self::DeviceCommand => 6,
        }
    }
}

/// Message that can be sent and received on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Request to be noticed. Sent by an unassigned responder toward the
    /// controller, and by the controller toward the general call to announce
    /// itself.
    Hello { board_id: BoardId },
    /// Controller grant of a bus address to the named board.
    SetAddress { board_id: BoardId, address: Address },
    /// Opaque device-control payload, forwarded to the device dispatcher.
    /// `value` is little-endian on the wire.
    DeviceCommand { module: u8, command: u8, value: u32 },
    /// Anything with a command code outside the catalog.
    Unknown { command: u8 },
}

impl Message {
    /// Decodes a raw payload for the given command code.
    ///
    /// Unknown command codes always succeed as [`Message::Unknown`]; there
    /// is no expected shape to check them against. Known codes fail with
    /// [`MalformedPayload`] when the payload length does not match the
    /// kind's fixed size.
    pub fn decode(command: u8, payload: &[u8]) -> Result<Message, MalformedPayload> {
        let Some(kind) = MessageKind::from_command(command) else {
            return Ok(Message::Unknown { command });
        };
        if payload.len() != kind.wire_size() {
            return Err(MalformedPayload {
                kind,
                expected: kind.wire_size(),
                actual: payload.len(),
            });
        }
        Ok(match kind {
            MessageKind::Hello => Message::Hello {
                board_id: board_id_from(payload),
            },
            MessageKind::SetAddress => Message::SetAddress {
                board_id: board_id_from(payload),
                address: Address::from_u8(payload[8]),
            },
            MessageKind::DeviceCommand => Message::DeviceCommand {
                module: payload[0],
                command: payload[1],
                value: u32::from_le_bytes([payload[2], payload[3], payload[4], payload[5]]),
            },
        })
    }

    /// Wire command code of this message.
    pub fn command(&self) -> u8 {
        match self {
            Self::Hello { .. } => CMD_HELLO,
            Self::SetAddress { .. } => CMD_SET_ADDRESS,
            Self::DeviceCommand { .. } => CMD_DEVICE_COMMAND,
            Self::Unknown { command } => *command,
        }
    }

    /// Encodes the payload into `buf`.
    ///
    /// The returned length is the amount of bytes written into the given
    /// array. Every kind has exactly one encoding; `Unknown` carries no
    /// payload.
    pub fn encode(&self, buf: &mut [u8; MAX_PAYLOAD_LEN]) -> usize {
        match self {
            Self::Hello { board_id } => {
                buf[..8].copy_from_slice(board_id.as_bytes());
                8
            }
            Self::SetAddress { board_id, address } => {
                buf[..8].copy_from_slice(board_id.as_bytes());
                buf[8] = address.as_u8();
                9
            }
            Self::DeviceCommand {
                module,
                command,
                value,
            } => {
                buf[0] = *module;
                buf[1] = *command;
                buf[2..6].copy_from_slice(&value.to_le_bytes());
                6
            }
            Self::Unknown { .. } => 0,
        }
    }
}

fn board_id_from(payload: &[u8]) -> BoardId {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&payload[..8]);
    BoardId::new(bytes)
}
