use heapless::spsc::Queue;
use heapless::Vec;

use crate::message::{Message, MAX_PAYLOAD_LEN};
use crate::traits::{BusError, BusTransport};
use crate::{Address, BoardId};

/// Longest raw frame accepted at ingress. Anything larger cannot be a
/// well-formed message of any kind and is dropped before it is queued.
pub const MAX_FRAME_LEN: usize = 16;

/// Inbound queue slots. The usable capacity of the spsc queue is one less.
pub const INBOUND_DEPTH: usize = 8;

/// A raw frame as delivered by the transport's receive path, queued until
/// the application loop polls for it.
#[derive(Debug)]
struct Inbound {
    sender: Address,
    command: u8,
    payload: Vec<u8, MAX_FRAME_LEN>,
}

/// Discovery/addressing protocol state and the inbound message queue.
///
/// One instance per board, alive for the whole process. All mutation happens
/// through `&mut self` on the application thread; the inbound queue is a
/// single-producer single-consumer ring so the receive path can be moved to
/// an interrupt context without changing the consumer side.
///
/// The application loop drives the protocol:
///
/// - feed raw frames in with [`push_inbound`](Self::push_inbound),
/// - drain decoded messages with [`pop_message`](Self::pop_message),
///   forwarding any [`Message::DeviceCommand`] to the dispatcher,
/// - while [`is_assigned`](Self::is_assigned) is false and a controller is
///   known, call [`send_hello`](Self::send_hello) once per iteration. The
///   polling cadence is the retry mechanism; there are no internal timers.
pub struct ProtocolDriver<T: BusTransport> {
    transport: T,
    board_id: BoardId,
    /// None until a `SetAddress` grant names this board.
    my_address: Option<Address>,
    /// None until a `Hello` carrying [`BoardId::CONTROLLER`] arrives; first
    /// sender wins and the value never changes for the process lifetime.
    /// There is no mechanism for a restarted controller to clear it.
    controller: Option<Address>,
    inbound: Queue<Inbound, INBOUND_DEPTH>,
}

impl<T: BusTransport> ProtocolDriver<T> {
    pub fn new(transport: T, board_id: BoardId) -> Self {
        Self {
            transport,
            board_id,
            my_address: None,
            controller: None,
            inbound: Queue::new(),
        }
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn my_address(&self) -> Option<Address> {
        self.my_address
    }

    pub fn controller(&self) -> Option<Address> {
        self.controller
    }

    pub fn is_assigned(&self) -> bool {
        self.my_address.is_some()
    }

    /// The underlying transport, e.g. for servicing its receive path.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Queues one raw frame from the transport's receive path.
    ///
    /// Overflow policy is reject-newest: when the queue is full the incoming
    /// frame is dropped and already-queued frames are untouched. Frames
    /// longer than [`MAX_FRAME_LEN`] are dropped here as line noise.
    pub fn push_inbound(&mut self, sender: Address, command: u8, payload: &[u8]) {
        if payload.len() > MAX_FRAME_LEN {
            log::warn!(
                "Dropping {} byte frame from {:?}, larger than any known message",
                payload.len(),
                sender
            );
            return;
        }
        let frame = Inbound {
            sender,
            command,
            payload: Vec::from_slice(payload).unwrap(),
        };
        if self.inbound.enqueue(frame).is_err() {
            log::warn!("Inbound queue full, dropping frame from {:?}", sender);
        }
    }

    /// Pops and decodes at most one queued frame, applying the addressing
    /// state machine before handing the message to the caller.
    ///
    /// Returns `None` when the queue is empty or the popped frame was
    /// malformed or unknown; both are logged and dropped, never fatal.
    pub fn pop_message(&mut self) -> Option<Message> {
        let frame = self.inbound.dequeue()?;
        let msg = match Message::decode(frame.command, &frame.payload) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!(
                    "Malformed {:?} payload from {:?}: expected {} bytes, got {}",
                    e.kind,
                    frame.sender,
                    e.expected,
                    e.actual
                );
                return None;
            }
        };
        match msg {
            Message::Hello { board_id } => self.on_hello(frame.sender, board_id),
            Message::SetAddress { board_id, address } => self.on_set_address(board_id, address),
            Message::DeviceCommand { .. } => {
                // Forwarded as-is. Whether the frame actually targeted this
                // board's current address is not checked here; the transport
                // decides what this board observes.
            }
            Message::Unknown { command } => {
                log::debug!("Ignoring unknown command {:#04x} from {:?}", command, frame.sender);
                return None;
            }
        }
        Some(msg)
    }

    /// Sends one `Hello` carrying this board's identity.
    ///
    /// An unassigned responder directs it at the discovered controller; with
    /// no controller known it goes to the general call, which is also how a
    /// controller announces itself. A failed attempt is logged and returned,
    /// not retried; the caller re-invokes on its own polling cadence.
    pub fn send_hello(&mut self) -> Result<(), BusError> {
        let dst = self.controller.unwrap_or(Address::GeneralCall);
        let msg = Message::Hello {
            board_id: self.board_id,
        };
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = msg.encode(&mut buf);
        let result = self.transport.try_send(dst, msg.command(), &buf[..len]);
        if let Err(e) = result {
            log::warn!("Hello to {:?} failed: {:?}", dst, e);
        }
        result
    }

    fn on_hello(&mut self, sender: Address, board_id: BoardId) {
        if board_id != BoardId::CONTROLLER {
            // A peer asking for an address; only a controller acts on that.
            return;
        }
        if self.controller.is_some() {
            // First responder wins.
            return;
        }
        log::info!("Controller discovered at {:?}", sender);
        self.controller = Some(sender);
    }

    fn on_set_address(&mut self, board_id: BoardId, address: Address) {
        if board_id != self.board_id {
            return;
        }
        if self.my_address == Some(address) {
            log::debug!("Re-grant of {:?}, already listening", address);
            return;
        }
        if address == Address::GeneralCall {
            log::warn!("Refusing grant of the general-call address");
            return;
        }
        if let Some(old) = self.my_address.take() {
            if let Err(e) = self.transport.stop_listening(old) {
                log::warn!("Failed to stop listening on {:?}: {:?}", old, e);
            }
        }
        // Between stop_listening and listen this board holds no responder
        // address; frames addressed to it in that window are lost.
        if let Err(e) = self.transport.listen(address) {
            log::warn!("Failed to listen on {:?}: {:?}", address, e);
        }
        self.my_address = Some(address);
        log::info!("Assigned bus address {:?}", address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{CMD_HELLO, CMD_SET_ADDRESS};

    const MY_ID: BoardId = BoardId::new([0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80]);
    const OTHER_ID: BoardId = BoardId::new([0x11, 0x21, 0x31, 0x41, 0x51, 0x61, 0x71, 0x81]);

    #[derive(Debug, PartialEq, Eq)]
    enum BusOp {
        Send(Address, u8, std::vec::Vec<u8>),
        Listen(Address),
        StopListening(Address),
    }

    #[derive(Default)]
    struct FakeBus {
        ops: std::vec::Vec<BusOp>,
        fail_sends: bool,
    }

    impl BusTransport for FakeBus {
        fn try_send(&mut self, dst: Address, command: u8, payload: &[u8]) -> Result<(), BusError> {
            self.ops.push(BusOp::Send(dst, command, payload.to_vec()));
            if self.fail_sends {
                Err(BusError::Nack)
            } else {
                Ok(())
            }
        }

        fn listen(&mut self, address: Address) -> Result<(), BusError> {
            self.ops.push(BusOp::Listen(address));
            Ok(())
        }

        fn stop_listening(&mut self, address: Address) -> Result<(), BusError> {
            self.ops.push(BusOp::StopListening(address));
            Ok(())
        }
    }

    fn driver() -> ProtocolDriver<FakeBus> {
        ProtocolDriver::new(FakeBus::default(), MY_ID)
    }

    fn push(driver: &mut ProtocolDriver<FakeBus>, sender: Address, msg: Message) {
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let len = msg.encode(&mut buf);
        driver.push_inbound(sender, msg.command(), &buf[..len]);
    }

    #[test]
    fn controller_discovery_is_first_wins() {
        let mut d = driver();
        push(&mut d, Address::Device(0x10), Message::Hello { board_id: BoardId::CONTROLLER });
        assert!(d.pop_message().is_some());
        assert_eq!(d.controller(), Some(Address::Device(0x10)));

        push(&mut d, Address::Device(0x22), Message::Hello { board_id: BoardId::CONTROLLER });
        assert!(d.pop_message().is_some());
        assert_eq!(d.controller(), Some(Address::Device(0x10)));
    }

    #[test]
    fn peer_hello_is_not_a_controller() {
        let mut d = driver();
        push(&mut d, Address::Device(0x33), Message::Hello { board_id: OTHER_ID });
        assert!(d.pop_message().is_some());
        assert_eq!(d.controller(), None);
    }

    #[test]
    fn send_hello_targets_the_controller_with_my_id() {
        let mut d = driver();
        push(&mut d, Address::Device(0x10), Message::Hello { board_id: BoardId::CONTROLLER });
        d.pop_message();

        assert_eq!(d.send_hello(), Ok(()));
        assert_eq!(
            d.transport.ops,
            vec![BusOp::Send(
                Address::Device(0x10),
                CMD_HELLO,
                MY_ID.as_bytes().to_vec()
            )]
        );
    }

    #[test]
    fn send_hello_without_controller_goes_to_general_call() {
        let mut d = driver();
        assert_eq!(d.send_hello(), Ok(()));
        assert_eq!(
            d.transport.ops,
            vec![BusOp::Send(
                Address::GeneralCall,
                CMD_HELLO,
                MY_ID.as_bytes().to_vec()
            )]
        );
    }

    #[test]
    fn send_hello_reports_transport_failure() {
        let mut d = driver();
        d.transport.fail_sends = true;
        assert_eq!(d.send_hello(), Err(BusError::Nack));
        assert_eq!(d.transport.ops.len(), 1);
    }

    #[test]
    fn grant_enables_the_new_listen_address() {
        let mut d = driver();
        push(
            &mut d,
            Address::Device(0x10),
            Message::SetAddress { board_id: MY_ID, address: Address::Device(5) },
        );
        assert!(d.pop_message().is_some());
        assert_eq!(d.my_address(), Some(Address::Device(5)));
        assert!(d.is_assigned());
        assert_eq!(d.transport.ops, vec![BusOp::Listen(Address::Device(5))]);
    }

    #[test]
    fn regrant_of_current_address_toggles_nothing() {
        let mut d = driver();
        let grant = Message::SetAddress { board_id: MY_ID, address: Address::Device(5) };
        push(&mut d, Address::Device(0x10), grant);
        d.pop_message();
        d.transport.ops.clear();

        push(&mut d, Address::Device(0x10), grant);
        assert!(d.pop_message().is_some());
        assert_eq!(d.my_address(), Some(Address::Device(5)));
        assert!(d.transport.ops.is_empty());
    }

    #[test]
    fn regrant_of_a_new_address_replaces_the_old_listen() {
        let mut d = driver();
        push(
            &mut d,
            Address::Device(0x10),
            Message::SetAddress { board_id: MY_ID, address: Address::Device(5) },
        );
        d.pop_message();
        d.transport.ops.clear();

        push(
            &mut d,
            Address::Device(0x10),
            Message::SetAddress { board_id: MY_ID, address: Address::Device(9) },
        );
        d.pop_message();
        assert_eq!(d.my_address(), Some(Address::Device(9)));
        assert_eq!(
            d.transport.ops,
            vec![
                BusOp::StopListening(Address::Device(5)),
                BusOp::Listen(Address::Device(9)),
            ]
        );
    }

    #[test]
    fn grant_for_another_board_is_ignored() {
        let mut d = driver();
        push(
            &mut d,
            Address::Device(0x10),
            Message::SetAddress { board_id: OTHER_ID, address: Address::Device(5) },
        );
        assert!(d.pop_message().is_some());
        assert_eq!(d.my_address(), None);
        assert!(d.transport.ops.is_empty());
    }

    #[test]
    fn grant_of_the_general_call_is_refused() {
        let mut d = driver();
        push(
            &mut d,
            Address::Device(0x10),
            Message::SetAddress { board_id: MY_ID, address: Address::GeneralCall },
        );
        assert!(d.pop_message().is_some());
        assert_eq!(d.my_address(), None);
        assert!(d.transport.ops.is_empty());
    }

    #[test]
    fn malformed_frames_are_dropped_without_state_change() {
        let mut d = driver();
        d.push_inbound(Address::Device(0x10), CMD_SET_ADDRESS, &[1, 2, 3]);
        assert_eq!(d.pop_message(), None);
        assert_eq!(d.my_address(), None);
        assert_eq!(d.controller(), None);
    }

    #[test]
    fn unknown_frames_are_swallowed() {
        let mut d = driver();
        d.push_inbound(Address::Device(0x10), 0x6f, &[0xaa]);
        assert_eq!(d.pop_message(), None);
    }

    #[test]
    fn oversized_frames_are_dropped_at_ingress() {
        let mut d = driver();
        d.push_inbound(Address::Device(0x10), CMD_HELLO, &[0u8; MAX_FRAME_LEN + 1]);
        assert_eq!(d.pop_message(), None);
    }

    #[test]
    fn overflow_rejects_the_newest_frame() {
        let mut d = driver();
        // Fill the queue (usable capacity is INBOUND_DEPTH - 1), then one more.
        for n in 0..INBOUND_DEPTH as u32 {
            push(
                &mut d,
                Address::Device(0x10),
                Message::DeviceCommand { module: 0, command: 0, value: n },
            );
        }
        let mut seen = std::vec::Vec::new();
        while let Some(Message::DeviceCommand { value, .. }) = d.pop_message() {
            seen.push(value);
        }
        let expected: std::vec::Vec<u32> = (0..INBOUND_DEPTH as u32 - 1).collect();
        assert_eq!(seen, expected);
    }
}
