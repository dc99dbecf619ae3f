use crate::traits::DeviceDriver;

/// Forwarding boundary between the protocol core and the device driver.
///
/// A decoded device command goes through unchanged: no bounds check on the
/// module index, no interpretation of the command code. What the numbers
/// mean is entirely the driver's business.
pub struct Dispatcher<D: DeviceDriver> {
    device: D,
}

impl<D: DeviceDriver> Dispatcher<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn dispatch(&mut self, module: u8, command: u8, value: u32) {
        log::debug!(
            "Device command {:#04x} for module {} with value {}",
            command,
            module,
            value
        );
        self.device.execute(module, command, value);
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}
