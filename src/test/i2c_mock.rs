// SPDX-License-Identifier: Apache-2.0
extern crate alloc;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell};

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;

use crate::driver::NUM_PIXELS;

/// The number of bytes in the pixel temperature register block.
const PIXEL_DATA_LENGTH: usize = NUM_PIXELS * 2;

/// The thermistor reading the mock answers with while awake, 26.5 ℃.
const DEFAULT_THERMISTOR: [u8; 2] = [0xA8, 0x01];

/// The thermistor reading a sleeping sensor reports.
const ASLEEP_THERMISTOR: [u8; 2] = [0x00, 0x80];

#[derive(Copy, Clone, Debug)]
pub(crate) enum MockError {
    /// An unknown I2C address was given.
    UnknownI2cAddress(u8),

    /// The given register shouldn't be read.
    IllegalReadRegister(u8),

    /// The given register should not be written to.
    IllegalWriteRegister(u8),

    /// The given value is illegal for the given register.
    IllegalWriteValue(u8, u8),

    /// The given register doesn't exist on the device.
    UnknownRegister(u8),

    /// The requested operation is not allowed.
    ///
    /// This covers situations such as:
    /// * A write transaction carrying no payload after the register address.
    /// * A read or write running past the end of a register.
    /// * A combined write-read transaction writing more than just the register address.
    IllegalOperation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum I2cOperation {
    Write { register: u8, length: usize },
    Read { register: u8, length: usize },
}

/// The register file of a simulated Grid-EYE.
///
/// Starts in the sensor's power-on state: normal mode, 10 FPS, interrupts disabled, all flags
/// clear, and a plausible room temperature on the thermistor.
#[derive(Clone, Debug)]
struct RegisterFile {
    mode: u8,
    frame_rate: u8,
    interrupt_control: u8,
    status: u8,
    average: u8,
    interrupt_levels: [u8; 6],
    thermistor: [u8; 2],
    pixel_interrupts: [u8; 8],
    pixel_data: [u8; PIXEL_DATA_LENGTH],

    /// How many writes of the moving average handshake have arrived in order.
    handshake_progress: usize,

    /// The average mode byte a completed handshake will apply.
    handshake_mode: u8,
}

impl RegisterFile {
    fn new() -> Self {
        RegisterFile {
            mode: 0x00,
            frame_rate: 0x00,
            interrupt_control: 0x00,
            status: 0x00,
            average: 0x00,
            interrupt_levels: [0x00; 6],
            thermistor: DEFAULT_THERMISTOR,
            pixel_interrupts: [0x00; 8],
            pixel_data: [0x00; PIXEL_DATA_LENGTH],
            handshake_progress: 0,
            handshake_mode: 0x00,
        }
    }

    /// Advance the moving average handshake by one write.
    ///
    /// The real sensor only applies the requested mode once the full five-byte sequence has
    /// arrived in exact order; an out-of-order byte discards the progress made so far.
    fn average_command(&mut self, value: u8) {
        self.handshake_progress = match (self.handshake_progress, value) {
            (0, 0x50) => 1,
            (1, 0x45) => 2,
            (2, 0x57) => 3,
            (3, 0x20) | (3, 0x00) => {
                self.handshake_mode = value;
                4
            }
            (4, 0x00) => {
                self.average = self.handshake_mode;
                0
            }
            _ => 0,
        };
    }
}

/// A mock I²C bus with a single simulated Grid-EYE on it.
///
/// The register file and operation log are behind shared references, so the mock can be cloned
/// and handed to a driver while the test keeps a handle for inspecting what the driver did and
/// for poking sensor-written registers like the status flags and pixel data.
#[derive(Clone, Debug)]
pub(crate) struct MockGridEyeBus {
    i2c_address: u8,
    registers: Rc<RefCell<RegisterFile>>,
    recent_operations: Rc<RefCell<Vec<I2cOperation>>>,
}

impl MockGridEyeBus {
    pub(crate) fn new(i2c_address: u8) -> Self {
        MockGridEyeBus {
            i2c_address,
            registers: Rc::new(RefCell::new(RegisterFile::new())),
            recent_operations: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Whether the mode register holds the sleep command.
    pub(crate) fn asleep(&self) -> bool {
        self.registers.borrow().mode == 0x10
    }

    /// Overwrite the latched status flags.
    pub(crate) fn set_status(&self, status: u8) {
        self.registers.borrow_mut().status = status;
    }

    /// Overwrite the thermistor bytes reported while awake.
    pub(crate) fn set_thermistor(&self, bytes: [u8; 2]) {
        self.registers.borrow_mut().thermistor = bytes;
    }

    /// Overwrite the pixel temperature registers, in bus order.
    pub(crate) fn set_pixel_data(&self, data: &[u8]) {
        self.registers.borrow_mut().pixel_data.copy_from_slice(data);
    }

    /// Overwrite the pixel interrupt flag registers, in bus order.
    pub(crate) fn set_pixel_interrupts(&self, flags: [u8; 8]) {
        self.registers.borrow_mut().pixel_interrupts = flags;
    }

    /// The successful operations seen so far, oldest first.
    pub(crate) fn recent_operations(&self) -> Ref<Vec<I2cOperation>> {
        self.recent_operations.borrow()
    }

    pub(crate) fn clear_recent_operations(&self) {
        self.recent_operations.borrow_mut().clear()
    }

    fn add_operation(&self, operation: I2cOperation) {
        self.recent_operations.borrow_mut().push(operation);
    }

    /// Read `buffer.len()` bytes starting at the given register.
    fn get(&self, register: u8, buffer: &mut [u8]) -> Result<(), MockError> {
        if buffer.is_empty() {
            return Err(MockError::IllegalOperation);
        }
        let registers = self.registers.borrow();
        let length = buffer.len();
        match (register, length) {
            (0x00, 1) => buffer[0] = registers.mode,
            (0x02, 1) => buffer[0] = registers.frame_rate,
            (0x03, 1) => buffer[0] = registers.interrupt_control,
            // The sensor holds the interrupt flag high while interrupts are disabled.
            (0x04, 1) => {
                buffer[0] = if registers.interrupt_control & 0x01 == 0 {
                    registers.status | 0x02
                } else {
                    registers.status
                }
            }
            (0x07, 1) => buffer[0] = registers.average,
            (0x08..=0x0D, _) if register as usize + length <= 0x0E => {
                let offset = (register - 0x08) as usize;
                buffer.copy_from_slice(&registers.interrupt_levels[offset..offset + length]);
            }
            (0x0E..=0x0F, _) if register as usize + length <= 0x10 => {
                let source = if registers.mode == 0x10 {
                    &ASLEEP_THERMISTOR
                } else {
                    &registers.thermistor
                };
                let offset = (register - 0x0E) as usize;
                buffer.copy_from_slice(&source[offset..offset + length]);
            }
            (0x10..=0x17, _) if (register - 0x10) as usize + length <= 8 => {
                let offset = (register - 0x10) as usize;
                buffer.copy_from_slice(&registers.pixel_interrupts[offset..offset + length]);
            }
            (0x80..=0xFF, _) if (register - 0x80) as usize + length <= PIXEL_DATA_LENGTH => {
                let offset = (register - 0x80) as usize;
                buffer.copy_from_slice(&registers.pixel_data[offset..offset + length]);
            }
            _ => return Err(MockError::IllegalReadRegister(register)),
        }
        Ok(())
    }

    /// Write the payload starting at the given register, applying the device's side effects.
    fn set(&self, register: u8, payload: &[u8]) -> Result<(), MockError> {
        let mut registers = self.registers.borrow_mut();
        match (register, payload.len()) {
            (0x00, 1) => {
                let value = payload[0];
                if value != 0x00 && value != 0x10 {
                    return Err(MockError::IllegalWriteValue(register, value));
                }
                registers.mode = value;
            }
            (0x01, 1) => {
                let value = payload[0];
                if value != 0x3F && value != 0x30 {
                    return Err(MockError::IllegalWriteValue(register, value));
                }
                // Both reset commands return the latched flags to their defaults.
                registers.status = 0x00;
                registers.pixel_interrupts = [0x00; 8];
            }
            (0x02, 1) => {
                let value = payload[0];
                if value != 0x00 && value != 0x01 {
                    return Err(MockError::IllegalWriteValue(register, value));
                }
                registers.frame_rate = value;
            }
            (0x03, 1) => {
                let value = payload[0];
                if value & !0x03 != 0 {
                    return Err(MockError::IllegalWriteValue(register, value));
                }
                registers.interrupt_control = value;
            }
            (0x05, 1) => {
                let value = payload[0];
                if value & !0x06 != 0 {
                    return Err(MockError::IllegalWriteValue(register, value));
                }
                // Each set bit clears the matching latched flag.
                registers.status &= !value;
            }
            (0x08..=0x0D, length) if register as usize + length <= 0x0E => {
                let offset = (register - 0x08) as usize;
                // The upper nibble of each level's high byte is reserved.
                for (index, byte) in payload.iter().enumerate() {
                    if (offset + index) % 2 == 1 && byte & 0xF0 != 0 {
                        return Err(MockError::IllegalWriteValue(register + index as u8, *byte));
                    }
                }
                registers.interrupt_levels[offset..offset + length].copy_from_slice(payload);
            }
            (0x1F, 1) => registers.average_command(payload[0]),
            (0x04 | 0x07 | 0x0E | 0x0F, _) | (0x10..=0x17, _) | (0x80..=0xFF, _) => {
                return Err(MockError::IllegalWriteRegister(register))
            }
            (0x00..=0x03 | 0x05 | 0x08..=0x0D | 0x1F, _) => {
                return Err(MockError::IllegalOperation)
            }
            _ => return Err(MockError::UnknownRegister(register)),
        }
        Ok(())
    }
}

impl i2c::Write for MockGridEyeBus {
    type Error = MockError;

    fn write(&mut self, i2c_address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        if i2c_address != self.i2c_address {
            return Err(MockError::UnknownI2cAddress(i2c_address));
        }
        // The first byte of a write is the register address, the rest is the payload.
        if bytes.len() < 2 {
            return Err(MockError::IllegalOperation);
        }
        let register = bytes[0];
        let payload = &bytes[1..];
        self.set(register, payload)?;
        self.add_operation(I2cOperation::Write {
            register,
            length: payload.len(),
        });
        Ok(())
    }
}

impl i2c::WriteRead for MockGridEyeBus {
    type Error = MockError;

    fn write_read(
        &mut self,
        i2c_address: u8,
        write_buffer: &[u8],
        out_buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        if i2c_address != self.i2c_address {
            return Err(MockError::UnknownI2cAddress(i2c_address));
        }
        // Reads should only be writing the register address.
        if write_buffer.len() != 1 {
            return Err(MockError::IllegalOperation);
        }
        let register = write_buffer[0];
        self.get(register, out_buffer)?;
        self.add_operation(I2cOperation::Read {
            register,
            length: out_buffer.len(),
        });
        Ok(())
    }
}

/// A delay provider that records every requested delay instead of waiting it out.
#[derive(Clone, Debug, Default)]
pub(crate) struct MockDelay {
    delays: Rc<RefCell<Vec<u16>>>,
}

impl MockDelay {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The delays requested so far, in milliseconds, oldest first.
    pub(crate) fn recorded(&self) -> Ref<Vec<u16>> {
        self.delays.borrow()
    }

    pub(crate) fn clear(&self) {
        self.delays.borrow_mut().clear()
    }
}

impl DelayMs<u16> for MockDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.delays.borrow_mut().push(ms);
    }
}
