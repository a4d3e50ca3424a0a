// SPDX-License-Identifier: Apache-2.0

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;

use crate::conversion::{flags_from_byte, temperature_from_bytes, thermistor_from_bytes};
use crate::error::Error;
use crate::register::*;
use crate::util::is_bit_set;

/// The I²C address the Grid-EYE uses unless its address select pin is pulled low.
pub const DEFAULT_ADDRESS: u8 = 0x69;

/// The width of the thermal image, in pixels.
pub const WIDTH: usize = 8;

/// The height of the thermal image, in pixels.
pub const HEIGHT: usize = 8;

/// The total number of pixels in the thermal image.
pub const NUM_PIXELS: usize = WIDTH * HEIGHT;

/// The number of bytes in one row of pixel temperature registers.
const ROW_STRIDE: usize = WIDTH * 2;

/// Settle time after writing the mode register, in milliseconds.
const MODE_SETTLE_MILLIS: u16 = 50;

/// Settle time after an initial reset, in milliseconds.
const RESET_SETTLE_MILLIS: u16 = 2;

/// The thermistor reading reported while the sensor is powered down.
///
/// A sleeping sensor answers 0x8000 on the thermistor registers, which the sign-magnitude
/// decode maps to exactly 2048.0, far outside the thermistor's real measurement range.
const THERMISTOR_ASLEEP: f32 = 2048.0;

/// Driver for the Panasonic AMG88xx Grid-EYE thermal sensors.
///
/// The sensor powers up asleep, and constructing the driver puts it back to sleep to establish
/// a known starting state, so a [`wake`][Self::wake] is always needed before measuring. The
/// [`powered`][Self::powered] method brackets a measurement session between the two
/// transitions. Waking is slow: the sensor needs an initial reset and then two full frames of
/// warm-up before its data is valid.
///
/// The driver holds no cache of device state; every query goes out over the bus. The sensor's
/// registers are exclusively owned by one driver instance, and nothing here is safe to share
/// across threads without external locking.
#[derive(Clone, Debug)]
pub struct GridEye<I2C, D> {
    /// The I²C bus this sensor is accessible on.
    bus: I2C,

    /// The delay provider used for the hardware settle times.
    delay: D,

    /// The I²C address this sensor is accessible at.
    address: u8,
}

impl<I2C, D> GridEye<I2C, D>
where
    I2C: i2c::WriteRead + i2c::Write,
    D: DelayMs<u16>,
{
    /// Create a `GridEye` for accessing the sensor at the given I²C address.
    ///
    /// Grid-EYEs answer at one of two addresses depending on the address select pin; the usual
    /// one is [`DEFAULT_ADDRESS`]. The sensor is put to sleep as part of construction.
    pub fn new(bus: I2C, delay: D, address: u8) -> Result<Self, Error<I2C>> {
        let mut sensor = Self {
            bus,
            delay,
            address,
        };
        sensor.sleep()?;
        Ok(sensor)
    }

    /// Whether the sensor is in sleep mode.
    ///
    /// This is computed from the sensor on every call rather than tracked in the driver, so it
    /// stays correct across resets the driver didn't perform. A sleeping sensor reports a
    /// fixed out-of-range sentinel on its thermistor registers.
    #[allow(clippy::float_cmp)]
    pub fn asleep(&mut self) -> Result<bool, Error<I2C>> {
        Ok(self.thermistor()? == THERMISTOR_ASLEEP)
    }

    /// Put the sensor into sleep mode.
    ///
    /// While asleep the sensor only answers mode register writes; wake it before taking any
    /// measurements. Does nothing if the sensor is already asleep.
    pub fn sleep(&mut self) -> Result<(), Error<I2C>> {
        if !self.asleep()? {
            self.write_register(Register::Mode, &[OperatingMode::Sleep.into()])?;
            self.delay.delay_ms(MODE_SETTLE_MILLIS);
        }
        Ok(())
    }

    /// Wake the sensor from sleep mode.
    ///
    /// A freshly woken sensor needs an initial reset and at least two full frames before its
    /// measurements are valid. This method performs the reset, clears the stale flags it
    /// leaves behind, and waits out the warm-up, so it can block for up to three seconds at
    /// the low frame rate. Does nothing if the sensor is already awake.
    pub fn wake(&mut self) -> Result<(), Error<I2C>> {
        if self.asleep()? {
            self.write_register(Register::Mode, &[OperatingMode::Normal.into()])?;
            self.delay.delay_ms(MODE_SETTLE_MILLIS);
            self.write_register(Register::Reset, &[ResetCommand::Initial.into()])?;
            self.delay.delay_ms(RESET_SETTLE_MILLIS);
            self.reset_flags()?;
            let warmup = self.frame_rate()?.warmup_millis();
            self.delay.delay_ms(warmup);
        }
        Ok(())
    }

    /// Run a measurement session with the sensor awake, returning it to sleep afterwards.
    ///
    /// The sensor is woken, the closure is run, and the sensor is put back to sleep no matter
    /// how the closure exits, so it always ends up in low-power mode. A failure from the
    /// closure takes precedence over a failure from the sleep transition.
    pub fn powered<T, F>(&mut self, session: F) -> Result<T, Error<I2C>>
    where
        F: FnOnce(&mut Self) -> Result<T, Error<I2C>>,
    {
        self.wake()?;
        let result = session(self);
        let cleanup = self.sleep();
        let value = result?;
        cleanup?;
        Ok(value)
    }

    /// Read the frame rate from the sensor.
    ///
    /// The power-on default is [10 FPS][FrameRate::High].
    pub fn frame_rate(&mut self) -> Result<FrameRate, Error<I2C>> {
        let [raw] = self.read_register::<1>(Register::FrameRate)?;
        Ok(FrameRate::from_raw(raw)?)
    }

    /// Set the sensor's frame rate.
    pub fn set_frame_rate(&mut self, frame_rate: FrameRate) -> Result<(), Error<I2C>> {
        self.write_register(Register::FrameRate, &[frame_rate.as_raw()])
    }

    /// Check if the moving average mode is enabled.
    pub fn moving_average(&mut self) -> Result<bool, Error<I2C>> {
        let [average] = self.read_register::<1>(Register::Average)?;
        Ok(is_bit_set(average, MOVING_AVERAGE_BIT))
    }

    /// Enable (or disable) the moving average mode.
    ///
    /// The average register is gated behind a vendor-defined handshake: three unlock bytes,
    /// the requested mode, then a closing byte, written one at a time in exact order with
    /// nothing interleaved.
    pub fn set_moving_average(&mut self, enabled: bool) -> Result<(), Error<I2C>> {
        for unlock_byte in AVERAGE_UNLOCK {
            self.write_register(Register::AverageCommand, &[unlock_byte])?;
        }
        let mode = (enabled as u8) << MOVING_AVERAGE_BIT;
        self.write_register(Register::AverageCommand, &[mode])?;
        self.write_register(Register::AverageCommand, &[AVERAGE_LOCK])
    }

    /// Read the sensor's own temperature from the on-board thermistor, in degrees Celsius.
    pub fn thermistor(&mut self) -> Result<f32, Error<I2C>> {
        let [lsb, msb] = self.read_register::<2>(Register::Thermistor)?;
        Ok(thermistor_from_bytes(lsb, msb))
    }

    /// Read a thermal image, as an 8×8 matrix of pixel temperatures in degrees Celsius.
    ///
    /// The matrix is in row-major order with the origin at the top left. The pixel registers
    /// are read one row at a time; the transport can't transfer the full frame in a single
    /// transaction.
    pub fn image(&mut self) -> Result<[[f32; WIDTH]; HEIGHT], Error<I2C>> {
        let mut rows = [[0u8; ROW_STRIDE]; HEIGHT];
        for (index, row) in rows.iter_mut().enumerate() {
            let register = u8::from(Register::PixelBase) + (index * ROW_STRIDE) as u8;
            self.bus
                .write_read(self.address, &[register], row)
                .map_err(Error::I2cWriteReadError)?;
        }
        // The sensor scans bottom-to-top and right-to-left relative to the image convention,
        // so rows and the byte pairs within them are both consumed in reverse.
        let mut image = [[0f32; WIDTH]; HEIGHT];
        for (destination, row) in image.iter_mut().zip(rows.iter().rev()) {
            for (pixel, pair) in destination.iter_mut().zip(row.chunks_exact(2).rev()) {
                *pixel = temperature_from_bytes(pair[0], pair[1]);
            }
        }
        Ok(image)
    }

    /// Clear the latched interrupt and overflow flags, as well as the pixel interrupt flags.
    pub fn reset_flags(&mut self) -> Result<(), Error<I2C>> {
        self.write_register(Register::Reset, &[ResetCommand::Flags.into()])
    }

    /// Disable the interrupt output by writing an all-zero configuration.
    ///
    /// Note that the sensor holds the [`interrupt`][Self::interrupt] flag high while
    /// interrupts are disabled.
    pub fn disable_interrupts(&mut self) -> Result<(), Error<I2C>> {
        self.set_interrupt_config(InterruptConfig::disabled())
    }

    /// Read the interrupt configuration from the sensor.
    pub fn interrupt_config(&mut self) -> Result<InterruptConfig, Error<I2C>> {
        let [control] = self.read_register::<1>(Register::InterruptControl)?;
        let levels = self.read_register::<6>(Register::InterruptLevels)?;
        Ok(InterruptConfig::from_registers(control, &levels))
    }

    /// Write a new interrupt configuration to the sensor.
    ///
    /// The level registers are written before the control register, as the control settings
    /// apply to whatever levels are committed. Changing the levels can leave a stale latched
    /// interrupt from the old configuration behind, so the interrupt flag is reset afterwards
    /// (the pixel and overflow flags are left alone). A failure partway through leaves the
    /// sensor with a mix of old and new settings; nothing is rolled back.
    pub fn set_interrupt_config(&mut self, config: InterruptConfig) -> Result<(), Error<I2C>> {
        self.write_register(Register::InterruptLevels, &config.level_bytes())?;
        self.write_register(Register::InterruptControl, &[config.control_byte()])?;
        self.reset_interrupt()
    }

    /// The latched interrupt flag.
    ///
    /// Set when any pixel breaches the configured levels. The sensor holds this flag high
    /// while interrupts are disabled.
    pub fn interrupt(&mut self) -> Result<bool, Error<I2C>> {
        let [status] = self.read_register::<1>(Register::Status)?;
        Ok(is_bit_set(status, STATUS_INTERRUPT_BIT))
    }

    /// Clear the latched interrupt flag without touching the pixel interrupt flags.
    pub fn reset_interrupt(&mut self) -> Result<(), Error<I2C>> {
        self.write_register(Register::StatusClear, &[StatusClear::Interrupt.into()])
    }

    /// The latched overflow flag, set when the sensor's ADC has overflowed.
    pub fn overflow(&mut self) -> Result<bool, Error<I2C>> {
        let [status] = self.read_register::<1>(Register::Status)?;
        Ok(is_bit_set(status, STATUS_OVERFLOW_BIT))
    }

    /// Clear the latched overflow flag.
    pub fn reset_overflow(&mut self) -> Result<(), Error<I2C>> {
        self.write_register(Register::StatusClear, &[StatusClear::Overflow.into()])
    }

    /// Read the per-pixel interrupt flags, as an 8×8 matrix matching the
    /// [`image`][Self::image] ordering.
    pub fn pixel_interrupts(&mut self) -> Result<[[bool; WIDTH]; HEIGHT], Error<I2C>> {
        let flags = self.read_register::<HEIGHT>(Register::PixelInterrupts)?;
        let mut matrix = [[false; WIDTH]; HEIGHT];
        for (destination, row) in matrix.iter_mut().zip(flags.iter().rev()) {
            *destination = flags_from_byte(*row);
        }
        Ok(matrix)
    }

    fn read_register<const LENGTH: usize>(
        &mut self,
        register: Register,
    ) -> Result<[u8; LENGTH], Error<I2C>> {
        read_register(&mut self.bus, self.address, register.into())
    }

    fn write_register(&mut self, register: Register, data: &[u8]) -> Result<(), Error<I2C>> {
        write_register(&mut self.bus, self.address, register.into(), data)
    }
}

/// Read `LENGTH` bytes starting at the given register.
fn read_register<I2C, const LENGTH: usize>(
    bus: &mut I2C,
    i2c_address: u8,
    register: u8,
) -> Result<[u8; LENGTH], Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    let mut buffer = [0u8; LENGTH];
    bus.write_read(i2c_address, &[register], &mut buffer)
        .map_err(Error::I2cWriteReadError)?;
    Ok(buffer)
}

/// Write the given bytes starting at the given register, as a single transaction.
fn write_register<I2C>(
    bus: &mut I2C,
    i2c_address: u8,
    register: u8,
    data: &[u8],
) -> Result<(), Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    // The longest payload the driver writes is the six interrupt level bytes.
    let mut combined = [0u8; 7];
    combined[0] = register;
    combined[1..=data.len()].copy_from_slice(data);
    bus.write(i2c_address, &combined[..=data.len()])
        .map_err(Error::I2cWriteError)
}
