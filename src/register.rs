// SPDX-License-Identifier: Apache-2.0

use core::convert::TryFrom;
use core::str::FromStr;

use num_enum::IntoPrimitive;

use crate::conversion::{temperature_from_bytes, temperature_to_bytes};
use crate::error::LibraryError;
use crate::util::is_bit_set;

/// Register addresses of the Grid-EYE.
///
/// All registers are a single byte wide unless noted otherwise.
// NOTE: To make it easier to compare against the datasheet, discriminant values should *always* be
// explicitly written out.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive)]
#[repr(u8)]
pub(crate) enum Register {
    /// Operating mode (normal or sleep).
    Mode = 0x00,

    /// Reset command register.
    Reset = 0x01,

    /// Frame rate selection.
    FrameRate = 0x02,

    /// Interrupt control: bit 0 enables interrupts, bit 1 selects absolute mode.
    InterruptControl = 0x03,

    /// Latched status flags: bit 1 interrupt, bit 2 overflow. Read-only.
    Status = 0x04,

    /// Status clear commands.
    StatusClear = 0x05,

    /// Averaging status: bit 5 is the moving average flag.
    Average = 0x07,

    /// Interrupt levels: upper limit, lower limit, and hysteresis, two bytes each.
    InterruptLevels = 0x08,

    /// Thermistor temperature, two bytes. Read-only.
    Thermistor = 0x0E,

    /// Pixel interrupt flags, one byte per row. Read-only.
    PixelInterrupts = 0x10,

    /// Target of the moving average unlock handshake.
    AverageCommand = 0x1F,

    /// First pixel temperature register; later rows follow at 16-byte strides.
    PixelBase = 0x80,
}

/// Commands accepted by the mode register.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub(crate) enum OperatingMode {
    Normal = 0x00,
    Sleep = 0x10,
}

/// Commands accepted by the reset register.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub(crate) enum ResetCommand {
    /// Full initial reset, required once after waking.
    Initial = 0x3F,

    /// Clear the interrupt, overflow, and pixel interrupt flags.
    Flags = 0x30,
}

/// Commands accepted by the status clear register.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub(crate) enum StatusClear {
    /// Clear the latched interrupt flag.
    Interrupt = 0x02,

    /// Clear the latched overflow flag.
    Overflow = 0x04,
}

/// Bit position of the interrupt flag in the status register.
pub(crate) const STATUS_INTERRUPT_BIT: usize = 1;

/// Bit position of the overflow flag in the status register.
pub(crate) const STATUS_OVERFLOW_BIT: usize = 2;

/// Bit position of the moving average flag in the average register.
pub(crate) const MOVING_AVERAGE_BIT: usize = 5;

/// The unlock prefix of the moving average command handshake.
pub(crate) const AVERAGE_UNLOCK: [u8; 3] = [0x50, 0x45, 0x57];

/// The closing byte of the moving average command handshake.
pub(crate) const AVERAGE_LOCK: u8 = 0x00;

/// The two measurement rates supported by the sensor.
///
/// The sensor updates its pixel registers either once or ten times a second; the power-on
/// default is [10 FPS][FrameRate::High]. The frame rate also governs how long
/// [`wake`][crate::GridEye::wake] has to wait before the first valid measurement, as the
/// datasheet requires at least two full frames to pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum FrameRate {
    /// One frame per second.
    Low,

    /// Ten frames per second, the power-on default.
    High,
}

impl FrameRate {
    /// Attempt to create a `FrameRate` from the raw register value.
    pub(crate) fn from_raw(raw_value: u8) -> Result<Self, LibraryError> {
        match raw_value {
            0x00 => Ok(Self::High),
            0x01 => Ok(Self::Low),
            _ => Err(LibraryError::InvalidData("Invalid raw frame rate given")),
        }
    }

    /// Map a frame rate variant into the representation used by the sensor.
    pub(crate) fn as_raw(&self) -> u8 {
        match self {
            Self::High => 0x00,
            Self::Low => 0x01,
        }
    }

    /// How long to wait after waking before measurements are valid, in milliseconds.
    ///
    /// The datasheet requires at least two full frame periods.
    pub(crate) fn warmup_millis(&self) -> u16 {
        match self {
            Self::Low => 3000,
            Self::High => 300,
        }
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::High
    }
}

impl TryFrom<u8> for FrameRate {
    type Error = LibraryError;

    /// Attempt to create a `FrameRate` from a frame count per second.
    ///
    /// This will only work if the source number *exactly* matches one of the two supported
    /// rates.
    /// ```
    /// # use core::convert::TryFrom;
    /// # use grideye::FrameRate;
    /// assert_eq!(FrameRate::try_from(10u8), Ok(FrameRate::High));
    /// assert!(FrameRate::try_from(2u8).is_err());
    /// ```
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            10 => Ok(Self::High),
            _ => Err(LibraryError::InvalidData(
                "The given number does not match a valid frame rate",
            )),
        }
    }
}

impl From<FrameRate> for u8 {
    /// The frame count per second of a `FrameRate`.
    fn from(frame_rate: FrameRate) -> Self {
        match frame_rate {
            FrameRate::Low => 1,
            FrameRate::High => 10,
        }
    }
}

impl FromStr for FrameRate {
    type Err = LibraryError;

    /// Parse a `FrameRate` from its symbolic name, either `"low"` or `"high"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            _ => Err(LibraryError::InvalidData(
                "The given name does not match a valid frame rate",
            )),
        }
    }
}

/// Interrupt configuration, covering the level registers and the interrupt control register.
///
/// `upper_limit`, `lower_limit`, and `hysteresis` are temperatures in degrees Celsius,
/// quantized to the sensor's 0.25 ℃ resolution when written. In absolute mode the interrupt
/// fires when a pixel breaches the absolute limits; otherwise the limits apply to the
/// difference between consecutive frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterruptConfig {
    /// A pixel temperature above this fires the interrupt.
    pub upper_limit: f32,

    /// A pixel temperature below this fires the interrupt.
    pub lower_limit: f32,

    /// Hysteresis applied when clearing a fired interrupt.
    pub hysteresis: f32,

    /// Absolute mode when set, difference mode otherwise.
    pub absolute: bool,

    /// Master interrupt enable.
    pub enabled: bool,
}

impl InterruptConfig {
    /// The configuration written by
    /// [`disable_interrupts`][crate::GridEye::disable_interrupts]: everything off, all levels
    /// zero.
    pub fn disabled() -> Self {
        Self {
            upper_limit: 0.0,
            lower_limit: 0.0,
            hysteresis: 0.0,
            absolute: false,
            enabled: false,
        }
    }

    /// Unpack a configuration from the control register and the six level bytes.
    pub(crate) fn from_registers(control: u8, levels: &[u8; 6]) -> Self {
        Self {
            upper_limit: temperature_from_bytes(levels[0], levels[1]),
            lower_limit: temperature_from_bytes(levels[2], levels[3]),
            hysteresis: temperature_from_bytes(levels[4], levels[5]),
            absolute: is_bit_set(control, 1),
            enabled: is_bit_set(control, 0),
        }
    }

    /// The six level register bytes: upper limit, lower limit, hysteresis.
    pub(crate) fn level_bytes(&self) -> [u8; 6] {
        let mut bytes = [0u8; 6];
        bytes[0..2].copy_from_slice(&temperature_to_bytes(self.upper_limit));
        bytes[2..4].copy_from_slice(&temperature_to_bytes(self.lower_limit));
        bytes[4..6].copy_from_slice(&temperature_to_bytes(self.hysteresis));
        bytes
    }

    /// The interrupt control register byte.
    pub(crate) fn control_byte(&self) -> u8 {
        (self.enabled as u8) | ((self.absolute as u8) << 1)
    }
}
