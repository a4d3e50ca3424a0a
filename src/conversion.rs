// SPDX-License-Identifier: Apache-2.0

//! Conversions between raw register bytes and measurement values.
//!
//! The Grid-EYE stores temperatures as little-endian byte pairs holding a 12-bit fixed-point
//! value in the low 12 bits of the word. Pixel and interrupt level temperatures are
//! two's-complement with a resolution of 0.25 ℃ per bit, while the on-board thermistor is
//! sign-magnitude (bit 11 is a plain sign bit) with a resolution of 0.0625 ℃ per bit. These
//! functions are the only place the driver interprets measurement bytes, and they are exposed
//! for use against raw register dumps.

// Rounding is not implemented in core, so FloatCore fills it in for no_std builds.
use num_traits::float::FloatCore;

use crate::util::is_bit_set;

/// Resolution of pixel and interrupt level temperatures, in degrees Celsius per bit.
const PIXEL_RESOLUTION: f32 = 0.25;

/// Resolution of the thermistor temperature, in degrees Celsius per bit.
const THERMISTOR_RESOLUTION: f32 = 0.0625;

/// The sign bit of a 12-bit fixed-point value.
const SIGN_BIT: u16 = 1 << 11;

/// Decode a pixel or interrupt level temperature from its register byte pair.
///
/// The value is 12-bit two's-complement, 0.25 ℃ per bit. Every byte pair decodes to *some*
/// temperature; the upper nibble of `msb` is not masked off, matching the sensor's arithmetic.
pub fn temperature_from_bytes(lsb: u8, msb: u8) -> f32 {
    let raw = u16::from_le_bytes([lsb, msb]);
    let mut value = i32::from(raw);
    if is_bit_set(raw, 11) {
        value -= 1 << 12;
    }
    value as f32 * PIXEL_RESOLUTION
}

/// Encode a temperature into the register byte pair used by the interrupt level registers.
///
/// The temperature is quantized to the nearest 0.25 ℃ step, rounding halves away from zero.
/// Temperatures outside the 12-bit range (roughly ±512 ℃) wrap through the two's-complement
/// encoding rather than saturating or failing, again matching the sensor's arithmetic.
pub fn temperature_to_bytes(temperature: f32) -> [u8; 2] {
    let mut raw = FloatCore::round(temperature / PIXEL_RESOLUTION) as i32;
    if raw < 0 {
        raw += 1 << 12;
    }
    [(raw & 0xFF) as u8, ((raw >> 8) & 0xFF) as u8]
}

/// Decode the thermistor temperature from its register byte pair.
///
/// The value is 12-bit sign-magnitude (bit 11 is the sign, not a two's-complement carry),
/// 0.0625 ℃ per bit. There is no matching encoder as the thermistor registers are read-only.
/// The upper nibble of `msb` is deliberately left unmasked so the 0x8000 power-down sentinel
/// decodes to 2048.0, well clear of any real reading.
pub fn thermistor_from_bytes(lsb: u8, msb: u8) -> f32 {
    let raw = u16::from_le_bytes([lsb, msb]);
    let value = if is_bit_set(raw, 11) {
        -i32::from(raw & !SIGN_BIT)
    } else {
        i32::from(raw)
    };
    value as f32 * THERMISTOR_RESOLUTION
}

/// Expand a flag register byte into individual booleans, most significant bit first.
pub fn flags_from_byte(value: u8) -> [bool; 8] {
    let mut flags = [false; 8];
    for (index, flag) in flags.iter_mut().enumerate() {
        *flag = is_bit_set(value, 7 - index);
    }
    flags
}
