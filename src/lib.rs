// SPDX-License-Identifier: Apache-2.0

//! A pure-Rust library for accessing Panasonic AMG88xx "Grid-EYE" thermal sensors over I²C.
//!
//! The Grid-EYE is an 8×8 thermopile array that reports a thermal image as 64 pixel
//! temperatures, along with an on-board thermistor reading and a configurable interrupt
//! output. This crate covers the full register map: the sleep/wake lifecycle, frame rate and
//! moving average configuration, the interrupt subsystem, and retrieval of the image and
//! thermistor measurements.
//!
//! This library uses the [`embedded-hal`][embedded-hal] blocking I²C and delay traits, meaning
//! you should be able to use it on any platform with an `embedded-hal` implementation
//! available. This library is also `no_std` compatible.
//!
//! [embedded-hal]: https://docs.rs/embedded-hal/0.2/embedded_hal/blocking/index.html
//!
//! # Example
//! ```no_run
//! use grideye::{GridEye, DEFAULT_ADDRESS};
//! use linux_embedded_hal::{Delay, I2cdev};
//!
//! let i2c_bus = I2cdev::new("/dev/i2c-1").expect("/dev/i2c-1 needs to be an I2C controller");
//! // The sensor is put to sleep as part of construction.
//! let mut sensor = GridEye::new(i2c_bus, Delay, DEFAULT_ADDRESS)?;
//! // Waking is slow; the sensor needs two full frames of warm-up before measuring.
//! let image = sensor.powered(|sensor| sensor.image())?;
//! for row in image.iter() {
//!     for temperature in row.iter() {
//!         print!("{:6.2} ", temperature);
//!     }
//!     println!();
//! }
//! # Ok::<(), grideye::Error<I2cdev>>(())
//! ```
//! This snippet gives a quick example of using the driver on Linux, with the sensor on I²C bus
//! #1 (`/dev/i2c-1`) at the default address. [`powered`][GridEye::powered] brackets the
//! measurement between the wake and sleep transitions; drive [`wake`][GridEye::wake] and
//! [`sleep`][GridEye::sleep] yourself if the sensor should stay powered between measurements.
//!
//! The raw byte conversions are exposed in the [`conversion`] module for use against register
//! dumps obtained elsewhere.

#![no_std]

pub mod conversion;
pub mod driver;
pub mod error;
pub mod register;
#[cfg(test)]
mod test;
mod util;

pub use driver::{GridEye, DEFAULT_ADDRESS, HEIGHT, NUM_PIXELS, WIDTH};
pub use error::{Error, LibraryError};
pub use register::{FrameRate, InterruptConfig};
