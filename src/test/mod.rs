// SPDX-License-Identifier: Apache-2.0
mod i2c_mock;

pub(crate) use i2c_mock::{I2cOperation, MockDelay, MockGridEyeBus};
