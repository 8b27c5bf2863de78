//! Board peripherals reachable from the `/dev` WebSocket endpoint.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Pwm,
    Gpio,
    Adc,
    Dac,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pwm => "pwm",
            Self::Gpio => "gpio",
            Self::Adc => "adc",
            Self::Dac => "dac",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("{0} channel {1} does not exist")]
    NoChannel(Device, u32),
    #[error("{0} is read-only")]
    ReadOnly(Device),
}

pub trait Board {
    fn read(&mut self, device: Device, index: u32) -> Result<f32, DeviceError>;

    fn write(&mut self, device: Device, index: u32, value: f32) -> Result<(), DeviceError>;

    /// Free heap in bytes, shown on diagnostic pages.
    fn free_heap(&self) -> usize;
}
