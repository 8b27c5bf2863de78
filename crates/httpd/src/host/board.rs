use std::collections::HashMap;

use httpd_hal::{Board, Device, DeviceError};

/// Peripherals backed by a register map. ADC inputs read whatever was last
/// injected with [`SimBoard::set_input`].
#[derive(Debug, Clone)]
pub struct SimBoard {
    channels: u32,
    registers: HashMap<(Device, u32), f32>,
    free_heap: usize,
}

impl SimBoard {
    pub fn new(channels: u32) -> Self {
        Self {
            channels,
            registers: HashMap::new(),
            free_heap: 32 * 1024,
        }
    }

    pub fn set_input(&mut self, device: Device, index: u32, value: f32) {
        self.registers.insert((device, index), value);
    }

    pub fn set_free_heap(&mut self, bytes: usize) {
        self.free_heap = bytes;
    }

    fn check(&self, device: Device, index: u32) -> Result<(), DeviceError> {
        if index < self.channels {
            Ok(())
        } else {
            Err(DeviceError::NoChannel(device, index))
        }
    }
}

impl Board for SimBoard {
    fn read(&mut self, device: Device, index: u32) -> Result<f32, DeviceError> {
        self.check(device, index)?;
        Ok(self.registers.get(&(device, index)).copied().unwrap_or(0.0))
    }

    fn write(&mut self, device: Device, index: u32, value: f32) -> Result<(), DeviceError> {
        self.check(device, index)?;
        if device == Device::Adc {
            return Err(DeviceError::ReadOnly(device));
        }
        self.registers.insert((device, index), value);
        Ok(())
    }

    fn free_heap(&self) -> usize {
        self.free_heap
    }
}
