//! `/dev` endpoint: `<dev>[<index>]=<value>` writes a peripheral and echoes
//! its new value, `<dev>[<index>]` just reads it.

use httpd_hal::{Board, Device, DeviceError};

/// Path whose peers talk to the board instead of a script.
pub const DEV_PATH: &str = "/dev";

const DEVICES: &[(&str, Device)] = &[
    ("pwm", Device::Pwm),
    ("gio", Device::Gpio),
    ("adc", Device::Adc),
    ("dac", Device::Dac),
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceCommandError {
    #[error("malformed device command")]
    Malformed,
    #[error("unknown device {0:?}")]
    UnknownDevice(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: &'static str,
    pub device: Device,
    pub index: u32,
    pub value: Option<f32>,
}

impl Command {
    pub fn parse(text: &str) -> Result<Self, DeviceCommandError> {
        let text = text.trim();
        let (name, rest) = text
            .split_at_checked(3)
            .ok_or(DeviceCommandError::Malformed)?;
        let &(name, device) = DEVICES
            .iter()
            .find(|(known, _)| *known == name)
            .ok_or_else(|| DeviceCommandError::UnknownDevice(name.to_string()))?;

        let rest = rest.strip_prefix('[').ok_or(DeviceCommandError::Malformed)?;
        let (index, rest) = rest.split_once(']').ok_or(DeviceCommandError::Malformed)?;
        let index = index
            .trim()
            .parse::<u32>()
            .map_err(|_| DeviceCommandError::Malformed)?;
        let value = match rest.strip_prefix('=') {
            Some(value) => Some(
                value
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| DeviceCommandError::Malformed)?,
            ),
            None if rest.is_empty() => None,
            None => return Err(DeviceCommandError::Malformed),
        };

        Ok(Self {
            name,
            device,
            index,
            value,
        })
    }

    pub fn execute<B: Board>(&self, board: &mut B) -> Result<String, DeviceCommandError> {
        if let Some(value) = self.value {
            board.write(self.device, self.index, value)?;
        }
        let value = board.read(self.device, self.index)?;
        Ok(format!("{}[{}]={}", self.name, self.index, value))
    }
}

/// Runs one command frame and formats the reply frame.
pub fn handle<B: Board>(payload: &[u8], board: &mut B) -> Result<String, DeviceCommandError> {
    let text = std::str::from_utf8(payload).map_err(|_| DeviceCommandError::Malformed)?;
    Command::parse(text)?.execute(board)
}
