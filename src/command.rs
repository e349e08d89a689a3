use crate::Accuracy;
use std::time::Duration;

/// Forces the sensor out of continuous mode back to single shot readiness
pub const BREAK_COMMAND: [u8; 2] = [0x30, 0x93];

/// Fetches the latest measurement produced in continuous mode
pub const FETCH_DATA_COMMAND: [u8; 2] = [0xE0, 0x00];

/// Stands for measurements per second, the discriminant doubles as the
/// first command byte of the matching continuous measurement family
#[allow(dead_code)]
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum Mps {
    Half = 0x20,
    #[default]
    Normal = 0x21,
    Double = 0x22,
    X4 = 0x23,
    X10 = 0x27,
}

impl Mps {
    /// Buckets a requested rate into the nearest band the sensor supports
    pub fn from_rate(rate: f32) -> Self {
        if rate < 1.0 {
            Mps::Half
        } else if rate == 1.0 {
            Mps::Normal
        } else if rate < 4.0 {
            Mps::Double
        } else if rate < 10.0 {
            Mps::X4
        } else {
            Mps::X10
        }
    }
}

/// Builds the single shot polling command along with the conversion time
/// the sensor needs before the data can be fetched
pub fn single_shot_command(accuracy: Accuracy) -> ([u8; 2], Duration) {
    let (lsb, delay) = match accuracy {
        Accuracy::High => (0x00, 25),
        Accuracy::Low => (0x16, 10),
        _ => (0x0B, 15),
    };
    ([0x24, lsb], Duration::from_millis(delay))
}

/// Builds the single shot clock stretching command
pub fn clock_stretch_command(accuracy: Accuracy) -> [u8; 2] {
    let lsb = match accuracy {
        Accuracy::High => 0x06,
        Accuracy::Low => 0x10,
        _ => 0x0D,
    };
    [0x2C, lsb]
}

/// Builds the continuous measurement command for the given rate band
pub fn periodic_command(accuracy: Accuracy, mps: Mps) -> [u8; 2] {
    let lsb = match mps {
        Mps::Half => match accuracy {
            Accuracy::High => 0x32,
            Accuracy::Low => 0x2F,
            _ => 0x24,
        },
        Mps::Normal => match accuracy {
            Accuracy::High => 0x30,
            Accuracy::Low => 0x2D,
            _ => 0x26,
        },
        Mps::Double => match accuracy {
            Accuracy::High => 0x36,
            Accuracy::Low => 0x2B,
            _ => 0x20,
        },
        Mps::X4 => match accuracy {
            Accuracy::High => 0x34,
            Accuracy::Low => 0x29,
            _ => 0x22,
        },
        Mps::X10 => match accuracy {
            Accuracy::High => 0x37,
            Accuracy::Low => 0x2A,
            _ => 0x21,
        },
    };
    [mps as u8, lsb]
}
