pub mod bus;
pub mod command;
pub mod error;

use crate::bus::I2cBus;
use crate::command::{
    clock_stretch_command, periodic_command, single_shot_command, Mps, BREAK_COMMAND,
    FETCH_DATA_COMMAND,
};
use crate::error::{Result, SHTError};
use crc::{Algorithm, Crc};
use std::thread::sleep;

pub mod prelude {
    pub use super::{
        bus::I2cBus, command::Mps, Accuracy, DeviceAddr, Reading, SensorState, TemperatureUnit,
        DEFAULT_BUS_SPEED, SHT3x,
    };
}

const CRC_ALGORITHM: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0xFF,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0x00,
    residue: 0x00,
};

// 2**16 - 1
const CONVERSION_DENOM: f64 = 65535f64;

// Constants used to convert values
const CELSIUS_PAIR: (f64, f64) = (45f64, 175f64);
const FAHRENHEIT_PAIR: (f64, f64) = (49f64, 315f64);

/// Default I2C clock speed passed to [`SHT3x::begin`]
pub const DEFAULT_BUS_SPEED: u32 = 400_000;

/// The temperature and humidity sensor driver.
///
/// Owns the bus handle and the sensor's idle/continuous state. The state
/// field is not synchronized, callers running from multiple threads must
/// serialize access to one driver instance themselves.
#[derive(Copy, Clone, Debug)]
pub struct SHT3x<BUS> {
    bus: BUS,
    state: SensorState,
    address: u8,
    accuracy: Accuracy,
    unit: TemperatureUnit,
}

/// Represents the reading gotten from the sensor
#[derive(Default, Clone, Copy, Debug)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
}

/// The two supported I2C addresses
#[allow(dead_code)]
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum DeviceAddr {
    #[default]
    AD0 = 0x44,
    AD1 = 0x45,
}

/// Influences what the reading temperature numbers are
#[allow(dead_code)]
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// Determines the accuracy of the sensor, the higher the repeatability
/// the longer it'll take and the more accurate it will be
#[allow(dead_code)]
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum Accuracy {
    High,
    #[default]
    Medium,
    Low,
}

/// Whether the sensor is idle or autonomously sampling
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum SensorState {
    #[default]
    Idle,
    Continuous,
}

/// Computes the sensor's CRC-8 (polynomial 0x31, init 0xFF) over the bytes
pub fn crc8(bytes: &[u8]) -> u8 {
    let crc = Crc::<u8>::new(&CRC_ALGORITHM);
    let mut digest = crc.digest();
    digest.update(bytes);
    digest.finalize()
}

fn merge_bytes(a: u8, b: u8) -> u16 {
    ((a as u16) << 8) | b as u16
}

fn verify_data(buffer: [u8; 6]) -> Result<()> {
    let temp_result = crc8(&buffer[0..2]);
    if temp_result != buffer[2] {
        return Err(SHTError::InvalidTemperatureChecksumError {
            bytes_start: buffer[0],
            bytes_end: buffer[1],
            expected_checksum: buffer[2],
            calculated_checksum: temp_result,
        });
    }

    let humidity_result = crc8(&buffer[3..5]);
    if humidity_result != buffer[5] {
        return Err(SHTError::InvalidHumidityChecksumError {
            bytes_start: buffer[3],
            bytes_end: buffer[4],
            expected_checksum: buffer[5],
            calculated_checksum: humidity_result,
        });
    }

    Ok(())
}

impl<BUS> SHT3x<BUS>
where
    BUS: I2cBus,
{
    /// Create a new sensor driver, starting out idle
    /// I2C clock frequency must be between 0 and 1000 kHz
    pub fn new(bus: BUS) -> Self {
        Self {
            bus,
            state: SensorState::default(),
            address: DeviceAddr::default() as u8,
            accuracy: Accuracy::default(),
            unit: TemperatureUnit::default(),
        }
    }

    /// Change the sensor's temperature unit
    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        self.unit = unit;
    }

    /// Change the sensor's temperature unit
    pub fn with_unit(mut self, unit: TemperatureUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Change the sensor's accuracy which also influences how long it takes to read
    pub fn set_accuracy(&mut self, accuracy: Accuracy) {
        self.accuracy = accuracy;
    }

    /// Change the sensor's accuracy which also influences how long it takes to read
    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Change the sensor's I2C address
    pub fn with_address(mut self, address: DeviceAddr) -> Self {
        self.address = address as u8;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Idempotent bus bring-up, configures the clock speed only when the
    /// peripheral has not been enabled yet
    pub fn begin(&mut self, speed: u32) {
        if !self.bus.is_enabled() {
            self.bus.set_speed(speed);
            self.bus.enable();
        }
    }

    /// Force the sensor out of continuous mode back to idle.
    ///
    /// The break command is sent regardless of the tracked state, the
    /// state only moves to idle once the sensor acked the transaction.
    pub fn break_command(&mut self) -> Result<()> {
        if !self.bus.lock() {
            return Err(SHTError::LockI2CError);
        }
        let result = self.send_command(BREAK_COMMAND);
        self.bus.unlock();
        result?;
        self.state = SensorState::Idle;
        Ok(())
    }

    /// Run one on-demand measurement and block until the conversion is done.
    ///
    /// When the sensor is in continuous mode a break command is issued
    /// first, its failure aborts the measurement.
    pub fn single_shot(&mut self) -> Result<Reading> {
        self.ensure_idle()?;
        if !self.bus.lock() {
            return Err(SHTError::LockI2CError);
        }
        let result = self.locked_single_shot();
        self.bus.unlock();
        result
    }

    /// Issue the clock stretching measurement command.
    ///
    /// Reading the measurement back under clock stretching is not
    /// implemented, so even a successful write resolves to
    /// [`SHTError::ClockStretchReadError`]. Write failures report the
    /// write error instead.
    pub fn single_shot_clock_stretch(&mut self) -> Result<Reading> {
        self.ensure_idle()?;
        if !self.bus.lock() {
            return Err(SHTError::LockI2CError);
        }
        let result = self.send_command(clock_stretch_command(self.accuracy));
        self.bus.unlock();
        result?;
        Err(SHTError::ClockStretchReadError)
    }

    /// Put the sensor into continuous mode at the given measurements per
    /// second, bucketed into the nearest band the sensor supports.
    ///
    /// Returns success without any bus traffic when already continuous.
    pub fn start_periodic(&mut self, rate: f32) -> Result<()> {
        if self.state == SensorState::Continuous {
            return Ok(());
        }
        if !self.bus.lock() {
            return Err(SHTError::LockI2CError);
        }
        let result = self.send_command(periodic_command(self.accuracy, Mps::from_rate(rate)));
        self.bus.unlock();
        result?;
        self.state = SensorState::Continuous;
        Ok(())
    }

    /// Fetch the latest measurement produced in continuous mode
    pub fn get_reading(&mut self) -> Result<Reading> {
        if !self.bus.lock() {
            return Err(SHTError::LockI2CError);
        }
        let result = self.locked_get_reading();
        self.bus.unlock();
        result
    }

    fn ensure_idle(&mut self) -> Result<()> {
        if self.state != SensorState::Idle {
            self.break_command()?;
        }
        Ok(())
    }

    fn locked_single_shot(&mut self) -> Result<Reading> {
        let (command, delay) = single_shot_command(self.accuracy);
        self.send_command(command)?;
        // Conversion time before the data can be fetched
        sleep(delay);
        let buffer = self.read_raw()?;
        self.process_data(buffer)
    }

    fn locked_get_reading(&mut self) -> Result<Reading> {
        self.send_command(FETCH_DATA_COMMAND)?;
        let buffer = self.read_raw()?;
        self.process_data(buffer)
    }

    fn send_command(&mut self, command: [u8; 2]) -> Result<()> {
        self.bus.begin_transaction(self.address);
        self.bus.write(command[0]);
        self.bus.write(command[1]);
        if self.bus.end_transaction() != 0 {
            return Err(SHTError::WriteI2CError);
        }
        Ok(())
    }

    fn read_raw(&mut self) -> Result<[u8; 6]> {
        if self.bus.request(self.address, 6) != 6 {
            return Err(SHTError::ReadI2CError);
        }
        let mut buffer = [0u8; 6];
        for byte in buffer.iter_mut() {
            *byte = self.bus.read();
        }
        Ok(buffer)
    }

    fn process_data(&self, buffer: [u8; 6]) -> Result<Reading> {
        verify_data(buffer)?;

        let raw_temp = merge_bytes(buffer[0], buffer[1]) as f64;
        let (sub, mul) = match self.unit {
            TemperatureUnit::Celsius => CELSIUS_PAIR,
            TemperatureUnit::Fahrenheit => FAHRENHEIT_PAIR,
        };
        let temperature = mul * (raw_temp / CONVERSION_DENOM) - sub;

        let raw_humidity = merge_bytes(buffer[3], buffer[4]) as f64;
        let humidity = 100f64 * raw_humidity / CONVERSION_DENOM;

        Ok(Reading {
            temperature,
            humidity,
        })
    }
}
