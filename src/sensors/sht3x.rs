//! Sensirion SHT3x humidity and temperature sensor.
//!
//! Results are only fetched once the sensor has had time to finish the
//! first sample after a start, and every 16-bit field is CRC checked before
//! it is converted.

use {
    crate::{
        clock::Clock,
        error::{DriverError, Field},
    },
    embedded_hal::blocking::{
        delay::DelayMs,
        i2c::{Write, WriteRead},
    },
    log::{debug, trace},
    std::{convert::TryFrom, time::Duration},
};

/// Address with the ADDR pin tied to ground, as wired on the ENV III.
pub const ADDRESS_GND: u8 = 0x44;
/// Address with the ADDR pin tied to VDD.
pub const ADDRESS_VDD: u8 = 0x45;

const CRC8_POLYNOMIAL: u8 = 0x31;
const CRC8_INIT: u8 = 0xFF;

/// Time the sensor NACKs commands after a break or a soft reset.
const STOP_SETTLE: Duration = Duration::from_millis(1);
const RESET_SETTLE: Duration = Duration::from_micros(1500);

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    FetchData = 0xE000,
    ClearStatus = 0x3041,
    SoftReset = 0x30A2,
    StopPeriodic = 0x3093,
    HeaterOn = 0x306D,
    HeaterOff = 0x3066,
    ReadStatus = 0xF32D,
}

/// Precision against measurement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeatability {
    High,
    Medium,
    Low,
}

impl Repeatability {
    /// Worst case time from measurement command to data ready.
    pub fn duration(self) -> Duration {
        match self {
            Repeatability::High => Duration::from_millis(15),
            Repeatability::Medium => Duration::from_millis(6),
            Repeatability::Low => Duration::from_millis(4),
        }
    }

    /// `duration` in timer ticks at `tick_rate_hz`, rounded up and
    /// saturated at `u32::MAX`.
    pub fn ticks(self, tick_rate_hz: u32) -> u32 {
        let ms = self.duration().as_millis() as u64;
        let ticks = (ms * u64::from(tick_rate_hz) + 999) / 1000;
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    fn column(self) -> usize {
        match self {
            Repeatability::High => 0,
            Repeatability::Medium => 1,
            Repeatability::Low => 2,
        }
    }
}

/// Measurements per second in periodic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rate {
    HalfMps,
    OneMps,
    TwoMps,
    FourMps,
    TenMps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SingleShot,
    Periodic(Rate),
}

impl Mode {
    /// Measurement command word for this mode, without clock stretching.
    pub fn command(self, repeatability: Repeatability) -> u16 {
        let row: [u16; 3] = match self {
            Mode::SingleShot => [0x2400, 0x240B, 0x2416],
            Mode::Periodic(Rate::HalfMps) => [0x2032, 0x2024, 0x202F],
            Mode::Periodic(Rate::OneMps) => [0x2130, 0x2126, 0x212D],
            Mode::Periodic(Rate::TwoMps) => [0x2236, 0x2220, 0x222B],
            Mode::Periodic(Rate::FourMps) => [0x2334, 0x2322, 0x2329],
            Mode::Periodic(Rate::TenMps) => [0x2737, 0x2721, 0x272A],
        };
        row[repeatability.column()]
    }
}

/// One temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Percent relative humidity.
    pub humidity: f32,
}

/// Status register word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u16);

impl Status {
    pub fn alert_pending(self) -> bool {
        self.0 & (1 << 15) != 0
    }

    pub fn heater_on(self) -> bool {
        self.0 & (1 << 13) != 0
    }

    pub fn humidity_alert(self) -> bool {
        self.0 & (1 << 11) != 0
    }

    pub fn temperature_alert(self) -> bool {
        self.0 & (1 << 10) != 0
    }

    /// Set after power-up, soft reset or a reset pulse.
    pub fn reset_detected(self) -> bool {
        self.0 & (1 << 4) != 0
    }

    /// Last command was not processed.
    pub fn command_failed(self) -> bool {
        self.0 & (1 << 1) != 0
    }

    /// Checksum of the last write transfer failed.
    pub fn write_checksum_failed(self) -> bool {
        self.0 & 1 != 0
    }
}

/// Sensirion CRC-8: polynomial 0x31, init 0xFF, MSB first, no final XOR.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC8_INIT;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC8_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

pub fn convert_temperature(raw: u16) -> f32 {
    -45.0 + 175.0 * f32::from(raw) / 65535.0
}

pub fn convert_humidity(raw: u16) -> f32 {
    100.0 * f32::from(raw) / 65535.0
}

/// Checks a `[msb, lsb, crc]` triple and returns the word.
fn checked_word<E>(chunk: &[u8], field: Field) -> Result<u16, DriverError<E>> {
    if crc8(&chunk[0..2]) != chunk[2] {
        debug!("SHT3x {} checksum mismatch: {:02X?}", field, chunk);
        return Err(DriverError::InvalidChecksum(field));
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

/// Owned handle on one SHT3x and its measurement state.
pub struct Sht3x<I2C, C> {
    i2c: I2C,
    address: u8,
    clock: C,
    mode: Mode,
    repeatability: Repeatability,
    measurement_started: bool,
    first_sample: bool,
    started_at: Duration,
    busy_until: Option<Duration>,
}

impl<I2C, C> Sht3x<I2C, C> {
    pub fn new(i2c: I2C, address: u8, clock: C) -> Self {
        Sht3x {
            i2c,
            address,
            clock,
            mode: Mode::SingleShot,
            repeatability: Repeatability::High,
            measurement_started: false,
            first_sample: false,
            started_at: Duration::default(),
            busy_until: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn repeatability(&self) -> Repeatability {
        self.repeatability
    }

    /// Time to wait between a start and the first result.
    pub fn measurement_duration(&self) -> Duration {
        self.repeatability.duration()
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn clear_measurement(&mut self) {
        self.measurement_started = false;
        self.first_sample = false;
    }
}

impl<I2C, C, E> Sht3x<I2C, C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    C: Clock,
{
    /// Waits out the window after a break or reset in which the sensor
    /// does not acknowledge commands.
    fn settle(&mut self) {
        if let Some(until) = self.busy_until.take() {
            let now = self.clock.now();
            if now < until {
                trace!("SHT3x settling for {:?}", until - now);
                self.clock.wait(until - now);
            }
        }
    }

    fn command(&mut self, command: u16) -> Result<(), E> {
        self.settle();
        trace!("SHT3x command {:#06X}", command);
        self.i2c.write(self.address, &command.to_be_bytes())
    }

    fn fetch(&mut self, command: Command, buffer: &mut [u8]) -> Result<(), E> {
        self.settle();
        self.i2c
            .write_read(self.address, &(command as u16).to_be_bytes(), buffer)
    }

    /// Resets the measurement state and clears the status register.
    pub fn init(&mut self) -> Result<(), DriverError<E>> {
        self.mode = Mode::SingleShot;
        self.started_at = Duration::default();
        self.clear_measurement();
        self.command(Command::ClearStatus as u16)
            .map_err(DriverError::BusInit)
    }

    /// Starts measuring in `mode`.
    ///
    /// The sensor only accepts a stop command while periodic acquisition is
    /// running, so a running acquisition is stopped before any new start.
    pub fn start(
        &mut self,
        mode: Mode,
        repeatability: Repeatability,
    ) -> Result<(), DriverError<E>> {
        if self.measurement_started && self.mode != Mode::SingleShot {
            self.stop_periodic()?;
        }
        self.command(mode.command(repeatability))
            .map_err(DriverError::BusWrite)?;

        self.mode = mode;
        self.repeatability = repeatability;
        self.started_at = self.clock.now();
        self.measurement_started = true;
        self.first_sample = true;
        debug!(
            "SHT3x started {:?} measurement, {:?} repeatability",
            mode, repeatability
        );
        Ok(())
    }

    /// Triggers one single shot measurement at the current repeatability.
    pub fn start_measurement(&mut self) -> Result<(), DriverError<E>> {
        self.start(Mode::SingleShot, self.repeatability)
    }

    /// True while the first sample after a start cannot be fetched yet.
    pub fn is_measuring(&self) -> bool {
        if !self.measurement_started || !self.first_sample {
            return false;
        }
        let elapsed = self.clock.now().saturating_sub(self.started_at);
        elapsed < self.measurement_duration()
    }

    /// Fetches and converts the latest sample.
    pub fn results(&mut self) -> Result<Reading, DriverError<E>> {
        if !self.measurement_started {
            debug!("SHT3x results requested without a measurement");
            return Err(DriverError::NotStarted);
        }
        if self.is_measuring() {
            debug!("SHT3x measurement still running");
            return Err(DriverError::StillMeasuring);
        }

        let mut raw = [0u8; 6];
        self.fetch(Command::FetchData, &mut raw)
            .map_err(DriverError::BusRead)?;
        trace!("SHT3x raw {:02X?}", raw);

        self.first_sample = false;
        if self.mode == Mode::SingleShot {
            self.measurement_started = false;
        }

        let temperature = checked_word(&raw[0..3], Field::Temperature)?;
        let humidity = checked_word(&raw[3..6], Field::Humidity)?;

        Ok(Reading {
            temperature: convert_temperature(temperature),
            humidity: convert_humidity(humidity),
        })
    }

    /// Single shot measurement that blocks on `delay` until the data is ready.
    pub fn measure<D>(&mut self, delay: &mut D) -> Result<Reading, DriverError<E>>
    where
        D: DelayMs<u32>,
    {
        self.start_measurement()?;
        let ms = self.measurement_duration().as_millis();
        delay.delay_ms(u32::try_from(ms).unwrap_or(u32::MAX));
        self.results()
    }

    /// Stops periodic acquisition, leaving the sensor idle in single shot mode.
    pub fn stop_periodic(&mut self) -> Result<(), DriverError<E>> {
        self.command(Command::StopPeriodic as u16)
            .map_err(DriverError::BusWrite)?;
        self.busy_until = Some(self.clock.now() + STOP_SETTLE);
        self.mode = Mode::SingleShot;
        self.clear_measurement();
        Ok(())
    }

    pub fn soft_reset(&mut self) -> Result<(), DriverError<E>> {
        self.command(Command::SoftReset as u16)
            .map_err(DriverError::BusWrite)?;
        self.busy_until = Some(self.clock.now() + RESET_SETTLE);
        self.mode = Mode::SingleShot;
        self.clear_measurement();
        Ok(())
    }

    pub fn set_heater(&mut self, on: bool) -> Result<(), DriverError<E>> {
        let command = if on {
            Command::HeaterOn
        } else {
            Command::HeaterOff
        };
        self.command(command as u16).map_err(DriverError::BusWrite)
    }

    pub fn status(&mut self) -> Result<Status, DriverError<E>> {
        let mut raw = [0u8; 3];
        self.fetch(Command::ReadStatus, &mut raw)
            .map_err(DriverError::BusRead)?;
        checked_word(&raw, Field::Status).map(Status)
    }
}
