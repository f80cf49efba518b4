//! QMP6988 barometric pressure sensor.
//!
//! Only the register map and the calibration layout are modelled. There is no
//! read path yet, so `pressure` and `altitude` report `Unsupported` instead of
//! a made-up value.

use {
    crate::error::DriverError,
    log::debug,
};

/// Address with SDO pulled low.
pub const ADDRESS_LOW: u8 = 0x70;
/// Address with SDO pulled high.
pub const ADDRESS_HIGH: u8 = 0x56;

/// Expected content of `Register::ChipId`.
pub const CHIP_ID: u8 = 0x5C;

pub const CALIBRATION_LENGTH: usize = 25;

pub type Bar = f32;
pub type Meters = f32;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Calibration = 0xA0,
    ChipId = 0xD1,
    Reset = 0xE0,
    IirConfig = 0xF1,
    DeviceStatus = 0xF3,
    CtrlMeas = 0xF4,
    PressureMsb = 0xF7,
    TemperatureMsb = 0xFA,
}

/// `CtrlMeas` bits 1:0.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerMode {
    Sleep = 0x00,
    Forced = 0x01,
    Normal = 0x03,
}

/// `CtrlMeas` bits 7:5 (temperature) and 4:2 (pressure).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oversampling {
    Skipped = 0x00,
    X1 = 0x01,
    X2 = 0x02,
    X4 = 0x03,
    X8 = 0x04,
    X16 = 0x05,
    X32 = 0x06,
    X64 = 0x07,
}

/// `IirConfig` bits 2:0.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Off = 0x00,
    N2 = 0x01,
    N4 = 0x02,
    N8 = 0x03,
    N16 = 0x04,
    N32 = 0x05,
}

/// Compensation coefficients stored in OTP starting at `Register::Calibration`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calibration {
    pub a0: i32,
    pub a1: i16,
    pub a2: i16,
    pub b00: i32,
    pub bt1: i16,
    pub bt2: i16,
    pub bp1: i16,
    pub b11: i16,
    pub bp2: i16,
    pub b12: i16,
    pub b21: i16,
    pub bp3: i16,
}

impl Calibration {
    /// Unpacks the 25 byte OTP block.
    ///
    /// `a0` and `b00` are 20-bit two's complement values whose low nibbles
    /// share the last byte.
    pub fn from_bytes(raw: &[u8; CALIBRATION_LENGTH]) -> Self {
        let word = |i: usize| i16::from_be_bytes([raw[i], raw[i + 1]]);
        let wide = |msb: u8, mid: u8, nibble: u8| {
            let value = (i32::from(msb) << 12) | (i32::from(mid) << 4) | i32::from(nibble);
            (value << 12) >> 12
        };

        Calibration {
            b00: wide(raw[0], raw[1], raw[24] >> 4),
            bt1: word(2),
            bt2: word(4),
            bp1: word(6),
            b11: word(8),
            bp2: word(10),
            b12: word(12),
            b21: word(14),
            bp3: word(16),
            a0: wide(raw[18], raw[19], raw[24] & 0x0F),
            a1: word(20),
            a2: word(22),
        }
    }
}

/// Placeholder handle for the pressure sensor. Holds no bus.
#[derive(Debug, Clone, Copy)]
pub struct Qmp6988 {
    address: u8,
}

impl Qmp6988 {
    pub fn new(address: u8) -> Self {
        Qmp6988 { address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn pressure<E>(&self) -> Result<Bar, DriverError<E>> {
        debug!("QMP6988 at {:#04X} has no pressure read path", self.address);
        Err(DriverError::Unsupported("pressure"))
    }

    pub fn altitude<E>(&self) -> Result<Meters, DriverError<E>> {
        debug!("QMP6988 at {:#04X} has no altitude read path", self.address);
        Err(DriverError::Unsupported("altitude"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_words_are_big_endian() {
        let mut raw = [0u8; CALIBRATION_LENGTH];
        raw[2] = 0xFF;
        raw[3] = 0xFE;
        raw[16] = 0x01;
        raw[17] = 0x02;
        raw[22] = 0x80;

        let cal = Calibration::from_bytes(&raw);
        assert_eq!(cal.bt1, -2);
        assert_eq!(cal.bp3, 0x0102);
        assert_eq!(cal.a2, i16::MIN);
        assert_eq!(cal.bt2, 0);
    }

    #[test]
    fn calibration_sign_extends_20_bit_values() {
        let mut raw = [0u8; CALIBRATION_LENGTH];
        raw[0] = 0x80;
        raw[18] = 0x7F;
        raw[19] = 0xFF;
        raw[24] = 0x0F;

        let cal = Calibration::from_bytes(&raw);
        assert_eq!(cal.b00, -524_288);
        assert_eq!(cal.a0, 524_287);

        raw[0] = 0xFF;
        raw[1] = 0xFF;
        raw[24] = 0xF0;
        let cal = Calibration::from_bytes(&raw);
        assert_eq!(cal.b00, -1);
        assert_eq!(cal.a0, 0x7FFF0);
    }

    #[test]
    fn readings_are_unsupported() {
        let qmp = Qmp6988::new(ADDRESS_LOW);
        assert!(matches!(
            qmp.pressure::<()>(),
            Err(DriverError::Unsupported("pressure"))
        ));
        assert!(matches!(
            qmp.altitude::<()>(),
            Err(DriverError::Unsupported("altitude"))
        ));
    }

    #[test]
    fn register_map() {
        assert_eq!(Register::ChipId as u8, 0xD1);
        assert_eq!(Register::Calibration as u8, 0xA0);
        assert_eq!(PowerMode::Normal as u8, 0x03);
        assert_eq!(Oversampling::X64 as u8, 0x07);
        assert_eq!(Filter::N32 as u8, 0x05);
    }
}
