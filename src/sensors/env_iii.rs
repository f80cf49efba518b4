use {
    crate::{
        clock::{Clock, MonotonicClock},
        config::{Acquisition, Config},
        error::DriverError,
        sensors::{
            qmp6988::{self, Bar, Meters, Qmp6988},
            sht3x::{self, Mode, Rate, Reading, Repeatability, Sht3x},
            Measurement, Sensor,
        },
    },
    anyhow::{anyhow, Result},
    embedded_hal::blocking::i2c::{Write, WriteRead},
    linux_embedded_hal::{Delay, I2cdev},
    log::info,
    std::time::Duration,
};

const REPEATABILITY: Repeatability = Repeatability::High;
const PERIODIC_RATE: Rate = Rate::OneMps;

/// The ENV III unit: SHT3x for temperature and humidity, QMP6988 for pressure.
pub struct EnvIii<I2C, C> {
    sht3x: Sht3x<I2C, C>,
    qmp6988: Qmp6988,
}

impl<I2C, C> EnvIii<I2C, C> {
    pub fn new(i2c: I2C, clock: C) -> Self {
        EnvIii {
            sht3x: Sht3x::new(i2c, sht3x::ADDRESS_GND, clock),
            qmp6988: Qmp6988::new(qmp6988::ADDRESS_LOW),
        }
    }

    pub fn measurement_duration(&self) -> Duration {
        self.sht3x.measurement_duration()
    }

    pub fn sht3x(&mut self) -> &mut Sht3x<I2C, C> {
        &mut self.sht3x
    }

    pub fn release(self) -> I2C {
        self.sht3x.release()
    }
}

impl<I2C, C, E> EnvIii<I2C, C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    C: Clock,
{
    /// Resets the SHT3x and starts periodic sampling at 1 mps with high
    /// repeatability. Returns how long to wait before the first result.
    pub fn init(&mut self) -> Result<Duration, DriverError<E>> {
        self.sht3x.init()?;
        self.sht3x.start(Mode::Periodic(PERIODIC_RATE), REPEATABILITY)?;
        Ok(self.measurement_duration())
    }

    pub fn start_measurement(&mut self) -> Result<(), DriverError<E>> {
        self.sht3x.start_measurement()
    }

    pub fn temperature_humidity(&mut self) -> Result<Reading, DriverError<E>> {
        self.sht3x.results()
    }

    pub fn pressure(&self) -> Result<Bar, DriverError<E>> {
        self.qmp6988.pressure()
    }

    pub fn altitude(&self) -> Result<Meters, DriverError<E>> {
        self.qmp6988.altitude()
    }
}

impl Sensor for EnvIii<I2cdev, MonotonicClock> {
    fn initialize(config: &Config) -> Result<Self> {
        let dev = I2cdev::new(&config.i2c_dev)
            .map_err(|e| anyhow!("Failed to open {}: {:?}", config.i2c_dev, e))?;

        let mut env = EnvIii::new(dev, MonotonicClock::new());
        env.init()
            .map_err(|e| anyhow!("Failed to initialize ENV III: {}", e))?;

        if config.acquisition == Acquisition::SingleShot {
            env.sht3x
                .stop_periodic()
                .map_err(|e| anyhow!("Failed to stop ENV III periodic mode: {}", e))?;
        }
        info!("ENV III ready on {} ({:?})", config.i2c_dev, config.acquisition);

        Ok(env)
    }

    fn measure(&mut self) -> Result<Vec<Measurement>> {
        let reading = match self.sht3x.mode() {
            Mode::SingleShot => self.sht3x.measure(&mut Delay),
            Mode::Periodic(_) => self.temperature_humidity(),
        }
        .map_err(|e| anyhow!("Failed to read from ENV III: {}", e))?;

        Ok(vec![
            Measurement {
                name: "temperature".to_string(),
                value: reading.temperature,
            },
            Measurement {
                name: "humidity".to_string(),
                value: reading.humidity,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::clock::fake::FakeClock,
        embedded_hal_mock::{
            i2c::{Mock as I2cMock, Transaction},
            MockError,
        },
        std::io::ErrorKind,
    };

    const SHT: u8 = sht3x::ADDRESS_GND;
    const PAYLOAD: [u8; 6] = [0x66, 0x5A, 0x2B, 0x5E, 0xB9, 0x3C];

    fn init_transactions() -> Vec<Transaction> {
        vec![
            Transaction::write(SHT, vec![0x30, 0x41]),
            Transaction::write(SHT, vec![0x21, 0x30]),
        ]
    }

    #[test]
    fn init_starts_periodic_high() {
        let mut env = EnvIii::new(I2cMock::new(&init_transactions()), FakeClock::default());
        assert_eq!(env.init().unwrap(), Duration::from_millis(15));
        assert_eq!(env.sht3x().mode(), Mode::Periodic(Rate::OneMps));
        assert_eq!(env.sht3x().repeatability(), Repeatability::High);
        env.release().done();
    }

    #[test]
    fn init_propagates_missing_sensor() {
        let expectations =
            [Transaction::write(SHT, vec![0x30, 0x41]).with_error(MockError::Io(ErrorKind::Other))];
        let mut env = EnvIii::new(I2cMock::new(&expectations), FakeClock::default());
        assert!(matches!(env.init(), Err(DriverError::BusInit(_))));
        env.release().done();
    }

    #[test]
    fn first_periodic_sample_is_gated() {
        let mut expectations = init_transactions();
        expectations.push(Transaction::write_read(SHT, vec![0xE0, 0x00], PAYLOAD.to_vec()));
        let clock = FakeClock::default();
        let mut env = EnvIii::new(I2cMock::new(&expectations), clock.clone());

        let wait = env.init().unwrap();
        assert!(matches!(
            env.temperature_humidity(),
            Err(DriverError::StillMeasuring)
        ));

        clock.advance(wait);
        let reading = env.temperature_humidity().unwrap();
        assert!((reading.temperature - 24.968).abs() < 0.01);
        env.release().done();
    }

    #[test]
    fn read_before_init() {
        let mut env = EnvIii::new(I2cMock::new(&[]), FakeClock::default());
        assert!(matches!(
            env.temperature_humidity(),
            Err(DriverError::NotStarted)
        ));
        env.release().done();
    }

    #[test]
    fn pressure_and_altitude_touch_no_bus() {
        let env = EnvIii::new(I2cMock::new(&[]), FakeClock::default());
        assert!(matches!(env.pressure(), Err(DriverError::Unsupported(_))));
        assert!(matches!(env.altitude(), Err(DriverError::Unsupported(_))));
        env.release().done();
    }
}
