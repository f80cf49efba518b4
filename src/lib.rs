//! Driver for the ENV III unit: an SHT3x temperature/humidity sensor and a
//! QMP6988 pressure sensor sharing one I2C bus.
//!
//! ```no_run
//! use env3::{clock::MonotonicClock, EnvIii};
//! use linux_embedded_hal::I2cdev;
//!
//! let dev = I2cdev::new("/dev/i2c-1").unwrap();
//! let mut env = EnvIii::new(dev, MonotonicClock::new());
//! let wait = env.init().unwrap();
//! std::thread::sleep(wait);
//! let reading = env.temperature_humidity().unwrap();
//! println!("{} C, {} %RH", reading.temperature, reading.humidity);
//! ```

use {
    crate::{clock::MonotonicClock, sensors::Sensor},
    anyhow::Result,
    chrono::Utc,
    linux_embedded_hal::I2cdev,
    log::{info, warn},
    tokio::time::{delay_for, interval},
};

pub mod clock;
pub mod config;
pub mod error;
pub mod sensors;

pub use {
    config::Config,
    error::{DriverError, Field},
    sensors::{
        env_iii::EnvIii,
        sht3x::{Mode, Rate, Reading, Repeatability, Sht3x},
    },
};

pub async fn client() -> Result<()> {
    pretty_env_logger::init();
    color_backtrace::install();

    let config = Config::from_env()?;
    info!(
        "Polling ENV III on {} every {:?}",
        config.i2c_dev, config.interval
    );

    let mut env: EnvIii<I2cdev, MonotonicClock> = Sensor::initialize(&config)?;
    delay_for(env.measurement_duration()).await;

    if let Err(e) = env.pressure() {
        warn!("{}", e);
    }
    if let Err(e) = env.altitude() {
        warn!("{}", e);
    }

    info!("Initialization complete");

    let mut interval = interval(config.interval);
    loop {
        interval.tick().await;

        let time = Utc::now();
        match env.measure() {
            Ok(measurements) => {
                for m in measurements {
                    info!("{} {} = {:.2}", time.to_rfc3339(), m.name, m.value);
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
}
