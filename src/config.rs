use {
    anyhow::{anyhow, Result},
    std::{env, time::Duration},
};

const DEFAULT_I2C_DEV: &str = "/dev/i2c-1";
const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// How the SHT3x is driven between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// Sensor samples on its own; each poll fetches the latest sample.
    Periodic,
    /// Each poll triggers one measurement and waits for it.
    SingleShot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub i2c_dev: String,
    pub interval: Duration,
    pub acquisition: Acquisition,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let i2c_dev = lookup("ENV_III_I2C_DEV").unwrap_or_else(|| DEFAULT_I2C_DEV.to_string());

        let interval = match lookup("ENV_III_INTERVAL_SECS") {
            Some(secs) => {
                let secs: u64 = secs
                    .parse()
                    .map_err(|e| anyhow!("Invalid ENV_III_INTERVAL_SECS {:?}: {}", secs, e))?;
                if secs == 0 {
                    return Err(anyhow!("ENV_III_INTERVAL_SECS must be at least 1"));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_INTERVAL,
        };

        let acquisition = match lookup("ENV_III_MODE").as_deref() {
            None | Some("periodic") => Acquisition::Periodic,
            Some("single-shot") => Acquisition::SingleShot,
            Some(other) => return Err(anyhow!("Invalid ENV_III_MODE {:?}", other)),
        };

        Ok(Config {
            i2c_dev,
            interval,
            acquisition,
        })
    }
}
