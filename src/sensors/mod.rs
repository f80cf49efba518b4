use {crate::config::Config, anyhow::Result};

pub mod env_iii;
pub mod qmp6988;
pub mod sht3x;

pub trait Sensor {
    fn initialize(config: &Config) -> Result<Self>
    where
        Self: Sized;

    fn measure(&mut self) -> Result<Vec<Measurement>>;
}

#[derive(Debug)]
pub struct Measurement {
    pub name: String,
    pub value: f32,
}
