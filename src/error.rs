use std::fmt;

/// The 16-bit field whose checksum did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    Humidity,
    Status,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Status => "status",
        };
        f.write_str(name)
    }
}

/// Errors returned by the ENV III drivers, generic over the bus error `E`.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverError<E> {
    /// The sensor did not acknowledge its init command.
    BusInit(E),
    /// A command could not be written to the bus.
    BusWrite(E),
    /// Result bytes could not be read back from the bus.
    BusRead(E),
    /// Results were requested but no measurement was ever started.
    NotStarted,
    /// The first sample after a start is not ready yet.
    StillMeasuring,
    /// CRC-8 mismatch on one field of the payload.
    InvalidChecksum(Field),
    /// The quantity has no working read path.
    Unsupported(&'static str),
}

impl<E: fmt::Debug> fmt::Display for DriverError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::BusInit(e) => write!(f, "failed to initialize sensor: {:?}", e),
            DriverError::BusWrite(e) => write!(f, "failed to write command: {:?}", e),
            DriverError::BusRead(e) => write!(f, "failed to read results: {:?}", e),
            DriverError::NotStarted => f.write_str("no measurement in progress"),
            DriverError::StillMeasuring => f.write_str("measurement still running"),
            DriverError::InvalidChecksum(field) => write!(f, "invalid {} checksum", field),
            DriverError::Unsupported(what) => write!(f, "{} readings are not supported", what),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for DriverError<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_field() {
        let e: DriverError<()> = DriverError::InvalidChecksum(Field::Humidity);
        assert_eq!(e.to_string(), "invalid humidity checksum");
    }

    #[test]
    fn display_wraps_bus_error() {
        let e = DriverError::BusRead("nack");
        assert_eq!(e.to_string(), "failed to read results: \"nack\"");
    }

    #[test]
    fn lifts_into_anyhow() {
        let e: anyhow::Error = DriverError::<()>::Unsupported("pressure").into();
        assert_eq!(e.to_string(), "pressure readings are not supported");
    }
}
