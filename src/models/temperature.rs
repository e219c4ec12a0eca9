use std::fmt::Display;

use thiserror::Error;

use crate::formatting::to_fixed;

pub const ABSOLUTE_ZERO_CELSIUS: f64 = -273.15;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Temperature {
    pub celsius: f64,
}

#[derive(Error, Debug, PartialEq)]
pub enum TemperatureError {
    #[error("Temperature is not a finite number")]
    NotFinite,
}

impl TryFrom<f64> for Temperature {
    type Error = TemperatureError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(TemperatureError::NotFinite);
        }
        Ok(Temperature { celsius: value })
    }
}

impl Temperature {
    /// False below absolute zero.
    pub fn is_plausible(&self) -> bool {
        self.celsius >= ABSOLUTE_ZERO_CELSIUS
    }
}

/// One decimal place, e.g. "21.4°C".
impl Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°C", to_fixed(self.celsius, 1))
    }
}
