use std::fmt::Display;

use thiserror::Error;

use crate::formatting::to_fixed;

/// Relative humidity in percent.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Humidity {
    pub percent: f64,
}

#[derive(Error, Debug, PartialEq)]
pub enum HumidityError {
    #[error("Humidity is not a finite number")]
    NotFinite,
}

impl TryFrom<f64> for Humidity {
    type Error = HumidityError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(HumidityError::NotFinite);
        }
        Ok(Self { percent: value })
    }
}

impl Humidity {
    /// Sensors drift a little past the ends of the scale, so values outside
    /// 0-100% are still displayed. This only flags them.
    pub fn is_plausible(&self) -> bool {
        (0.0..=100.0).contains(&self.percent)
    }
}

impl Display for Humidity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", to_fixed(self.percent, 0))
    }
}
