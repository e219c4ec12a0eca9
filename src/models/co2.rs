use std::fmt::Display;

use thiserror::Error;

use crate::formatting::json_number;

/// CO2 concentration in parts per million.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Co2Concentration {
    pub ppm: f64,
}

#[derive(Error, Debug, PartialEq)]
pub enum Co2ConcentrationError {
    #[error("CO2 concentration is not a finite number")]
    NotFinite,
}

impl TryFrom<f64> for Co2Concentration {
    type Error = Co2ConcentrationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(Co2ConcentrationError::NotFinite);
        }
        Ok(Self { ppm: value })
    }
}

impl Co2Concentration {
    pub fn is_plausible(&self) -> bool {
        self.ppm >= 0.0
    }
}

/// Shown as received, no rounding.
impl Display for Co2Concentration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} PPM", json_number(self.ppm))
    }
}
