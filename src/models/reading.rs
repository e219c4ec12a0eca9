use std::fmt::Display;

use derive_more::Display as DeriveDisplay;
use thiserror::Error;

use super::{
    co2::{Co2Concentration, Co2ConcentrationError},
    element::ElementId,
    humidity::{Humidity, HumidityError},
    temperature::{Temperature, TemperatureError},
};

/// The quantities the sensor publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, DeriveDisplay)]
pub enum Quantity {
    #[display(fmt = "humidity")]
    Humidity,
    #[display(fmt = "temperature")]
    Temperature,
    #[display(fmt = "co2")]
    Co2,
}

impl Quantity {
    /// Order in which a refresh cycle fetches the quantities.
    pub const REFRESH_ORDER: [Quantity; 3] =
        [Quantity::Humidity, Quantity::Temperature, Quantity::Co2];

    pub fn element(self) -> ElementId {
        match self {
            Quantity::Humidity => ElementId::Humidity,
            Quantity::Temperature => ElementId::Temperature,
            Quantity::Co2 => ElementId::Co2Ppm,
        }
    }
}

/// A single finite value of one quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Humidity(Humidity),
    Temperature(Temperature),
    Co2(Co2Concentration),
}

#[derive(Error, Debug, PartialEq)]
pub enum ReadingError {
    #[error(transparent)]
    Humidity(#[from] HumidityError),

    #[error(transparent)]
    Temperature(#[from] TemperatureError),

    #[error(transparent)]
    Co2(#[from] Co2ConcentrationError),
}

impl Reading {
    /// Wrap a raw number as a reading of `quantity`. Only non-finite numbers
    /// are refused.
    pub fn from_raw(quantity: Quantity, raw: f64) -> Result<Self, ReadingError> {
        Ok(match quantity {
            Quantity::Humidity => Reading::Humidity(Humidity::try_from(raw)?),
            Quantity::Temperature => Reading::Temperature(Temperature::try_from(raw)?),
            Quantity::Co2 => Reading::Co2(Co2Concentration::try_from(raw)?),
        })
    }

    pub fn quantity(&self) -> Quantity {
        match self {
            Reading::Humidity(_) => Quantity::Humidity,
            Reading::Temperature(_) => Quantity::Temperature,
            Reading::Co2(_) => Quantity::Co2,
        }
    }

    /// False when the value is outside what the sensor can physically report.
    /// Such readings are still displayed.
    pub fn is_plausible(&self) -> bool {
        match self {
            Reading::Humidity(value) => value.is_plausible(),
            Reading::Temperature(value) => value.is_plausible(),
            Reading::Co2(value) => value.is_plausible(),
        }
    }

    /// The text written into this reading's display element.
    pub fn display_text(&self) -> String {
        self.to_string()
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Humidity(value) => value.fmt(f),
            Reading::Temperature(value) => value.fmt(f),
            Reading::Co2(value) => value.fmt(f),
        }
    }
}
