use derive_more::Display;
use serde::Serialize;

/// Fixed identifiers of the dashboard's display elements.
/// Declaration order is page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementId {
    #[display(fmt = "co2ppm")]
    Co2Ppm,
    #[display(fmt = "temperature")]
    Temperature,
    #[display(fmt = "humidity")]
    Humidity,
}

impl ElementId {
    pub const PAGE_ORDER: [ElementId; 3] =
        [ElementId::Co2Ppm, ElementId::Temperature, ElementId::Humidity];
}
