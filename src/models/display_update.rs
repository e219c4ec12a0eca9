use std::fmt::Display;

use super::{element::ElementId, reading::Reading};

/// One write of text into one display element.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    pub element: ElementId,
    pub text: String,
}

impl From<Reading> for DisplayUpdate {
    fn from(reading: Reading) -> Self {
        Self {
            element: reading.quantity().element(),
            text: reading.display_text(),
        }
    }
}

impl Display for DisplayUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Display Update | {}: {}>", self.element, self.text)
    }
}
