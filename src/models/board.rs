use std::collections::BTreeMap;

use serde::Serialize;

use super::{display_update::DisplayUpdate, element::ElementId};

/// Shown in every element before the page has loaded.
pub const PLACEHOLDER: &str = "n/a";

/// Shown in every element once the page has loaded, until a reading arrives.
pub const LOADING: &str = "…";

/// The current text of every display element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Board {
    elements: BTreeMap<ElementId, String>,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            elements: ElementId::PAGE_ORDER
                .into_iter()
                .map(|element| (element, PLACEHOLDER.to_string()))
                .collect(),
        }
    }
}

impl Board {
    /// Page load: blank every element's placeholder.
    pub fn on_load(&mut self) {
        for text in self.elements.values_mut() {
            *text = LOADING.to_string();
        }
    }

    pub fn apply(&mut self, update: &DisplayUpdate) {
        self.elements.insert(update.element, update.text.clone());
    }

    pub fn text(&self, element: ElementId) -> &str {
        self.elements
            .get(&element)
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER)
    }

    /// Elements in page order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &str)> {
        self.elements
            .iter()
            .map(|(element, text)| (*element, text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_placeholders() {
        let board = Board::default();
        for element in ElementId::PAGE_ORDER {
            assert_eq!(board.text(element), PLACEHOLDER);
        }
    }

    #[test]
    fn test_on_load_blanks_placeholders() {
        let mut board = Board::default();
        board.on_load();
        assert!(board.iter().all(|(_, text)| text == LOADING));
    }

    #[test]
    fn test_apply_replaces_only_target_element() {
        let mut board = Board::default();
        board.on_load();
        board.apply(&DisplayUpdate {
            element: ElementId::Humidity,
            text: "55%".into(),
        });

        assert_eq!(board.text(ElementId::Humidity), "55%");
        assert_eq!(board.text(ElementId::Temperature), LOADING);
        assert_eq!(board.text(ElementId::Co2Ppm), LOADING);
    }

    #[test]
    fn test_iterates_in_page_order() {
        let board = Board::default();
        let order: Vec<ElementId> = board.iter().map(|(element, _)| element).collect();
        assert_eq!(order, ElementId::PAGE_ORDER.to_vec());
    }
}
