//! Page chrome: mobile menu, accordions, modals, and reveal-on-scroll.
//!
//! None of this touches the workflow; it is plain flag toggling.

/// Menu toggle glyph while the menu is closed.
pub const MENU_CLOSED_GLYPH: &str = "☰";
/// Menu toggle glyph while the menu is open.
pub const MENU_OPEN_GLYPH: &str = "✕";
/// Visible fraction at which an observed element is revealed.
pub const REVEAL_THRESHOLD: f32 = 0.1;

const MODAL_SUFFIX: &str = "-modal";

/// One accordion header/panel pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccordionPanel {
    /// Header carries the `active` class.
    pub active: bool,
    /// Full content height of the panel.
    pub scroll_height: u32,
    /// Inline max-height; `None` collapses the panel.
    pub max_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Modal {
    element_id: String,
    hidden: bool,
}

/// Non-workflow page state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageChrome {
    menu_open: bool,
    accordions: Vec<AccordionPanel>,
    modals: Vec<Modal>,
    body_scroll_locked: bool,
    revealed: Vec<bool>,
}

impl PageChrome {
    /// Creates chrome with the menu closed and nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the mobile nav is expanded.
    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    /// Glyph currently shown on the menu toggle.
    pub fn menu_glyph(&self) -> &'static str {
        if self.menu_open {
            MENU_OPEN_GLYPH
        } else {
            MENU_CLOSED_GLYPH
        }
    }

    /// Menu toggle clicked.
    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// A nav link was followed; the menu always closes.
    pub fn on_nav_link(&mut self) {
        self.menu_open = false;
    }

    /// Registers a collapsed accordion panel and returns its index.
    pub fn add_accordion(&mut self, scroll_height: u32) -> usize {
        self.accordions.push(AccordionPanel {
            active: false,
            scroll_height,
            max_height: None,
        });
        self.accordions.len() - 1
    }

    /// Accordion panel at `index`.
    pub fn accordion(&self, index: usize) -> Option<&AccordionPanel> {
        self.accordions.get(index)
    }

    /// Accordion header clicked. Unknown indices are ignored.
    pub fn toggle_accordion(&mut self, index: usize) {
        let Some(panel) = self.accordions.get_mut(index) else {
            return;
        };
        panel.active = !panel.active;
        panel.max_height = match panel.max_height {
            Some(_) => None,
            None => Some(panel.scroll_height),
        };
    }

    /// Registers the modal for trigger name `name` (element `<name>-modal`).
    pub fn add_modal(&mut self, name: &str) {
        self.modals.push(Modal {
            element_id: format!("{name}{MODAL_SUFFIX}"),
            hidden: true,
        });
    }

    /// `true` when the modal for `name` is showing.
    pub fn modal_open(&self, name: &str) -> bool {
        let element_id = format!("{name}{MODAL_SUFFIX}");
        self.modals
            .iter()
            .any(|modal| modal.element_id == element_id && !modal.hidden)
    }

    /// Whether background scrolling is disabled.
    pub fn body_scroll_locked(&self) -> bool {
        self.body_scroll_locked
    }

    /// `data-modal-target` clicked.
    pub fn open_modal(&mut self, name: &str) {
        if self.set_modal_hidden(&format!("{name}{MODAL_SUFFIX}"), false) {
            self.body_scroll_locked = true;
        }
    }

    /// `data-modal-close` clicked.
    pub fn close_modal(&mut self, name: &str) {
        if self.set_modal_hidden(&format!("{name}{MODAL_SUFFIX}"), true) {
            self.body_scroll_locked = false;
        }
    }

    /// Window click; closes the modal when the click landed on its backdrop.
    pub fn on_window_click(&mut self, target_element_id: &str) {
        if self.set_modal_hidden(target_element_id, true) {
            self.body_scroll_locked = false;
        }
    }

    /// Starts observing an element; it begins transparent. Returns its id.
    pub fn observe(&mut self) -> usize {
        self.revealed.push(false);
        self.revealed.len() - 1
    }

    /// Intersection update for an observed element. Reveals are permanent.
    pub fn on_intersection(&mut self, element: usize, ratio: f32) {
        if let Some(revealed) = self.revealed.get_mut(element)
            && ratio >= REVEAL_THRESHOLD
        {
            *revealed = true;
        }
    }

    /// Whether `element` has faded in.
    pub fn is_revealed(&self, element: usize) -> bool {
        self.revealed.get(element).copied().unwrap_or(false)
    }

    fn set_modal_hidden(&mut self, element_id: &str, hidden: bool) -> bool {
        match self
            .modals
            .iter_mut()
            .find(|modal| modal.element_id == element_id)
        {
            Some(modal) => {
                modal.hidden = hidden;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accordion_expands_to_scroll_height_and_collapses() {
        let mut chrome = PageChrome::new();
        let faq = chrome.add_accordion(240);

        chrome.toggle_accordion(faq);
        assert_eq!(chrome.accordion(faq).and_then(|p| p.max_height), Some(240));
        assert!(chrome.accordion(faq).is_some_and(|p| p.active));

        chrome.toggle_accordion(faq);
        assert_eq!(chrome.accordion(faq).and_then(|p| p.max_height), None);
        chrome.toggle_accordion(99);
    }

    #[test]
    fn unknown_modal_does_not_lock_scroll() {
        let mut chrome = PageChrome::new();
        chrome.open_modal("missing");
        assert!(!chrome.body_scroll_locked());
    }
}
