use crate::wizard::state::ScreenKind;

/// Key hints shown at the bottom of the screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBarState {
    pub left_hint: String,
    pub right_hint: String,
}

impl StatusBarState {
    pub fn for_screen(kind: ScreenKind) -> Self {
        match kind {
            ScreenKind::Text => Self::buttons(),
            ScreenKind::Waiting => Self::waiting(),
            ScreenKind::Selection => Self::selection(),
        }
    }

    /// Hints for a plain screen with a button row
    pub fn buttons() -> Self {
        Self {
            left_hint: "h/l: choose".to_string(),
            right_hint: "Enter: press  Esc: cancel".to_string(),
        }
    }

    /// Hints for the software selection screen
    pub fn selection() -> Self {
        Self {
            left_hint: "j/k: move  Space: toggle  Tab: next group".to_string(),
            right_hint: "Enter: install  Esc: cancel".to_string(),
        }
    }

    /// Hints while an operation runs
    pub fn waiting() -> Self {
        Self {
            left_hint: "Please wait...".to_string(),
            right_hint: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_screens_offer_no_keys() {
        let hints = StatusBarState::for_screen(ScreenKind::Waiting);
        assert!(hints.right_hint.is_empty());
        assert_eq!(StatusBarState::for_screen(ScreenKind::Selection), StatusBarState::selection());
    }
}
