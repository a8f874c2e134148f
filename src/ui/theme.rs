use ratatui::style::{Color, Modifier, Style};

/// Colors of the wizard and the styles built from them
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,
    pub info: Color,
    pub text: Color,
    pub danger: Color,
    pub checked: Color,
    pub dim: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Magenta,
            info: Color::Cyan,
            text: Color::White,
            danger: Color::Red,
            checked: Color::Green,
            dim: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }

    pub fn danger_style(&self) -> Style {
        Style::default().fg(self.danger)
    }

    /// Application title and dialog titles
    pub fn title_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    /// The button Enter would press
    pub fn focused_button_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    /// The software item under the cursor
    pub fn cursor_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::REVERSED)
    }

    pub fn checkbox_style(&self, checked: bool) -> Style {
        if checked {
            Style::default().fg(self.checked)
        } else {
            self.text_style()
        }
    }

    /// Header line of a message panel, in the color of its kind
    pub fn panel_style(&self, is_error: bool) -> Style {
        let color = if is_error { self.danger } else { self.info };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_items_stand_out() {
        let theme = Theme::default();
        assert_ne!(theme.checkbox_style(true), theme.checkbox_style(false));
        assert_eq!(theme.checkbox_style(true).fg, Some(Color::Green));
    }

    #[test]
    fn focus_is_reversed() {
        let theme = Theme::default();
        assert!(theme.focused_button_style().add_modifier.contains(Modifier::REVERSED));
        assert!(theme.cursor_style().add_modifier.contains(Modifier::REVERSED));
        assert_eq!(theme.panel_style(true).fg, Some(Color::Red));
    }
}
