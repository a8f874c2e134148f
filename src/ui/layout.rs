use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Fixed screen regions of the wizard
pub struct Layout {
    pub full: Rect,
    pub header: Rect,
    pub content: Rect,
    pub message: Rect,
    pub status: Rect,
}

impl Layout {
    pub fn new(area: Rect) -> Self {
        // Message space stays reserved so the dialog does not move
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(8),    // Dialog
                Constraint::Length(3), // Message panel
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        Self {
            full: area,
            header: chunks[0],
            content: chunks[1],
            message: chunks[2],
            status: chunks[3],
        }
    }

    /// A `width` x `height` rectangle centered in `area`
    pub fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
        let [_, column, _] = RatatuiLayout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(width),
            Constraint::Fill(1),
        ])
        .areas(area);

        let [_, centered, _] = RatatuiLayout::vertical([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .areas(column);

        centered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_stack_vertically() {
        let layout = Layout::new(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.header.height, 1);
        assert_eq!(layout.message.height, 3);
        assert_eq!(layout.status.y, 23);
        assert_eq!(layout.content.height, 19);
    }

    #[test]
    fn centered_box_is_centered() {
        let area = Layout::centered_box(Rect::new(0, 0, 80, 24), 40, 10);
        assert_eq!(area, Rect::new(20, 7, 40, 10));
    }
}
