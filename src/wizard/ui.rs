use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};

use super::state::{self, Screen, ScreenKind};
use super::Wizard;
use crate::ui::Layout;

/// Draw the current wizard state
pub fn draw(frame: &mut Frame, wizard: &Wizard) {
    let layout = Layout::new(frame.area());
    frame.render_widget(Clear, layout.full);

    let screen = state::screen(wizard.state());

    draw_header(frame, layout.header, wizard);
    match screen.kind {
        ScreenKind::Text => draw_text_screen(frame, layout.content, wizard, &screen),
        ScreenKind::Waiting => draw_waiting_screen(frame, layout.content, wizard, &screen),
        ScreenKind::Selection => draw_selection_screen(frame, layout.content, wizard, &screen),
    }
    draw_message(frame, layout.message, wizard);
    draw_status_bar(frame, layout.status, wizard);
}

fn draw_header(frame: &mut Frame, area: Rect, wizard: &Wizard) {
    let title = format!(" {} ", wizard.config.general.title);
    frame.render_widget(
        Paragraph::new(title).style(wizard.theme.title_style()),
        area,
    );

    let right = if wizard.is_dryrun() {
        format!("[dry run] {} ", wizard.state().short_name())
    } else {
        format!("{} ", wizard.state().short_name())
    };
    frame.render_widget(
        Paragraph::new(right)
            .style(wizard.theme.info_style())
            .alignment(Alignment::Right),
        area,
    );
}

fn framed_box(frame: &mut Frame, area: Rect, wizard: &Wizard, title: &str, height: u16) -> Rect {
    let width = 64.min(area.width.saturating_sub(4));
    let centered = Layout::centered_box(area, width, height.min(area.height));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(wizard.theme.dim_style())
        .title(format!(" {title} "))
        .title_style(wizard.theme.title_style());

    let inner = block.inner(centered);
    frame.render_widget(Clear, centered);
    frame.render_widget(block, centered);
    inner
}

fn draw_text_screen(frame: &mut Frame, area: Rect, wizard: &Wizard, screen: &Screen) {
    let inner = framed_box(frame, area, wizard, screen.title, 10);
    if inner.height < 2 {
        return;
    }

    let text_area = Rect::new(inner.x + 1, inner.y + 1, inner.width.saturating_sub(2), inner.height - 2);
    frame.render_widget(
        Paragraph::new(screen.text)
            .style(wizard.theme.text_style())
            .wrap(Wrap { trim: true }),
        text_area,
    );

    let buttons_area = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
    draw_buttons(frame, buttons_area, wizard, screen);
}

fn draw_waiting_screen(frame: &mut Frame, area: Rect, wizard: &Wizard, screen: &Screen) {
    let inner = framed_box(frame, area, wizard, screen.title, 7);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{}  {}", wizard.spinner_char(), screen.text),
            wizard.theme.text_style(),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

fn draw_selection_screen(frame: &mut Frame, area: Rect, wizard: &Wizard, screen: &Screen) {
    let height = area.height.saturating_sub(2).max(8);
    let inner = framed_box(frame, area, wizard, screen.title, height);
    if inner.height < 4 {
        return;
    }

    let chunks = ratatui::layout::Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Prompt
            Constraint::Length(1), // Tabs
            Constraint::Min(1),    // Items
            Constraint::Length(1), // Buttons
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(screen.text).style(wizard.theme.dim_style()),
        chunks[0],
    );

    let selection = &wizard.selection;
    let titles: Vec<String> = selection.groups.iter().map(|g| g.label.clone()).collect();
    frame.render_widget(
        Tabs::new(titles)
            .select(selection.tab)
            .style(wizard.theme.dim_style())
            .highlight_style(wizard.theme.title_style()),
        chunks[1],
    );

    let items: Vec<ListItem> = selection
        .current_group()
        .map(|group| {
            group
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let style = if i == selection.cursor {
                        wizard.theme.cursor_style()
                    } else {
                        wizard.theme.checkbox_style(item.checked)
                    };
                    let mark = if item.checked { "[x]" } else { "[ ]" };
                    ListItem::new(format!("{} {}", mark, item.label)).style(style)
                })
                .collect()
        })
        .unwrap_or_default();

    if items.is_empty() {
        frame.render_widget(
            Paragraph::new("Nothing to install in this group.").style(wizard.theme.dim_style()),
            chunks[2],
        );
    } else {
        let mut list_state = ListState::default().with_selected(Some(selection.cursor));
        frame.render_stateful_widget(List::new(items), chunks[2], &mut list_state);
    }

    draw_buttons(frame, chunks[3], wizard, screen);
}

fn draw_buttons(frame: &mut Frame, area: Rect, wizard: &Wizard, screen: &Screen) {
    let mut spans = Vec::new();
    for (i, button) in screen.buttons.iter().enumerate() {
        let style = if i == wizard.focused_button {
            wizard.theme.focused_button_style()
        } else {
            wizard.theme.text_style()
        };
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(format!("[ {} ]", button.label()), style));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn draw_message(frame: &mut Frame, area: Rect, wizard: &Wizard) {
    let Some(msg) = &wizard.message else {
        return;
    };

    let (title, text_style) = if msg.is_error {
        (" Error ", wizard.theme.danger_style())
    } else {
        (" Info ", wizard.theme.text_style())
    };
    let panel_style = wizard.theme.panel_style(msg.is_error);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(panel_style)
        .title(title)
        .title_style(panel_style);

    frame.render_widget(
        Paragraph::new(Span::styled(msg.text.as_str(), text_style))
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_status_bar(frame: &mut Frame, area: Rect, wizard: &Wizard) {
    frame.render_widget(Clear, area);

    frame.render_widget(
        Paragraph::new(format!(" {}", wizard.status_bar.left_hint)).style(wizard.theme.dim_style()),
        Rect::new(area.x, area.y, area.width * 2 / 3, 1),
    );
    frame.render_widget(
        Paragraph::new(format!("{} ", wizard.status_bar.right_hint))
            .style(wizard.theme.dim_style())
            .alignment(Alignment::Right),
        area,
    );
}
