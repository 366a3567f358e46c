use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("?", "Toggle this help"),
            ("q", "Quit (Ctrl-C always quits)"),
        ],
    ),
    (
        "Time",
        &[
            ("h/l", "Previous/next period"),
            ("t/e", "Today/yesterday"),
            ("[/]", "Shorter/longer period (day, week, month)"),
        ],
    ),
    (
        "Filtering",
        &[
            ("/", "Filter commands by text"),
            ("u/a", "Unique commands only / all commands"),
        ],
    ),
    (
        "Summary",
        &[
            ("j/k", "Navigate contexts"),
            ("Enter", "Open context"),
        ],
    ),
    (
        "Context",
        &[
            ("j/k", "Navigate commands"),
            ("Enter", "Show command in its session"),
            ("H/L", "Previous/next context"),
            ("Esc", "Back to summary"),
        ],
    ),
    (
        "Command",
        &[
            ("j/k", "Previous/next command in session"),
            ("Esc", "Back to context"),
        ],
    ),
];

pub fn render(frame: &mut Frame, area: Rect) {
    // Center the help overlay
    let popup_width = 60u16.min(area.width.saturating_sub(4));
    let popup_height = 30u16.min(area.height.saturating_sub(4));
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(x, y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Theme::block_accent()
        .title(" Keyboard Shortcuts ")
        .padding(Theme::PADDING_CARD);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::new().fg(Theme::HIGHLIGHT).bold();
    let desc_style = Style::new().fg(Theme::TEXT_CONTENT);
    let header_style = Style::new().fg(Theme::ACCENT).bold();

    let mut lines = Vec::new();
    for (i, (title, keys)) in SECTIONS.iter().enumerate() {
        if i > 0 {
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(Span::styled(
            format!("── {title} ──"),
            header_style,
        )));
        for (key, desc) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<10}"), key_style),
                Span::styled(*desc, desc_style),
            ]));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Press ? or Esc to close",
        Style::new().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}
