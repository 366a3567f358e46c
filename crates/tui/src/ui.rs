use crate::app::{App, FlashLevel, View};
use crate::theme::Theme;
use crate::views::{command_detail, context_detail, help, summary};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, app: &App) {
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, app, header_area);

    // Body
    match app.underlying_view() {
        View::Summary => summary::render(frame, app, body_area),
        View::ContextDetail => context_detail::render(frame, app, body_area),
        View::CommandDetail => command_detail::render(frame, app, body_area),
        View::Help => {}
    }

    render_footer(frame, app, footer_area);

    // Help overlay
    if matches!(app.view, View::Help) {
        help::render(frame, frame.area());
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Theme::block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut left_spans = vec![
        Span::styled(" shelltrail ", Style::new().fg(Theme::BRAND).bold()),
        Span::raw("  "),
        Span::styled(
            app.period_label(),
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        ),
        Span::styled(
            format!("  [{}]", app.period),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ),
        Span::styled(
            format!("  {}", app.display_mode.label()),
            Style::new().fg(Theme::BRANCH),
        ),
    ];

    if !app.filter.is_empty() && !app.filter_editing {
        left_spans.push(Span::styled(
            format!("  filter:{}", app.filter),
            Style::new().fg(Theme::HIGHLIGHT),
        ));
    }

    if app.loading {
        left_spans.push(Span::styled(
            "  Loading...",
            Style::new().fg(Theme::HIGHLIGHT).italic(),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(left_spans)).alignment(Alignment::Left),
        inner,
    );

    // Right side: where in the hierarchy we are
    let right = match app.underlying_view() {
        View::Summary | View::Help => Span::styled(
            format!("{} contexts ", app.contexts.len()),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ),
        View::ContextDetail | View::CommandDetail => match &app.detail_context {
            Some(key) => Span::styled(
                format!("{} ", key.short_name()),
                Style::new().fg(Theme::ACCENT).bold(),
            ),
            None => Span::raw(""),
        },
    };
    frame.render_widget(
        Paragraph::new(Line::from(right)).alignment(Alignment::Right),
        inner,
    );
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);

    let mut spans = if app.filter_editing {
        vec![
            Span::styled(
                " / ",
                Style::new()
                    .fg(Color::Black)
                    .bg(Theme::HIGHLIGHT)
                    .bold(),
            ),
            Span::styled(
                format!(" {}", app.filter),
                Style::new().fg(Theme::TEXT_PRIMARY),
            ),
            Span::styled("_", Style::new().fg(Theme::HIGHLIGHT)),
            Span::styled("  ESC cancel  Enter confirm", desc_style),
        ]
    } else {
        let hints: &[(&str, &str)] = match app.view {
            View::Summary => &[
                (" j/k ", "navigate  "),
                ("Enter ", "open  "),
                ("h/l ", "period  "),
                ("[/] ", "day/week/month  "),
                ("/ ", "filter  "),
                ("u/a ", "unique/all  "),
                ("? ", "help  "),
                ("q ", "quit"),
            ],
            View::ContextDetail => &[
                (" j/k ", "navigate  "),
                ("Enter ", "session  "),
                ("H/L ", "context  "),
                ("h/l ", "period  "),
                ("/ ", "filter  "),
                ("Esc ", "back  "),
                ("q ", "quit"),
            ],
            View::CommandDetail => &[
                (" j/k ", "prev/next command  "),
                ("Esc ", "back  "),
                ("q ", "quit"),
            ],
            View::Help => &[(" ?/Esc ", "close  "), ("q ", "quit")],
        };
        hints
            .iter()
            .flat_map(|(key, desc)| {
                [
                    Span::styled(*key, key_style),
                    Span::styled(*desc, desc_style),
                ]
            })
            .collect()
    };

    // Append flash message to any view's footer
    if let Some((ref msg, level)) = app.flash_message {
        let color = match level {
            FlashLevel::Error => Theme::FAILURE,
            FlashLevel::Info => Theme::ACCENT,
        };
        spans.push(Span::styled("  ", Style::new()));
        spans.push(Span::styled(msg.as_str(), Style::new().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
