use crate::app::{App, CommandDetail};
use crate::theme::{Theme, status_color};
use crate::views::{clock, format_duration, short_date, truncate_to_width};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use shelltrail_core::Command;

/// Rows of the target field block: border (2) plus six fields.
const FIELD_BLOCK_HEIGHT: u16 = 8;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(detail) = &app.command_detail else {
        let msg = if app.window_loading {
            "Loading session..."
        } else {
            "Command unavailable."
        };
        frame.render_widget(
            Paragraph::new(Span::styled(msg, Style::new().fg(Theme::TEXT_SECONDARY)))
                .alignment(Alignment::Center),
            area,
        );
        return;
    };
    let Some(target) = detail.target() else {
        return;
    };

    let [fields_area, window_area] = Layout::vertical([
        Constraint::Length(FIELD_BLOCK_HEIGHT),
        Constraint::Fill(1),
    ])
    .areas(area);

    render_fields(frame, detail, target, fields_area);
    render_window(frame, detail, window_area);
}

fn render_fields(frame: &mut Frame, detail: &CommandDetail, cmd: &Command, area: Rect) {
    let mut title = String::from(" Command ");
    if !detail.has_previous() {
        title.push_str("· session start ");
    }
    if !detail.has_next() {
        title.push_str("· session end ");
    }
    let block = Theme::block_accent().title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = Style::new().fg(Theme::TEXT_KEY_DESC);
    let value = Style::new().fg(Theme::TEXT_CONTENT);
    let field = |name: &'static str, text: String, style: Style| {
        Line::from(vec![
            Span::styled(format!(" {name:<10}"), label),
            Span::styled(text, style),
        ])
    };

    let repo = if cmd.repo.as_deref().is_some_and(|r| !r.is_empty()) {
        format!(
            "{} ({})",
            cmd.repo.as_deref().unwrap_or_default(),
            cmd.branch_key()
        )
    } else {
        "-".to_string()
    };
    let status = if cmd.succeeded() {
        "ok".to_string()
    } else {
        format!("exit {}", cmd.exit_status)
    };
    let duration = cmd
        .duration_ms
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        field(
            "command",
            truncate_to_width(&cmd.command, usize::from(inner.width).saturating_sub(11)),
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        ),
        field("directory", cmd.cwd.clone(), value),
        field("repo", repo, Style::new().fg(Theme::ACCENT)),
        field("time", short_date(cmd.timestamp), value),
        Line::from(vec![
            Span::styled(format!(" {:<10}", "status"), label),
            Span::styled(status, Style::new().fg(status_color(cmd.exit_status))),
            Span::styled(format!("   took {duration}"), value),
        ]),
        field(
            "session",
            cmd.session.clone().unwrap_or_else(|| "-".to_string()),
            Style::new().fg(Theme::TEXT_MUTED),
        ),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_window(frame: &mut Frame, detail: &CommandDetail, area: Rect) {
    let width = usize::from(area.width).saturating_sub(16);
    let items: Vec<ListItem> = detail
        .commands
        .iter()
        .map(|cmd| {
            let marker = if cmd.succeeded() { "✓" } else { "✗" };
            ListItem::new(Line::from(vec![
                Span::styled(clock(cmd.timestamp), Style::new().fg(Theme::TEXT_SECONDARY)),
                Span::raw("  "),
                Span::styled(marker, Style::new().fg(status_color(cmd.exit_status))),
                Span::raw("  "),
                Span::styled(
                    truncate_to_width(&cmd.command, width),
                    Style::new().fg(Theme::TEXT_CONTENT),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::new()
                .bg(Theme::SELECTED_BG)
                .fg(Theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(" > ")
        .highlight_spacing(ratatui::widgets::HighlightSpacing::Always);

    let mut state = ListState::default().with_selected(Some(detail.target_index));
    frame.render_stateful_widget(list, area, &mut state);
}
