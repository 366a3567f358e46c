use crate::app::App;
use crate::theme::Theme;
use crate::views::{clock, pad_to_width, short_date};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use shelltrail_core::filter::DisplayMode;
use shelltrail_core::group::ContextSummary;
use shelltrail_core::period::Period;

const NAME_WIDTH: usize = 24;
const MAX_BRANCHES: usize = 3;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.contexts.is_empty() {
        let msg = if app.loading {
            "Loading...".to_string()
        } else {
            format!("No commands in {}.", app.period_label())
        };
        render_empty(frame, area, &msg);
        return;
    }

    let narrowed = !app.filter.is_empty() || app.display_mode != DisplayMode::All;
    let items: Vec<ListItem> = app
        .contexts
        .iter()
        .map(|row| ListItem::new(context_line(row, app.period, narrowed)))
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::new()
                .bg(Theme::SELECTED_BG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(" > ")
        .highlight_spacing(ratatui::widgets::HighlightSpacing::Always);

    let mut state = ListState::default().with_selected(Some(app.selected_context));
    frame.render_stateful_widget(list, area, &mut state);
}

fn context_line(row: &ContextSummary, period: Period, narrowed: bool) -> Line<'static> {
    let count = if narrowed {
        format!("{:>4}/{:<4}", row.filtered, row.total)
    } else {
        format!("{:>4}     ", row.total)
    };
    let count_color = if narrowed && row.filtered == 0 {
        Theme::TEXT_MUTED
    } else {
        Theme::SUCCESS
    };

    let last_active = match period {
        Period::Day => clock(row.last_timestamp),
        Period::Week | Period::Month => short_date(row.last_timestamp),
    };

    let mut spans = vec![
        Span::styled(
            pad_to_width(row.key.short_name(), NAME_WIDTH),
            Style::new().fg(Theme::TEXT_PRIMARY),
        ),
        Span::styled(count, Style::new().fg(count_color)),
        Span::styled(
            format!("  {last_active:>12}  "),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ),
    ];

    if row.key.has_repo() {
        spans.push(Span::styled(
            format!("{} ", row.key.repo),
            Style::new().fg(Theme::ACCENT),
        ));
        let branches: Vec<String> = row
            .branches
            .iter()
            .take(MAX_BRANCHES)
            .map(|(branch, n)| format!("{branch}({n})"))
            .collect();
        spans.push(Span::styled(
            branches.join(" "),
            Style::new().fg(Theme::BRANCH),
        ));
        if row.branches.len() > MAX_BRANCHES {
            spans.push(Span::styled(
                format!(" +{}", row.branches.len() - MAX_BRANCHES),
                Style::new().fg(Theme::TEXT_MUTED),
            ));
        }
        spans.push(Span::raw("  "));
    }

    spans.push(Span::styled(
        row.key.cwd.clone(),
        Style::new().fg(Theme::TEXT_MUTED),
    ));
    Line::from(spans)
}

fn render_empty(frame: &mut Frame, area: Rect, msg: &str) {
    let lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            msg.to_string(),
            Style::new().fg(Theme::TEXT_SECONDARY),
        )),
        Line::from(vec![
            Span::styled("h", Style::new().fg(Theme::TEXT_KEY).bold()),
            Span::styled(" previous period   ", Style::new().fg(Theme::TEXT_KEY_DESC)),
            Span::styled("]", Style::new().fg(Theme::TEXT_KEY).bold()),
            Span::styled(" longer period", Style::new().fg(Theme::TEXT_KEY_DESC)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}
