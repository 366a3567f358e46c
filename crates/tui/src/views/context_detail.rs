use crate::app::App;
use crate::peek::{PeekSlot, PeriodPeek};
use crate::scroll::{self, DetailLine};
use crate::theme::{Theme, status_color};
use crate::views::{clock, truncate_to_width};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use shelltrail_core::bucket::{Bucket, Granularity, bucket_label};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.detail_commands.is_empty() {
        render_empty(frame, app, area);
        return;
    }

    let granularity = app.period.granularity();
    let width = usize::from(area.width);
    let lines: Vec<Line> = scroll::flatten(&app.bucket_sizes())
        .into_iter()
        .skip(app.detail_scroll)
        .take(usize::from(area.height))
        .map(|line| match line {
            DetailLine::Blank => Line::raw(""),
            DetailLine::Header { bucket } => {
                bucket_header(&app.detail_buckets[bucket], granularity)
            }
            DetailLine::Command { bucket, index } => command_line(
                &app.detail_buckets[bucket],
                &app.detail_commands[index],
                index == app.detail_selected,
                width,
            ),
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn bucket_header(bucket: &Bucket, granularity: Granularity) -> Line<'static> {
    let noun = if bucket.len() == 1 {
        "command"
    } else {
        "commands"
    };
    Line::from(vec![
        Span::styled("── ", Style::new().fg(Theme::GUTTER)),
        Span::styled(
            bucket_label(bucket.id, granularity),
            Style::new().fg(Theme::BUCKET_HEADER).bold(),
        ),
        Span::styled(
            format!("  {} {noun}", bucket.len()),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ),
        Span::styled(
            format!(
                "  {}–{}",
                clock(bucket.first_timestamp),
                clock(bucket.last_timestamp)
            ),
            Style::new().fg(Theme::TEXT_MUTED),
        ),
    ])
}

fn command_line(
    bucket: &Bucket,
    cmd: &shelltrail_core::Command,
    selected: bool,
    width: usize,
) -> Line<'static> {
    let marker = if cmd.succeeded() { "✓" } else { "✗" };
    let repeats = bucket.count_of(&cmd.command);
    let suffix = if repeats > 1 {
        format!("  ×{repeats}")
    } else {
        String::new()
    };
    // prefix (3) + time (5) + gaps and marker (5) + suffix
    let text_width = width.saturating_sub(13 + suffix.len());

    let base = if selected {
        Style::new().bg(Theme::SELECTED_BG).add_modifier(Modifier::BOLD)
    } else {
        Style::new()
    };
    Line::from(vec![
        Span::styled(if selected { " > " } else { "   " }, base.fg(Theme::ACCENT)),
        Span::styled(clock(cmd.timestamp), base.fg(Theme::TEXT_SECONDARY)),
        Span::styled("  ", base),
        Span::styled(marker, base.fg(status_color(cmd.exit_status))),
        Span::styled("  ", base),
        Span::styled(
            truncate_to_width(&cmd.command, text_width),
            base.fg(Theme::TEXT_PRIMARY),
        ),
        Span::styled(suffix, base.fg(Theme::HIGHLIGHT)),
    ])
}

fn render_empty(frame: &mut Frame, app: &App, area: Rect) {
    let block = Theme::block_dim().padding(Theme::PADDING_COMPACT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let key_style = Style::new().fg(Theme::TEXT_KEY).bold();
    let desc_style = Style::new().fg(Theme::TEXT_CONTENT);
    let name = app
        .detail_context
        .as_ref()
        .map(|key| key.short_name().to_string())
        .unwrap_or_default();

    let headline = if app.loading {
        "Loading...".to_string()
    } else if !app.filter.is_empty() {
        format!("No commands in {name} match \"{}\".", app.filter)
    } else {
        format!("No commands in {name} for {}.", app.period_label())
    };
    let mut lines = vec![
        Line::from(Span::styled(
            headline,
            Style::new().fg(Theme::TEXT_SECONDARY),
        )),
        Line::raw(""),
    ];

    if let Some(peek) = &app.peek {
        if matches!(peek.previous, PeekSlot::Pending) || matches!(peek.next, PeekSlot::Pending) {
            lines.push(Line::from(Span::styled(
                "Checking adjacent periods...",
                Style::new().fg(Theme::TEXT_MUTED).italic(),
            )));
        }
        if let Some(ready) = peek.previous.ready() {
            lines.push(peek_line("h", ready, key_style, desc_style));
        }
        if let Some(ready) = peek.next.ready() {
            lines.push(peek_line("l", ready, key_style, desc_style));
        }
    }

    let hints = app.context_hints();
    let mut context_spans = Vec::new();
    if let Some(prev) = &hints.previous {
        context_spans.push(Span::styled("H ", key_style));
        context_spans.push(Span::styled(format!("{}   ", prev.short_name()), desc_style));
    }
    if let Some(next) = &hints.next {
        context_spans.push(Span::styled("L ", key_style));
        context_spans.push(Span::styled(next.short_name().to_string(), desc_style));
    }
    if !context_spans.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(context_spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn peek_line(key: &'static str, peek: &PeriodPeek, key_style: Style, desc_style: Style) -> Line<'static> {
    let count = match peek.count {
        0 => "no commands".to_string(),
        1 => "1 command".to_string(),
        n => format!("{n} commands"),
    };
    Line::from(vec![
        Span::styled(format!("{key} "), key_style),
        Span::styled(format!("{}: {count}", peek.label), desc_style),
    ])
}
