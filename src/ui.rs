use crate::app::Focus;
use crate::audio::AudioEngine;
use crate::picker::FilePicker;
use crate::session::PlayerSession;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph};
use std::time::Duration;

const APP_TITLE: &str = "PlayDeck v0.1.0  ";

struct Palette {
    bg: Color,
    panel_bg: Color,
    border: Color,
    border_focus: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
}

const PALETTE: Palette = Palette {
    bg: Color::Rgb(10, 15, 24),
    panel_bg: Color::Rgb(19, 29, 43),
    border: Color::Rgb(69, 121, 176),
    border_focus: Color::Rgb(100, 203, 184),
    text: Color::Rgb(214, 228, 248),
    muted: Color::Rgb(149, 173, 204),
    accent: Color::Rgb(100, 203, 184),
    alert: Color::Rgb(249, 174, 88),
    selected_bg: Color::Rgb(34, 55, 82),
};

pub fn draw(
    frame: &mut Frame,
    session: &PlayerSession,
    picker: &FilePicker,
    audio: &dyn AudioEngine,
    focus: Focus,
) {
    frame.render_widget(
        Block::default().style(Style::default().bg(PALETTE.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, session, vertical[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(vertical[1]);

    draw_catalog(frame, session, body[0], focus == Focus::Catalog);
    draw_picker(frame, picker, body[1], focus == Focus::Picker);
    draw_now_playing(frame, session, audio, vertical[2]);
    draw_status(frame, session, vertical[3]);
}

fn draw_header(frame: &mut Frame, session: &PlayerSession, area: Rect) {
    frame.render_widget(panel_block(""), area);

    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let shuffle = if session.shuffle_enabled() { "ON" } else { "OFF" };
    let line = Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::default()
                .fg(PALETTE.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Tracks {}", session.len()),
            Style::default().fg(PALETTE.text),
        ),
        Span::styled("  |  ", Style::default().fg(PALETTE.muted)),
        Span::styled(
            format!("Shuffle {shuffle}"),
            Style::default().fg(PALETTE.alert),
        ),
        Span::styled("  |  ", Style::default().fg(PALETTE.muted)),
        Span::styled(
            format!("Repeat {}", session.repeat_mode().label()),
            Style::default().fg(PALETTE.alert),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

fn draw_catalog(frame: &mut Frame, session: &PlayerSession, area: Rect, focused: bool) {
    let items: Vec<ListItem> = session
        .tracks()
        .iter()
        .enumerate()
        .map(|(idx, track)| {
            let marker = if session.current_index() == Some(idx) {
                "> "
            } else {
                "  "
            };
            let style = if session.current_index() == Some(idx) {
                Style::default().fg(PALETTE.accent)
            } else {
                Style::default().fg(PALETTE.text)
            };
            ListItem::new(format!("{marker}{}", track.display_name)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(focusable_block("Queue", focused))
        .highlight_style(
            Style::default()
                .bg(PALETTE.selected_bg)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !session.is_empty() {
        state.select(Some(session.selected_track));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_picker(frame: &mut Frame, picker: &FilePicker, area: Rect, focused: bool) {
    let items: Vec<ListItem> = picker
        .entries()
        .iter()
        .map(|entry| ListItem::new(entry.label.clone()).style(Style::default().fg(PALETTE.text)))
        .collect();

    let title = format!("Files: {}", picker.current_dir().display());
    let list = List::new(items)
        .block(focusable_block(&title, focused))
        .highlight_style(
            Style::default()
                .bg(PALETTE.selected_bg)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !picker.entries().is_empty() {
        state.select(Some(picker.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_now_playing(frame: &mut Frame, session: &PlayerSession, audio: &dyn AudioEngine, area: Rect) {
    frame.render_widget(panel_block("Now Playing"), area);
    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let name = session
        .current_track()
        .map(|track| track.display_name.as_str())
        .unwrap_or("No track loaded");
    let transport = if audio.current_track().is_none() {
        "stopped"
    } else if audio.is_paused() {
        "paused"
    } else {
        "playing"
    };
    let info = audio.stream_info().unwrap_or_default();
    let title_line = Line::from(vec![
        Span::styled(name, Style::default().fg(PALETTE.text).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  [{transport}]"), Style::default().fg(PALETTE.muted)),
        Span::styled(
            format!(
                "   {} / {} / {}",
                info.bitrate_text(),
                info.sample_rate_text(),
                info.channels_text()
            ),
            Style::default().fg(PALETTE.muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(title_line), rows[0]);

    let position = audio.position().unwrap_or(Duration::ZERO);
    let duration = audio.duration();
    let ratio = duration
        .filter(|total| !total.is_zero())
        .map(|total| (position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(PALETTE.accent).bg(PALETTE.panel_bg))
        .use_unicode(true)
        .label("")
        .ratio(ratio);
    frame.render_widget(gauge, rows[1]);

    let total_text = duration.map_or_else(|| String::from("--:--"), format_time);
    let time_line = Line::from(vec![
        Span::styled(
            format!("{} / {}", format_time(position), total_text),
            Style::default().fg(PALETTE.text),
        ),
        Span::styled(
            format!("   Vol {}%", (audio.volume() * 100.0).round() as u16),
            Style::default().fg(PALETTE.muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(time_line), rows[2]);
}

fn draw_status(frame: &mut Frame, session: &PlayerSession, area: Rect) {
    frame.render_widget(panel_block("Status"), area);
    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let line = Line::from(vec![
        Span::styled(&session.status, Style::default().fg(PALETTE.text)),
        Span::styled(
            "   Tab panes | Enter pick/play | a add dir | Space play/pause | x stop | n/p skip | \u{2190}/\u{2192} seek | 0-9 jump | z shuffle | r repeat | +/- vol | q quit",
            Style::default().fg(PALETTE.muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

fn panel_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PALETTE.border))
        .style(Style::default().bg(PALETTE.panel_bg).fg(PALETTE.text))
}

fn focusable_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused {
        PALETTE.border_focus
    } else {
        PALETTE.border
    };
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(PALETTE.panel_bg).fg(PALETTE.text))
}

pub fn format_time(value: Duration) -> String {
    let total = value.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}
