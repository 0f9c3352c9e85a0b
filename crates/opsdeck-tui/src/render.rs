//! Frame drawing: Header, panels and full-screen sub-views.
//!
//! Every visible cell is written each frame: panel content is clipped to
//! the interior width and padded with blanks, and rows past the content
//! are blanked too, so nothing from an earlier frame survives.

use std::time::Duration;

use opsdeck_core::{CycleReport, Outcome, SourceId};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthChar;

use crate::command::KEY_HINTS;
use crate::layout::{Panel, ScreenLayout};
use crate::theme;

/// One row of text and the style it is drawn in.
pub type StyledLine = (String, Style);

/// What header row 1 and 2 show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Local wall clock, preformatted.
    pub clock: String,
    pub refresh_interval: Duration,
    /// Duration of the last completed fetch cycle.
    pub last_cycle: Option<Duration>,
    /// Replaces the key hints until the next key press.
    pub status: Option<String>,
}

// ── Dashboard ───────────────────────────────────────────────────────

/// Draw header then panels, in fixed order.
pub fn draw_dashboard(frame: &mut Frame, header: &HeaderInfo, report: Option<&CycleReport>) {
    let area = frame.area();
    let layout = ScreenLayout::compute(area.width, area.height);

    draw_header(frame, layout.header.intersection(area), header);
    for panel in layout.panels() {
        draw_panel(frame, &panel, report);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, header: &HeaderInfo) {
    if area.is_empty() {
        return;
    }
    let width = usize::from(area.width);
    let cycle = header
        .last_cycle
        .map_or_else(|| "-".to_owned(), |d| format!("{:.1}s", d.as_secs_f64()));

    let row1 = Line::from(vec![
        Span::styled(" opsdeck ", theme::brand()),
        Span::styled(
            fit_line(
                &format!(
                    " {}  every {}  cycle {cycle}",
                    header.clock,
                    humantime::format_duration(header.refresh_interval)
                ),
                width.saturating_sub(9),
            ),
            theme::text(),
        ),
    ]);

    let row2 = match header.status.as_deref() {
        Some(status) => Line::from(Span::styled(
            fit_line(&format!(" {status}"), width),
            theme::status_message(),
        )),
        None => hints_line(),
    };

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(vec![row1, row2]), area);
}

fn hints_line() -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (key, label) in KEY_HINTS {
        spans.push(Span::styled(*key, theme::key_hint_key()));
        spans.push(Span::styled(format!(" {label}  "), theme::key_hint()));
    }
    Line::from(spans)
}

fn draw_panel(frame: &mut Frame, panel: &Panel, report: Option<&CycleReport>) {
    let area = panel.rect.intersection(frame.area());
    if area.is_empty() {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default())
        .title(Span::styled(format!(" {} ", panel.title), theme::title_style()));
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);
    let rows = usize::from(inner.height);
    draw_lines(frame, inner, &panel_lines(panel.sources, report, rows));
}

/// A label row per source followed by that source's lines.
///
/// The `rows` are shared out evenly, earlier sources taking the
/// remainder, so a long first source never hides the ones below it.
fn panel_lines(
    sources: &[SourceId],
    report: Option<&CycleReport>,
    rows: usize,
) -> Vec<StyledLine> {
    let count = sources.len().max(1);
    let mut out = Vec::with_capacity(rows);
    for (i, id) in sources.iter().enumerate() {
        let share = rows / count + usize::from(i < rows % count);
        if share == 0 {
            continue;
        }
        out.push((format!("[{id}]"), theme::source_label()));
        let body = match report {
            None => plain_lines(&["fetching…".to_owned()]),
            Some(r) => r.get(*id).map_or_else(Vec::new, |res| outcome_lines(&res.outcome)),
        };
        out.extend(
            clip_block(body, share - 1)
                .into_iter()
                .map(|(line, style)| (format!(" {line}"), style)),
        );
    }
    out
}

/// Keep at most `rows` lines; an overflowing block ends in a count of
/// what was cut.
fn clip_block(mut lines: Vec<StyledLine>, rows: usize) -> Vec<StyledLine> {
    if lines.len() <= rows {
        return lines;
    }
    if rows == 0 {
        return Vec::new();
    }
    let hidden = lines.len() - (rows - 1);
    lines.truncate(rows - 1);
    lines.push((format!("… +{hidden} more"), theme::key_hint()));
    lines
}

/// Display lines for one outcome, styled by what produced them.
pub fn outcome_lines(outcome: &Outcome) -> Vec<StyledLine> {
    match outcome {
        Outcome::Lines(lines) if lines.is_empty() => plain_lines(&["(no data)".to_owned()]),
        Outcome::Lines(lines) => lines
            .iter()
            .map(|l| (l.clone(), theme::line_style(l)))
            .collect(),
        Outcome::Unavailable(p) => vec![(p.to_string(), theme::placeholder_style(p))],
    }
}

/// Lines with no status meaning, such as tool output.
pub fn plain_lines(lines: &[String]) -> Vec<StyledLine> {
    lines.iter().map(|l| (l.clone(), theme::text())).collect()
}

// ── Sub-views ───────────────────────────────────────────────────────

/// Full-screen bordered listing, used by detail views and the packet scan.
pub fn draw_detail(frame: &mut Frame, title: &str, lines: &[StyledLine]) {
    let area = frame.area();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_detail())
        .title(Span::styled(format!(" {title} "), theme::title_style()))
        .title_bottom(Span::styled(" any key to return ", theme::key_hint()));
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);
    draw_lines(frame, inner, lines);
}

// ── Clipping ────────────────────────────────────────────────────────

fn draw_lines(frame: &mut Frame, area: Rect, lines: &[StyledLine]) {
    if area.is_empty() {
        return;
    }
    let width = usize::from(area.width);
    let rows: Vec<Line> = (0..usize::from(area.height))
        .map(|row| match lines.get(row) {
            Some((text, style)) => Line::from(Span::styled(fit_line(text, width), *style)),
            None => Line::from(" ".repeat(width)),
        })
        .collect();
    frame.render_widget(Paragraph::new(rows), area);
}

/// Truncate `line` to `width` display columns and pad it to exactly that.
///
/// A wide character that would straddle the edge is dropped, not split.
pub fn fit_line(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for c in line.chars() {
        if c.is_control() {
            continue;
        }
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.extend(std::iter::repeat_n(' ', width - used));
    out
}
