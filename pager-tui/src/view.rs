//! Rendering of the scrolling list.

use crate::notifications::NotificationLevel;
use crate::state::{App, PLACEHOLDER};
use pager_cache::{PageDelegate, PageFetcher};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 3;
/// Top and bottom border of the list block.
const LIST_BORDERS: u16 = 2;

const ACCENT: Color = Color::Rgb(0, 255, 255);
const TEXT: Color = Color::Rgb(255, 255, 255);
const TEXT_DIM: Color = Color::Rgb(136, 136, 136);
const HIGHLIGHT_BG: Color = Color::Rgb(42, 42, 42);

/// Rows of list content that fit in a terminal of `terminal_height` lines.
pub fn list_height(terminal_height: u16) -> usize {
    terminal_height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT + LIST_BORDERS) as usize
}

pub fn render<D, F>(f: &mut Frame<'_>, app: &App<D, F>)
where
    D: PageDelegate,
    F: PageFetcher + 'static,
{
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);
    render_list(f, app, layout[1]);
    render_footer(f, app, layout[2]);
}

fn render_header<D, F>(f: &mut Frame<'_>, app: &App<D, F>, area: Rect)
where
    D: PageDelegate,
    F: PageFetcher + 'static,
{
    let header = Paragraph::new(app.status_line())
        .style(Style::default().fg(TEXT))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled("Remote Pager", Style::default().fg(ACCENT))),
        );
    f.render_widget(header, area);
}

fn render_list<D, F>(f: &mut Frame<'_>, app: &App<D, F>, area: Rect)
where
    D: PageDelegate,
    F: PageFetcher + 'static,
{
    let end = (app.offset + app.viewport_height).min(app.row_count());
    let items: Vec<ListItem> = (app.offset..end)
        .map(|row| {
            let text = app.row_text(row);
            let style = if text == PLACEHOLDER {
                Style::default().fg(TEXT_DIM)
            } else {
                Style::default().fg(TEXT)
            };
            ListItem::new(format!("{:>6}  {}", row + 1, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(HIGHLIGHT_BG)
                .fg(ACCENT)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if app.selected >= app.offset && app.selected < end {
        state.select(Some(app.selected - app.offset));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_footer<D, F>(f: &mut Frame<'_>, app: &App<D, F>, area: Rect)
where
    D: PageDelegate,
    F: PageFetcher + 'static,
{
    let help = "j/k move • PgUp/PgDn page • g/G top/bottom • r reload • ctrl-r retry • q quit";
    let (text, style) = match app.latest_notification() {
        Some(note) => {
            let color = match note.level {
                NotificationLevel::Info => ACCENT,
                NotificationLevel::Warning => Color::Rgb(255, 255, 0),
                NotificationLevel::Error => Color::Rgb(255, 0, 0),
                NotificationLevel::Success => Color::Rgb(0, 255, 0),
            };
            (
                format!("{}: {}", note.label(), note.message),
                Style::default().fg(color),
            )
        }
        None => (help.to_string(), Style::default().fg(TEXT_DIM)),
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}
