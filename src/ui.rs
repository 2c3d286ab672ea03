//! Terminal UI rendering with ratatui
//!
//! Everything here reads the game; nothing mutates it.

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Cell};
use crate::game::{Game, GameState};
use crate::ledger::{GameResult, Outcome};
use crate::menu::Menu;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const BLOCK: &str = "██";
const EMPTY: &str = "  ";

/// Board (10*2 + 2 for borders) plus the side panel
const GAME_WIDTH: u16 = 44;
/// Board rows + 2 for borders
const GAME_HEIGHT: u16 = BOARD_HEIGHT as u16 + 2;

const MENU_WIDTH: u16 = 40;
const MENU_HEIGHT: u16 = 14;
const TITLE_HEIGHT: u16 = 3;

/// Render whichever screen the game is on
pub fn render(frame: &mut Frame, game: &Game) {
    match game.state {
        GameState::MainMenu => render_menu(frame, &game.menu),
        GameState::Rating => render_rating(frame, game.results()),
        _ => render_game(frame, game),
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Title area and the bordered item box of the main menu
fn menu_layout(area: Rect) -> (Rect, Rect) {
    let menu_area = center_rect(area, MENU_WIDTH, MENU_HEIGHT);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(TITLE_HEIGHT), Constraint::Min(4)])
        .split(menu_area);
    (layout[0], layout[1])
}

/// Menu item under a terminal cell, for mouse clicks
pub fn menu_item_at(area: Rect, menu: &Menu, column: u16, row: u16) -> Option<usize> {
    let (_, items_area) = menu_layout(area);
    let inner = Block::default().borders(Borders::ALL).inner(items_area);
    if column < inner.x || column >= inner.x + inner.width || row <= inner.y {
        return None;
    }
    // One blank line first, then each item followed by a blank line
    let offset = row - inner.y - 1;
    if offset % 2 != 0 {
        return None;
    }
    let index = (offset / 2) as usize;
    (index < menu.items.len()).then_some(index)
}

/// Render the main menu
fn render_menu(frame: &mut Frame, menu: &Menu) {
    let (title_area, items_area) = menu_layout(frame.area());

    let title = Paragraph::new(vec![
        Line::raw(""),
        Line::styled("B L O C K F A L L", Style::default().fg(Color::Cyan).bold()),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(title, title_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(items_area);
    frame.render_widget(block, items_area);

    let mut lines = vec![Line::raw("")];
    for (i, item) in menu.items.iter().enumerate() {
        let (prefix, style) = if i == menu.selected {
            ("▶ ", Style::default().fg(Color::Yellow).bold())
        } else {
            ("  ", Style::default().fg(Color::White))
        };
        lines.push(Line::styled(format!("{}{}", prefix, item.label), style));
        lines.push(Line::raw(""));
    }
    lines.push(Line::styled(
        "↑↓ Select  Enter Confirm  q Quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render the best-results screen
fn render_rating(frame: &mut Frame, results: &[GameResult]) {
    let area = center_rect(frame.area(), 50, 16);
    let block = Block::default()
        .title(" BEST RESULTS ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = result_lines(results);
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Esc/Enter Back",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn result_lines(results: &[GameResult]) -> Vec<Line<'static>> {
    if results.is_empty() {
        return vec![Line::styled(
            "No results yet",
            Style::default().fg(Color::Gray),
        )];
    }
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let color = match result.outcome {
                Outcome::Win => Color::Green,
                Outcome::Lose => Color::Red,
            };
            Line::from(vec![
                Span::raw(format!("{:>2}. {}  {:>6}  ", i + 1, result.timestamp, result.score)),
                Span::styled(result.outcome.as_str(), Style::default().fg(color).bold()),
            ])
        })
        .collect()
}

/// Render the board, side panel and any overlay
fn render_game(frame: &mut Frame, game: &Game) {
    let area = frame.area();
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_WIDTH as u16 * 2 + 2),
            Constraint::Min(10),
        ])
        .split(game_area);

    render_board(frame, layout[0], game);
    render_stats(frame, layout[1], game);

    match game.state {
        GameState::Paused => {
            render_overlay(frame, area, "PAUSED", Color::Yellow, "Press P to resume")
        }
        GameState::GameOver => {
            render_overlay(frame, area, "GAME OVER", Color::Red, "Press R for menu")
        }
        GameState::GameWon => {
            render_overlay(frame, area, "YOU WIN!", Color::Green, "Press R for menu")
        }
        _ => {}
    }

    if game.show_results {
        render_results_overlay(frame, area, game.results());
    }
}

/// Render the game board
fn render_board(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // The active piece is hidden once the round is won
    let piece = game
        .current_piece
        .as_ref()
        .filter(|_| game.state != GameState::GameWon);
    let piece_cells: Vec<(i32, i32)> = piece.map(|p| p.cells().collect()).unwrap_or_default();

    let lines: Vec<Line> = game
        .board
        .rows()
        .enumerate()
        .map(|(row, cells)| {
            let spans: Vec<Span> = cells
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    let in_piece = piece_cells.contains(&(row as i32, col as i32));
                    match (in_piece, piece, cell) {
                        (true, Some(p), _) => {
                            Span::styled(BLOCK, Style::default().fg(p.color()))
                        }
                        (_, _, Cell::Filled(color)) => {
                            Span::styled(BLOCK, Style::default().fg(*color))
                        }
                        _ => Span::raw(EMPTY),
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label =
        |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Gray)));

    let mut lines = vec![
        label("SCORE"),
        Line::from(Span::styled(
            game.score.points.to_string(),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        label("LINES"),
        Line::from(Span::styled(
            game.score.lines.to_string(),
            Style::default().fg(Color::Green),
        )),
        Line::raw(""),
        label("BEST"),
        Line::from(Span::styled(
            game.results().first().map_or(0, |r| r.score).to_string(),
            Style::default().fg(Color::Cyan),
        )),
        Line::raw(""),
        Line::styled("←→ Move  ↑ Rotate", Style::default().fg(Color::DarkGray)),
        Line::styled("↓ Drop  Space Hard", Style::default().fg(Color::DarkGray)),
        Line::styled("P Pause  Tab Best", Style::default().fg(Color::DarkGray)),
        Line::styled("R Restart  Q Quit", Style::default().fg(Color::DarkGray)),
    ];

    if let Some(status) = &game.status {
        lines.push(Line::raw(""));
        lines.push(Line::styled(status.clone(), Style::default().fg(Color::Red)));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render a centered overlay message
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, color: Color, subtitle: &str) {
    let overlay_area = center_rect(area, 24, 5);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let text = vec![
        Line::styled(title.to_string(), Style::default().fg(color).bold()),
        Line::styled(subtitle.to_string(), Style::default().fg(Color::Gray)),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}

/// Render the best-results list over the game
fn render_results_overlay(frame: &mut Frame, area: Rect, results: &[GameResult]) {
    let overlay_area = center_rect(area, 50, 15);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(" Best Results (Tab to close) ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);
    frame.render_widget(Paragraph::new(result_lines(results)), inner);
}
