use crate::{
    error::Error,
    events::{Event, Events},
    sweep::{Board, Coordinate, Outcome, Symbol},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use num_traits::ToPrimitive;
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame, Terminal,
};
use tracing::info;
use typed_builder::TypedBuilder;

// a bordered cell needs one column/row of content inside the border
const MIN_CELL_EXTENT: u16 = 3;

const STATUS_HEIGHT: u16 = 3;

/// Width and height in terminal cells needed to draw a `size` x `size` board.
pub(crate) fn extent(size: usize, cell_width: u16, cell_height: u16) -> Result<(u16, u16), Error> {
    if cell_width < MIN_CELL_EXTENT || cell_height < MIN_CELL_EXTENT {
        return Err(Error::Geometry(format!(
            "cells must be at least {MIN_CELL_EXTENT}x{MIN_CELL_EXTENT}, got {cell_width}x{cell_height}"
        )));
    }

    let too_large = || Error::Geometry(format!("a {size}x{size} board is too large to draw"));
    let side = size.to_u16().ok_or_else(too_large)?;
    let width = side.checked_mul(cell_width).ok_or_else(too_large)?;
    let height = side.checked_mul(cell_height).ok_or_else(too_large)?;
    Ok((width, height))
}

fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

/// First row (or column) to draw so that `cursor` is inside a window of
/// `visible` cells.
fn scroll(cursor: usize, visible: u16) -> usize {
    cursor.saturating_sub(usize::from(visible.max(1)) - 1)
}

fn symbol_style(symbol: Symbol) -> Style {
    let style = Style::default();
    match symbol {
        Symbol::Hidden => style.bg(Color::DarkGray),
        Symbol::Mine => style.fg(Color::Red).add_modifier(Modifier::BOLD),
        Symbol::Count(0) => style.fg(Color::Gray),
        Symbol::Count(1) => style.fg(Color::Blue),
        Symbol::Count(2) => style.fg(Color::Green),
        Symbol::Count(3) => style.fg(Color::Red),
        Symbol::Count(_) => style.fg(Color::Magenta).add_modifier(Modifier::BOLD),
    }
}

#[derive(TypedBuilder)]
pub(crate) struct BoardWidget<'a> {
    board: &'a Board,
    cursor: Coordinate,
    // top-left cell of the visible part of the board
    #[builder(default)]
    offset: Coordinate,
    #[builder(default = 5)]
    cell_width: u16,
    #[builder(default = 3)]
    cell_height: u16,
}

impl BoardWidget<'_> {
    fn cell_area(&self, area: Rect, (row, column): Coordinate) -> Option<Rect> {
        let row = row.checked_sub(self.offset.0)?;
        let column = column.checked_sub(self.offset.1)?;
        let x = column.to_u16()?.checked_mul(self.cell_width)?;
        let y = row.to_u16()?.checked_mul(self.cell_height)?;

        if x.checked_add(self.cell_width)? > area.width
            || y.checked_add(self.cell_height)? > area.height
        {
            return None;
        }

        Some(Rect::new(
            area.x + x,
            area.y + y,
            self.cell_width,
            self.cell_height,
        ))
    }
}

impl Widget for BoardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (row, symbols) in self.board.view().into_iter().enumerate() {
            for (column, symbol) in symbols.into_iter().enumerate() {
                let Some(cell_area) = self.cell_area(area, (row, column)) else {
                    continue;
                };

                let border_style = if (row, column) == self.cursor {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                Paragraph::new(symbol.to_string())
                    .alignment(Alignment::Center)
                    .style(symbol_style(symbol))
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(border_style),
                    )
                    .render(cell_area, buf);
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Control {
    Continue,
    Quit,
}

pub(crate) struct App {
    board: Board,
    cursor: Coordinate,
    // outcome as of the last move, kept because the board is fully exposed
    // once the game is over
    outcome: Outcome,
    notice: Option<&'static str>,
    cell_width: u16,
    cell_height: u16,
    extent: (u16, u16),
}

impl App {
    pub(crate) fn new(board: Board, cell_width: u16, cell_height: u16) -> Result<Self, Error> {
        let extent = extent(board.size(), cell_width, cell_height)?;
        let outcome = board.outcome();
        Ok(Self {
            board,
            cursor: (0, 0),
            outcome,
            notice: None,
            cell_width,
            cell_height,
            extent,
        })
    }

    pub(crate) fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn outcome(&self) -> Outcome {
        self.outcome
    }

    fn step(&mut self, row_offset: isize, column_offset: isize) {
        let last = self.board.size() - 1;
        let (row, column) = self.cursor;
        self.cursor = (
            row.saturating_add_signed(row_offset).min(last),
            column.saturating_add_signed(column_offset).min(last),
        );
        self.notice = None;
    }

    fn reveal(&mut self) -> Result<(), Error> {
        if self.board.tile(self.cursor)?.exposed {
            self.notice = Some("Already revealed");
            return Ok(());
        }
        self.notice = None;

        self.board.expose(self.cursor)?;
        self.outcome = self.board.outcome();
        info!(cursor = ?self.cursor, outcome = ?self.outcome, "move");

        if self.outcome != Outcome::Ongoing {
            self.board.expose_all();
        }
        Ok(())
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Result<Control, Error> {
        if self.outcome != Outcome::Ongoing {
            return Ok(Control::Quit);
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(Control::Quit)
            }
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Control::Quit),
            KeyCode::Up | KeyCode::Char('k') => self.step(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => self.step(1, 0),
            KeyCode::Left | KeyCode::Char('h') => self.step(0, -1),
            KeyCode::Right | KeyCode::Char('l') => self.step(0, 1),
            KeyCode::Char(' ') | KeyCode::Enter => self.reveal()?,
            _ => {}
        }
        Ok(Control::Continue)
    }

    fn status_line(&self) -> String {
        match self.outcome {
            Outcome::Won => "You won! Press any key to exit.".to_owned(),
            Outcome::Lost => "You hit a mine! Press any key to exit.".to_owned(),
            Outcome::Ongoing => match self.notice {
                Some(notice) => notice.to_owned(),
                None => format!("{} mines | arrows move, space reveals, q quits", self.board.mines()),
            },
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let (width, height) = self.extent;
        let area = frame.size();

        // the status line always gets its rows, the board scrolls in the rest
        let status_height = STATUS_HEIGHT.min(area.height);
        let board_area = centered(
            Rect {
                height: height.min(area.height - status_height),
                ..area
            },
            width,
        );
        let status_area = Rect {
            y: area.y + board_area.height,
            height: status_height,
            ..area
        };

        let offset = (
            scroll(self.cursor.0, board_area.height / self.cell_height),
            scroll(self.cursor.1, board_area.width / self.cell_width),
        );

        frame.render_widget(
            BoardWidget::builder()
                .board(&self.board)
                .cursor(self.cursor)
                .offset(offset)
                .cell_width(self.cell_width)
                .cell_height(self.cell_height)
                .build(),
            board_area,
        );

        let status = self.status_line();
        let status_width = status
            .len()
            .to_u16()
            .unwrap_or(u16::MAX)
            .saturating_add(4)
            .max(width);
        frame.render_widget(
            Paragraph::new(status)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" gridsweep ")),
            centered(status_area, status_width),
        );
    }

    /// Runs the game until the player quits or, once the game is over, presses
    /// any key.
    pub(crate) fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &Events,
    ) -> Result<(), Error> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;

            match events.next()? {
                Event::Input(key) => {
                    if self.handle_key(key)? == Control::Quit {
                        break;
                    }
                }
                Event::Tick => {}
                Event::Interrupt => break,
            }
        }

        info!(outcome = ?self.outcome, "game over");
        Ok(())
    }
}
