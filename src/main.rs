mod error;
mod events;
mod sweep;
mod ui;

use anyhow::{Context, Result};
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use structopt::StructOpt;
use tracing::Level;

use crate::{
    events::Events,
    sweep::{Board, Outcome},
    ui::App,
};

#[derive(Debug, StructOpt)]
#[structopt(name = "gridsweep", about = "Sweep a square field of hidden mines")]
struct Opt {
    /// Number of cells along each side of the board
    #[structopt(short, long, default_value = "9")]
    size: usize,

    /// Number of mines hidden on the board
    #[structopt(short, long, default_value = "10")]
    mines: usize,

    /// Width of a single cell in terminal columns
    #[structopt(long, default_value = "5")]
    cell_width: u16,

    /// Height of a single cell in terminal rows
    #[structopt(long, default_value = "3")]
    cell_height: u16,

    /// Milliseconds between redraws when no key is pressed
    #[structopt(long, default_value = "250")]
    tick_rate: u64,

    /// Write logs to this file
    #[structopt(long, parse(from_os_str))]
    log_file: Option<PathBuf>,

    /// Include debug output in the log file
    #[structopt(short, long)]
    verbose: bool,
}

fn init_logging(path: Option<&Path>, verbose: bool) -> Result<()> {
    // the terminal belongs to the game, so without a file nothing is logged
    let Some(path) = path else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();
    Ok(())
}

fn leave_screen(out: &mut impl Write) -> io::Result<()> {
    execute!(out, LeaveAlternateScreen, Show)
}

/// Puts the terminal back into cooked mode on the main screen when dropped,
/// whichever way `play` returns.
struct RawScreen;

impl RawScreen {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        // from here on `Drop` undoes raw mode
        let screen = Self;
        execute!(io::stdout(), EnterAlternateScreen).context("failed to enter alternate screen")?;
        Ok(screen)
    }
}

impl Drop for RawScreen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = leave_screen(&mut io::stdout());
    }
}

fn play(app: &mut App, tick_rate: Duration) -> Result<()> {
    let events = Events::with_config(events::Config { tick_rate })?;

    let _screen = RawScreen::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.hide_cursor()?;

    app.run(&mut terminal, &events).context("game loop failed")
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    init_logging(opt.log_file.as_deref(), opt.verbose)?;

    let board = Board::new(opt.size, opt.mines).context("failed to create board")?;
    let mut app = App::new(board, opt.cell_width, opt.cell_height)?;

    play(&mut app, Duration::from_millis(opt.tick_rate))?;

    print!("{}", app.board());
    println!(
        "{}",
        match app.outcome() {
            Outcome::Won => "Winner, winner chicken dinner!",
            Outcome::Lost => "Game over, you hit a mine!",
            Outcome::Ongoing => "Game abandoned.",
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opt = Opt::from_iter_safe(["gridsweep"]).unwrap();

        assert_eq!(opt.size, 9);
        assert_eq!(opt.mines, 10);
        assert_eq!(opt.cell_width, 5);
        assert_eq!(opt.cell_height, 3);
        assert_eq!(opt.tick_rate, 250);
        assert!(opt.log_file.is_none());
        assert!(!opt.verbose);
    }

    #[test]
    fn test_options() {
        let opt = Opt::from_iter_safe([
            "gridsweep",
            "-s",
            "4",
            "--mines",
            "3",
            "--log-file",
            "sweep.log",
            "-v",
        ])
        .unwrap();

        assert_eq!(opt.size, 4);
        assert_eq!(opt.mines, 3);
        assert_eq!(opt.log_file, Some(PathBuf::from("sweep.log")));
        assert!(opt.verbose);
    }

    #[test]
    fn test_rejects_non_numeric_size() {
        assert!(Opt::from_iter_safe(["gridsweep", "--size", "nine"]).is_err());
        assert!(Opt::from_iter_safe(["gridsweep", "--mines", "-1"]).is_err());
    }

    #[test]
    fn test_leave_screen_restores_cursor() {
        let mut out = Vec::new();
        leave_screen(&mut out).unwrap();

        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("\x1b[?1049l"), "{written:?}");
        assert!(written.contains("\x1b[?25h"), "{written:?}");
    }

    #[test]
    fn test_default_options_make_a_board() {
        let opt = Opt::from_iter_safe(["gridsweep"]).unwrap();
        let board = Board::new(opt.size, opt.mines).unwrap();
        assert!(App::new(board, opt.cell_width, opt.cell_height).is_ok());
    }
}
