use crate::error::Error;
use crossterm::event::{self, Event as CEvent, KeyEvent, KeyEventKind};
use std::{sync::mpsc, thread, time::Duration};
use tracing::{debug, warn};

pub(crate) enum Event<I> {
    Input(I),
    Tick,
    Interrupt,
}

/// Merges key presses, periodic ticks and SIGINT into a single `Receiver`.
/// Key presses and ticks each get their own thread; the signal arrives through
/// the `ctrlc` handler.
pub(crate) struct Events {
    rx: mpsc::Receiver<Event<KeyEvent>>,
    _input_handle: thread::JoinHandle<()>,
    _tick_handle: thread::JoinHandle<()>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Config {
    pub(crate) tick_rate: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
        }
    }
}

impl Events {
    pub(crate) fn with_config(config: Config) -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel();

        {
            let tx = tx.clone();
            ctrlc::set_handler(move || {
                debug!("received interrupt");
                let _ = tx.send(Event::Interrupt);
            })?;
        }

        Ok(Self {
            rx,
            _input_handle: {
                let tx = tx.clone();
                thread::spawn(move || loop {
                    match event::read() {
                        Ok(CEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            if tx.send(Event::Input(key)).is_err() {
                                return;
                            }
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(%err, "failed to read terminal event");
                            return;
                        }
                    }
                })
            },
            _tick_handle: {
                thread::spawn(move || loop {
                    if tx.send(Event::Tick).is_err() {
                        break;
                    }
                    thread::sleep(config.tick_rate);
                })
            },
        })
    }

    pub(crate) fn next(&self) -> Result<Event<KeyEvent>, mpsc::RecvError> {
        self.rx.recv()
    }
}
