use crate::sweep::Coordinate;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("invalid board configuration: {0}")]
    Configuration(String),

    #[error("coordinate {0:?} is outside the board")]
    OutOfBounds(Coordinate),

    #[error("invalid terminal geometry: {0}")]
    Geometry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to install the interrupt handler")]
    Signal(#[from] ctrlc::Error),

    #[error("event channel closed")]
    Events(#[from] std::sync::mpsc::RecvError),
}
