use crate::error::Error;
use bit_set::BitSet;
use rand::Rng;
use std::fmt;
use tracing::{debug, info, instrument, warn};

pub(crate) type Coordinate = (usize, usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Ongoing,
    Won,
    Lost,
}

/// What a renderer is allowed to know about a tile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Symbol {
    Hidden,
    Mine,
    Count(u8),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Hidden => f.write_str(" "),
            Self::Mine => f.write_str("*"),
            Self::Count(count) => write!(f, "{count}"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Tile {
    pub(crate) mine: bool,
    pub(crate) exposed: bool,
    // always zero for mines, which render as a mine marker instead
    pub(crate) adjacent_mines: u8,
}

impl Tile {
    pub(crate) fn symbol(&self) -> Symbol {
        match (self.exposed, self.mine) {
            (false, _) => Symbol::Hidden,
            (true, true) => Symbol::Mine,
            (true, false) => Symbol::Count(self.adjacent_mines),
        }
    }
}

// Row-major, so neighbour indices come out in ascending order.
const OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

fn neighbour(
    (row, column): Coordinate,
    (row_offset, column_offset): (isize, isize),
    size: usize,
) -> Option<usize> {
    let row = row.checked_add_signed(row_offset)?;
    let column = column.checked_add_signed(column_offset)?;
    (row < size && column < size).then(|| index_from_coord((row, column), size))
}

fn adjacent(coordinate: Coordinate, size: usize) -> impl Iterator<Item = usize> {
    OFFSETS
        .iter()
        .filter_map(move |&offset| neighbour(coordinate, offset, size))
}

fn index_from_coord((r, c): Coordinate, size: usize) -> usize {
    r * size + c
}

fn coord_from_index(index: usize, size: usize) -> Coordinate {
    (index / size, index % size)
}

/// Checks the board dimensions and returns the number of tiles.
fn tile_count(size: usize, mines: usize) -> Result<usize, Error> {
    if size == 0 {
        return Err(Error::Configuration(
            "board size must be at least 1".to_owned(),
        ));
    }

    let ntiles = size
        .checked_mul(size)
        .ok_or_else(|| Error::Configuration(format!("board size {size} is too large")))?;

    if mines > ntiles {
        return Err(Error::Configuration(format!(
            "{mines} mines do not fit on a board of {ntiles} cells"
        )));
    }

    Ok(ntiles)
}

/// One pending step of the fill: the tile being expanded and the position in
/// `OFFSETS` of the next neighbour to look at.
struct Frame {
    coordinate: Coordinate,
    adjacent_mines: u8,
    offset: usize,
}

pub(crate) struct Board {
    tiles: Vec<Tile>,
    // length of one side of the board
    size: usize,
    // the total number of mines
    mines: usize,
    // exposed mines, any at all means the game is lost
    exploded: usize,
    // the exposed tiles
    seen: BitSet<usize>,
}

impl Board {
    pub(crate) fn new(size: usize, mines: usize) -> Result<Self, Error> {
        Self::with_rng(size, mines, &mut rand::thread_rng())
    }

    /// Places `mines` mines uniformly at random using `rng`.
    pub(crate) fn with_rng<R: Rng + ?Sized>(
        size: usize,
        mines: usize,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let ntiles = tile_count(size, mines)?;
        let samples = rand::seq::index::sample(rng, ntiles, mines)
            .into_iter()
            .collect::<BitSet>();

        Ok(Self::from_samples(size, samples))
    }

    /// Builds a board with mines at exactly the given coordinates. Repeated
    /// coordinates count as a single mine.
    pub(crate) fn with_mines(
        size: usize,
        mines: impl IntoIterator<Item = Coordinate>,
    ) -> Result<Self, Error> {
        tile_count(size, 0)?;
        let samples = mines
            .into_iter()
            .map(|(r, c)| {
                if r < size && c < size {
                    Ok(index_from_coord((r, c), size))
                } else {
                    Err(Error::Configuration(format!(
                        "mine at {:?} is outside a {size}x{size} board",
                        (r, c)
                    )))
                }
            })
            .collect::<Result<BitSet, _>>()?;

        Ok(Self::from_samples(size, samples))
    }

    fn from_samples(size: usize, samples: BitSet) -> Self {
        let mines = samples.len();
        let tiles = (0..size)
            .flat_map(|row| std::iter::repeat(row).zip(0..size))
            .enumerate()
            .map(|(i, point)| {
                let mine = samples.contains(i);

                let adjacent_mines = if mine {
                    0
                } else {
                    adjacent(point, size)
                        .fold(0, |total, index| total + u8::from(samples.contains(index)))
                };
                assert!(adjacent_mines <= 8);

                Tile {
                    mine,
                    exposed: false,
                    adjacent_mines,
                }
            })
            .collect::<Vec<_>>();

        info!(size, mines, "created board");

        Self {
            tiles,
            size,
            mines,
            exploded: Default::default(),
            seen: Default::default(),
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn mines(&self) -> usize {
        self.mines
    }

    pub(crate) fn outcome(&self) -> Outcome {
        if self.exploded > 0 {
            return Outcome::Lost;
        }

        // nothing but safe tiles can be in `seen` at this point
        assert!(self.seen.len() <= self.tiles.len() - self.mines);

        if self.seen.len() == self.tiles.len() - self.mines {
            Outcome::Won
        } else {
            Outcome::Ongoing
        }
    }

    fn checked_index(&self, (r, c): Coordinate) -> Result<usize, Error> {
        if r < self.size && c < self.size {
            Ok(index_from_coord((r, c), self.size))
        } else {
            Err(Error::OutOfBounds((r, c)))
        }
    }

    /// Marks a tile as exposed, returning `false` if it already was.
    fn uncover(&mut self, index: usize) -> bool {
        if !self.seen.insert(index) {
            return false;
        }

        let tile = &mut self.tiles[index];
        tile.exposed = true;
        self.exploded += usize::from(tile.mine);
        true
    }

    fn frame(&self, index: usize) -> Frame {
        Frame {
            coordinate: coord_from_index(index, self.size),
            adjacent_mines: self.tiles[index].adjacent_mines,
            offset: 0,
        }
    }

    /// Reveals the tile at `coordinate` and fills outwards from it.
    ///
    /// Every safe neighbour of a revealed safe tile is revealed. Neighbours
    /// whose count matches the count of the tile being expanded are expanded
    /// in turn; the others are only revealed. The frames on `stack` mirror the
    /// calls of a depth-first recursion, so neighbours are visited in exactly
    /// the order the recursive formulation would visit them.
    #[instrument(skip(self))]
    pub(crate) fn expose(&mut self, coordinate: Coordinate) -> Result<(), Error> {
        let start = self.checked_index(coordinate)?;

        if !self.uncover(start) {
            debug!("tile already exposed");
            return Ok(());
        }

        if self.tiles[start].mine {
            warn!("exposed a mine");
            return Ok(());
        }

        let mut stack = vec![self.frame(start)];

        while let Some(frame) = stack.last_mut() {
            let Some(&offset) = OFFSETS.get(frame.offset) else {
                stack.pop();
                continue;
            };
            frame.offset += 1;
            let adjacent_mines = frame.adjacent_mines;

            let Some(next) = neighbour(frame.coordinate, offset, self.size) else {
                continue;
            };

            let tile = &self.tiles[next];
            if tile.mine {
                continue;
            }

            if tile.adjacent_mines == adjacent_mines {
                if self.uncover(next) {
                    stack.push(self.frame(next));
                }
            } else {
                self.uncover(next);
            }
        }

        debug!(exposed = self.seen.len(), "fill finished");
        Ok(())
    }

    pub(crate) fn expose_all(&mut self) {
        for index in 0..self.tiles.len() {
            self.uncover(index);
        }
    }

    pub(crate) fn tile(&self, coordinate: Coordinate) -> Result<&Tile, Error> {
        let index = self.checked_index(coordinate)?;
        Ok(&self.tiles[index])
    }

    pub(crate) fn view(&self) -> Vec<Vec<Symbol>> {
        self.tiles
            .chunks(self.size)
            .map(|row| row.iter().map(Tile::symbol).collect())
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(1 + 4 * self.size);

        writeln!(f, "{rule}")?;
        for row in self.tiles.chunks(self.size) {
            for tile in row {
                write!(f, "| {} ", tile.symbol())?;
            }
            writeln!(f, "|")?;
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}
