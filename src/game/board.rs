use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Square grid, so this is the length of one row/column.
pub const BOARD_SIZE: usize = 8;
/// Total number of cells on the board.
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// The eight unit offsets, applied additively when walking runs.
const DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Contents of one board cell.
#[derive(Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Black,
    White,
}

impl Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Black => write!(f, "B"),
            Self::White => write!(f, "W"),
            Self::Empty => write!(f, "."),
        }
    }
}

/// A seat identity: who is moving, as opposed to what sits in a cell.
///
/// Black is seat 0 and moves first; White is seat 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disc {
    Black,
    White,
}

impl Disc {
    pub fn index(self) -> usize {
        match self {
            Self::Black => 0,
            Self::White => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Black),
            1 => Some(Self::White),
            _ => None,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    /// The cell value this seat plays.
    pub fn cell(self) -> Cell {
        match self {
            Self::Black => Cell::Black,
            Self::White => Cell::White,
        }
    }
}

/// A board coordinate. May sit outside the board while walking a
/// direction; [`Position::index`] is the bounds check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Position {
    pub row: i8,
    pub col: i8,
}

impl Position {
    /// Coordinate for a cell index, or `None` outside `0..64`.
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= NUM_CELLS {
            return None;
        }
        Some(Self {
            row: (index / BOARD_SIZE) as i8,
            col: (index % BOARD_SIZE) as i8,
        })
    }

    /// Cell index for this coordinate, or `None` off the board.
    pub fn index(self) -> Option<usize> {
        let range = 0..BOARD_SIZE as i8;
        if !range.contains(&self.row) || !range.contains(&self.col) {
            return None;
        }
        Some(self.row as usize * BOARD_SIZE + self.col as usize)
    }

    fn step(self, (dr, dc): (i8, i8)) -> Self {
        Self {
            row: self.row + dr,
            col: self.col + dc,
        }
    }
}

/// Immutable board value: 64 cells, index = row * 8 + col.
///
/// Every accepted move produces a new `Board`; nothing mutates one in
/// place, which keeps state transitions easy to reason about and test.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Board([Cell; NUM_CELLS]);

impl Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // print the board as a grid
        for row in self.0.chunks(BOARD_SIZE) {
            for cell in row {
                write!(f, "{:?} ", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Board {
    /// Standard start position: the four center cells hold two discs of
    /// each color on the diagonals, everything else is empty.
    pub fn new() -> Self {
        let mut cells = [Cell::Empty; NUM_CELLS];
        cells[27] = Cell::White;
        cells[28] = Cell::Black;
        cells[35] = Cell::Black;
        cells[36] = Cell::White;
        Self(cells)
    }

    pub fn from_cells(cells: [Cell; NUM_CELLS]) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[Cell; NUM_CELLS] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.0.get(index).copied()
    }

    /// Capturable run length in each of the eight directions when `mover`
    /// plays at `position`, evaluated as if the cell already held the
    /// mover's disc. A run counts only when it is a contiguous line of
    /// opponent discs anchored by one of the mover's own; a run that hits
    /// an empty cell or the edge captures nothing.
    pub fn flippable_runs(&self, position: Position, mover: Disc) -> [u8; 8] {
        let own = mover.cell();
        let opponent = mover.opponent().cell();
        let mut runs = [0u8; 8];
        for (slot, direction) in runs.iter_mut().zip(DIRECTIONS) {
            let mut cursor = position.step(direction);
            let mut run = 0u8;
            while let Some(index) = cursor.index() {
                if self.0[index] == opponent {
                    run += 1;
                } else {
                    if self.0[index] == own {
                        *slot = run;
                    }
                    break;
                }
                cursor = cursor.step(direction);
            }
        }
        runs
    }

    /// Play `mover` at `index`, returning the resulting board.
    ///
    /// Rejected when the target is occupied or out of range, or when the
    /// move would flip nothing; the current board is left untouched.
    pub fn apply_move(&self, index: usize, mover: Disc) -> Result<Self, GameError> {
        let position = Position::from_index(index).ok_or(GameError::IllegalMove { index })?;
        if self.0[index] != Cell::Empty {
            return Err(GameError::IllegalMove { index });
        }
        let runs = self.flippable_runs(position, mover);
        if runs.iter().all(|&run| run == 0) {
            return Err(GameError::IllegalMove { index });
        }

        let mut cells = self.0;
        cells[index] = mover.cell();
        for (direction, &run) in DIRECTIONS.iter().zip(&runs) {
            let mut cursor = position;
            for _ in 0..run {
                cursor = cursor.step(*direction);
                if let Some(flip) = cursor.index() {
                    cells[flip] = mover.cell();
                }
            }
        }
        Ok(Self(cells))
    }

    /// True when at least one empty cell yields a nonzero flip for `mover`.
    pub fn can_move(&self, mover: Disc) -> bool {
        self.0.iter().enumerate().any(|(index, &cell)| {
            cell == Cell::Empty
                && Position::from_index(index)
                    .map(|position| {
                        self.flippable_runs(position, mover)
                            .iter()
                            .any(|&run| run > 0)
                    })
                    .unwrap_or(false)
        })
    }

    /// Number of cells holding this seat's discs.
    pub fn score(&self, mover: Disc) -> u32 {
        let own = mover.cell();
        self.0.iter().filter(|&&cell| cell == own).count() as u32
    }

    /// Returns `(black, white, empty)`. Always sums to 64.
    pub fn counts(&self) -> (u32, u32, u32) {
        let black = self.score(Disc::Black);
        let white = self.score(Disc::White);
        (black, white, NUM_CELLS as u32 - black - white)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(row: usize, col: usize) -> usize {
        row * BOARD_SIZE + col
    }

    #[test]
    fn initial_board_has_two_discs_each() {
        let board = Board::new();
        assert_eq!(board.counts(), (2, 2, 60));
        assert_eq!(board.get(27), Some(Cell::White));
        assert_eq!(board.get(28), Some(Cell::Black));
        assert_eq!(board.get(35), Some(Cell::Black));
        assert_eq!(board.get(36), Some(Cell::White));
    }

    #[test]
    fn position_conversions_are_bounds_checked() {
        assert_eq!(Position::from_index(64), None);
        assert_eq!(Position::from_index(19), Some(Position { row: 2, col: 3 }));
        assert_eq!(Position { row: 2, col: 3 }.index(), Some(19));
        assert_eq!(Position { row: -1, col: 0 }.index(), None);
        assert_eq!(Position { row: 0, col: 8 }.index(), None);
    }

    #[test]
    fn opening_move_flips_exactly_one_disc() {
        let board = Board::new();
        let position = Position::from_index(19).unwrap();
        let runs = board.flippable_runs(position, Disc::Black);
        assert_eq!(runs.iter().sum::<u8>(), 1);

        let next = board.apply_move(19, Disc::Black).unwrap();
        assert_eq!(next.get(19), Some(Cell::Black));
        assert_eq!(next.get(27), Some(Cell::Black)); // the flipped disc
        assert_eq!(next.score(Disc::Black), 4);
        assert_eq!(next.score(Disc::White), 1);
        assert_eq!(next.counts(), (4, 1, 59));
        // the original board is untouched
        assert_eq!(board.counts(), (2, 2, 60));
    }

    #[test]
    fn occupied_cell_is_rejected() {
        let board = Board::new();
        assert_eq!(
            board.apply_move(27, Disc::Black),
            Err(GameError::IllegalMove { index: 27 })
        );
    }

    #[test]
    fn move_that_flips_nothing_is_rejected() {
        let board = Board::new();
        // corner cell, far from any opponent run
        assert_eq!(
            board.apply_move(0, Disc::Black),
            Err(GameError::IllegalMove { index: 0 })
        );
        // adjacent to an own disc only
        assert_eq!(
            board.apply_move(idx(2, 4), Disc::Black),
            Err(GameError::IllegalMove { index: idx(2, 4) })
        );
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let board = Board::new();
        assert_eq!(
            board.apply_move(64, Disc::Black),
            Err(GameError::IllegalMove { index: 64 })
        );
    }

    #[test]
    fn run_terminating_on_empty_captures_nothing() {
        let mut cells = [Cell::Empty; NUM_CELLS];
        cells[1] = Cell::White;
        cells[2] = Cell::White;
        // no black anchor beyond the white run
        let board = Board::from_cells(cells);
        let runs = board.flippable_runs(Position::from_index(0).unwrap(), Disc::Black);
        assert_eq!(runs, [0; 8]);
        assert!(board.apply_move(0, Disc::Black).is_err());
    }

    #[test]
    fn long_run_flips_every_disc_between_anchor_and_move() {
        let mut cells = [Cell::Empty; NUM_CELLS];
        for col in 1..7 {
            cells[idx(3, col)] = Cell::White;
        }
        cells[idx(3, 7)] = Cell::Black;
        let board = Board::from_cells(cells);

        let next = board.apply_move(idx(3, 0), Disc::Black).unwrap();
        for col in 0..8 {
            assert_eq!(next.get(idx(3, col)), Some(Cell::Black));
        }
        assert_eq!(next.counts(), (8, 0, 56));
    }

    #[test]
    fn initial_legal_moves_are_the_four_canonical_openings() {
        let board = Board::new();
        let legal: Vec<usize> = (0..NUM_CELLS)
            .filter(|&index| board.apply_move(index, Disc::Black).is_ok())
            .collect();
        assert_eq!(legal, vec![idx(2, 3), idx(3, 2), idx(4, 5), idx(5, 4)]);
        assert!(board.can_move(Disc::Black));
        assert!(board.can_move(Disc::White));
    }

    #[test]
    fn stuck_player_has_no_move() {
        let mut cells = [Cell::Empty; NUM_CELLS];
        cells[0] = Cell::White;
        cells[1] = Cell::Black;
        let board = Board::from_cells(cells);
        assert!(!board.can_move(Disc::Black));
        assert!(board.can_move(Disc::White));
    }
}
