//! Compact textual codec for boards, used in share URLs and wire messages.
//!
//! Each board cell is one ternary digit (black = 0, white = 1, empty = 2).
//! The 64 digits plus two trailing sentinel `2`s form 22 base-3 triples,
//! and each triple maps through a fixed 27-character alphabet to one
//! URL-safe character.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GameError;
use crate::game::board::{Board, Cell, NUM_CELLS};

/// Fixed alphabet; the character at position `n` encodes the triple with
/// base-3 value `n`.
const CODE_CHARS: &[u8; 27] = b"234567bcdfghjkmnpqrstvwxyz-";

fn digit(cell: Cell) -> usize {
    match cell {
        Cell::Black => 0,
        Cell::White => 1,
        Cell::Empty => 2,
    }
}

fn cell(digit: usize) -> Cell {
    match digit {
        0 => Cell::Black,
        1 => Cell::White,
        _ => Cell::Empty,
    }
}

/// Encode a board as its 22-character token.
pub fn encode(board: &Board) -> String {
    let mut digits: Vec<usize> = board.cells().iter().map(|&c| digit(c)).collect();
    // pad to a multiple of three; the sentinels are dropped again on decode
    digits.extend([2, 2]);
    digits
        .chunks(3)
        .map(|triple| CODE_CHARS[triple[0] * 9 + triple[1] * 3 + triple[2]] as char)
        .collect()
}

/// Decode a board token produced by [`encode`].
///
/// Fails with [`GameError::MalformedEncoding`] on a character outside the
/// alphabet or when fewer than 64 cells come out; extra trailing digits
/// (the padding sentinels) are dropped.
pub fn decode(token: &str) -> Result<Board, GameError> {
    let mut cells = [Cell::Empty; NUM_CELLS];
    let mut next = 0usize;
    for ch in token.chars() {
        let value = CODE_CHARS
            .iter()
            .position(|&c| c as char == ch)
            .ok_or(GameError::MalformedEncoding)?;
        for digit in [value / 9, (value / 3) % 3, value % 3] {
            if next < NUM_CELLS {
                cells[next] = cell(digit);
                next += 1;
            }
        }
    }
    if next < NUM_CELLS {
        return Err(GameError::MalformedEncoding);
    }
    Ok(Board::from_cells(cells))
}

// The codec owns the board's serde form: a board travels as its token.
impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(self))
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        decode(&token).map_err(D::Error::custom)
    }
}
