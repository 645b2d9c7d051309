//! Heuristic move advisor: a static positional evaluation plus a depth-2
//! minimax (one own move, one adversarial reply).

use rand::{thread_rng, Rng};

use crate::game::board::{Board, Disc, BOARD_SIZE, NUM_CELLS};

/// Positional weights for the static evaluation. Corners dominate, edges
/// matter, the interior barely counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub corner: f64,
    pub edge: f64,
    pub other: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            corner: 12.0,
            edge: 4.0,
            other: 1.0,
        }
    }
}

/// Sum of positional weights over the seat's discs. Not a material count:
/// a corner disc is worth twelve interior ones.
pub fn weighted_score(board: &Board, seat: Disc, weights: &Weights) -> f64 {
    let own = seat.cell();
    board
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, &cell)| cell == own)
        .map(|(index, _)| {
            let edge_row = index / BOARD_SIZE == 0 || index / BOARD_SIZE == BOARD_SIZE - 1;
            let edge_col = index % BOARD_SIZE == 0 || index % BOARD_SIZE == BOARD_SIZE - 1;
            match (edge_row, edge_col) {
                (true, true) => weights.corner,
                (true, false) | (false, true) => weights.edge,
                (false, false) => weights.other,
            }
        })
        .sum()
}

/// Best move candidates for `mover` under the default weights.
pub fn suggest_moves(board: &Board, mover: Disc) -> Vec<usize> {
    suggest_moves_weighted(board, mover, &Weights::default())
}

/// Best move candidates for `mover`: the set of legal moves maximizing the
/// worst-case weighted-score margin over every opponent reply.
///
/// The tie-break term is the same-ply margin divided by 100, so it only
/// separates candidates whose adversarial values agree. An opponent with
/// no legal reply contributes no constraint, leaving the candidate at the
/// best-possible worst case. Ties are all returned, in ascending index
/// order; the result is deterministic for a given board and mover, and
/// empty exactly when the mover has no legal move.
pub fn suggest_moves_weighted(board: &Board, mover: Disc, weights: &Weights) -> Vec<usize> {
    let opponent = mover.opponent();
    let mut best_worst_case = f64::NEG_INFINITY;
    let mut best_moves: Vec<usize> = Vec::new();

    for index in 0..NUM_CELLS {
        let Ok(after_own) = board.apply_move(index, mover) else {
            continue;
        };
        // how good the board is for us straight away, used to split ties
        let tie_break = (weighted_score(&after_own, mover, weights)
            - weighted_score(&after_own, opponent, weights))
            / 100.0;

        let mut worst_case = f64::INFINITY;
        for reply in 0..NUM_CELLS {
            let Ok(after_reply) = after_own.apply_move(reply, opponent) else {
                continue;
            };
            // subtracting the opponent score is not redundant, because of
            // the corner and edge boosts
            let value = weighted_score(&after_reply, mover, weights)
                - weighted_score(&after_reply, opponent, weights)
                + tie_break;
            if value < worst_case {
                worst_case = value;
            }
        }

        if worst_case == best_worst_case {
            best_moves.push(index);
        } else if worst_case > best_worst_case {
            best_worst_case = worst_case;
            best_moves = vec![index];
        }
    }

    best_moves
}

/// Uniform pick among equally good suggestions.
pub fn choose(moves: &[usize]) -> Option<usize> {
    if moves.is_empty() {
        return None;
    }
    let pick = thread_rng().gen_range(0..moves.len());
    Some(moves[pick])
}
