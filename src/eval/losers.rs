//! Losers-chess evaluation.
//!
//! The goal is inverted but forcing power is not: captures are how men
//! are shed, and the side with more of them dictates the feeding order.
//! Material is scored per occupancy class (which sides still own pawns
//! and pieces); a side whose opponent is running out of men while it
//! keeps its own forcing material heads toward the win score. When all
//! four classes remain, a pawn-and-king table refinement pushes pawns
//! forward and keeps kings to the rear.

use crate::bitboard::{isq, pop_first};
use crate::board::piece::*;
use crate::eval::score::{Score, WIN, s};
use crate::search::Search;
use crate::search::tt::{MaterialEntry, PawnEntry};

/// King placement: hiding on the back ranks early, walking in late.
#[rustfmt::skip]
const LOSERS_PST_KING: [Score; 64] = [
    s(-90, 0),  s(-90, 5),  s(-90, 10), s(-90, 15), s(-90, 15), s(-90, 10), s(-90, 5),  s(-90, 0),
    s(-90, 5),  s(-90, 10), s(-90, 15), s(-90, 20), s(-90, 20), s(-90, 15), s(-90, 10), s(-90, 5),
    s(-80, 10), s(-80, 15), s(-80, 20), s(-80, 25), s(-80, 25), s(-80, 20), s(-80, 15), s(-80, 10),
    s(-60, 15), s(-60, 20), s(-60, 25), s(-60, 30), s(-60, 30), s(-60, 25), s(-60, 20), s(-60, 15),
    s(-40, 15), s(-40, 20), s(-40, 25), s(-40, 30), s(-40, 30), s(-40, 25), s(-40, 20), s(-40, 15),
    s(-20, 10), s(-20, 15), s(-20, 20), s(-20, 25), s(-20, 25), s(-20, 20), s(-20, 15), s(-20, 10),
    s(0, 5),    s(0, 10),   s(0, 15),   s(0, 20),   s(0, 20),   s(0, 15),   s(0, 10),   s(0, 5),
    s(10, 0),   s(10, 5),   s(10, 10),  s(10, 15),  s(10, 15),  s(10, 10),  s(10, 5),   s(10, 0),
];

/// Pawns race toward their doom on the last rank.
#[rustfmt::skip]
const LOSERS_PST_PAWN: [Score; 64] = [
    s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),
    s(80, 60), s(80, 60), s(60, 60), s(60, 60), s(60, 60), s(60, 60), s(80, 60), s(80, 60),
    s(40, 30), s(40, 30), s(30, 30), s(30, 30), s(30, 30), s(30, 30), s(40, 30), s(40, 30),
    s(20, 20), s(20, 20), s(15, 20), s(20, 20), s(20, 20), s(15, 20), s(20, 20), s(20, 20),
    s(15, 10), s(15, 10), s(10, 10), s(10, 10), s(10, 10), s(10, 10), s(15, 10), s(15, 10),
    s(5, 0),   s(5, 0),   s(5, 0),   s(5, 0),   s(5, 0),   s(5, 0),   s(5, 0),   s(5, 0),
    s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),
    s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),   s(0, 0),
];

/// Variant evaluation, side-to-move relative.
pub fn evaluate(search: &mut Search) -> i32 {
    let us = search.board.us();
    let mut result = eval_material(search);
    let ply = search.board.ply;
    if search.stack[ply].mt.flags == 15 {
        // All four material classes on the board: refine by placement.
        let pawn_king = eval_pawns_and_kings(search);
        result += pawn_king.interpolate(search.stack[ply].mt.phase as i32);
    }
    if us { result } else { -result }
}

/// Material by occupancy class, white's point of view, cached in the
/// material table. Leading in removals reads as a positive score.
pub fn eval_material(search: &mut Search) -> i32 {
    let key = search.board.st().material_hash;
    if let Some(entry) = search.tables.material.probe(key) {
        search.stack[search.board.ply].mt = *entry;
        return entry.score as i32;
    }

    let brd = &search.board;
    let wpawns = brd.count(WPAWN) as i32;
    let bpawns = brd.count(BPAWN) as i32;
    let wpieces = (brd.count(WKNIGHT) + brd.count(WBISHOP) + brd.count(WROOK)
        + brd.count(WQUEEN)) as i32;
    let bpieces = (brd.count(BKNIGHT) + brd.count(BBISHOP) + brd.count(BROOK)
        + brd.count(BQUEEN)) as i32;
    let wqueens = brd.count(WQUEEN) as i32;
    let bqueens = brd.count(BQUEEN) as i32;

    let phase = (crate::eval::score::MAX_PHASE - wpieces - bpieces - wqueens - bqueens).max(0);
    let flags = u8::from(wpawns > 0)
        + 2 * u8::from(bpawns > 0)
        + 4 * u8::from(wpieces > 0)
        + 8 * u8::from(bpieces > 0);

    let result = match flags {
        // Bare-king terminals never reach evaluation; the in-between
        // classes score by who is closer to empty.
        3 => 100 * (wpawns - bpawns) + bpawns - wpawns,
        6 => WIN - wpieces * 100,
        7 => WIN / 2 + 100 * (bpawns + wpieces - wpawns),
        9 => -WIN + bpieces * 100,
        11 => -WIN / 2 - 100 * (wpawns + bpieces - bpawns),
        12 => (wpieces - bpieces) * 100,
        13 => -WIN + bpieces * 100,
        14 => WIN - wpieces * 100,
        15 => {
            let mut v = 0;
            if wpawns != bpawns {
                v = 100 * (wpawns - bpawns);
                v += if wpawns > bpawns { bpawns } else { wpawns };
            }
            if wpieces != bpieces {
                v += 250 * (wpieces - bpieces);
                v += if wpieces > bpieces { bpieces } else { wpieces };
            }
            v
        }
        _ => 0,
    };

    let entry = MaterialEntry {
        key,
        score: result.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        phase: phase.min(16) as u8,
        attack_force: [0, 0],
        flags,
    };
    search.tables.material.store(entry);
    search.stack[search.board.ply].mt = entry;
    result
}

/// Pawn-and-king placement for the full-material class, cached in the
/// pawn table.
fn eval_pawns_and_kings(search: &mut Search) -> Score {
    let key = search.board.st().pawn_hash;
    if let Some(entry) = search.tables.pawn.probe(key) {
        search.stack[search.board.ply].pt = *entry;
        return entry.score;
    }

    let brd = &search.board;
    let mut side = [Score::ZERO; 2];
    for uz in 0..2usize {
        let us = uz == 1;
        let kpos = brd.king_sq(us);
        side[uz] += LOSERS_PST_KING[isq(kpos, us) as usize];
        let mut pawns = brd.pieces(PAWN[uz]);
        while pawns != 0 {
            let sq = pop_first(&mut pawns);
            side[uz] += LOSERS_PST_PAWN[isq(sq, us) as usize];
        }
    }

    let entry = PawnEntry {
        key,
        score: side[1] - side[0],
        ..PawnEntry::default()
    };
    search.tables.pawn.store(entry);
    search.stack[search.board.ply].pt = entry;
    entry.score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Variant};
    use crate::options::EngineOptions;
    use std::str::FromStr;

    fn losers_eval(fen: &str) -> i32 {
        let mut options = EngineOptions::default();
        options.wild = Variant::Losers;
        let mut search = Search::new(options);
        search.set_position(Board::from_str(fen).unwrap());
        evaluate(&mut search)
    }

    #[test]
    fn forcing_material_reads_as_an_edge() {
        // Piece-only class: the side with more men to feed controls the
        // flow of forced captures.
        let ahead = losers_eval("1k6/8/8/8/8/8/3n4/K1NR4 w - - 0 1");
        assert!(ahead > 0, "losers eval {ahead}");
    }

    #[test]
    fn symmetric_position_is_level() {
        let eval = losers_eval("4k3/pppp4/8/8/8/8/PPPP4/4K3 w - - 0 1");
        assert_eq!(eval, 0);
    }
}
