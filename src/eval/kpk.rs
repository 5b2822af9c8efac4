//! King-and-pawn versus king bitbase.
//!
//! 24 pawn squares (files a..d, ranks 2..7) times 64 white-king squares
//! give 1536 slots per side to move; each slot is a 64-bit mask over the
//! black-king square, bit set when white wins. Built at startup by
//! retrograde analysis: direct rules seed WIN/DRAW/INVALID, then
//! positions are classified off their successors until a fixpoint.
//! Probes mirror the pawn onto files a..d first.

use once_cell::sync::Lazy;

use crate::bitboard::{bit, file_of, rank_of, sq};
use crate::moves::magic::{king_moves, pawn_captures};

const MAX_IDX: usize = 24 * 64;

const UNKNOWN: u8 = 0;
const DRAW: u8 = 1;
const WIN: u8 = 2;
const INVALID: u8 = 3;

/*
 * Index layout:  0..5 white king | 6..7 pawn file | 8..10 pawn rank - 1
 */
#[inline(always)]
fn index(wk: u8, wp: u8) -> usize {
    debug_assert!(file_of(wp) <= 3);
    debug_assert!((1..=6).contains(&rank_of(wp)));
    wk as usize + ((file_of(wp) as usize) << 6) + (((rank_of(wp) - 1) as usize) << 8)
}

/// Direct classification without lookahead.
fn seed(wtm: bool, wk: u8, bk: u8, wp: u8) -> u8 {
    if wk == bk || wk == wp || bk == wp {
        return INVALID;
    }
    if crate::bitboard::distance(wk, bk) == 1 {
        return INVALID;
    }
    if wtm && pawn_captures(true, wp) & bit(bk) != 0 {
        return INVALID; // the pawn could simply take the king
    }

    if wtm {
        let tsq = wp + 8;
        if tsq == wk || tsq == bk {
            // Pawn blocked; a white king with no free square is stuck.
            if king_moves(wk) & !king_moves(bk) & !bit(wp) == 0 {
                return DRAW;
            }
            return UNKNOWN;
        }
        if wp < sq::A7 {
            return UNKNOWN;
        }
        if king_moves(wk) & bit(tsq) != 0 || king_moves(bk) & bit(tsq) == 0 {
            return WIN; // promotes out of the defender's reach
        }
        return UNKNOWN;
    }

    let attacks_w = king_moves(wk) | pawn_captures(true, wp);
    let bk_moves = king_moves(bk) & !attacks_w;
    if bk_moves == 0 {
        return DRAW; // stalemated defender
    }
    if king_moves(bk) & bit(wp) != 0 && attacks_w & bit(wp) == 0 {
        return DRAW; // the pawn falls
    }
    UNKNOWN
}

struct Scratch {
    // [side to move][black king][index]
    t: Vec<u8>,
}

impl Scratch {
    fn new() -> Self {
        Scratch {
            t: vec![INVALID; 2 * 64 * MAX_IDX],
        }
    }

    #[inline(always)]
    fn at(&self, wtm: bool, bk: u8, idx: usize) -> u8 {
        self.t[(wtm as usize * 64 + bk as usize) * MAX_IDX + idx]
    }

    #[inline(always)]
    fn set(&mut self, wtm: bool, bk: u8, idx: usize, v: u8) {
        self.t[(wtm as usize * 64 + bk as usize) * MAX_IDX + idx] = v;
    }
}

/// White to move: a win if any pawn push or king move reaches a won
/// black-to-move position; a draw if all successors are drawn.
fn classify_white(wk: u8, bk: u8, wp: u8, t: &Scratch) -> u8 {
    let mut all_draw = true;
    let mut tsq = wp + 8;
    loop {
        if tsq == wk || tsq == bk || tsq >= sq::A8 {
            break;
        }
        let next = t.at(false, bk, index(wk, tsq));
        debug_assert!(next != INVALID);
        if next == WIN {
            return WIN;
        }
        all_draw &= next == DRAW;
        if tsq >= sq::A4 {
            break;
        }
        tsq += 8; // double step from the home rank
    }
    let mut moves = king_moves(wk) & !(king_moves(bk) | bit(wp));
    while moves != 0 {
        let to = crate::bitboard::pop_first(&mut moves);
        let next = t.at(false, bk, index(to, wp));
        debug_assert!(next != INVALID);
        if next == WIN {
            return WIN;
        }
        all_draw &= next == DRAW;
    }
    if all_draw { DRAW } else { UNKNOWN }
}

/// Black to move: a draw if any king move escapes to a drawn position; a
/// win for white if every reply loses.
fn classify_black(wk: u8, bk: u8, wp: u8, t: &Scratch) -> u8 {
    let mut all_win = true;
    let idx = index(wk, wp);
    let mut moves = king_moves(bk) & !(king_moves(wk) | pawn_captures(true, wp));
    debug_assert!(moves != 0);
    while moves != 0 {
        let to = crate::bitboard::pop_first(&mut moves);
        let next = t.at(true, to, idx);
        debug_assert!(next != INVALID);
        if next == DRAW {
            return DRAW;
        }
        all_win &= next == WIN;
    }
    if all_win { WIN } else { UNKNOWN }
}

struct KpkBitbase {
    won: [Box<[u64; MAX_IDX]>; 2],
}

fn pawn_squares() -> impl Iterator<Item = u8> {
    (sq::A2..=sq::H7).filter(|&wp| file_of(wp) <= 3)
}

static KPK: Lazy<KpkBitbase> = Lazy::new(|| {
    let mut scratch = Scratch::new();
    let mut won: [Box<[u64; MAX_IDX]>; 2] = [
        vec![0u64; MAX_IDX].into_boxed_slice().try_into().unwrap(),
        vec![0u64; MAX_IDX].into_boxed_slice().try_into().unwrap(),
    ];

    // Pass 0 seeds the direct results; later passes classify UNKNOWN
    // slots from their successors until nothing changes. The number of
    // unknown slots must shrink monotonically or the generator is wrong.
    let mut prev_unknowns = usize::MAX;
    let mut step = 0;
    loop {
        let mut changed = false;
        let mut unknowns = 0usize;
        for wk in 0..64u8 {
            for bk in 0..64u8 {
                for wp in pawn_squares() {
                    let idx = index(wk, wp);
                    if step == 0 {
                        scratch.set(true, bk, idx, seed(true, wk, bk, wp));
                        scratch.set(false, bk, idx, seed(false, wk, bk, wp));
                        changed = true;
                    } else {
                        if scratch.at(true, bk, idx) == UNKNOWN {
                            unknowns += 1;
                            let r = classify_white(wk, bk, wp, &scratch);
                            scratch.set(true, bk, idx, r);
                            changed |= r != UNKNOWN;
                        }
                        if scratch.at(false, bk, idx) == UNKNOWN {
                            unknowns += 1;
                            let r = classify_black(wk, bk, wp, &scratch);
                            scratch.set(false, bk, idx, r);
                            changed |= r != UNKNOWN;
                        }
                    }
                }
            }
        }
        if step > 0 {
            debug_assert!(unknowns <= prev_unknowns, "retrograde pass diverged");
            prev_unknowns = unknowns;
        }
        step += 1;
        if !changed {
            break;
        }
    }

    for wtm in 0..2usize {
        for wk in 0..64u8 {
            for bk in 0..64u8 {
                for wp in pawn_squares() {
                    let idx = index(wk, wp);
                    if scratch.at(wtm == 1, bk, idx) == WIN {
                        won[wtm][idx] |= bit(bk);
                    }
                }
            }
        }
    }
    KpkBitbase { won }
});

/// Does the pawn side win? `white_pawn` selects the orientation: pass
/// the position with the pawn side mapped to white. Out-of-domain input
/// (pawn on rank 1 or 8) reports no win, letting evaluation carry on.
pub fn probe(wtm: bool, wk: u8, bk: u8, wp: u8) -> bool {
    if !(1..=6).contains(&rank_of(wp)) {
        return false;
    }
    let (wk, bk, wp) = if file_of(wp) <= 3 {
        (wk, bk, wp)
    } else {
        (wk ^ 7, bk ^ 7, wp ^ 7) // mirror onto files a..d
    };
    KPK.won[wtm as usize][index(wk, wp)] & bit(bk) != 0
}

/// Probe from a position where the pawn side may be black: flip the
/// board vertically first.
pub fn probe_colored(pawn_side_white: bool, stm_is_pawn_side: bool, ksq_us: u8, ksq_them: u8, psq: u8) -> bool {
    if pawn_side_white {
        probe(stm_is_pawn_side, ksq_us, ksq_them, psq)
    } else {
        probe(
            stm_is_pawn_side,
            crate::bitboard::flip_sq(ksq_us),
            crate::bitboard::flip_sq(ksq_them),
            crate::bitboard::flip_sq(psq),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_wins_and_draws() {
        // Rook pawn with the defender in the corner: drawn.
        assert!(!probe(true, sq::A6, sq::A8, sq::A5));
        // King ahead of the pawn on the sixth rank: won either way.
        assert!(probe(true, sq::D6, sq::D8, sq::D5));
        assert!(probe(false, sq::D6, sq::D8, sq::D5));
        // A far-advanced free pawn outruns the bare king.
        assert!(probe(true, sq::H3, sq::H2, sq::B7));
    }

    #[test]
    fn defender_in_front_draw_rule() {
        // Attacking king stuck behind its pawn; the defender holds the
        // squares in front.
        assert!(!probe(true, sq::E3, sq::E6, sq::E4));
    }

    #[test]
    fn mirrored_files_agree() {
        // h-file probe mirrors to the a-file.
        assert_eq!(
            probe(true, sq::G6, sq::G8, sq::H5),
            probe(true, sq::B6, sq::B8, sq::A5)
        );
    }

    #[test]
    fn out_of_domain_is_no_win() {
        assert!(!probe(true, sq::E1, sq::E8, sq::E1));
    }
}
