//! Knight, bishop, rook and queen terms.
//!
//! Pieces are scored against the pawns-and-kings skeleton only, so when a
//! ply leaves the skeleton untouched the previous ply's per-piece scores,
//! attack masks and king-zone counters are reused wholesale, except for
//! the piece that moved and the piece that was captured.

use crate::bitboard::{self as bits, bit, pop_first, sq};
use crate::board::piece::*;
use crate::eval::score::{Score, s};
use crate::moves::magic::{self, king_moves, king_zone, knight_moves};
use crate::search::Search;
use crate::search::tt::PAWN_FLAG_CLOSED_CENTER;

/// King-zone attack weight per piece code.
const ATTACK_WEIGHT: [i16; 13] = [0, 0, 3, 3, 5, 9, 0, 0, 3, 3, 5, 9, 0];
const ATTACK_WEIGHT_SQUARE: i16 = 3;

const MOBILITY: [i16; 32] = [
    -50, -30, -20, -10, -5, 0, 0, 5, 5, 5, 10, 10, 10, 10, 15, 15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15, 15,
];

/// By count of attackable pawn-structure targets in reach.
const ATTACKS: [i16; 8] = [-5, 0, 5, 10, 10, 10, 10, 10];

/// Penalty for standing on a pawn-attacked square, per piece code.
const ATTACKED: [i16; 13] = [0, 0, -30, -30, -50, -90, 0, 0, -30, -30, -50, -90, 0];

/// Outpost bonuses from the owner's view; `[0]` bishops, `[1]` knights.
#[rustfmt::skip]
const OUTPOST: [[i16; 64]; 2] = [
    [
        0, 0, 0,  0,  0, 0, 0, 0,
        0, 5, 5,  5,  5, 5, 5, 0,
        0, 5, 5, 10, 10, 5, 5, 0,
        0, 0, 5,  5,  5, 5, 0, 0,
        0, 0, 0,  0,  0, 0, 0, 0,
        0, 0, 0,  0,  0, 0, 0, 0,
        0, 0, 0,  0,  0, 0, 0, 0,
        0, 0, 0,  0,  0, 0, 0, 0,
    ],
    [
        0, 0,  0,  0,  0,  0, 0, 0,
        0, 0,  0,  5,  5,  0, 0, 0,
        0, 0, 10, 20, 20, 10, 0, 0,
        0, 0,  5, 10, 10,  5, 0, 0,
        0, 0,  0,  5,  5,  0, 0, 0,
        0, 0,  0,  0,  0,  0, 0, 0,
        0, 0,  0,  0,  0,  0, 0, 0,
        0, 0,  0,  0,  0,  0, 0, 0,
    ],
];

/// Indexed by "the blocker belongs to the side being scored".
const BLOCKED_CENTER_PAWN: [Score; 2] = [s(10, 0), s(-10, 0)];

const VBISHOPPAIR: Score = s(30, 50);
const DEFENDED: Score = s(5, 0);
const ROOK_7TH: Score = s(20, 30);
const SEMIOPEN_FILE: Score = s(5, 0);
const OPEN_FILE: Score = s(15, 5);
const CLOSED_FILE: Score = s(-5, -5);
const SUPPORTED_PASSER: Score = s(10, 20);
const CONNECTED_ROOKS: Score = s(10, 20);
const TRAPPED_PC: i16 = -35;

const PAT_BLOCKED_CENTER: u64 = bit(sq::D3) | bit(sq::E3) | bit(sq::D6) | bit(sq::E6);
/// Edge bands on the opponent's side of the board, indexed by `white`.
const PAT_TRAPPED: [u64; 2] = [
    (bits::RANK_1 | bits::RANK_2 | bits::RANK_3) & bits::EDGE,
    (bits::RANK_6 | bits::RANK_7 | bits::RANK_8) & bits::EDGE,
];

/// Piece terms from white's view; fills the frame's per-piece scores,
/// attack masks and king-zone counters as a side effect.
pub fn eval(search: &mut Search) -> Score {
    let ply = search.board.ply;
    let equal_pawns = ply > 0
        && search.board.st().pawn_hash == search.board.frame(ply - 1).pawn_hash
        && search.stack[ply - 1].eval_result.is_some();
    let (prev_piece, prev_capture) = if equal_pawns {
        let m = &search.stack[ply - 1].current_move;
        (m.piece, m.capture)
    } else {
        (EMPTY, EMPTY)
    };

    let pt = search.stack[ply].pt;
    let brd = &search.board;
    let skeleton = brd.pawns_kings();
    let kpos = [brd.king_sq(false), brd.king_sq(true)];
    let kzone = [king_zone(kpos[0]), king_zone(kpos[1])];
    let closed_center = pt.flags & PAWN_FLAG_CLOSED_CENTER != 0;

    let mut attack = [0u64; 13];
    let mut pc_score = [Score::ZERO; 13];
    let mut king_attack = [Score::ZERO; 13];
    attack[BPAWN as usize] = brd.pawn_attacks(false);
    attack[WPAWN as usize] = brd.pawn_attacks(true);
    attack[BKING as usize] = king_moves(kpos[0]);
    attack[WKING as usize] = king_moves(kpos[1]);

    let mut result = Score::ZERO;
    for pc in WKNIGHT..=BQUEEN {
        if pc == WKING || pc == BPAWN {
            continue;
        }
        let us = is_white(pc);
        let uz = us as usize;
        let pcz = pc as usize;

        if equal_pawns && pc != prev_piece && pc != prev_capture {
            pc_score[pcz] = search.stack[ply - 1].pc_score[pcz];
            king_attack[pcz] = search.stack[ply - 1].king_attack[pcz];
            attack[pcz] = search.stack[ply - 1].attack[pcz];
            result += if us { pc_score[pcz] } else { -pc_score[pcz] };
            continue;
        }

        let mut bb_pc = brd.pieces(pc);
        if bb_pc == 0 {
            continue;
        }
        let mut sc = Score::ZERO;
        let is_minor = kind(pc) == 2 || kind(pc) == 3;

        while bb_pc != 0 {
            let sq_i = pop_first(&mut bb_pc);
            let bsq = bit(sq_i);
            let defended = brd.is_attacked_by_pawn(sq_i, us);

            sc += super::pst::pst(pc, sq_i);

            // A piece camping on d3/e3/d6/e6 with its own pawn still at
            // home clogs the center for its side.
            if bsq & PAT_BLOCKED_CENTER != 0 {
                if sq_i == sq::E3 && brd.matrix[sq::E2 as usize] == WPAWN
                    || sq_i == sq::D3 && brd.matrix[sq::D2 as usize] == WPAWN
                {
                    sc += BLOCKED_CENTER_PAWN[us as usize];
                } else if sq_i == sq::E6 && brd.matrix[sq::E7 as usize] == BPAWN
                    || sq_i == sq::D6 && brd.matrix[sq::D7 as usize] == BPAWN
                {
                    sc += BLOCKED_CENTER_PAWN[!us as usize];
                }
            }

            let moves = match kind(pc) {
                2 => knight_moves(sq_i),
                3 => magic::bishop_moves(sq_i, skeleton),
                4 => magic::rook_moves(sq_i, skeleton),
                _ => magic::queen_moves(sq_i, skeleton),
            };

            let safe_moves = moves & pt.mob[uz];
            let mob_cnt = bits::popcnt(safe_moves) as usize;
            sc += Score::both(MOBILITY[mob_cnt.min(31)]);
            sc += Score::both(
                ATTACKS[(bits::popcnt(safe_moves & pt.attack[uz]) as usize).min(7)],
            );
            attack[pcz] |= moves;

            if brd.is_attacked_by_pawn(sq_i, !us) {
                sc += Score::both(ATTACKED[pcz]);
            }

            // Cornered on the opponent's edge with nowhere to go.
            if mob_cnt < 2
                && !defended
                && bsq & PAT_TRAPPED[uz] != 0
                && bits::max_1(moves & !skeleton)
            {
                sc += Score::both(TRAPPED_PC * (bits::rel_rank(sq_i, us) as i16 - 3));
            }

            if defended && is_minor {
                sc += DEFENDED;
                if brd.is_outpost(sq_i, us) {
                    let table = &OUTPOST[(pc == KNIGHT[uz]) as usize];
                    sc += Score::both(table[bits::isq(sq_i, us) as usize]);
                }
            }

            if pc == ROOK[uz] {
                if !pt.is_open_file(sq_i, us) {
                    sc += CLOSED_FILE;
                    // Tarrasch: the rook belongs behind a passer.
                    if moves & pt.passers & bits::fill_up(bsq, us) != 0 {
                        sc += SUPPORTED_PASSER;
                    }
                } else if pt.is_open_file(sq_i, !us) {
                    sc += OPEN_FILE;
                    if moves & brd.pieces(pc) & bits::FILES[bits::file_of(sq_i) as usize] != 0 {
                        sc += CONNECTED_ROOKS;
                    }
                } else {
                    sc += SEMIOPEN_FILE;
                }

                if bsq & bits::NTH_RANK[uz][7] != 0
                    && brd.pieces(KING[1 - uz]) & bits::BACKRANKS[uz] != 0
                {
                    sc += ROOK_7TH;
                }
            }

            // King-zone pressure bookkeeping for the king-attack term.
            if safe_moves & kzone[1 - uz] != 0 {
                king_attack[pcz].mg += 1;
                king_attack[pcz].eg += ATTACK_WEIGHT[pcz];
                let hits = bits::popcnt(safe_moves & attack[KING[1 - uz] as usize]) as i16;
                king_attack[pcz].eg += ATTACK_WEIGHT_SQUARE * hits;
            }
        }

        if pc == BISHOP[uz] && brd.has_bishop_pair(us) && !closed_center {
            sc += VBISHOPPAIR;
        }

        pc_score[pcz] = sc;
        result += if us { sc } else { -sc };
    }

    let frame = &mut search.stack[ply];
    frame.attack = attack;
    frame.pc_score[WKNIGHT as usize..=BQUEEN as usize]
        .copy_from_slice(&pc_score[WKNIGHT as usize..=BQUEEN as usize]);
    frame.king_attack = king_attack;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::eval::evaluate;
    use crate::options::EngineOptions;
    use std::str::FromStr;

    fn piece_score(fen: &str, pc: u8) -> Score {
        let mut search = Search::new(EngineOptions::default());
        search.set_position(Board::from_str(fen).unwrap());
        evaluate(&mut search);
        search.stack[0].pc_score[pc as usize]
    }

    #[test]
    fn rook_prefers_open_files() {
        let open = piece_score("4k3/8/8/8/8/8/6PP/R3K3 w - - 0 1", WROOK);
        let closed = piece_score("4k3/8/8/8/8/8/P5PP/R3K3 w - - 0 1", WROOK);
        assert!(open.mg > closed.mg);
    }

    #[test]
    fn knight_outpost_needs_pawn_cover() {
        let outpost = piece_score("4k3/8/8/3N4/2P5/8/8/4K3 w - - 0 1", WKNIGHT);
        let bare = piece_score("4k3/8/8/3N4/8/8/2P5/4K3 w - - 0 1", WKNIGHT);
        assert!(outpost.mg > bare.mg);
    }

    #[test]
    fn bishop_pair_bonus() {
        let pair = piece_score("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1", WBISHOP);
        let single = piece_score("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1", WBISHOP);
        assert!(pair.mg >= single.mg + VBISHOPPAIR.mg - 10);
    }

    #[test]
    fn hanging_piece_penalty() {
        // c4 is covered by the d5 pawn; d2 is not.
        let attacked = piece_score("4k3/8/8/3p4/2N5/8/8/4K3 b - - 0 1", WKNIGHT);
        let safe = piece_score("4k3/8/8/3p4/8/8/3N4/4K3 b - - 0 1", WKNIGHT);
        assert!(attacked.mg < safe.mg);
    }
}
