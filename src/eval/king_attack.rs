//! King attack scoring.
//!
//! Two components: the shelter score converts the pawn-hash attack units
//! through `KING_SHELTER`, and the piece attack converts zone pressure,
//! material imbalance and queen check threats through the non-linear
//! `KING_ATTACK` curve. Both sit behind a gate: no queen or too little
//! attacking force means no king attack at all.

use crate::bitboard::{self as bits, bit, pop_first};
use crate::board::piece::*;
use crate::eval::score::{Score, s};
use crate::moves::magic::{self, king_moves, king_zone};
use crate::search::Search;
use crate::search::tt::PAWN_FLAG_CLOSED_CENTER;

/// Check-threat weights per piece code (pawns and kings join the attack
/// here, unlike in the zone bookkeeping).
const KA_WEIGHT: [i32; 13] = [0, 1, 3, 3, 5, 9, 2, 1, 3, 3, 5, 9, 2];

/// Shelter attack units to centipawns.
const KING_SHELTER: [i32; 24] = [
    -50, -40, -25, -10, 5, 15, 25, 35, 45, 50, 55, 60, 65, 70, 75, 80, 85, 90, 95, 100, 105,
    110, 115, 120,
];

/// Piece attack units to centipawns; flat start, steep middle.
const KING_ATTACK: [i32; 64] = [
    0, 0, 0, 1, 2, 3, 5, 7, 9, 12, 15, 18, 22, 26, 30, 35, 40, 45, 50, 56, 62, 68, 75, 82, 90,
    98, 105, 114, 123, 132, 141, 150, 160, 170, 180, 191, 202, 214, 226, 238, 250, 262, 274,
    286, 296, 308, 320, 332, 344, 356, 368, 380, 392, 404, 414, 426, 438, 450, 462, 472, 482,
    490, 495, 500,
];

const CLOSED_CENTER_MUL: i32 = 180;
/// Extra shelter units for a missing fianchetto cover / missing back
/// rank defender, indexed by "cover is present".
const FIANCHETTO_UNIT: [i32; 2] = [1, 0];
const BACKRANK_UNIT: [i32; 2] = [1, 0];
const QUEEN_CONTACT_CHECK: i32 = 20;
const QUEEN_DISTANT_CHECK: i32 = 10;

/// Minimum attack force (queen plus a piece) to bother scoring.
const FORCE_GATE: u8 = 12;

/// Is the check square truly covered once `exclude_sq` stops blocking?
fn verify_defended(search: &Search, target: u8, exclude_sq: u8, them: bool) -> bool {
    let frame = &search.stack[search.board.ply];
    let tz = them as usize;
    let direct = frame.attack[PAWN[tz] as usize] | frame.attack[KNIGHT[tz] as usize];
    if bit(target) & direct != 0 {
        return true;
    }
    let brd = &search.board;
    let occ = brd.occupied() & !bit(exclude_sq);
    if magic::bishop_moves(target, occ)
        & (brd.pieces(BISHOP[tz]) | brd.pieces(QUEEN[tz]))
        != 0
    {
        return true;
    }
    magic::rook_moves(target, occ) & (brd.pieces(ROOK[tz]) | brd.pieces(QUEEN[tz])) != 0
}

/// Does another friendly piece back up the checking square?
fn verify_supported(search: &Search, target: u8, exclude_sq: u8, us: bool) -> bool {
    let frame = &search.stack[search.board.ply];
    let uz = us as usize;
    let direct = frame.attack[PAWN[uz] as usize]
        | frame.attack[KNIGHT[uz] as usize]
        | frame.attack[KING[uz] as usize];
    if bit(target) & direct != 0 {
        return true;
    }
    let brd = &search.board;
    let occ = brd.occupied();
    if magic::bishop_moves(target, occ)
        & !bit(exclude_sq)
        & (brd.pieces(BISHOP[uz]) | brd.pieces(QUEEN[uz]))
        != 0
    {
        return true;
    }
    magic::rook_moves(target, occ) & !bit(exclude_sq) & (brd.pieces(ROOK[uz]) | brd.pieces(QUEEN[uz]))
        != 0
}

/// King attack score for side `us`, stored as that king's piece score.
pub fn eval(search: &mut Search, us: bool) -> Score {
    let ply = search.board.ply;
    let uz = us as usize;
    let tz = 1 - uz;
    let them = !us;

    let mut result = Score::ZERO;
    if search.board.pieces(QUEEN[uz]) == 0 {
        search.stack[ply].pc_score[KING[uz] as usize] = result;
        return result;
    }
    let my_force = search.stack[ply].mt.attack_force[uz];
    if my_force < FORCE_GATE {
        search.stack[ply].pc_score[KING[uz] as usize] = result;
        return result;
    }

    /*
     * Shelter component.
     */
    let mut shelter_units = search.stack[ply].pt.king_attack[uz] as i32;
    let brd = &search.board;
    let backrank_ok = bits::NTH_RANK[uz][8] & brd.pieces(ROOK[tz]) != 0;
    let fianchetto_ok = bits::forward1(brd.pieces(KING[tz]), them)
        & (brd.pieces(BISHOP[tz]) | brd.pieces(PAWN[tz]))
        != 0;
    shelter_units += FIANCHETTO_UNIT[fianchetto_ok as usize];
    shelter_units += BACKRANK_UNIT[backrank_ok as usize];

    let mut shelter_score = KING_SHELTER[shelter_units.clamp(0, 23) as usize];
    if search.stack[ply].pt.flags & PAWN_FLAG_CLOSED_CENTER != 0 {
        shelter_score = (CLOSED_CENTER_MUL * shelter_score) / 256;
    }
    if search.options.king_attack_shelter != 256 {
        shelter_score = (search.options.king_attack_shelter * shelter_score) / 256;
    }

    /*
     * Piece attack component.
     */
    let frame = &search.stack[ply];
    let mut attackers_count = 0i32;
    let mut attackers_weight = 0i32;
    let mut attacks = 0u64;
    let mut defends = 0u64;
    for pc in KNIGHT[uz]..=QUEEN[uz] {
        let mirrored = if pc > WKING { pc - 6 } else { pc + 6 };
        defends |= frame.attack[mirrored as usize];
        let count = frame.king_attack[pc as usize].mg as i32;
        if count == 0 {
            continue;
        }
        attackers_count += count;
        attackers_weight += frame.king_attack[pc as usize].eg as i32;
        attacks |= frame.attack[pc as usize];
    }

    if attackers_count == 0 {
        let score = s(shelter_score as i16, 0);
        search.stack[ply].pc_score[KING[uz] as usize] = score;
        return score;
    }

    let ksq_them = brd.king_sq(them);
    let zone = king_zone(ksq_them);
    defends |= frame.attack[PAWN[tz] as usize];

    if frame.attack[PAWN[uz] as usize] & zone != 0 {
        attackers_count += 1;
        attackers_weight += KA_WEIGHT[PAWN[uz] as usize];
        attacks |= frame.attack[PAWN[uz] as usize];
    }
    if frame.attack[KING[uz] as usize] & zone != 0 {
        attackers_count += 1;
        attackers_weight += KA_WEIGHT[KING[uz] as usize];
        attacks |= frame.attack[KING[uz] as usize];
    }

    let mut units = shelter_score / 10;
    units += (attackers_count * attackers_weight) / 4;
    units += my_force as i32 - frame.mt.attack_force[tz] as i32;

    let king_area = king_moves(ksq_them);
    let area_attacks = king_area & attacks;
    let undefended = area_attacks & !defends;
    units += bits::popcnt(area_attacks) as i32;
    units += 2 * bits::popcnt(undefended) as i32;

    // Queen checks: contact squares next to the king, and distant checks
    // down open lines, each discounted when defended and amplified when
    // the checking square is supported.
    let checks_diag = magic::bishop_moves(ksq_them, brd.occupied());
    let checks_hv = magic::rook_moves(ksq_them, brd.occupied());
    if frame.attack[QUEEN[uz] as usize] & zone != 0 {
        let mob = frame.pt.mob[uz];
        let mut queens = brd.pieces(QUEEN[uz]);
        while queens != 0 {
            let qsq = pop_first(&mut queens);
            let queen_attacks = magic::queen_moves(qsq, brd.occupied()) & !brd.all(us);
            let mut contact = queen_attacks & king_area;
            while contact != 0 {
                units += 1;
                let target = pop_first(&mut contact);
                let defended = bit(target) & defends != 0;
                if defended && verify_defended(search, target, qsq, them) {
                    continue;
                }
                units += 1;
                if verify_supported(search, target, qsq, us) {
                    units += QUEEN_CONTACT_CHECK;
                }
            }
            let mut distant = queen_attacks & (checks_diag | checks_hv) & !king_area & mob;
            while distant != 0 {
                units += 1;
                let target = pop_first(&mut distant);
                let defended = bit(target) & defends != 0;
                if defended && verify_defended(search, target, qsq, them) {
                    continue;
                }
                units += QUEEN_DISTANT_CHECK;
            }
        }
    }

    let mut piece_score = KING_ATTACK[units.clamp(0, 63) as usize];
    if search.options.king_attack_pieces != 256 {
        piece_score = (search.options.king_attack_pieces * piece_score) / 256;
    }

    result = s((shelter_score + piece_score) as i16, 0);
    search.stack[ply].pc_score[KING[uz] as usize] = result;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::eval::evaluate;
    use crate::options::EngineOptions;
    use std::str::FromStr;

    fn attack_score(fen: &str, us: bool) -> Score {
        let mut search = Search::new(EngineOptions::default());
        search.set_position(Board::from_str(fen).unwrap());
        evaluate(&mut search);
        search.stack[0].pc_score[KING[us as usize] as usize]
    }

    #[test]
    fn no_queen_means_no_attack_score() {
        let score = attack_score(
            "2r2rk1/pp3ppp/8/8/8/8/PP3PPP/2R2RK1 w - - 0 1",
            true,
        );
        assert_eq!(score, Score::ZERO);
    }

    #[test]
    fn bare_shelter_raises_the_attack() {
        // Same attackers, black king stripped of its shield.
        let sheltered = attack_score(
            "r4rk1/pppq1ppp/2n5/8/8/2N5/PPPQ1PPP/R4RK1 w - - 0 1",
            true,
        );
        let stripped = attack_score(
            "r4rk1/pppq4/2n5/8/8/2N5/PPPQ1PPP/R4RK1 w - - 0 1",
            true,
        );
        assert!(stripped.mg > sheltered.mg);
    }

    #[test]
    fn multipliers_scale_the_components() {
        let fen = "r4rk1/pppq4/2n5/8/8/2N5/PPPQ1PPP/R4RK1 w - - 0 1";
        let normal = attack_score(fen, true);
        let mut options = EngineOptions::default();
        options.king_attack_shelter = 0;
        options.king_attack_pieces = 0;
        let mut search = Search::new(options);
        search.set_position(Board::from_str(fen).unwrap());
        evaluate(&mut search);
        let off = search.stack[0].pc_score[WKING as usize];
        assert!(off.mg <= normal.mg);
        assert_eq!(off.mg, 0);
    }
}
