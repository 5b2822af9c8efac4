//! Pawn structure, king shelter and passed pawns.
//!
//! The structural score and everything derivable from pawns and kings
//! alone is cached in the pawn table: per-side scores, passer bits,
//! mobility and attack masks, shelter attack units, open-file masks and
//! the pawn width. Passed-pawn interaction with pieces depends on full
//! occupancy and is evaluated per node on top of the cached bits.

use crate::bitboard::{
    self as bits, ADJACENT_FILES, CENTER, RANKS, bit, file_of, pop_first, rank_of, sq,
};
use crate::board::piece::*;
use crate::board::{ALLPIECES, Board};
use crate::eval::score::{Score, s};
use crate::moves::magic::{self, king_moves, king_zone, pawn_captures};
use crate::search::Search;
use crate::search::tt::{PAWN_FLAG_CLOSED_CENTER, PawnEntry};

/// Indexed by `opposed`.
const ISOLATED: [Score; 2] = [s(-25, -20), s(-15, -15)];
const WEAK: [Score; 2] = [s(-15, -15), s(-10, -10)];
const DOUBLED: Score = s(-10, -20);
const BLOCKED_CENTER_PAWN: Score = s(-15, 0);
const PAWN_WIDTH_EG: i16 = 5;
/// Endgame credit for a king touching attackable pawns.
const KING_ACTIVITY: i16 = 5;

/// Indexed by relative rank.
const CANDIDATE: [Score; 8] = [
    s(0, 0),
    s(0, 5),
    s(0, 5),
    s(0, 10),
    s(0, 20),
    s(0, 40),
    s(0, 0),
    s(0, 0),
];

/// Duo/defended bonus by relative rank.
const DUO: [i16; 8] = [0, 0, 0, 0, 5, 25, 45, 0];

/// Shelter units from the king's station alone (black's view, mirror
/// for white).
#[rustfmt::skip]
const SHELTER_KPOS: [i8; 64] = [
    9, 9, 9, 9, 9, 9, 9, 9,
    9, 9, 9, 9, 9, 9, 9, 9,
    9, 9, 9, 9, 9, 9, 9, 9,
    6, 6, 7, 8, 8, 7, 6, 6,
    4, 4, 5, 6, 6, 5, 4, 4,
    2, 2, 3, 4, 4, 3, 2, 2,
    1, 1, 2, 3, 3, 2, 1, 1,
    0, 0, 1, 2, 2, 1, 0, 0,
];

const SHELTER_OPEN_FILES: [i8; 4] = [0, 2, 4, 5];
const PAWN_SHIELD_GAPS: [i8; 6] = [0, 1, 3, 5, 6, 7];
const SIDE_PAWNS: [i8; 3] = [0, -1, -2];
const STORM_PAWNS: [i8; 8] = [0, 1, 2, 3, 3, 4, 4, 4];

/// Files touched by the king's squares, as a file-mask byte.
fn king_file_mask(kpos: u8) -> u8 {
    let f = file_of(kpos) as i8;
    let mut mask = 1u8 << f;
    if f > 0 {
        mask |= 1 << (f - 1);
    }
    if f < 7 {
        mask |= 1 << (f + 1);
    }
    mask
}

/// Pawns-and-kings score from white's view, served from the pawn table.
pub fn eval(search: &mut Search) -> Score {
    let key = search.board.st().pawn_hash;
    if let Some(entry) = search.tables.pawn.probe(key) {
        search.stack[search.board.ply].pt = *entry;
        return entry.score;
    }

    let entry = compute(&search.board);
    search.tables.pawn.store(entry);
    search.stack[search.board.ply].pt = entry;
    entry.score
}

fn compute(brd: &Board) -> PawnEntry {
    let mut entry = PawnEntry {
        key: brd.st().pawn_hash,
        open_files: [0xFF, 0xFF],
        ..PawnEntry::default()
    };
    let mut side_score = [Score::ZERO; 2];
    let mut blocked_center_pawns = 0;
    let pawns_all = brd.pieces(WPAWN) | brd.pieces(BPAWN);
    let kpos = [brd.king_sq(false), brd.king_sq(true)];

    for uz in 0..2usize {
        let us = uz == 1;
        let them = !us;
        let tz = 1 - uz;
        let pawns_us = brd.pieces(PAWN[uz]);
        let pawns_them = brd.pieces(PAWN[tz]);

        let mut bb = pawns_us;
        while bb != 0 {
            let sq_i = pop_first(&mut bb);
            let bsq = bit(sq_i);
            let f = file_of(sq_i) as usize;
            let r = rank_of(sq_i);
            let r_us = bits::rel_rank(sq_i, us) as usize;
            let up = bits::fill_up(bsq, us) ^ bsq;
            let af = ADJACENT_FILES[f];

            let isolated = af & pawns_us == 0;
            let doubled = up & pawns_us != 0;
            let opposed = up & pawns_them != 0;
            let attacking = !isolated && pawn_captures(us, sq_i) & pawns_them != 0;
            let blocked = !attacking && bit(bits::forward_sq(sq_i, us)) & pawns_all != 0;
            let passed =
                !doubled && !opposed && pawns_them & af & bits::upward_ranks(r, us) == 0;
            let defended = !isolated && pawn_captures(them, sq_i) & pawns_us != 0;
            let duo = defended || af & RANKS[r as usize] & pawns_us != 0;
            let mut weak = !isolated
                && !passed
                && !defended
                && !attacking
                && !doubled
                && r_us + usize::from(!blocked) < 6;

            // Not weak if it can step to safety within a push or two.
            if weak && !blocked {
                let mut next_sq = bits::forward_sq(sq_i, us);
                let steps = 2 + usize::from(r_us == 1);
                for _ in 0..steps {
                    let defenders = pawn_captures(them, next_sq) & pawns_us;
                    let attackers = pawn_captures(us, next_sq) & pawns_them;
                    next_sq = bits::forward_sq(next_sq, us);
                    if defenders == 0 && attackers == 0 && bit(next_sq) & pawns_all == 0 {
                        continue;
                    }
                    let not_safe = defenders == 0
                        || (bits::is_1(defenders) && bits::gt_1(attackers));
                    weak &= not_safe;
                    break;
                }
            }

            // Not weak if a neighbour pawn can come up and defend it.
            if weak && r_us > 2 && f > 0 {
                let sq1 = (sq_i as i8 - if us { 9 } else { -7 }) as u8;
                let sq2 = (sq1 as i8 - if us { 8 } else { -8 }) as u8;
                if bit(sq2) & pawns_us != 0 && bit(sq1) & pawns_them == 0 {
                    weak &= !brd.pawn_is_safe(sq1, us);
                } else if r_us == 4
                    && bit((sq2 as i8 - if us { 8 } else { -8 }) as u8) & pawns_us != 0
                    && (bit(sq2) | bit(sq1)) & pawns_all == 0
                {
                    weak &= !brd.pawn_is_safe(sq1, us) && !brd.pawn_is_safe(sq2, us);
                }
            }
            if weak && r_us > 2 && f < 7 {
                let sq1 = (sq_i as i8 - if us { 7 } else { -9 }) as u8;
                let sq2 = (sq1 as i8 - if us { 8 } else { -8 }) as u8;
                if bit(sq2) & pawns_us != 0 && bit(sq1) & pawns_them == 0 {
                    weak &= !brd.pawn_is_safe(sq1, us);
                } else if r_us == 4
                    && bit((sq2 as i8 - if us { 8 } else { -8 }) as u8) & pawns_us != 0
                    && (bit(sq2) | bit(sq1)) & pawns_all == 0
                {
                    weak &= !brd.pawn_is_safe(sq1, us) && !brd.pawn_is_safe(sq2, us);
                }
            }

            let mut candidate =
                !passed && !weak && !opposed && !doubled && !isolated && !blocked;
            if candidate && r_us < 5 {
                let helpers = af & pawns_us & king_moves(sq_i);
                let sentries = af & pawns_them & bits::upward_ranks(r, us);
                debug_assert!(sentries != 0);
                candidate &=
                    bits::gt_1(helpers) || (bits::is_1(helpers) && bits::is_1(sentries));
            }

            side_score[uz] += super::pst::pst(PAWN[uz], sq_i);
            if isolated {
                side_score[uz] += ISOLATED[opposed as usize];
            }
            if weak {
                side_score[uz] += WEAK[opposed as usize];
            }
            if duo {
                side_score[uz] += Score::both(DUO[r_us]);
            }
            if doubled {
                side_score[uz] += DOUBLED;
            }
            if passed {
                entry.passers |= bsq;
            }
            if candidate {
                side_score[uz] += CANDIDATE[r_us];
            }
            if blocked {
                blocked_center_pawns += i32::from(bsq & CENTER != 0);
                if sq_i == sq::D2 || sq_i == sq::E2 || sq_i == sq::D7 || sq_i == sq::E7 {
                    side_score[uz] += BLOCKED_CENTER_PAWN;
                }
            }

            entry.open_files[uz] &= !(1u8 << f);
            entry.count[uz] += 1;
        }

        // Pawns spread wide help the endgame king.
        entry.width[uz] = bits::bb_width((entry.open_files[uz] ^ 0xFF) as u64);
        side_score[uz] += s(0, PAWN_WIDTH_EG * entry.width[uz] as i16);

        entry.mob[uz] =
            !(pawns_us | brd.pawn_attacks(them) | brd.pieces(KING[uz]));
        entry.attack[uz] = entry.mob[uz] & (pawns_them | brd.pieces(KING[tz]));

        side_score[uz] += super::pst::pst(KING[uz], kpos[uz]);
        let king_atcks = king_moves(kpos[uz]) & entry.attack[uz];
        side_score[uz] += s(0, bits::popcnt(king_atcks) as i16 * KING_ACTIVITY);

        // Shelter units against their king; castling offers the escape
        // hatch of a fresh shelter, discounted by the tempo it costs.
        let mut sau = shelter_attack_units(brd, &entry, kpos[tz], them);
        if sau > 2 && brd.can_castle_ks(them) {
            sau = sau.min(shelter_attack_units(brd, &entry, bits::isq(sq::G8, them), them) + 2);
        }
        if sau > 2 && brd.can_castle_qs(them) {
            sau = sau.min(shelter_attack_units(brd, &entry, bits::isq(sq::C8, them), them) + 2);
        }
        entry.king_attack[uz] = sau.clamp(-128, 127) as i8;
    }

    if blocked_center_pawns >= 3 {
        entry.flags |= PAWN_FLAG_CLOSED_CENTER;
    }

    entry.score = side_score[1] - side_score[0];
    entry
}

/// Weighted weaknesses of the shelter in front of `them`'s king on
/// `kpos_them`: 0 for a perfect shelter up to roughly 10 for none.
fn shelter_attack_units(brd: &Board, entry: &PawnEntry, kpos_them: u8, them: bool) -> i32 {
    let us = !them;
    let uz = us as usize;
    let tz = them as usize;
    let pawns_them = brd.pieces(PAWN[tz]);
    let kr = rank_of(kpos_them);

    let mut units = SHELTER_KPOS[bits::isq(kpos_them, them) as usize] as i32;

    // Files near the king that our heavy pieces can enter.
    let open_near_king = entry.open_files[uz] & king_file_mask(kpos_them);
    units += SHELTER_OPEN_FILES[(open_near_king.count_ones() as usize).min(3)] as i32;

    // Holes in the shield directly ahead.
    let shield_gaps = king_moves(kpos_them) & bits::upward_ranks(kr, them) & !pawns_them;
    units += PAWN_SHIELD_GAPS[(bits::popcnt(shield_gaps) as usize).min(5)] as i32;

    // Friendly pawns beside the king plug rank attacks.
    let side_pawns = king_moves(kpos_them) & RANKS[kr as usize] & pawns_them;
    units += SIDE_PAWNS[(bits::popcnt(side_pawns) as usize).min(2)] as i32;

    // Enemy pawns storming the zone.
    let storm = king_zone(kpos_them) & bits::upward_ranks(kr, them) & brd.pieces(PAWN[uz]);
    units += STORM_PAWNS[(bits::popcnt(storm) as usize).min(7)] as i32;

    // Open lines and squares toward the king through the pawn skeleton.
    let skeleton = brd.pieces(WPAWN) | brd.pieces(BPAWN) | brd.pieces(KING[uz]);
    let mask = (king_zone(kpos_them) | magic::queen_moves(kpos_them, skeleton))
        & entry.mob[uz]
        & (bits::RANK_3 | bits::RANK_4 | bits::RANK_5 | bits::RANK_6);
    units += bits::popcnt(mask) as i32 / 2;

    units
}

/// Passer bonuses by relative rank (rank 2 = index 0).
const PP_MG: [i16; 6] = [5, 5, 15, 35, 70, 130];
const PP_EG: [i16; 6] = [10, 10, 15, 25, 50, 80];
const PP_DIST_US: [i16; 6] = [0, 0, 3, 7, 12, 15];
const PP_DIST_THEM: [i16; 6] = [0, 0, 5, 12, 20, 40];
const PP_ADVANCE: [i16; 6] = [0, 0, 0, 20, 50, 120];

/// Score `white`'s passed pawns against the full occupancy: base bonus,
/// king distances and a free-path advance ladder. The result is also
/// stashed in the frame for the pruning margin.
pub fn eval_passed_pawns(search: &mut Search, us: bool) -> Score {
    let ply = search.board.ply;
    let uz = us as usize;
    let mut result = Score::ZERO;
    let mut passers = search.stack[ply].pt.passers & search.board.pieces(PAWN[uz]);
    if passers == 0 {
        search.stack[ply].passer_score[uz] = result;
        return result;
    }
    let them = !us;

    while passers != 0 {
        let sq_i = pop_first(&mut passers);
        let r = if us {
            rank_of(sq_i) as usize - 1
        } else {
            6 - rank_of(sq_i) as usize
        };
        debug_assert!(r <= 5);
        result += s(PP_MG[r], PP_EG[r]);

        if r < 2 {
            continue;
        }

        // King proximity to the stop square, endgame only.
        let mut to = bits::forward_sq(sq_i, us);
        let dist_us =
            bits::distance(search.board.king_sq(us), to) as i16 * PP_DIST_US[r];
        let dist_them =
            bits::distance(search.board.king_sq(them), to) as i16 * PP_DIST_THEM[r];
        result += s(0, dist_them - dist_us);

        // March the free path, halving the bonus per step; a defended
        // stop square ends the march unless we outnumber the defenders.
        let mut advance_bonus = PP_ADVANCE[r] as i32;
        for _ in r + 1..=6 {
            if bit(to) & search.board.occupied() != 0 {
                break;
            }
            search.board.bb[ALLPIECES] ^= bit(sq_i); // expose x-ray support
            let attacks = search.board.attacks_to(to);
            search.board.bb[ALLPIECES] ^= bit(sq_i);

            let defend = attacks & search.board.all(them);
            if defend != 0 {
                let support = attacks & search.board.all(us);
                if support == 0 || (bits::is_1(support) && bits::gt_1(defend)) {
                    break;
                }
            }
            result += Score::both(advance_bonus as i16);
            to = bits::forward_sq(to, us);
            advance_bonus /= 2;
        }
    }

    if search.stack[ply].mt.has_imbalance(them) {
        if search.stack[ply].mt.has_major_imbalance() {
            result = result.mul256(196);
        } else {
            result = result.mul256(232);
        }
    }
    search.stack[ply].passer_score[uz] = result;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EngineOptions;
    use std::str::FromStr;

    fn pawn_entry(fen: &str) -> PawnEntry {
        let brd = Board::from_str(fen).unwrap();
        compute(&brd)
    }

    #[test]
    fn passers_are_flagged() {
        let entry = pawn_entry("4k3/8/8/3P4/8/8/6p1/4K3 w - - 0 1");
        assert!(entry.passers & bit(sq::D5) != 0);
        assert!(entry.passers & bit(sq::G2) != 0);
        let entry = pawn_entry("4k3/3p4/8/3P4/8/8/8/4K3 w - - 0 1");
        assert_eq!(entry.passers, 0); // blocked by an opposing pawn
    }

    #[test]
    fn isolated_pawn_is_penalized() {
        let isolated = pawn_entry("4k3/8/8/8/8/8/P7/4K3 w - - 0 1");
        let connected = pawn_entry("4k3/8/8/8/8/8/PP6/4K3 w - - 0 1");
        // One extra pawn should score more than double the single pawn if
        // the isolation penalty bites.
        assert!(connected.score.mg > isolated.score.mg);
    }

    #[test]
    fn open_file_masks() {
        let entry = pawn_entry("4k3/8/8/8/8/8/P2P4/4K3 w - - 0 1");
        assert_eq!(entry.open_files[1] & 1, 0); // a-file has a white pawn
        assert_eq!(entry.open_files[1] & (1 << 3), 0);
        assert_ne!(entry.open_files[1] & (1 << 4), 0);
        assert_eq!(entry.open_files[0], 0xFF); // black has no pawns
        assert_eq!(entry.count[1], 2);
        assert_eq!(entry.width[1], 3);
    }

    #[test]
    fn shelter_prefers_castled_king_behind_pawns() {
        let castled = pawn_entry("6k1/5ppp/8/8/8/8/5PPP/6K1 w - - 0 1");
        let wandering = pawn_entry("6k1/5ppp/8/4K3/8/8/5PPP/8 w - - 0 1");
        // Black's attack units against the wandering white king exceed
        // those against the castled one.
        assert!(wandering.king_attack[0] > castled.king_attack[0]);
    }

    #[test]
    fn closed_center_flag() {
        // d4, d5 and e5 are blocked center pawns with no pawn captures
        // to free them.
        let entry = pawn_entry("4k3/8/4p3/3pP3/3P4/8/8/4K3 w - - 0 1");
        assert_ne!(entry.flags & PAWN_FLAG_CLOSED_CENTER, 0);
        let open = pawn_entry("4k3/8/8/3p4/8/4P3/8/4K3 w - - 0 1");
        assert_eq!(open.flags & PAWN_FLAG_CLOSED_CENTER, 0);
    }

    #[test]
    fn passed_pawn_bonus_grows_with_rank() {
        let mut search = Search::new(EngineOptions::default());
        search
            .set_position(Board::from_str("4k3/8/8/3P4/8/8/8/4K3 w - - 0 1").unwrap());
        crate::eval::evaluate(&mut search);
        let mid = search.stack[0].passer_score[1];

        let mut search = Search::new(EngineOptions::default());
        search
            .set_position(Board::from_str("4k3/3P4/8/8/8/8/8/4K3 w - - 0 1").unwrap());
        crate::eval::evaluate(&mut search);
        let advanced = search.stack[0].passer_score[1];
        assert!(advanced.eg > mid.eg);
    }
}
