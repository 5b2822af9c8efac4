//! Attack queries, move validity, legality and check detection.
//!
//! `valid` answers "could the generator have produced this move here" for
//! moves arriving from hash entries and killer slots. `legal` answers
//! "does this move leave our king safe" without making the move; it also
//! stamps the en-passant and castle tags onto the move, and for castles
//! performs the attacked-square tests. `gives_check` classifies a move as
//! no check, check, or double check before it is played.

use crate::bitboard::{self as bits, bit, sq};
use crate::board::piece::*;
use crate::board::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use crate::moves::magic;
use crate::moves::types::Move;

impl Board {
    /// Union of both sides' attackers of `target` under the current
    /// occupancy.
    pub fn attacks_to(&self, target: u8) -> u64 {
        let occ = self.occupied();
        magic::pawn_captures(false, target) & self.bb[WPAWN as usize]
            | magic::pawn_captures(true, target) & self.bb[BPAWN as usize]
            | magic::knight_moves(target)
                & (self.bb[WKNIGHT as usize] | self.bb[BKNIGHT as usize])
            | magic::king_moves(target) & (self.bb[WKING as usize] | self.bb[BKING as usize])
            | magic::bishop_moves(target, occ)
                & (self.bb[WBISHOP as usize]
                    | self.bb[BBISHOP as usize]
                    | self.bb[WQUEEN as usize]
                    | self.bb[BQUEEN as usize])
            | magic::rook_moves(target, occ)
                & (self.bb[WROOK as usize]
                    | self.bb[BROOK as usize]
                    | self.bb[WQUEEN as usize]
                    | self.bb[BQUEEN as usize])
    }

    pub fn is_attacked(&self, target: u8, by_white: bool) -> bool {
        let them = by_white as usize;
        let occ = self.occupied();
        magic::pawn_captures(!by_white, target) & self.bb[PAWN[them] as usize] != 0
            || magic::knight_moves(target) & self.bb[KNIGHT[them] as usize] != 0
            || magic::king_moves(target) & self.bb[KING[them] as usize] != 0
            || magic::bishop_moves(target, occ)
                & (self.bb[BISHOP[them] as usize] | self.bb[QUEEN[them] as usize])
                != 0
            || magic::rook_moves(target, occ)
                & (self.bb[ROOK[them] as usize] | self.bb[QUEEN[them] as usize])
                != 0
    }

    #[inline(always)]
    pub fn in_check(&self) -> bool {
        let us = self.us();
        self.is_attacked(self.king_sq(us), !us)
    }

    /// Could the generator have emitted this move in the current
    /// position? Checks piece placement, the captured piece, castle
    /// preconditions, en-passant plumbing and slider obstruction.
    pub fn valid(&self, mv: &Move) -> bool {
        if mv.is_empty() {
            return false;
        }
        let us = self.us();
        if !belongs_to(mv.piece, us) {
            return false;
        }
        if self.matrix[mv.from as usize] != mv.piece {
            return false;
        }
        let st = self.st();
        if mv.en_passant {
            if st.ep_sq == 0 || mv.to != st.ep_sq || self.matrix[mv.to as usize] != EMPTY {
                return false;
            }
            return if us {
                mv.piece == WPAWN && self.matrix[(mv.to - 8) as usize] == BPAWN
            } else {
                mv.piece == BPAWN && self.matrix[(mv.to + 8) as usize] == WPAWN
            };
        }
        if mv.castle != 0 {
            if !self.has_castle_right(mv.castle) {
                return false;
            }
            let m = &self.matrix;
            return match mv.castle {
                CASTLE_WK => {
                    m[sq::H1 as usize] == WROOK
                        && m[sq::F1 as usize] == EMPTY
                        && m[sq::G1 as usize] == EMPTY
                        && !self.is_attacked(sq::E1, false)
                        && !self.is_attacked(sq::F1, false)
                        && !self.is_attacked(sq::G1, false)
                }
                CASTLE_WQ => {
                    m[sq::A1 as usize] == WROOK
                        && m[sq::B1 as usize] == EMPTY
                        && m[sq::C1 as usize] == EMPTY
                        && m[sq::D1 as usize] == EMPTY
                        && !self.is_attacked(sq::E1, false)
                        && !self.is_attacked(sq::D1, false)
                        && !self.is_attacked(sq::C1, false)
                }
                CASTLE_BK => {
                    m[sq::H8 as usize] == BROOK
                        && m[sq::F8 as usize] == EMPTY
                        && m[sq::G8 as usize] == EMPTY
                        && !self.is_attacked(sq::E8, true)
                        && !self.is_attacked(sq::F8, true)
                        && !self.is_attacked(sq::G8, true)
                }
                CASTLE_BQ => {
                    m[sq::A8 as usize] == BROOK
                        && m[sq::B8 as usize] == EMPTY
                        && m[sq::C8 as usize] == EMPTY
                        && m[sq::D8 as usize] == EMPTY
                        && !self.is_attacked(sq::E8, true)
                        && !self.is_attacked(sq::D8, true)
                        && !self.is_attacked(sq::C8, true)
                }
                _ => false,
            };
        }
        if self.matrix[mv.to as usize] != mv.capture {
            return false;
        }
        let to_bb = bit(mv.to);
        match kind(mv.piece) {
            1 => {
                // Pawn: captures are diagonal steps, pushes need the path.
                if mv.capture != EMPTY {
                    magic::pawn_captures(us, mv.from) & to_bb != 0
                } else if us {
                    (mv.to == mv.from + 8
                        || (mv.to == mv.from + 16
                            && bits::rank_of(mv.from) == 1
                            && self.matrix[(mv.from + 8) as usize] == EMPTY))
                        && (mv.promotion != EMPTY) == (bits::rank_of(mv.to) == 7)
                } else {
                    (mv.from == mv.to + 8
                        || (mv.from == mv.to + 16
                            && bits::rank_of(mv.from) == 6
                            && self.matrix[(mv.from - 8) as usize] == EMPTY))
                        && (mv.promotion != EMPTY) == (bits::rank_of(mv.to) == 0)
                }
            }
            2 => magic::knight_moves(mv.from) & to_bb != 0,
            3 => magic::bishop_moves(mv.from, self.occupied()) & to_bb != 0,
            4 => magic::rook_moves(mv.from, self.occupied()) & to_bb != 0,
            5 => magic::queen_moves(mv.from, self.occupied()) & to_bb != 0,
            6 => magic::king_moves(mv.from) & to_bb != 0,
            _ => false,
        }
    }

    /// Does this pseudo-legal move leave the mover's king safe? Stamps
    /// `en_passant` and `castle` onto the move while classifying it. The
    /// king-safety test runs on a provisional occupancy so the move never
    /// has to be made; x-rays uncovered by vacating the source square are
    /// caught by the slider pass.
    pub fn legal(&self, mv: &mut Move) -> bool {
        let us = self.us();
        let them = !us as usize;
        let to_bb = bit(mv.to);
        let mut occupied = self.occupied() & !to_bb;

        mv.en_passant =
            self.st().ep_sq != 0 && mv.to == self.st().ep_sq && mv.piece == PAWN[us as usize];
        if mv.en_passant {
            occupied ^= if us { to_bb >> 8 } else { to_bb << 8 };
        }

        let kpos = if is_king(mv.piece) {
            mv.to
        } else {
            self.king_sq(us)
        };

        // Direct attacks by non-sliders, with captured pieces masked out.
        if self.bb[KNIGHT[them] as usize] & occupied & magic::knight_moves(kpos) != 0
            || self.bb[PAWN[them] as usize] & occupied & magic::pawn_captures(us, kpos) != 0
            || (is_king(mv.piece)
                && magic::king_moves(kpos) & self.bb[KING[them] as usize] != 0)
        {
            return false;
        }

        mv.castle = 0;
        if is_king(mv.piece) {
            if us && mv.from == sq::E1 {
                if mv.to == sq::G1 {
                    mv.castle = CASTLE_WK;
                    if self.is_attacked(sq::E1, false)
                        || self.is_attacked(sq::F1, false)
                        || self.is_attacked(sq::G1, false)
                    {
                        return false;
                    }
                } else if mv.to == sq::C1 {
                    mv.castle = CASTLE_WQ;
                    if self.is_attacked(sq::E1, false)
                        || self.is_attacked(sq::D1, false)
                        || self.is_attacked(sq::C1, false)
                    {
                        return false;
                    }
                }
            } else if !us && mv.from == sq::E8 {
                if mv.to == sq::G8 {
                    mv.castle = CASTLE_BK;
                    if self.is_attacked(sq::E8, true)
                        || self.is_attacked(sq::F8, true)
                        || self.is_attacked(sq::G8, true)
                    {
                        return false;
                    }
                } else if mv.to == sq::C8 {
                    mv.castle = CASTLE_BQ;
                    if self.is_attacked(sq::E8, true)
                        || self.is_attacked(sq::D8, true)
                        || self.is_attacked(sq::C8, true)
                    {
                        return false;
                    }
                }
            }
        }

        // Sliding attacks through the vacated source square.
        let opp_sliders = (self.bb[BISHOP[them] as usize]
            | self.bb[ROOK[them] as usize]
            | self.bb[QUEEN[them] as usize])
            & !to_bb;
        if magic::queen_rays(kpos) & opp_sliders != 0 {
            let diag = opp_sliders & !self.bb[ROOK[them] as usize];
            let hor_ver = opp_sliders & !self.bb[BISHOP[them] as usize];
            occupied ^= bit(mv.from);
            occupied |= to_bb;
            return magic::bishop_moves(kpos, occupied) & diag == 0
                && magic::rook_moves(kpos, occupied) & hor_ver == 0;
        }
        true
    }

    /// 0 = no check, 1 = check (direct or discovered), 2 = double check.
    /// Checker bitboards for the resulting position are staged on the
    /// next frame for `forward` to keep.
    pub fn gives_check(&mut self, mv: &Move) -> u8 {
        let us = self.us();
        let from_bb = bit(mv.from);
        let to_bb = bit(mv.to);
        let kpos = self.king_sq(!us);
        let check_mask = magic::queen_rays(kpos) | magic::knight_moves(kpos);
        if check_mask & (from_bb | to_bb) == 0 && mv.castle == 0 && !mv.en_passant {
            return 0;
        }

        let occ = self.occupied();
        let mut direct = 0u64;
        if check_mask & to_bb != 0 || mv.castle != 0 {
            direct = match kind(mv.piece) {
                1 => magic::pawn_captures(!us, kpos) & to_bb,
                2 => magic::knight_moves(kpos) & to_bb,
                3 => {
                    if magic::bishop_rays(kpos) & to_bb != 0 {
                        magic::bishop_moves(kpos, occ) & to_bb
                    } else {
                        0
                    }
                }
                4 => {
                    if magic::rook_rays(kpos) & to_bb != 0 {
                        magic::rook_moves(kpos, occ) & to_bb
                    } else {
                        0
                    }
                }
                5 => {
                    if magic::queen_rays(kpos) & to_bb != 0 {
                        magic::queen_moves(kpos, occ) & to_bb
                    } else {
                        0
                    }
                }
                6 => match mv.castle {
                    CASTLE_WK => magic::rook_moves(kpos, occ ^ from_bb) & bit(sq::F1),
                    CASTLE_WQ => magic::rook_moves(kpos, occ ^ from_bb) & bit(sq::D1),
                    CASTLE_BK => magic::rook_moves(kpos, occ ^ from_bb) & bit(sq::F8),
                    CASTLE_BQ => magic::rook_moves(kpos, occ ^ from_bb) & bit(sq::D8),
                    _ => 0,
                },
                _ => 0,
            };
        }

        // Checking promotion: the new piece attacks through the vacated
        // source square.
        if direct == 0 && mv.promotion != EMPTY && check_mask & to_bb != 0 {
            let occ_no_pawn = occ ^ from_bb;
            direct = match kind(mv.promotion) {
                2 => magic::knight_moves(kpos) & to_bb,
                3 => magic::bishop_moves(kpos, occ_no_pawn) & to_bb,
                4 => magic::rook_moves(kpos, occ_no_pawn) & to_bb,
                5 => magic::queen_moves(kpos, occ_no_pawn) & to_bb,
                _ => 0,
            };
        }

        // Discovered check from a slider behind the vacated square.
        let mut revealed = 0u64;
        if check_mask & from_bb != 0 || mv.en_passant {
            let uz = us as usize;
            let mut sliders = (self.bb[BISHOP[uz] as usize]
                | self.bb[ROOK[uz] as usize]
                | self.bb[QUEEN[uz] as usize])
                & !(from_bb | to_bb)
                & magic::queen_rays(kpos);
            if sliders != 0 {
                let mut occ2 = (occ ^ from_bb) | to_bb;
                if mv.en_passant {
                    occ2 ^= if us { to_bb >> 8 } else { to_bb << 8 };
                }
                revealed = magic::bishop_moves(kpos, occ2)
                    & sliders
                    & !(self.bb[ROOK[uz] as usize]);
                sliders &= !(self.bb[BISHOP[uz] as usize]);
                revealed |= magic::rook_moves(kpos, occ2) & sliders;
            }
        }

        let checkers = direct | revealed;
        if checkers == 0 {
            return 0;
        }
        let staged = self.staged_frame_mut();
        staged.checkers = checkers;
        staged.checker_sq = bits::bsf(checkers);
        if bits::gt_1(checkers) { 2 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn attack_queries() {
        let b = Board::from_str("4k3/8/8/3r4/8/8/3P4/4K3 w - - 0 1").unwrap();
        assert!(b.is_attacked(sq::D4, false)); // rook down the file
        assert!(b.is_attacked(sq::C3, true)); // pawn capture
        assert!(!b.is_attacked(sq::A8, true));
        let attackers = b.attacks_to(sq::D5);
        assert_eq!(attackers, 0);
        let attackers = b.attacks_to(sq::D3);
        assert!(attackers & bit(sq::D5) != 0); // rook
        assert!(attackers & bit(sq::E1) == 0);
    }

    #[test]
    fn pinned_piece_is_illegal_to_move() {
        let b = Board::from_str("4k3/8/8/8/8/4r3/4B3/4K3 w - - 0 1").unwrap();
        let mut pinned = Move::new(WBISHOP, sq::E2, sq::D3);
        assert!(b.valid(&pinned));
        assert!(!b.legal(&mut pinned));
        let vertical = Move::capture(WBISHOP, sq::E2, sq::E3, BROOK);
        assert!(!b.valid(&vertical)); // bishops don't move vertically
    }

    #[test]
    fn ep_capture_exposing_rank_check_is_illegal() {
        // After ...d7d5 both pawns vanish from the 5th rank and the rook
        // hits the king.
        let b =
            Board::from_str("8/8/8/KPpr4/8/8/6k1/8 w - c6 0 2").unwrap();
        let mut ep = Move::capture(WPAWN, sq::B5, sq::C6, BPAWN);
        assert!(b.valid(&Move {
            en_passant: true,
            ..ep
        }));
        assert!(!b.legal(&mut ep));
    }

    #[test]
    fn gives_check_classification() {
        let mut b = Board::from_str("4k3/8/8/8/8/8/3N4/4KB2 w - - 0 1").unwrap();
        let direct = Move::new(WKNIGHT, sq::D2, sq::F3);
        assert_eq!(b.gives_check(&direct), 0); // f3 doesn't hit e8
        let check = Move::new(WKNIGHT, sq::D2, sq::C4);
        assert_eq!(b.gives_check(&check), 0);
        let mut b2 = Board::from_str("3k4/8/8/8/3N4/8/8/3K4 w - - 0 1").unwrap();
        let hop_in = Move::new(WKNIGHT, sq::D4, sq::E6);
        assert_eq!(b2.gives_check(&hop_in), 1);
        let hop_away = Move::new(WKNIGHT, sq::D4, sq::C2);
        assert_eq!(b2.gives_check(&hop_away), 0);
    }

    #[test]
    fn discovered_and_double_checks() {
        // Bishop on c3 aims at h8 through the knight on e5.
        let mut b = Board::from_str("7k/8/8/4N3/8/2B5/8/K7 w - - 0 1").unwrap();
        let mut discovered = Move::new(WKNIGHT, sq::E5, sq::C4);
        assert!(b.legal(&mut discovered));
        assert_eq!(b.gives_check(&discovered), 1);
        let mut double = Move::new(WKNIGHT, sq::E5, sq::G6);
        assert!(b.legal(&mut double));
        assert_eq!(b.gives_check(&double), 2);
    }

    #[test]
    fn checking_promotion() {
        let mut b = Board::from_str("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let promote = Move::promotion(WPAWN, sq::A7, sq::A8, 0, WROOK);
        assert_eq!(b.gives_check(&promote), 1);
        let harmless = Move::promotion(WPAWN, sq::A7, sq::A8, 0, WBISHOP);
        assert_eq!(b.gives_check(&harmless), 0);
    }

    #[test]
    fn castle_through_attack_is_rejected() {
        let b = Board::from_str("4k3/8/8/8/8/5r2/8/4K2R w K - 0 1").unwrap();
        let mut oo = Move::new(WKING, sq::E1, sq::G1);
        assert!(!b.legal(&mut oo)); // f1 is covered by the rook
    }
}
