//! Make and unmake.
//!
//! `forward` pushes a frame and applies the move with incremental key
//! updates; `backward` reverses the board edits and drops the frame, which
//! restores every key and flag in one step. A null move only flips the
//! side to move and clears the en-passant square.

use crate::bitboard::sq;
use crate::board::piece::*;
use crate::board::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_MASK, CASTLE_WK, CASTLE_WQ};
use crate::hash::zobrist;
use crate::moves::types::Move;

impl Board {
    pub fn forward(&mut self, mv: &Move) {
        debug_assert!(mv.piece == self.matrix[mv.from as usize]);
        debug_assert!(mv.from != mv.to);

        self.push_frame();
        let old_ep = self.st().ep_sq;
        self.st_mut().hash ^= zobrist::ep_key(old_ep);
        self.st_mut().ep_sq = 0;

        if mv.capture != EMPTY || mv.promotion != EMPTY {
            if mv.capture != EMPTY {
                debug_assert!(!is_king(mv.capture));
                if mv.en_passant {
                    // The pawn falls on the square behind the target.
                    let taken = if mv.to >= sq::A6 { mv.to - 8 } else { mv.to + 8 };
                    debug_assert!(self.matrix[taken as usize] == mv.capture);
                    self.remove_piece_hashed(mv.capture, taken);
                } else {
                    debug_assert!(self.matrix[mv.to as usize] == mv.capture);
                    self.remove_piece_hashed(mv.capture, mv.to);
                }
            }
            if mv.promotion != EMPTY {
                self.remove_piece_hashed(mv.piece, mv.from);
                self.add_piece_hashed(mv.promotion, mv.to);
            } else {
                self.move_piece_hashed(mv.piece, mv.from, mv.to);
            }
            self.st_mut().fifty = 0;
        } else {
            debug_assert!(self.matrix[mv.to as usize] == EMPTY);
            self.move_piece_hashed(mv.piece, mv.from, mv.to);
            let st = self.st_mut();
            st.fifty += 1;
            if mv.piece == WPAWN {
                st.fifty = 0;
                if mv.to == mv.from + 16 {
                    st.ep_sq = mv.from + 8;
                    st.hash ^= zobrist::ep_key(st.ep_sq);
                }
            } else if mv.piece == BPAWN {
                st.fifty = 0;
                if mv.from == mv.to + 16 {
                    st.ep_sq = mv.to + 8;
                    st.hash ^= zobrist::ep_key(st.ep_sq);
                }
            }
        }

        if self.st().castling != 0 {
            match mv.castle {
                0 => {}
                CASTLE_WK => self.move_piece_hashed(WROOK, sq::H1, sq::F1),
                CASTLE_WQ => self.move_piece_hashed(WROOK, sq::A1, sq::D1),
                CASTLE_BK => self.move_piece_hashed(BROOK, sq::H8, sq::F8),
                CASTLE_BQ => self.move_piece_hashed(BROOK, sq::A8, sq::D8),
                _ => debug_assert!(false, "bad castle tag"),
            }
            let lost =
                self.st().castling & (CASTLE_MASK[mv.from as usize] | CASTLE_MASK[mv.to as usize]);
            if lost != 0 {
                let st = self.st_mut();
                st.castling ^= lost;
                for right in 0..4 {
                    if lost & (1 << right) != 0 {
                        st.hash ^= zobrist::keys().castling[right];
                        st.pawn_hash ^= zobrist::keys().castling[right];
                    }
                }
            }
        }

        let st = self.st_mut();
        st.wtm = !st.wtm;
        st.hash ^= zobrist::keys().stm;
    }

    pub fn backward(&mut self, mv: &Move) {
        if mv.capture != EMPTY || mv.promotion != EMPTY {
            if mv.promotion != EMPTY {
                self.remove_piece(mv.promotion, mv.to);
                self.add_piece(mv.piece, mv.from);
            } else {
                self.move_piece(mv.piece, mv.to, mv.from);
            }
            if mv.capture != EMPTY {
                let taken = if mv.en_passant {
                    if mv.to >= sq::A6 { mv.to - 8 } else { mv.to + 8 }
                } else {
                    mv.to
                };
                self.add_piece(mv.capture, taken);
            }
        } else {
            self.move_piece(mv.piece, mv.to, mv.from);
            match mv.castle {
                0 => {}
                CASTLE_WK => self.move_piece(WROOK, sq::F1, sq::H1),
                CASTLE_WQ => self.move_piece(WROOK, sq::D1, sq::A1),
                CASTLE_BK => self.move_piece(BROOK, sq::F8, sq::H8),
                CASTLE_BQ => self.move_piece(BROOK, sq::D8, sq::A8),
                _ => debug_assert!(false, "bad castle tag"),
            }
        }
        self.pop_frame();
    }

    /// Pass the move: flip the side, drop any en-passant right.
    pub fn forward_null(&mut self) {
        self.push_frame();
        let st = self.st_mut();
        st.hash ^= zobrist::ep_key(st.ep_sq);
        st.ep_sq = 0;
        st.wtm = !st.wtm;
        st.hash ^= zobrist::keys().stm;
        st.checkers = 0;
        st.checker_sq = 0;
    }

    pub fn backward_null(&mut self) {
        self.pop_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::types::Move;
    use std::str::FromStr;

    fn mv(board: &Board, uci: &str) -> Move {
        crate::moves::parse_uci_move(board, uci).expect("legal test move")
    }

    #[test]
    fn make_unmake_restores_everything() {
        let mut board = Board::new();
        let before = board.to_fen();
        let hash = board.st().hash;

        let e4 = mv(&board, "e2e4");
        board.forward(&e4);
        assert_ne!(board.st().hash, hash);
        assert_eq!(board.st().ep_sq, sq::E3);
        assert_eq!(board.st().hash, board.compute_hash());
        board.backward(&e4);

        assert_eq!(board.to_fen(), before);
        assert_eq!(board.st().hash, hash);
    }

    #[test]
    fn en_passant_capture_removes_the_right_pawn() {
        let mut board =
            Board::from_str("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2")
                .unwrap();
        let take = mv(&board, "d4e3");
        assert!(take.en_passant);
        board.forward(&take);
        assert_eq!(board.matrix[sq::E4 as usize], EMPTY);
        assert_eq!(board.matrix[sq::E3 as usize], BPAWN);
        assert_eq!(board.st().hash, board.compute_hash());
        board.backward(&take);
        assert_eq!(board.matrix[sq::E4 as usize], WPAWN);
    }

    #[test]
    fn castling_moves_the_rook_and_strips_rights() {
        let mut board =
            Board::from_str("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let oo = mv(&board, "e1g1");
        assert_eq!(oo.castle, CASTLE_WK);
        board.forward(&oo);
        assert_eq!(board.matrix[sq::F1 as usize], WROOK);
        assert_eq!(board.matrix[sq::G1 as usize], WKING);
        assert!(!board.can_castle_ks(true));
        assert!(!board.can_castle_qs(true));
        assert!(board.can_castle_ks(false));
        assert_eq!(board.st().hash, board.compute_hash());
        assert_eq!(board.st().pawn_hash, board.compute_pawn_hash());
        board.backward(&oo);
        assert!(board.can_castle_ks(true));
        assert_eq!(board.matrix[sq::H1 as usize], WROOK);
    }

    #[test]
    fn promotion_updates_material_key() {
        let mut board = Board::from_str("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let promote = mv(&board, "a7a8q");
        board.forward(&promote);
        assert_eq!(board.matrix[sq::A8 as usize], WQUEEN);
        assert_eq!(board.count(WPAWN), 0);
        assert_eq!(board.st().material_hash, board.compute_material_hash());
        board.backward(&promote);
        assert_eq!(board.count(WPAWN), 1);
        assert_eq!(board.st().material_hash, board.compute_material_hash());
    }

    #[test]
    fn null_move_flips_side_and_clears_ep() {
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2")
                .unwrap();
        let hash = board.st().hash;
        board.forward_null();
        assert!(board.us());
        assert_eq!(board.st().ep_sq, 0);
        assert_eq!(board.st().hash, board.compute_hash());
        board.backward_null();
        assert_eq!(board.st().hash, hash);
        assert!(!board.us());
    }
}
