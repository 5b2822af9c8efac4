//! Piece-square tables.
//!
//! The value arrays read like a board diagram with black's home rank on
//! the last line; indexing them directly by square yields black's table
//! and the vertical mirror yields white's.

use once_cell::sync::Lazy;

use crate::bitboard::flip_sq;
use crate::board::piece::*;
use crate::eval::score::{Score, s};

#[rustfmt::skip]
const PAWN_MG: [i16; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,  10,  15,  15,  10,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
      0,   0,   0,   0,   0,   0,   0,   0,
];

const PAWN_EG: [i16; 64] = [0; 64];

const KING_MG: [i16; 64] = [0; 64];

#[rustfmt::skip]
const KING_EG: [i16; 64] = [
      0,  15,  20,  25,  25,  20,  15,   0,
     15,  25,  30,  35,  35,  30,  25,  15,
     20,  30,  35,  40,  40,  35,  30,  20,
     25,  35,  40,  45,  45,  45,  35,  25,
     25,  35,  40,  45,  45,  40,  35,  25,
     20,  30,  35,  40,  40,  35,  30,  20,
     15,  25,  30,  35,  35,  30,  25,  15,
      0,  15,  20,  25,  25,  20,  15,   0,
];

#[rustfmt::skip]
const KNIGHT_MG: [i16; 64] = [
    -12,  -6,   0,   0,   0,   0,  -6, -12,
     -6,   0,  16,  16,  16,  16,   0,  -6,
      0,  12,  26,  24,  24,  26,  12,   0,
     -4,   8,  16,  16,  16,  16,   8,  -4,
     -8,   4,  12,  12,  12,  12,   4,  -8,
    -12,   0,  10,   6,   6,  10,   0, -12,
    -18, -16,  -6,  -6,  -6,  -6, -16, -18,
    -22, -20, -16, -16, -16, -16, -20, -22,
];

#[rustfmt::skip]
const KNIGHT_EG: [i16; 64] = [
    -20, -14,  -8,  -8,  -8,  -8, -14, -20,
    -14,  -8,   4,   4,   4,   4,  -8, -14,
     -6,   6,  18,  18,  18,  18,   6,  -6,
     -6,   6,  18,  18,  18,  18,   6,  -6,
     -8,   4,  16,  16,  16,  16,   4,  -8,
     -8,   4,  16,  16,  16,  16,   4,  -8,
    -14,  -8,   4,   4,   4,   4,  -8, -14,
    -22, -16, -10, -10, -10, -10, -16, -22,
];

#[rustfmt::skip]
const BISHOP_MG: [i16; 64] = [
     -2,  -2,  -2,   0,   0,  -2,  -2,  -2,
     -4,   4,   4,   2,   2,   4,   4,  -4,
     -6,   2,  10,   8,   8,  10,   2,  -6,
     -6,   0,   6,  12,  12,   6,   0,  -6,
     -6,   0,   6,  12,  12,   6,   0,  -6,
     -6,   0,   6,   4,   4,   6,   0,  -6,
     -4,   4,  -2,  -4,  -4,  -2,   4,  -4,
     -2,  -6, -10, -12, -12, -10,  -6,  -2,
];

#[rustfmt::skip]
const BISHOP_EG: [i16; 64] = [
     -6,  -6,  -6,  -6,  -6,  -6,  -6,  -6,
     -6,   0,   0,   0,   0,   0,   0,  -6,
     -6,   0,   8,   8,   8,   8,   0,  -6,
     -6,   0,   8,  14,  14,   8,   0,  -6,
     -6,   0,   8,  14,  14,   8,   0,  -6,
     -6,   0,   8,   8,   8,   8,   0,  -6,
     -6,   0,   0,   0,   0,   0,   0,  -6,
     -6,  -6,  -6,  -6,  -6,  -6,  -6,  -6,
];

#[rustfmt::skip]
const ROOK_MG: [i16; 64] = [
     -4,  -4,   0,   4,   4,   0,  -4,  -4,
     -4,  -4,   0,   4,   4,   0,  -4,  -4,
     -4,  -4,   0,   4,   4,   0,  -4,  -4,
     -4,  -4,   0,   4,   4,   0,  -4,  -4,
     -4,  -4,   0,   4,   4,   0,  -4,  -4,
     -4,  -4,   0,   4,   4,   0,  -4,  -4,
     -4,  -4,   0,   4,   4,   0,  -4,  -4,
     -4,  -4,   0,   4,   4,   0,  -4,  -4,
];

const ROOK_EG: [i16; 64] = [0; 64];

#[rustfmt::skip]
const QUEEN_MG: [i16; 64] = [
     -2,  -2,   0,   2,   2,   0,  -2,  -2,
      0,   0,   2,   4,   4,   2,   0,   0,
      0,   0,   2,   4,   4,   2,   0,   0,
      0,   0,   2,   4,   4,   2,   0,   0,
     -2,  -2,   0,   2,   2,   0,  -2,  -2,
     -2,  -2,   0,   2,   2,   0,  -2,  -2,
     -4,  -4,  -2,   0,   0,  -2,  -4,  -4,
     -8,  -8,  -6,  -4,  -4,  -6,  -8,  -8,
];

#[rustfmt::skip]
const QUEEN_EG: [i16; 64] = [
     -4,  -4,  -4,  -4,  -4,  -4,  -4,  -4,
     -4,   0,   0,   0,   0,   0,   0,  -4,
     -4,   0,   4,   4,   4,   4,   0,  -4,
     -4,   0,   4,   8,   8,   4,   0,  -4,
     -4,   0,   4,   8,   8,   4,   0,  -4,
     -4,   0,   4,   4,   4,   4,   0,  -4,
     -4,   0,   0,   0,   0,   0,   0,  -4,
     -4,  -4,  -4,  -4,  -4,  -4,  -4,  -4,
];

static TABLE: Lazy<[[Score; 64]; 13]> = Lazy::new(|| {
    let mut table = [[Score::ZERO; 64]; 13];
    let sources: [(&[i16; 64], &[i16; 64]); 6] = [
        (&PAWN_MG, &PAWN_EG),
        (&KNIGHT_MG, &KNIGHT_EG),
        (&BISHOP_MG, &BISHOP_EG),
        (&ROOK_MG, &ROOK_EG),
        (&QUEEN_MG, &QUEEN_EG),
        (&KING_MG, &KING_EG),
    ];
    for (i, (mg, eg)) in sources.iter().enumerate() {
        let black = BPAWN as usize + i;
        let white = WPAWN as usize + i;
        for sq in 0..64 {
            table[black][sq] = s(mg[sq], eg[sq]);
            table[white][flip_sq(sq as u8) as usize] = s(mg[sq], eg[sq]);
        }
    }
    table
});

/// Tapered table value for `pc` on `sq`.
#[inline(always)]
pub fn pst(pc: u8, sq: u8) -> Score {
    TABLE[pc as usize][sq as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::sq;

    #[test]
    fn white_mirrors_black() {
        assert_eq!(pst(WPAWN, sq::E5), pst(BPAWN, sq::E4));
        assert_eq!(pst(WKNIGHT, sq::F3), pst(BKNIGHT, sq::F6));
        assert_eq!(pst(WBISHOP, sq::G2), pst(BBISHOP, sq::G7));
        assert_eq!(pst(WROOK, sq::D7), pst(BROOK, sq::D2));
        assert_eq!(pst(WQUEEN, sq::H8), pst(BQUEEN, sq::H1));
        assert_eq!(pst(WKING, sq::A1), pst(BKING, sq::A8));
    }

    #[test]
    fn home_squares_are_penalized_for_knights() {
        assert!(pst(WKNIGHT, sq::B1).mg < pst(WKNIGHT, sq::F3).mg);
        assert!(pst(BKNIGHT, sq::G8).mg < pst(BKNIGHT, sq::C6).mg);
    }

    #[test]
    fn king_centralization_is_endgame_only() {
        assert_eq!(pst(WKING, sq::E4).mg, 0);
        assert!(pst(WKING, sq::E4).eg > pst(WKING, sq::A1).eg);
    }
}
