//! Zobrist keys for the three incremental hashes.
//!
//! The board maintains a main key (all position attributes), a pawn key
//! (pawns, kings and castling rights, indexing the pawn hash table) and a
//! material key (piece counts only, indexing the material table). All keys
//! are drawn once from a fixed-seed generator so every process agrees on
//! them; losers-chess positions are salted so the two variants can never
//! share a transposition entry.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::piece::BKING;

const ZOBRIST_SEED: u64 = 0x00C0_FFEE_D00D_2015;

pub struct ZobristKeys {
    /// Piece-square keys, indexed `[piece code][square]`. Row 0 is unused
    /// by pieces and doubles as the en-passant square keys.
    pub piece: [[u64; 64]; BKING as usize + 1],
    /// Castling right keys in K, Q, k, q order.
    pub castling: [u64; 4],
    /// XORed into the main key when black is to move.
    pub stm: u64,
    /// Salt applied to the main key in losers chess.
    pub losers: u64,
}

static KEYS: Lazy<ZobristKeys> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
    let mut piece = [[0u64; 64]; BKING as usize + 1];
    for row in piece.iter_mut() {
        for key in row.iter_mut() {
            *key = rng.random();
        }
    }
    // Square 0 can never be an en-passant square; keeping its key zero
    // makes "clear the ep key" unconditional at the call sites.
    piece[0][0] = 0;
    ZobristKeys {
        piece,
        castling: [rng.random(), rng.random(), rng.random(), rng.random()],
        stm: rng.random(),
        losers: rng.random(),
    }
});

#[inline(always)]
pub fn keys() -> &'static ZobristKeys {
    &KEYS
}

/// Key for `pc` standing on `sq`.
#[inline(always)]
pub fn piece_key(pc: u8, sq: u8) -> u64 {
    KEYS.piece[pc as usize][sq as usize]
}

/// En-passant key for a target square (0 means none and hashes to 0).
#[inline(always)]
pub fn ep_key(sq: u8) -> u64 {
    KEYS.piece[0][sq as usize]
}

/// Material-count key: toggled when the `count`-th piece of code `pc`
/// appears or disappears. Counts are 1-based and far below the table
/// width in any legal position.
#[inline(always)]
pub fn material_key(pc: u8, count: u8) -> u64 {
    KEYS.piece[pc as usize][(count & 63) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::piece::{BPAWN, WKING, WPAWN};

    #[test]
    fn keys_are_stable_and_distinct() {
        assert_ne!(piece_key(WPAWN, 8), piece_key(WPAWN, 9));
        assert_ne!(piece_key(WPAWN, 8), piece_key(BPAWN, 8));
        assert_ne!(keys().stm, 0);
        assert_ne!(keys().losers, 0);
        assert_ne!(piece_key(WKING, 4), 0);
    }

    #[test]
    fn cleared_ep_key_is_zero() {
        assert_eq!(ep_key(0), 0);
        assert_ne!(ep_key(20), 0);
    }
}
