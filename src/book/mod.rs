//! Polyglot opening book access.
//!
//! The file is a sorted array of 16-byte entries keyed by a position
//! fingerprint over the fixed random table. Lookup binary-searches to
//! the first matching entry and picks among the alternatives by weight.
//! A missing or unreadable file simply means no book.

pub mod entry;
pub mod keys;

use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use tracing::debug;

use crate::board::piece::{EMPTY, kind};
use crate::board::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use crate::moves::magic::pawn_captures;
use crate::moves::types::Move;
use entry::BookEntry;
use keys::{RANDOM_CASTLE, RANDOM_EN_PASSANT, RANDOM_TURN, RANDOM64};

/// Position fingerprint in the book's key space. Differs from the
/// engine's own Zobrist: fixed table, piece-kind ordering interleaved
/// by color, and the en-passant file only counts when a pawn could
/// actually take.
pub fn compute_key(board: &Board) -> u64 {
    let mut key = 0u64;
    for square in 0..64usize {
        let pc = board.matrix[square];
        if pc == EMPTY {
            continue;
        }
        let white = crate::board::piece::is_white(pc);
        let piece_kind = (kind(pc) as usize - 1) * 2 + usize::from(white);
        key ^= RANDOM64[64 * piece_kind + square];
    }

    let st = board.st();
    if st.castling & CASTLE_WK != 0 {
        key ^= RANDOM64[RANDOM_CASTLE];
    }
    if st.castling & CASTLE_WQ != 0 {
        key ^= RANDOM64[RANDOM_CASTLE + 1];
    }
    if st.castling & CASTLE_BK != 0 {
        key ^= RANDOM64[RANDOM_CASTLE + 2];
    }
    if st.castling & CASTLE_BQ != 0 {
        key ^= RANDOM64[RANDOM_CASTLE + 3];
    }

    if st.ep_sq != 0 {
        let stm = st.wtm;
        let capturers = pawn_captures(!stm, st.ep_sq)
            & board.pieces(crate::board::piece::PAWN[stm as usize]);
        if capturers != 0 {
            key ^= RANDOM64[RANDOM_EN_PASSANT + crate::bitboard::file_of(st.ep_sq) as usize];
        }
    }

    if st.wtm {
        key ^= RANDOM64[RANDOM_TURN];
    }
    key
}

pub struct Book {
    entries: Vec<BookEntry>,
}

impl Book {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Book> {
        let bytes = fs::read(path)?;
        let count = bytes.len() / BookEntry::SIZE;
        let mut entries = Vec::with_capacity(count);
        for chunk in bytes.chunks_exact(BookEntry::SIZE) {
            entries.push(BookEntry::from_bytes(chunk.try_into().expect("16-byte chunk")));
        }
        Ok(Book { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries for the position, located by binary search on the
    /// ascending key order.
    fn matches(&self, key: u64) -> &[BookEntry] {
        let start = self.entries.partition_point(|e| e.key < key);
        let mut end = start;
        while end < self.entries.len() && self.entries[end].key == key {
            end += 1;
        }
        &self.entries[start..end]
    }

    /// Pick a book move for the position, weighted by entry weight.
    pub fn probe(&self, board: &Board) -> Option<Move> {
        let key = compute_key(board);
        let candidates = self.matches(key);
        if candidates.is_empty() {
            return None;
        }

        let total: u32 = candidates.iter().map(|e| e.weight as u32).sum();
        if total == 0 {
            // Weightless book: take the first decodable entry.
            return candidates.iter().find_map(|e| e.decode_move(board));
        }

        let mut pick = rand::rng().random_range(0..total);
        for entry in candidates {
            let w = entry.weight as u32;
            if pick < w {
                debug!(weight = entry.weight, of = total, "book choice");
                return entry.decode_move(board);
            }
            pick -= w;
        }
        None
    }
}

/// One-shot probe used by the search; any I/O trouble reads as "no
/// book move".
pub fn probe_file(path: &str, board: &Board) -> Option<Move> {
    Book::open(path).ok()?.probe(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn start_position_key_matches_the_reference() {
        assert_eq!(compute_key(&Board::new()), 0x463B_9618_1691_FC9C);
    }

    #[test]
    fn known_positions_pin_the_key_computation() {
        let fixtures = [
            (
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
                0x823C_9B50_FD11_4196u64,
            ),
            (
                "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
                0x0756_B944_61C5_0FB0,
            ),
            (
                "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 2",
                0x662F_AFB9_65DB_29D4,
            ),
            (
                "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
                0x22A4_8B5A_8E47_FF78,
            ),
            (
                "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPPKPPP/RNBQ1BNR b kq - 0 3",
                0x652A_607C_A3F2_42C1,
            ),
            (
                "rnbq1bnr/ppp1pkpp/8/3pPp2/8/8/PPPPKPPP/RNBQ1BNR w - - 0 4",
                0x00FD_D303_C946_BDD9,
            ),
        ];
        for (fen, expected) in fixtures {
            let board = Board::from_str(fen).unwrap();
            assert_eq!(compute_key(&board), expected, "key mismatch for {fen}");
        }
    }

    #[test]
    fn ep_file_counts_only_with_a_capturer() {
        // After e2e4 there is an ep square on e3 but no black pawn can
        // take; the key must ignore it.
        let board =
            Board::from_str("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        let plain =
            Board::from_str("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
                .unwrap();
        assert_eq!(compute_key(&board), compute_key(&plain));
    }

    #[test]
    fn probe_walks_a_synthetic_book() {
        let board = Board::new();
        let key = compute_key(&board);
        // e2e4 in book encoding.
        let raw = (12u16 << 6) | 28;
        let mut bytes = Vec::new();
        // A smaller key first to exercise the binary search.
        bytes.extend_from_slice(&(key - 1).to_be_bytes());
        bytes.extend_from_slice(&raw.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&key.to_be_bytes());
        bytes.extend_from_slice(&raw.to_be_bytes());
        bytes.extend_from_slice(&100u16.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());

        let dir = std::env::temp_dir().join("tempo_book_test.bin");
        std::fs::write(&dir, &bytes).unwrap();
        let book = Book::open(&dir).unwrap();
        assert_eq!(book.len(), 2);
        let mv = book.probe(&board).expect("book move");
        assert_eq!(mv.to_uci(), "e2e4");
        std::fs::remove_file(&dir).ok();

        assert!(probe_file("definitely-missing.bin", &board).is_none());
    }
}
