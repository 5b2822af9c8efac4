//! Pseudo-legal move generators.
//!
//! Four disjoint generators append into a `MoveList`: captures (with
//! en-passant and promotion captures), quiet promotions, castles and
//! quiet moves. Legality is the picker's business; together the four
//! cover exactly the legal moves of any position after filtering.

use crate::bitboard::{self as bits, bit, pop_first, sq};
use crate::board::piece::*;
use crate::board::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use crate::moves::magic;
use crate::moves::types::{Move, MoveList};

/// Captures of any piece in `targets` (own-piece bits are ignored), plus
/// en-passant. Promotion captures yield all four promotion pieces.
pub fn gen_captures(board: &Board, list: &mut MoveList, targets: u64) {
    list.begin_batch();
    let us = board.us();
    let uz = us as usize;
    let them = 1 - uz;
    let occ = board.occupied();
    let targets = targets & board.all(!us);
    let last_rank = bits::NTH_RANK[uz][8];

    // Pawns: walk the attacked target squares back to their attackers.
    let pawn_pc = PAWN[uz];
    let mut pawn_targets = targets;
    if board.st().ep_sq != 0 {
        pawn_targets |= bit(board.st().ep_sq);
    }
    pawn_targets &= board.pawn_attacks(us);
    while pawn_targets != 0 {
        let to = pop_first(&mut pawn_targets);
        let mut froms = magic::pawn_captures(!us, to) & board.pieces(pawn_pc);
        while froms != 0 {
            let from = pop_first(&mut froms);
            if to == board.st().ep_sq {
                let mut mv = Move::capture(pawn_pc, from, to, PAWN[them]);
                mv.en_passant = true;
                list.push(mv);
            } else if bit(to) & last_rank == 0 {
                list.push(Move::capture(pawn_pc, from, to, board.matrix[to as usize]));
            } else {
                let victim = board.matrix[to as usize];
                for promo in [QUEEN[uz], KNIGHT[uz], ROOK[uz], BISHOP[uz]] {
                    list.push(Move::promotion(pawn_pc, from, to, victim, promo));
                }
            }
        }
    }

    let mut pieces = board.pieces(KNIGHT[uz]);
    while pieces != 0 {
        let from = pop_first(&mut pieces);
        let mut hits = magic::knight_moves(from) & targets;
        while hits != 0 {
            let to = pop_first(&mut hits);
            list.push(Move::capture(KNIGHT[uz], from, to, board.matrix[to as usize]));
        }
    }
    let mut pieces = board.pieces(BISHOP[uz]);
    while pieces != 0 {
        let from = pop_first(&mut pieces);
        let mut hits = magic::bishop_moves(from, occ) & targets;
        while hits != 0 {
            let to = pop_first(&mut hits);
            list.push(Move::capture(BISHOP[uz], from, to, board.matrix[to as usize]));
        }
    }
    let mut pieces = board.pieces(ROOK[uz]);
    while pieces != 0 {
        let from = pop_first(&mut pieces);
        let mut hits = magic::rook_moves(from, occ) & targets;
        while hits != 0 {
            let to = pop_first(&mut hits);
            list.push(Move::capture(ROOK[uz], from, to, board.matrix[to as usize]));
        }
    }
    let mut pieces = board.pieces(QUEEN[uz]);
    while pieces != 0 {
        let from = pop_first(&mut pieces);
        let mut hits = magic::queen_moves(from, occ) & targets;
        while hits != 0 {
            let to = pop_first(&mut hits);
            list.push(Move::capture(QUEEN[uz], from, to, board.matrix[to as usize]));
        }
    }
    let from = board.king_sq(us);
    let mut hits = magic::king_moves(from) & board.all(!us);
    while hits != 0 {
        let to = pop_first(&mut hits);
        list.push(Move::capture(KING[uz], from, to, board.matrix[to as usize]));
    }
}

/// Quiet promotions: pawns one step from the last rank pushing into an
/// empty square, four entries each.
pub fn gen_promotions(board: &Board, list: &mut MoveList) {
    list.begin_batch();
    let us = board.us();
    let uz = us as usize;
    let pawn_pc = PAWN[uz];
    let mut pawns = board.pieces(pawn_pc) & bits::NTH_RANK[uz][7];
    while pawns != 0 {
        let from = pop_first(&mut pawns);
        let to = bits::forward_sq(from, us);
        if board.matrix[to as usize] == EMPTY {
            for promo in [QUEEN[uz], KNIGHT[uz], ROOK[uz], BISHOP[uz]] {
                list.push(Move::promotion(pawn_pc, from, to, EMPTY, promo));
            }
        }
    }
}

/// Castles where the right exists and the path is empty. The attacked-
/// square conditions are checked by `legal`.
pub fn gen_castles(board: &Board, list: &mut MoveList) {
    list.begin_batch();
    let m = &board.matrix;
    if board.us() {
        if board.has_castle_right(CASTLE_WK)
            && m[sq::F1 as usize] == EMPTY
            && m[sq::G1 as usize] == EMPTY
        {
            list.push(Move::new(WKING, sq::E1, sq::G1));
        }
        if board.has_castle_right(CASTLE_WQ)
            && m[sq::D1 as usize] == EMPTY
            && m[sq::C1 as usize] == EMPTY
            && m[sq::B1 as usize] == EMPTY
        {
            list.push(Move::new(WKING, sq::E1, sq::C1));
        }
    } else {
        if board.has_castle_right(CASTLE_BK)
            && m[sq::F8 as usize] == EMPTY
            && m[sq::G8 as usize] == EMPTY
        {
            list.push(Move::new(BKING, sq::E8, sq::G8));
        }
        if board.has_castle_right(CASTLE_BQ)
            && m[sq::D8 as usize] == EMPTY
            && m[sq::C8 as usize] == EMPTY
            && m[sq::B8 as usize] == EMPTY
        {
            list.push(Move::new(BKING, sq::E8, sq::C8));
        }
    }
}

/// Non-capturing piece moves into empty squares; pawn single and double
/// pushes, excluding promotions.
pub fn gen_quiets(board: &Board, list: &mut MoveList) {
    list.begin_batch();
    let us = board.us();
    let uz = us as usize;
    let occ = board.occupied();
    let empty = !occ;

    let pawn_pc = PAWN[uz];
    let mut pawns = board.pieces(pawn_pc) & !bits::NTH_RANK[uz][7];
    while pawns != 0 {
        let from = pop_first(&mut pawns);
        let to = bits::forward_sq(from, us);
        if board.matrix[to as usize] != EMPTY {
            continue;
        }
        list.push(Move::new(pawn_pc, from, to));
        if bit(from) & bits::NTH_RANK[uz][2] != 0 {
            let to2 = bits::forward_sq(to, us);
            if board.matrix[to2 as usize] == EMPTY {
                list.push(Move::new(pawn_pc, from, to2));
            }
        }
    }

    let mut pieces = board.pieces(KNIGHT[uz]);
    while pieces != 0 {
        let from = pop_first(&mut pieces);
        let mut quiet = magic::knight_moves(from) & empty;
        while quiet != 0 {
            list.push(Move::new(KNIGHT[uz], from, pop_first(&mut quiet)));
        }
    }
    let mut pieces = board.pieces(BISHOP[uz]);
    while pieces != 0 {
        let from = pop_first(&mut pieces);
        let mut quiet = magic::bishop_moves(from, occ) & empty;
        while quiet != 0 {
            list.push(Move::new(BISHOP[uz], from, pop_first(&mut quiet)));
        }
    }
    let mut pieces = board.pieces(ROOK[uz]);
    while pieces != 0 {
        let from = pop_first(&mut pieces);
        let mut quiet = magic::rook_moves(from, occ) & empty;
        while quiet != 0 {
            list.push(Move::new(ROOK[uz], from, pop_first(&mut quiet)));
        }
    }
    let mut pieces = board.pieces(QUEEN[uz]);
    while pieces != 0 {
        let from = pop_first(&mut pieces);
        let mut quiet = magic::queen_moves(from, occ) & empty;
        while quiet != 0 {
            list.push(Move::new(QUEEN[uz], from, pop_first(&mut quiet)));
        }
    }
    let from = board.king_sq(us);
    let mut quiet = magic::king_moves(from) & empty;
    while quiet != 0 {
        list.push(Move::new(KING[uz], from, pop_first(&mut quiet)));
    }
}

/// All four generators in one pass; the staged picker never needs this,
/// but the root setup, perft and move parsing do.
pub fn gen_all(board: &Board, list: &mut MoveList) {
    gen_captures(board, list, u64::MAX);
    gen_promotions(board, list);
    gen_castles(board, list);
    gen_quiets(board, list);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn count_stage(fen: &str, f: impl Fn(&Board, &mut MoveList)) -> usize {
        let board = Board::from_str(fen).unwrap();
        let mut list = MoveList::default();
        f(&board, &mut list);
        list.len()
    }

    #[test]
    fn startpos_stage_counts() {
        let start = crate::board::Board::new().to_fen();
        assert_eq!(count_stage(&start, |b, l| gen_captures(b, l, u64::MAX)), 0);
        assert_eq!(count_stage(&start, gen_promotions), 0);
        assert_eq!(count_stage(&start, gen_castles), 0);
        assert_eq!(count_stage(&start, gen_quiets), 20);
    }

    #[test]
    fn promotion_capture_fans_out() {
        // Pawn on b7 can take a8 rook or push: 4 + 4 entries.
        let fen = "r3k3/1P6/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(count_stage(fen, |b, l| gen_captures(b, l, u64::MAX)), 4);
        assert_eq!(count_stage(fen, gen_promotions), 4);
    }

    #[test]
    fn en_passant_is_a_capture() {
        let fen = "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2";
        let board = Board::from_str(fen).unwrap();
        let mut list = MoveList::default();
        gen_captures(&board, &mut list, u64::MAX);
        assert!(list.moves.iter().any(|m| m.en_passant && m.to == sq::E3));
    }

    #[test]
    fn double_push_needs_both_squares_empty() {
        let fen = "4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1";
        let board = Board::from_str(fen).unwrap();
        let mut list = MoveList::default();
        gen_quiets(&board, &mut list);
        assert!(!list.moves.iter().any(|m| m.piece == WPAWN));
        let fen = "4k3/8/8/8/4n3/8/4P3/4K3 w - - 0 1";
        let board = Board::from_str(fen).unwrap();
        let mut list = MoveList::default();
        gen_quiets(&board, &mut list);
        let pawn_moves: Vec<_> = list.moves.iter().filter(|m| m.piece == WPAWN).collect();
        assert_eq!(pawn_moves.len(), 1);
        assert_eq!(pawn_moves[0].to, sq::E3);
    }

    #[test]
    fn castles_need_empty_path_only() {
        // Attacked transit squares are legal()'s concern, not the
        // generator's.
        let fen = "4k3/8/8/8/8/5r2/8/R3K2R w KQ - 0 1";
        assert_eq!(count_stage(fen, gen_castles), 2);
        let fen = "4k3/8/8/8/8/8/8/Rn2K2R w KQ - 0 1";
        assert_eq!(count_stage(fen, gen_castles), 1);
    }
}
