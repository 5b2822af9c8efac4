//! All three incremental keys must stay equal to from-scratch
//! recomputation across arbitrary make/unmake traffic.

use std::str::FromStr;

use tempo::Board;
use tempo::moves::legal_moves;

fn walk_and_verify(board: &mut Board, depth: u32) {
    assert_eq!(board.st().hash, board.compute_hash());
    assert_eq!(board.st().pawn_hash, board.compute_pawn_hash());
    assert_eq!(board.st().material_hash, board.compute_material_hash());
    if depth == 0 {
        return;
    }
    for mv in legal_moves(board) {
        let before = (
            board.st().hash,
            board.st().pawn_hash,
            board.st().material_hash,
        );
        board.forward(&mv);
        walk_and_verify(board, depth - 1);
        board.backward(&mv);
        let after = (
            board.st().hash,
            board.st().pawn_hash,
            board.st().material_hash,
        );
        assert_eq!(before, after, "unmake of {} changed a key", mv.to_uci());
    }
}

#[test]
fn keys_match_recomputation_from_start() {
    let mut board = Board::new();
    walk_and_verify(&mut board, 3);
}

#[test]
fn keys_match_recomputation_in_tactical_positions() {
    let fens = [
        // Castling, en passant and promotions all within two plies.
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2",
        "r3k3/1P6/8/8/8/8/8/4K3 w q - 0 1",
    ];
    for fen in fens {
        let mut board = Board::from_str(fen).unwrap();
        walk_and_verify(&mut board, 2);
    }
}

#[test]
fn distinct_ep_states_hash_differently() {
    let with_ep =
        Board::from_str("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2").unwrap();
    let without_ep =
        Board::from_str("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 2").unwrap();
    assert_ne!(with_ep.st().hash, without_ep.st().hash);
}

#[test]
fn castling_rights_hash_differently() {
    let full = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let partial = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w Kkq - 0 1").unwrap();
    assert_ne!(full.st().hash, partial.st().hash);
    assert_ne!(full.st().pawn_hash, partial.st().pawn_hash);
}

#[test]
fn material_key_ignores_piece_placement() {
    let a = Board::from_str("4k3/8/8/8/8/8/2N5/4K3 w - - 0 1").unwrap();
    let b = Board::from_str("4k3/8/8/5N2/8/8/8/4K3 w - - 0 1").unwrap();
    assert_eq!(a.st().material_hash, b.st().material_hash);
    assert_ne!(a.st().hash, b.st().hash);
}
