//! Losers-chess variant behavior.

use std::str::FromStr;

use tempo::board::{Board, Variant};
use tempo::eval::score;
use tempo::options::EngineOptions;
use tempo::search::{Search, SearchLimits};

fn losers_search(fen: &str) -> Search {
    let mut options = EngineOptions::default();
    options.wild = Variant::Losers;
    options.own_book = false;
    let mut search = Search::new(options);
    search.set_position(Board::from_str(fen).unwrap());
    search
}

fn go(search: &mut Search, depth: i32) -> tempo::search::SearchResult {
    search.go(&SearchLimits {
        depth: Some(depth),
        ..SearchLimits::default()
    })
}

#[test]
fn captures_are_forcing() {
    let mut search = losers_search("4k3/8/8/3p4/2P5/8/8/4K3 w - - 0 1");
    let result = go(&mut search, 4);
    assert_eq!(result.best_move.to_uci(), "c4d5");
}

#[test]
fn sacrificing_the_last_piece_wins() {
    let mut search = losers_search("4k3/8/8/3p4/8/8/3N4/4K3 w - - 0 1");
    let result = go(&mut search, 8);
    let uci = result.best_move.to_uci();
    assert!(uci == "d2c4" || uci == "d2e4", "got {uci}");
    assert!(score::is_mate(result.score));
}

#[test]
fn stalemate_is_a_win_for_the_stalemated_side() {
    // Black to move is stalemated; in losers chess that is a win for
    // the side that cannot move.
    let mut search = losers_search("k7/8/1Q6/8/8/8/8/K7 b - - 0 1");
    let result = go(&mut search, 4);
    assert!(result.best_move.is_empty());
    assert_eq!(result.score, score::MATE);
}

#[test]
fn variant_keys_do_not_collide_with_standard_chess() {
    let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    let standard = Board::from_fen(fen).unwrap();
    let losers = Board::from_fen_variant(fen, Variant::Losers).unwrap();
    assert_ne!(standard.st().hash, losers.st().hash);
    // The salt must survive make/unmake.
    let mut losers = losers;
    let mv = tempo::moves::parse_uci_move(&losers, "e2e4").unwrap();
    losers.forward(&mv);
    assert_eq!(losers.st().hash, losers.compute_hash());
}

#[test]
fn losers_ignores_insufficient_material_draws() {
    // Two bare-ish minors would be a material draw in standard chess;
    // in losers the game is very much alive.
    let search = losers_search("4k3/8/8/8/8/8/8/3NK3 w - - 40 1");
    assert!(!search.is_draw());
}
