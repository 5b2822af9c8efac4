//! Tactical fixtures: within a depth ceiling of 15 and a node budget of
//! twenty million, the search must land on the known best move.

use std::str::FromStr;

use tempo::board::Board;
use tempo::options::EngineOptions;
use tempo::search::{Search, SearchLimits};

const DEPTH_CEILING: i32 = 15;
const NODE_CEILING: u64 = 20_000_000;

fn best_move_of(fen: &str) -> String {
    let mut options = EngineOptions::default();
    options.own_book = false;
    let mut search = Search::new(options);
    search.set_position(Board::from_str(fen).unwrap());
    let result = search.go(&SearchLimits {
        depth: Some(DEPTH_CEILING),
        nodes: Some(NODE_CEILING),
        ..SearchLimits::default()
    });
    result.best_move.to_uci()
}

#[test]
fn back_rank_queen_sacrifice() {
    assert_eq!(
        best_move_of("1k1r4/pp1b1R2/3q2pp/4p3/2B5/4Q3/PPP2B2/2K5 b - - 0 1"),
        "d6d1"
    );
}

#[test]
fn central_breakthrough() {
    assert_eq!(
        best_move_of("3r1k2/4npp1/1ppr3p/p6P/P2PPPP1/1NR5/5K2/2R5 w - - 0 1"),
        "d4d5"
    );
}

#[test]
fn bishop_infiltration() {
    assert_eq!(
        best_move_of("2r1r2k/1q3ppp/p2Rp3/2p1P3/6QB/p3P3/bP3PPP/3R2K1 w - - 0 1"),
        "h4f6"
    );
}

#[test]
fn pin_and_win() {
    assert_eq!(
        best_move_of("r4rk1/1p2ppbp/p2pbnp1/q7/3BPPP1/2N2B2/PPP4P/R2Q1RK1 b - - 0 1"),
        "e6g4"
    );
}

#[test]
fn smothered_net() {
    assert_eq!(
        best_move_of("5rk1/2p4p/2p4r/3P4/4p1b1/1Q2NqPp/PP3P1K/R4R2 b - - 0 1"),
        "f3g2"
    );
}
