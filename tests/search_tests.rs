//! Search behavior: transposition-table pressure, abort safety, and the
//! driver's handling of degenerate positions.

use std::str::FromStr;

use tempo::board::Board;
use tempo::eval::score;
use tempo::options::EngineOptions;
use tempo::search::{Search, SearchLimits};

fn fresh_search(fen: &str) -> Search {
    let mut options = EngineOptions::default();
    options.own_book = false;
    let mut search = Search::new(options);
    search.set_position(Board::from_str(fen).unwrap());
    search
}

/// The Lasker-Reichhelm study is decided by transposition hits; with
/// the table on, depth 15 must stay far below fifty thousand nodes.
#[test]
fn hash_pressure_on_lasker_reichhelm() {
    let mut search = fresh_search("8/k7/3p4/p2P1p2/P2P1P2/8/8/K7 w - - 0 1");
    let result = search.go(&SearchLimits {
        depth: Some(15),
        ..SearchLimits::default()
    });
    assert!(
        result.nodes < 50_000,
        "searched {} nodes with the table enabled",
        result.nodes
    );
    assert!(result.score > 0, "white is winning here");
}

#[test]
fn mate_score_is_distance_correct() {
    // Mate in two: Ra8 is answered by a forced block, then mate.
    let mut search = fresh_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1");
    let result = search.go(&SearchLimits {
        depth: Some(6),
        ..SearchLimits::default()
    });
    assert_eq!(result.score, score::MATE - 1);
    assert_eq!(result.best_move.to_uci(), "a1a8");
}

#[test]
fn stalemate_scores_zero() {
    // Black to move has no moves and is not in check.
    let mut search = fresh_search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
    let result = search.go(&SearchLimits {
        depth: Some(4),
        ..SearchLimits::default()
    });
    assert!(result.best_move.is_empty());
    assert_eq!(result.score, 0);
}

#[test]
fn node_budget_is_respected() {
    let mut search = fresh_search(
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 3 3",
    );
    let result = search.go(&SearchLimits {
        nodes: Some(20_000),
        depth: Some(30),
        ..SearchLimits::default()
    });
    assert!(!result.best_move.is_empty());
    // The node counter includes pruned moves and the poll grain allows
    // some overshoot, but the order of magnitude must hold.
    assert!(result.nodes < 100_000, "node budget blown: {}", result.nodes);
}

/// Whenever the search is cut off mid-iteration, the answer must be
/// the best move of some fully completed iteration.
#[test]
fn abort_returns_a_completed_iterations_move() {
    let fen = "r2q1rk1/ppp2ppp/2np1n2/2b1p1B1/2B1P1b1/2NP1N2/PPP2PPP/R2Q1RK1 w - - 0 1";
    let completed: Vec<_> = (1..=7)
        .map(|depth| {
            fresh_search(fen)
                .go(&SearchLimits {
                    depth: Some(depth),
                    ..SearchLimits::default()
                })
                .best_move
        })
        .collect();

    let capped = fresh_search(fen).go(&SearchLimits {
        depth: Some(7),
        nodes: Some(8_000),
        ..SearchLimits::default()
    });
    assert!(
        completed.contains(&capped.best_move),
        "{} matches no completed iteration",
        capped.best_move.to_uci()
    );
}

#[test]
fn in_tree_repetition_is_a_draw() {
    let mut search = fresh_search("4k3/8/8/8/8/8/8/4K2R w - - 10 20");
    let shuffle = ["h1h2", "e8d8", "h2h1", "d8e8"];
    for text in shuffle {
        let mv = tempo::moves::parse_uci_move(&search.board, text).unwrap();
        let check = search.board.gives_check(&mv);
        search.forward(&mv, check);
    }
    // Back to the root position with the same side to move.
    assert!(search.is_draw());
}

#[test]
fn deeper_search_never_worsens_a_forced_mate() {
    let mut search = fresh_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1");
    let deep = search.go(&SearchLimits {
        depth: Some(10),
        ..SearchLimits::default()
    });
    assert_eq!(deep.score, score::MATE - 1);
}
