//! Evaluation must be blind to which color is which: a position and its
//! color-and-rank mirror evaluate identically from the mover's seat.

use std::str::FromStr;

use tempo::board::Board;
use tempo::eval::evaluate;
use tempo::options::EngineOptions;
use tempo::search::Search;

const CORPUS: [&str; 12] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "2r1r2k/1q3ppp/p2Rp3/2p1P3/6QB/p3P3/bP3PPP/3R2K1 w - - 0 1",
    "1k1r4/pp1b1R2/3q2pp/4p3/2B5/4Q3/PPP2B2/2K5 b - - 0 1",
    "4k3/8/8/3P4/8/8/8/4K3 w - - 0 1",
    "8/k7/3p4/p2P1p2/P2P1P2/8/8/K7 w - - 0 1",
    "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1",
    "4k3/pppq4/8/8/8/8/PPPQ4/4K3 w - - 0 1",
    "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 4 9",
];

fn eval_of(board: Board) -> i32 {
    let mut options = EngineOptions::default();
    options.own_book = false;
    let mut search = Search::new(options);
    search.set_position(board);
    evaluate(&mut search)
}

#[test]
fn mirror_symmetry_over_the_corpus() {
    for fen in CORPUS {
        let board = Board::from_str(fen).unwrap();
        let mirror = board.mirrored();
        let eval = eval_of(board);
        let mirror_eval = eval_of(mirror);
        assert_eq!(eval, mirror_eval, "asymmetric evaluation for {fen}");
    }
}

#[test]
fn phase_is_mirror_invariant() {
    for fen in CORPUS {
        let board = Board::from_str(fen).unwrap();
        let mirror = board.mirrored();

        let mut search = Search::new(EngineOptions::default());
        search.set_position(board);
        evaluate(&mut search);
        let phase = search.stack[0].mt.phase;

        let mut search = Search::new(EngineOptions::default());
        search.set_position(mirror);
        evaluate(&mut search);
        assert_eq!(phase, search.stack[0].mt.phase, "phase drift for {fen}");
    }
}

#[test]
fn double_mirror_is_identity() {
    for fen in CORPUS {
        let board = Board::from_str(fen).unwrap();
        assert_eq!(board.mirrored().mirrored().to_fen(), board.to_fen());
    }
}
