//! Move generator correctness against the standard perft corpus, plus
//! the make/unmake round-trip invariant.

use std::str::FromStr;

use tempo::Board;
use tempo::moves::perft::perft;

fn expect(fen: &str, counts: &[(u32, u64)]) {
    let mut board = Board::from_str(fen).unwrap();
    for &(depth, nodes) in counts {
        assert_eq!(
            perft(&mut board, depth),
            nodes,
            "perft({depth}) mismatch for {fen}"
        );
    }
}

#[test]
fn startpos() {
    expect(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        &[(1, 20), (2, 400), (3, 8_902), (4, 197_281), (5, 4_865_609)],
    );
}

#[test]
fn kiwipete() {
    expect(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        &[(1, 48), (2, 2_039), (3, 97_862), (4, 4_085_603)],
    );
}

#[test]
fn endgame_position() {
    expect(
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        &[(1, 14), (2, 191), (3, 2_812), (4, 43_238), (5, 674_624)],
    );
}

#[test]
fn promotion_heavy_position() {
    expect(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        &[(1, 6), (2, 264), (3, 9_467), (4, 422_333)],
    );
}

#[test]
fn talkchess_discovered_check() {
    expect(
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        &[(1, 44), (2, 1_486), (3, 62_379), (4, 2_103_487)],
    );
}

#[test]
fn steven_edwards_position() {
    expect(
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        &[(1, 46), (2, 2_079), (3, 89_890), (4, 3_894_594)],
    );
}

/// After enumerating (making and unmaking) the full tree, the notation
/// must be byte-identical to the input.
#[test]
fn enumeration_leaves_the_position_untouched() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ];
    for fen in fens {
        let mut board = Board::from_str(fen).unwrap();
        let before = board.to_fen();
        let hash = board.st().hash;
        perft(&mut board, 3);
        assert_eq!(board.to_fen(), before, "FEN drift on {fen}");
        assert_eq!(board.st().hash, hash, "hash drift on {fen}");
    }
}
