//! Endgame evaluation fixtures: dead draws stay near zero, known wins
//! clear the winning threshold, the KPK bitbase agrees with theory.

use std::str::FromStr;

use tempo::board::Board;
use tempo::eval::{evaluate, kpk};
use tempo::options::EngineOptions;
use tempo::search::Search;

fn eval_fen(fen: &str) -> i32 {
    let mut options = EngineOptions::default();
    options.own_book = false;
    let mut search = Search::new(options);
    search.set_position(Board::from_str(fen).unwrap());
    evaluate(&mut search)
}

#[test]
fn bare_minor_is_a_dead_draw() {
    let eval = eval_fen("7k/8/6K1/3N4/8/8/8/8 w - - 0 1");
    assert!(eval.abs() <= 10, "KNK scored {eval}");
}

#[test]
fn bare_kings_are_a_dead_draw() {
    let eval = eval_fen("6k1/8/8/8/8/8/8/1K6 w - - 0 1");
    assert!(eval.abs() <= 10, "KK scored {eval}");
}

#[test]
fn two_knights_cannot_win() {
    let eval = eval_fen("5k2/8/2N2K2/8/5N2/8/8/8 w - - 0 1");
    assert!(eval.abs() <= 10, "KNNK scored {eval}");
}

#[test]
fn two_bishops_win() {
    let eval = eval_fen("8/8/8/8/4k3/8/8/K2B2B1 w - - 0 1");
    assert!(eval > 500, "KBBK scored only {eval}");
}

#[test]
fn kpk_probe_fixture() {
    // White king h3, black king h2, white pawn b7, white to move: the
    // pawn walks in.
    assert!(kpk::probe(true, 23, 15, 49));
}

#[test]
fn kpk_drives_the_evaluation() {
    // Winning KPK: big score for the pawn side.
    let winning = eval_fen("8/1P6/8/8/7K/8/7k/8 w - - 0 1");
    assert!(winning > 400, "won KPK scored {winning}");
    // Rook-pawn with the defender in the corner: scaled toward zero.
    let drawn = eval_fen("k7/8/K7/P7/8/8/8/8 b - - 0 1");
    assert!(drawn.abs() < 100, "drawn KPK scored {drawn}");
}

#[test]
fn krkp_and_kqkp_heuristics_have_sane_signs() {
    // Queen against a far-from-promotion pawn is winning.
    let qp = eval_fen("4k3/4p3/8/8/8/8/8/KQ6 w - - 0 1");
    assert!(qp > 400, "KQKP scored {qp}");
    // Rook against a supported pawn on the seventh is murky.
    let rp = eval_fen("8/8/8/8/8/8/pk6/R4K2 w - - 0 1");
    assert!(rp.abs() < 450, "KRKP edge case scored {rp}");
}

#[test]
fn losers_variant_positions_evaluate() {
    use tempo::board::Variant;
    let mut options = EngineOptions::default();
    options.wild = Variant::Losers;
    options.own_book = false;
    let mut search = Search::new(options);
    search.set_position(
        Board::from_fen_variant("4k3/pppp4/8/8/8/8/PPPP4/4K3 w - - 0 1", Variant::Losers)
            .unwrap(),
    );
    assert_eq!(tempo::eval::losers::evaluate(&mut search), 0);
}
