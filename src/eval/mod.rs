//! Static evaluation.
//!
//! The pipeline: material (cached by material key) sets the phase and the
//! game-type flags; pawns-and-kings structure comes from the pawn table;
//! piece terms and king attack are computed per node with a skeleton
//! shortcut; passed pawns are scored against the full occupancy. The
//! tapered total is blended by phase, endgame-adjusted when the material
//! flags say so, converted to the side to move and snapped to the grain.

pub mod endgame;
pub mod king_attack;
pub mod kpk;
pub mod losers;
pub mod pawns;
pub mod pieces;
pub mod pst;
pub mod score;

use crate::board::MAX_PLY;
use crate::board::piece::*;
use crate::search::Search;
use crate::search::tt::{
    IMB_MAJOR_B, IMB_MAJOR_W, IMB_MINOR_B, IMB_MINOR_W, MFLAG_EG, MFLAG_KING_ATTACK_FORCE_B,
    MFLAG_KING_ATTACK_FORCE_W, MFLAG_MATING_POWER_B, MFLAG_MATING_POWER_W, MaterialEntry,
};
use score::{MAX_PHASE, Score, s};

const TEMPO: [Score; 2] = [s(-10, 0), s(10, 0)];

const MAT_PAWN: Score = Score::both(100);
const MAT_KNIGHT: Score = Score::both(325);
const MAT_BISHOP: Score = Score::both(325);
const MAT_ROOK: Score = Score::both(500);
const MAT_QUEEN: Score = Score::both(925);

const REDUNDANT_KNIGHT: Score = Score::both(-5);
const REDUNDANT_ROOK: Score = Score::both(-10);
const REDUNDANT_QUEEN: Score = Score::both(-20);

/// Full static evaluation from the side to move's point of view. Not
/// meaningful in check (the caller's pruning blocks never use it there);
/// the cached value is cleared so nothing downstream trusts it.
pub fn evaluate(s: &mut Search) -> i32 {
    let ply = s.board.ply;
    if s.stack[ply].in_check && ply < MAX_PLY - 1 {
        s.stack[ply].eval_result = None;
        return 0;
    }
    if let Some(cached) = s.stack[ply].eval_result {
        return cached;
    }

    let wtm = s.board.us();
    let mut result = eval_material(s);
    let mut total = TEMPO[wtm as usize];
    total += pawns::eval(s);
    total += pieces::eval(s);
    if s.stack[ply].pt.passers != 0 {
        let white_passers = pawns::eval_passed_pawns(s, true);
        let black_passers = pawns::eval_passed_pawns(s, false);
        total += white_passers - black_passers;
    } else {
        s.stack[ply].passer_score = [Score::ZERO; 2];
    }
    total += king_attack::eval(s, true);
    total -= king_attack::eval(s, false);

    let phase = s.stack[ply].mt.phase as i32;
    result += total.interpolate(phase);
    if s.stack[ply].mt.flags & MFLAG_EG != 0 {
        result = endgame::eval(s, result);
    }
    if !wtm {
        result = -result;
    }
    let result = score::grain(result);
    s.stack[ply].eval_result = Some(result);
    result
}

/// Material balance, phase and the game-type flags, served from the
/// material table. Returns the white-relative material score.
pub fn eval_material(s: &mut Search) -> i32 {
    let key = s.board.st().material_hash;
    if let Some(entry) = s.tables.material.probe(key) {
        s.stack[s.board.ply].mt = *entry;
        return entry.score as i32;
    }

    let brd = &s.board;
    let wpawns = brd.count(WPAWN) as i32;
    let bpawns = brd.count(BPAWN) as i32;
    let wknights = brd.count(WKNIGHT) as i32;
    let bknights = brd.count(BKNIGHT) as i32;
    let wbishops = brd.count(WBISHOP) as i32;
    let bbishops = brd.count(BBISHOP) as i32;
    let wrooks = brd.count(WROOK) as i32;
    let brooks = brd.count(BROOK) as i32;
    let wqueens = brd.count(WQUEEN) as i32;
    let bqueens = brd.count(BQUEEN) as i32;
    let wminors = wknights + wbishops;
    let bminors = bknights + bbishops;
    let wpieces = wminors + wrooks + wqueens;
    let bpieces = bminors + brooks + bqueens;

    let phase = (MAX_PHASE - wminors - bminors - wrooks - brooks - 2 * (wqueens + bqueens))
        .clamp(0, MAX_PHASE);

    let mut result = Score::ZERO;
    if wknights != bknights {
        result += MAT_KNIGHT * (wknights - bknights) as i16;
        if wknights > 1 {
            result += REDUNDANT_KNIGHT;
        }
        if bknights > 1 {
            result -= REDUNDANT_KNIGHT;
        }
    }
    if wbishops != bbishops {
        result += MAT_BISHOP * (wbishops - bbishops) as i16;
    }
    if wrooks != brooks {
        result += MAT_ROOK * (wrooks - brooks) as i16;
        if wrooks > 1 {
            result += REDUNDANT_ROOK;
        }
        if brooks > 1 {
            result -= REDUNDANT_ROOK;
        }
    }
    if wqueens != bqueens {
        result += MAT_QUEEN * (wqueens - bqueens) as i16;
        if wqueens > 1 {
            result += REDUNDANT_QUEEN;
        }
        if bqueens > 1 {
            result -= REDUNDANT_QUEEN;
        }
    }

    // Imbalance class is judged on pieces alone, before pawns enter.
    let mut flags = 0u8;
    let balanced = wminors == bminors && (wrooks + 2 * wqueens) == (brooks + 2 * bqueens);
    if !balanced {
        let power = result.interpolate(phase);
        flags = if power > 450 {
            IMB_MAJOR_W
        } else if power > 100 {
            IMB_MINOR_W
        } else if power < -450 {
            IMB_MAJOR_B
        } else if power < -100 {
            IMB_MINOR_B
        } else {
            0
        };
    }

    if wpawns != bpawns {
        result += MAT_PAWN * (wpawns - bpawns) as i16;
    }

    let mating_power_w = wrooks > 0 || wqueens > 0 || wminors > 2 || (wminors == 2 && wbishops > 0);
    let mating_power_b = brooks > 0 || bqueens > 0 || bminors > 2 || (bminors == 2 && bbishops > 0);
    if mating_power_w {
        flags |= MFLAG_MATING_POWER_W;
        if wqueens > 0 && (wpieces > 2 || wrooks > 0 || wqueens > 1) {
            flags |= MFLAG_KING_ATTACK_FORCE_W;
        }
    }
    if mating_power_b {
        flags |= MFLAG_MATING_POWER_B;
        if bqueens > 0 && (bpieces > 2 || brooks > 0 || bqueens > 1) {
            flags |= MFLAG_KING_ATTACK_FORCE_B;
        }
    }
    if wpawns <= 1 || bpawns <= 1 || !mating_power_w || !mating_power_b {
        flags |= MFLAG_EG;
    }

    let attack_force = |minors: i32, rooks: i32, queens: i32| -> u8 {
        (3 * minors + 5 * rooks + 9 * queens).clamp(0, 255) as u8
    };

    let entry = MaterialEntry {
        key,
        score: result.interpolate(phase) as i16,
        phase: phase as u8,
        attack_force: [
            attack_force(bminors, brooks, bqueens),
            attack_force(wminors, wrooks, wqueens),
        ],
        flags,
    };
    s.tables.material.store(entry);
    s.stack[s.board.ply].mt = entry;
    entry.score as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EngineOptions;
    use std::str::FromStr;

    fn eval_fen(fen: &str) -> i32 {
        let mut search = Search::new(EngineOptions::default());
        search.set_position(crate::board::Board::from_str(fen).unwrap());
        evaluate(&mut search)
    }

    #[test]
    fn startpos_is_balanced() {
        let eval = eval_fen(crate::board::Board::new().to_fen().as_str());
        assert!(eval.abs() <= 40, "startpos eval {eval} out of band");
    }

    #[test]
    fn an_extra_rook_shows_up() {
        let eval = eval_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert!(eval > 400, "rook-up eval {eval}");
    }

    #[test]
    fn evaluation_is_symmetric_under_mirror() {
        let fens = [
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "4k3/8/8/8/8/8/8/R3K3 w - - 0 1",
        ];
        for fen in fens {
            let mut search = Search::new(EngineOptions::default());
            let board = crate::board::Board::from_str(fen).unwrap();
            let mirror = board.mirrored();
            search.set_position(board);
            let eval = evaluate(&mut search);
            let mut search2 = Search::new(EngineOptions::default());
            search2.set_position(mirror);
            let mirrored_eval = evaluate(&mut search2);
            assert_eq!(eval, mirrored_eval, "mirror asymmetry on {fen}");
        }
    }

    #[test]
    fn phase_runs_zero_to_sixteen() {
        let mut search = Search::new(EngineOptions::default());
        search.set_position(crate::board::Board::new());
        evaluate(&mut search);
        assert_eq!(search.stack[0].mt.phase, 0);

        let mut search = Search::new(EngineOptions::default());
        search.set_position(crate::board::Board::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap());
        evaluate(&mut search);
        assert_eq!(search.stack[0].mt.phase, 16);
    }
}
