//! The staged move picker.
//!
//! Moves are generated on demand, stage by stage: hash move, winning
//! captures by MVV-LVA, queen promotions, the mate killer and two
//! killers, losing captures and under-promotions, castles, then quiet
//! moves by history score. Every emitted move has passed a just-in-time
//! validity and legality check, so a node that gets no move at all is
//! mated or stalemated. In losers chess the picker stops after the
//! capture stage whenever a capture exists, since captures are forcing.

use crate::board::Variant;
use crate::board::piece::{VALUE, kind};
use crate::moves::movegen;
use crate::moves::types::{Move, Stage};
use crate::search::Search;

/// Most valuable victim first, cheapest aggressor as tie-break; always
/// positive so winning captures clear the good-capture threshold.
fn mvv_lva(mv: &Move) -> i32 {
    VALUE[mv.capture as usize] * 64 - VALUE[mv.piece as usize]
}

impl Search {
    /// Reset the current ply's list and produce the first move.
    pub fn first_move(&mut self, depth: i32) -> Option<Move> {
        self.stack[self.board.ply].move_list.clear();
        self.next_move(depth)
    }

    /// Produce the next legal move, advancing stages as the list runs
    /// dry. Quiet stages are skipped at negative quiescence depth unless
    /// the side to move is in check.
    pub fn next_move(&mut self, depth: i32) -> Option<Move> {
        if let Some(mv) = self.pop_move() {
            return Some(mv);
        }
        let ply = self.board.ply;
        let do_quiets = depth >= 0 || self.stack[ply].in_check;
        let losers = self.board.variant == Variant::Losers;

        loop {
            match self.stack[ply].move_list.stage {
                Stage::Hash => {
                    self.stack[ply].move_list.stage = Stage::Captures;
                    let mut mv = self.stack[ply].tt_move;
                    if !mv.is_empty() && self.board.valid(&mv) && self.board.legal(&mut mv) {
                        // Keep the tagged form for duplicate filtering.
                        self.stack[ply].tt_move = mv;
                        return Some(mv);
                    }
                }
                Stage::Captures => {
                    {
                        let (board, frame) = (&self.board, &mut self.stack[ply]);
                        movegen::gen_captures(board, &mut frame.move_list, u64::MAX);
                        for mv in frame.move_list.latest_batch_mut() {
                            mv.score = if losers {
                                // Prefer captures the opponent must answer
                                // by taking back.
                                let victim_is_white = crate::board::piece::is_white(mv.capture);
                                i32::from(board.is_attacked(mv.to, victim_is_white))
                            } else {
                                mvv_lva(mv)
                            };
                        }
                    }
                    if losers {
                        self.stack[ply].move_list.min_score = i32::MIN;
                        let result = self.pop_move();
                        let tt = &self.stack[ply].tt_move;
                        if result.is_some() || (!tt.is_empty() && tt.is_capture()) {
                            self.stack[ply].move_list.stage = Stage::Stop;
                            return result;
                        }
                        self.stack[ply].move_list.stage = Stage::Promotions;
                    } else {
                        self.stack[ply].move_list.stage = Stage::Promotions;
                        if let Some(mv) = self.pop_move() {
                            return Some(mv);
                        }
                    }
                }
                Stage::Promotions => {
                    {
                        let (board, frame) = (&self.board, &mut self.stack[ply]);
                        movegen::gen_promotions(board, &mut frame.move_list);
                    }
                    let start = self.stack[ply].move_list.batch_start;
                    let len = self.stack[ply].move_list.moves.len();
                    for i in start..len {
                        let mv = self.stack[ply].move_list.moves[i];
                        let score = if losers {
                            10 - kind(mv.promotion) as i32
                        } else if depth <= 0 || self.board.see(&mv) >= 0 {
                            kind(mv.promotion) as i32
                        } else {
                            // Unsound promotions wait with the bad captures.
                            -100 + kind(mv.promotion) as i32
                        };
                        self.stack[ply].move_list.moves[i].score = score;
                    }
                    self.stack[ply].move_list.stage = Stage::MateKiller;
                    if let Some(mv) = self.pop_move() {
                        return Some(mv);
                    }
                }
                Stage::MateKiller => {
                    self.stack[ply].move_list.stage = Stage::Killer1;
                    if do_quiets {
                        if let Some(mv) = self.try_killer(0, &[]) {
                            return Some(mv);
                        }
                    }
                }
                Stage::Killer1 => {
                    self.stack[ply].move_list.stage = Stage::Killer2;
                    if do_quiets {
                        if let Some(mv) = self.try_killer(1, &[0]) {
                            return Some(mv);
                        }
                    }
                }
                Stage::Killer2 => {
                    self.stack[ply].move_list.stage = Stage::MinorPromotions;
                    if do_quiets {
                        if let Some(mv) = self.try_killer(2, &[0, 1]) {
                            return Some(mv);
                        }
                    }
                }
                Stage::MinorPromotions => {
                    // Also releases the captures demoted for losing
                    // material.
                    self.stack[ply].move_list.min_score = i32::MIN;
                    self.stack[ply].move_list.stage = Stage::Castling;
                    if let Some(mv) = self.pop_move() {
                        return Some(mv);
                    }
                }
                Stage::Castling => {
                    self.stack[ply].move_list.stage = Stage::QuietMoves;
                    if !self.stack[ply].in_check {
                        {
                            let (board, frame) = (&self.board, &mut self.stack[ply]);
                            movegen::gen_castles(board, &mut frame.move_list);
                            for mv in frame.move_list.latest_batch_mut() {
                                mv.score = 100;
                            }
                        }
                        if let Some(mv) = self.pop_move() {
                            return Some(mv);
                        }
                    }
                }
                Stage::QuietMoves => {
                    self.stack[ply].move_list.stage = Stage::Stop;
                    if do_quiets {
                        self.stack[ply].move_list.min_score = i32::MIN;
                        let history = &self.history;
                        let (board, frame) = (&self.board, &mut self.stack[ply]);
                        movegen::gen_quiets(board, &mut frame.move_list);
                        for mv in frame.move_list.latest_batch_mut() {
                            mv.score = history[mv.piece as usize][mv.to as usize];
                        }
                        return self.pop_move();
                    }
                }
                Stage::Stop => return None,
            }
        }
    }

    /// Emit killer slot `slot` if it is distinct, valid and legal.
    fn try_killer(&mut self, slot: usize, earlier: &[usize]) -> Option<Move> {
        let ply = self.board.ply;
        let mut mv = self.stack[ply].killers[slot];
        if mv.is_empty() || mv.is_capture() {
            return None;
        }
        if self.stack[ply].tt_move == mv {
            return None;
        }
        for &e in earlier {
            if self.stack[ply].killers[e] == mv {
                return None;
            }
        }
        if self.board.valid(&mv) && self.board.legal(&mut mv) {
            return Some(mv);
        }
        None
    }

    /// Pop the best queued move: re-score losing captures downward while
    /// the good-capture threshold holds, skip duplicates of the hash and
    /// killer moves, and verify legality just before emitting.
    fn pop_move(&mut self) -> Option<Move> {
        let ply = self.board.ply;
        loop {
            let mut mv = self.stack[ply].move_list.pop_best()?;
            if self.stack[ply].move_list.min_score == 0
                && mv.is_capture()
                && self.board.min_gain(&mv) < 0
            {
                let see = self.board.see(&mv);
                if see < 0 {
                    mv.score = see;
                    self.stack[ply].move_list.requeue(mv);
                    continue;
                }
            }
            if self.stack[ply].tt_move == mv || self.is_killer(&mv) {
                continue;
            }
            if self.board.legal(&mut mv) {
                return Some(mv);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::options::EngineOptions;
    use std::str::FromStr;

    fn drain(search: &mut Search, depth: i32) -> Vec<Move> {
        let mut out = Vec::new();
        let mut mv = search.first_move(depth);
        while let Some(m) = mv {
            out.push(m);
            mv = search.next_move(depth);
        }
        out
    }

    fn searcher(fen: &str) -> Search {
        let mut search = Search::new(EngineOptions::default());
        search.set_position(Board::from_str(fen).unwrap());
        search
    }

    #[test]
    fn picker_covers_all_legal_moves() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        ];
        for fen in fens {
            let mut search = searcher(fen);
            let picked = drain(&mut search, 1);
            let legal = crate::moves::legal_moves(&search.board);
            assert_eq!(picked.len(), legal.len(), "count mismatch on {fen}");
            for mv in &legal {
                assert!(picked.contains(mv), "{} missing on {fen}", mv.to_uci());
            }
            for (i, mv) in picked.iter().enumerate() {
                assert!(
                    !picked[..i].contains(mv),
                    "{} emitted twice on {fen}",
                    mv.to_uci()
                );
            }
        }
    }

    #[test]
    fn hash_move_comes_first() {
        let mut search = searcher("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let e4 = crate::moves::parse_uci_move(&search.board, "e2e4").unwrap();
        search.stack[0].tt_move = e4;
        let first = search.first_move(1).unwrap();
        assert_eq!(first, e4);
        let rest = {
            let mut out = vec![first];
            while let Some(m) = search.next_move(1) {
                out.push(m);
            }
            out
        };
        assert_eq!(rest.iter().filter(|m| **m == e4).count(), 1);
    }

    #[test]
    fn winning_capture_before_losing_capture() {
        // bxc4 wins a knight; Qxd5 walks into the e6 pawn.
        let mut search = searcher("4k3/8/4p3/3p4/2n5/1P6/3Q4/4K3 w - - 0 1");
        let moves = drain(&mut search, 1);
        let pxn = moves
            .iter()
            .position(|m| m.to_uci() == "b3c4")
            .expect("pawn takes knight");
        let qxp = moves
            .iter()
            .position(|m| m.to_uci() == "d2d5")
            .expect("queen takes pawn");
        assert!(pxn < qxp, "losing capture surfaced before winning one");
    }

    #[test]
    fn quiescence_depth_skips_quiets() {
        let mut search = searcher("4k3/8/8/3p4/8/2N5/8/4K3 w - - 0 1");
        let tactical = drain(&mut search, -1);
        assert!(!tactical.is_empty());
        assert!(tactical.iter().all(|m| m.is_capture() || m.is_promotion()));
    }

    #[test]
    fn killers_surface_after_captures() {
        let mut search = searcher("r3k3/1q6/8/8/8/8/6P1/4K2R w - - 0 1");
        let killer = crate::moves::parse_uci_move(&search.board, "g2g3").unwrap();
        search.stack[0].killers[1] = killer;
        let moves = drain(&mut search, 3);
        let killer_pos = moves.iter().position(|m| *m == killer).unwrap();
        let quiet_rook = moves
            .iter()
            .position(|m| m.to_uci() == "h1h5")
            .expect("rook quiet move present");
        assert!(killer_pos < quiet_rook, "killer did not jump the quiets");
    }

    #[test]
    fn losers_picker_is_captures_only_when_captures_exist() {
        let mut options = EngineOptions::default();
        options.wild = Variant::Losers;
        let mut search = Search::new(options);
        search.set_position(
            Board::from_str("4k3/8/8/3p4/2P5/8/8/4K3 w - - 0 1").unwrap(),
        );
        let moves = drain(&mut search, 3);
        assert_eq!(moves.len(), 1);
        assert!(moves[0].is_capture());
    }
}
