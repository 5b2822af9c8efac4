//! The principal variation search.
//!
//! Entry point `go` handles the book probe and drives iterative
//! deepening; each iteration runs through an aspiration window into the
//! root search, which applies the full-window/zero-window pattern over
//! the sorted root moves. The recursive `pvs` is fail-soft with the
//! whole pruning arsenal; `qsearch` resolves tactics at the horizon.
//! Losers chess swaps in its own recursion behind the same driver.

use once_cell::sync::Lazy;
use tracing::debug;

use crate::board::Variant;
use crate::eval::evaluate;
use crate::eval::score::{self, Bound, INF, MATE, WIN};
use crate::moves::types::{Move, Stage};
use crate::search::{Search, SearchLimits, SearchResult};

/*
 * Late-move reduction table: reductions grow with depth and with the
 * move's position in the ordering, following the measured distribution
 * of cutoff indices.
 */
const LMR_CUTOFF_PCT: [f64; 16] = [
    0.8835, 0.0618, 0.0221, 0.0101, 0.0051, 0.0028, 0.0018, 0.0011, 0.0008, 0.0007, 0.0007,
    0.0007, 0.0007, 0.0007, 0.0007, 0.0006,
];

static LMR_TABLE: Lazy<[[u8; 16]; 32]> = Lazy::new(|| {
    let mut table = [[0u8; 16]; 32];
    for (d, row) in table.iter_mut().enumerate() {
        for (m, cell) in row.iter_mut().enumerate() {
            let f = 0.01; // higher: more reductions near the tail
            let df = 0.25;
            let base_red = (d as f64 * df / 2.0).min(1.8);
            let extra_red = d as f64 * df;
            let pct = 1.0 - LMR_CUTOFF_PCT[m];
            let mul = (pct - (1.0 - f)).max(0.0) / f;
            *cell = (pct * base_red + mul * extra_red + 0.25) as u8;
        }
    }
    table
});

fn lmr_reduce(depth: i32, searched_moves: usize) -> i32 {
    LMR_TABLE[(depth.max(0) as usize).min(31)][searched_moves.min(15)] as i32
}

impl Search {
    /// Run a complete search under `limits` and return the decision.
    /// Emits UCI `info` lines along the way when verbose.
    pub fn go(&mut self, limits: &SearchLimits) -> SearchResult {
        self.prepare(limits);

        if self.options.own_book && self.board.variant == Variant::Standard {
            let path = self.options.book_file.clone();
            if let Some(mv) = crate::book::probe_file(&path, &self.board) {
                debug!(mv = %mv, "book hit");
                self.stack[0].best_move = mv;
                if self.verbose {
                    println!(
                        "info depth 1 score cp 0 nodes 1 time {} pv {}",
                        self.tm.elapsed_ms(),
                        mv.to_uci()
                    );
                }
                return self.result(1);
            }
        }

        let mut depth_reached = 0;
        if self.init_root_moves() > 0 {
            depth_reached = self.iterative_deepening();
        } else if self.board.variant == Variant::Losers {
            // Mated or stalemated in losers chess: the mover wins.
            self.result_score = MATE;
        } else {
            self.result_score = if self.root.in_check { -MATE } else { 0 };
        }
        self.result(depth_reached)
    }

    fn result(&mut self, depth: i32) -> SearchResult {
        SearchResult {
            best_move: self.stack[0].best_move,
            ponder_move: self.ponder_move,
            score: self.result_score,
            depth,
            nodes: self.nodes + self.pruned_nodes,
        }
    }

    /// Deepen until the clock, a mate, a node budget or the depth limit
    /// says stop. Returns the last completed depth.
    pub fn iterative_deepening(&mut self) -> i32 {
        let mut last_score = -INF;
        let max_time = self.tm.reserved_max();
        let min_time = self.tm.reserved_min();
        let timed = self.timed_search();
        let mut completed = 0;

        for depth in 1..=self.max_depth {
            let iter_score = self.aspiration(depth, last_score);
            if self.abort(true) {
                break;
            }
            completed = depth;
            self.store_pv();
            debug!(depth, score = iter_score, nodes = self.nodes, "iteration done");

            if timed && !self.pondering() {
                let score_jump = depth >= 6
                    && ((iter_score - last_score).abs() > 20 || iter_score > WIN);
                let elapsed = self.tm.elapsed_ms();
                if self.root.moves.len() <= 1 && (depth >= 8 || elapsed > min_time / 8) {
                    // Forced move; linger only long enough for a ponder
                    // move.
                    break;
                } else if elapsed > max_time / 2 {
                    break;
                } else if elapsed > min_time / 2 && !score_jump && self.root.is_easy() {
                    break;
                } else if elapsed > min_time && !score_jump && !self.root.is_complex() {
                    break;
                }
            }
            let mate_ply = score::mate_in_ply(iter_score);
            if mate_ply > 0 && depth > mate_ply {
                break;
            }
            last_score = iter_score;
        }

        if !self.stack[0].pv.is_empty() {
            let score = self.result_score;
            self.send_pv(score, completed.min(self.max_depth), Bound::Exact);
            if self.stack[0].pv.len() > 1 {
                self.ponder_move = self.stack[0].pv[1];
            }
        }
        completed
    }

    /// Search `depth` through a window around the previous score,
    /// doubling the width on failure before giving up on windows.
    pub fn aspiration(&mut self, depth: i32, last_score: i32) -> i32 {
        if depth >= 6 && !score::is_win(last_score) {
            let mut center = last_score;
            let mut window = 20;
            while window < 900 {
                let alpha = center - window;
                let beta = center + window;
                let score = self.pvs_root(alpha, beta, depth);
                if self.stop_all {
                    return score;
                }
                if score > alpha && score < beta {
                    return score;
                }
                if score::is_win(score) {
                    break;
                }
                center = score;
                window *= 2;
            }
        }
        self.pvs_root(-INF, INF, depth)
    }

    /// Root node: every move is searched, subtree sizes drive the next
    /// iteration's ordering and the easy-move heuristic.
    pub fn pvs_root(&mut self, mut alpha: i32, beta: i32, depth: i32) -> i32 {
        debug_assert!(!self.root.moves.is_empty());
        let mut best = -INF;
        let prev_best = self.stack[0].best_move;
        self.root.sort_moves(&prev_best);

        for i in 0..self.root.moves.len() {
            let mv = self.root.moves[i].mv;
            let gives_check = self.root.moves[i].gives_check;
            let nodes_before = self.nodes;
            let extend = i32::from(gives_check != 0);
            self.forward(&mv, gives_check);
            let mut score = 0;
            if i > 0 {
                score = -self.pvs(-alpha - 1, -alpha, depth - 1 + extend);
            }
            if i == 0 || score > alpha {
                score = -self.pvs(-beta, -alpha, depth - 1 + extend);
            }
            self.backward(&mv);
            self.root.moves[i].nodes += self.nodes - nodes_before;

            if self.stop_all {
                return alpha;
            }
            if score > best {
                best = score;
                self.result_score = score;
                self.stack[0].best_move = mv;
                let flag = score::flags(score, alpha, beta);
                let is_exact = flag == Bound::Exact;
                if is_exact || self.stack[0].pv.first() != Some(&mv) {
                    self.update_pv(&mv);
                }
                self.send_pv(best, depth, flag);
                if !is_exact {
                    // Out of the aspiration window; let the caller
                    // rebuild it.
                    return score;
                }
                debug_assert!(alpha < best);
                alpha = best;
            }
        }
        best
    }

    /// Fail-soft principal variation search.
    pub fn pvs(&mut self, mut alpha: i32, mut beta: i32, depth: i32) -> i32 {
        if self.board.variant == Variant::Losers {
            return self.losers_pvs(alpha, beta, -1, depth);
        }
        debug_assert!(alpha < beta);

        let ply = self.board.ply;
        self.stack[ply].pv.clear();
        self.sel_depth = self.sel_depth.max(ply as i32);
        self.stack[ply].best_move.clear();

        if depth < 1 {
            return self.qsearch(alpha, beta, 0);
        }

        /*
         * Stop conditions: abort, the ply ceiling, mate-distance
         * pruning, trivial draws.
         */
        self.nodes += 1;
        if self.abort(false) {
            return alpha;
        }
        if ply >= crate::board::MAX_PLY - 1 {
            return evaluate(self);
        }

        let alpha1 = alpha;
        if MATE - (ply as i32) < beta {
            beta = MATE - ply as i32;
            if alpha >= beta {
                return beta;
            }
        }
        if -MATE + (ply as i32) > alpha {
            alpha = -MATE + ply as i32;
            if beta <= alpha {
                return alpha;
            }
        }
        if self.is_draw() {
            return self.draw_score();
        }

        /*
         * Transposition table.
         */
        let pv = alpha + 1 < beta;
        self.stack[ply].tt_key = self.board.st().hash;
        let mut tt_move = Move::default();
        if let Some(probe) = self.tables.tt.probe(self.stack[ply].tt_key, ply as i32) {
            tt_move = probe.mv;
            if probe.depth >= depth {
                match probe.bound {
                    Bound::Exact if pv => return probe.score,
                    Bound::Lower if !pv && probe.score >= beta => return probe.score,
                    Bound::Upper if !pv && probe.score <= alpha => return probe.score,
                    _ => {}
                }
            }
        }
        self.stack[ply].tt_move = tt_move;

        /*
         * Node pruning: razoring, reverse futility, null move.
         */
        let in_check = self.stack[ply].in_check;
        let eval = evaluate(self);
        let do_prune_node = !in_check
            && !self.skip_null
            && !pv
            && alpha < WIN
            && beta > -WIN
            && self.board.has_pieces(self.board.us());

        let mg = 150 + self.eval_margin() + 50 * depth;
        if do_prune_node && eval + mg < alpha && depth < 4 && self.options.alpha_pruning {
            let delta = beta - mg;
            let razor_value = self.qsearch(delta - 1, delta, 0);
            if razor_value < delta {
                return razor_value;
            }
        }

        if do_prune_node && eval - mg > beta && depth < 4 && self.options.beta_pruning {
            return eval - mg;
        }

        if do_prune_node && eval >= beta && depth > 1 && self.options.null_move {
            let mut r = 3;
            if depth >= 7 && self.options.null_adaptive_depth {
                r += depth / 7;
            }
            if depth > r && eval - beta >= 100 && self.options.null_adaptive_value {
                r += ((eval - beta) / 100).min(3);
            }
            self.forward_null();
            let null_score = -self.pvs(-beta, -alpha, depth - 1 - r);
            self.backward_null();
            if self.stop_all {
                return alpha;
            }
            if null_score >= beta {
                const RV: i32 = 5;
                if self.options.null_verify && depth > RV {
                    self.skip_null = true;
                    let verified = self.pvs(alpha, beta, depth - 1 - RV);
                    self.skip_null = false;
                    if verified >= beta {
                        return verified;
                    }
                } else {
                    return null_score;
                }
            }
        }

        /*
         * Internal iterative deepening when the table has no move.
         */
        if depth >= 6 && self.stack[ply].tt_move.is_empty() {
            self.skip_null = pv;
            let r = if pv { 2 } else { 4 };
            let iid_score = self.pvs(alpha, beta, depth - r);
            if score::is_mate(iid_score) {
                return iid_score;
            }
            if !self.stack[ply].best_move.is_empty() {
                self.stack[ply].tt_move = self.stack[ply].best_move;
            }
        }

        /*
         * The moves loop.
         */
        let Some(mut mv) = self.first_move(depth) else {
            return if in_check {
                -MATE + ply as i32
            } else {
                self.draw_score()
            };
        };

        self.skip_null = false;
        self.stack[ply].searched.clear();
        self.stack[ply].best_move.clear();
        let mut best = -INF;
        let mut searched_moves = 0usize;
        let score_max = MATE - ply as i32 - 1;
        let do_ffp = !pv
            && depth < 8
            && eval + 40 * (depth + 1) <= alpha
            && self.options.futility_pruning;
        let do_lmp = !pv
            && depth < 4
            && eval + 20 * (depth + 1) <= alpha
            && self.options.late_move_pruning;

        loop {
            let gives_check = self.board.gives_check(&mv);

            let is_quiet_stage =
                self.stack[ply].move_list.stage == Stage::Stop && searched_moves > 0;
            let is_dangerous =
                !is_quiet_stage || in_check || gives_check != 0 || self.is_passed_pawn(&mv);
            let do_prune =
                !is_dangerous && searched_moves > 1 && best > -score::DEEPEST_MATE;

            // Futile quiet moves: the static eval cannot catch up.
            if do_prune && do_ffp {
                self.pruned_nodes += 1;
                if let Some(next) = self.next_move(depth) {
                    mv = next;
                    continue;
                }
                break;
            }
            // Late quiet moves in hopeless nodes.
            if do_prune && do_lmp && searched_moves >= (4 + 2 * depth) as usize {
                self.pruned_nodes += 1;
                if let Some(next) = self.next_move(depth) {
                    mv = next;
                    continue;
                }
                break;
            }

            /*
             * Extensions: checks always, plus tactical PV extensions at
             * low depth.
             */
            let mut extend = 0;
            if gives_check > 1 {
                extend = 1;
            } else if gives_check > 0 && (depth < 4 || pv || self.board.see(&mv) >= 0) {
                extend = 1;
            } else if pv && depth < 4 && self.options.pv_extensions && self.board.is_gain(&mv) {
                extend = 1;
            } else if pv
                && !in_check
                && self.options.pv_extensions
                && depth < 4
                && !mv.is_promotion()
                && self.is_passed_pawn(&mv)
            {
                extend = 1;
            }

            /*
             * Late move reductions for the quiet tail.
             */
            let mut reduce = 0;
            if depth > 1 && is_quiet_stage && self.options.lmr {
                reduce = lmr_reduce(depth, searched_moves);
                if reduce > 1 && is_dangerous {
                    reduce = 1;
                }
                debug_assert!(depth - reduce >= 1);
            }

            self.forward(&mv, gives_check);
            let mut score;
            if searched_moves == 0 {
                score = -self.pvs(-beta, -alpha, depth - 1 + extend);
            } else {
                score = -self.pvs(-alpha - 1, -alpha, depth - 1 - reduce + extend);
                if score > alpha && reduce > 0 {
                    score = -self.pvs(-alpha - 1, -alpha, depth - 1 + extend);
                }
                if pv && score > alpha {
                    score = -self.pvs(-beta, -alpha, depth - 1 + extend);
                }
            }
            self.backward(&mv);

            if self.stop_all {
                return alpha;
            }
            if score > best {
                self.stack[ply].best_move = mv;
                if score >= beta {
                    self.tables.tt.store(
                        self.stack[ply].tt_key,
                        self.tt_age(),
                        ply as i32,
                        depth,
                        score,
                        &mv,
                        Bound::Lower,
                    );
                    if !mv.is_tactical() {
                        self.update_killers(&mv, score);
                        self.update_history(&mv);
                        self.punish_searched(searched_moves);
                    }
                    return score;
                }
                best = score;
                if best > alpha {
                    self.update_pv(&mv);
                    alpha = best;
                }
                if best >= score_max {
                    break;
                }
            }
            self.stack[ply].searched.push(mv);
            searched_moves += 1;

            match self.next_move(depth) {
                Some(next) => mv = next,
                None => break,
            }
        }

        debug_assert!(!self.stop_all);
        debug_assert!(best > -INF && best < beta);
        let flag = score::flags(best, alpha1, beta);
        let best_move = self.stack[ply].best_move;
        self.tables.tt.store(
            self.stack[ply].tt_key,
            self.tt_age(),
            ply as i32,
            depth,
            best,
            &best_move,
            flag,
        );
        best
    }

    /// Quiescence: captures and promotions, quiet checks at depth 0,
    /// evasions when in check. Stand pat on the static eval.
    pub fn qsearch(&mut self, mut alpha: i32, mut beta: i32, depth: i32) -> i32 {
        debug_assert!(depth <= 0);
        let ply = self.board.ply;
        self.stack[ply].pv.clear();

        self.nodes += 1;
        if self.abort(false) {
            return alpha;
        }
        if ply >= crate::board::MAX_PLY - 1 {
            return evaluate(self);
        }

        if MATE - (ply as i32) < beta {
            beta = MATE - ply as i32;
            if alpha >= beta {
                return beta;
            }
        }
        if -MATE + (ply as i32) > alpha {
            alpha = -MATE + ply as i32;
            if beta <= alpha {
                return alpha;
            }
        }
        if self.is_draw() {
            return self.draw_score();
        }

        let eval = evaluate(self);
        let in_check = self.stack[ply].in_check;
        if eval >= beta && !in_check {
            return eval;
        }

        self.stack[ply].tt_move.clear();
        let Some(mut mv) = self.first_move(depth) else {
            if in_check {
                return -MATE + ply as i32;
            }
            // With no tactical moves at the qsearch entry the node is
            // quiet; deeper plies just stand pat.
            return if depth == 0 { self.draw_score() } else { eval };
        };
        if eval > alpha && !in_check {
            alpha = eval;
        }

        let fbase = eval + 50;
        let is_eg = !in_check && self.stack[ply].mt.is_eg();
        loop {
            let gives_check = self.board.gives_check(&mv);
            let dangerous = depth < 0
                || mv.is_capture()
                || in_check
                || gives_check != 0
                || mv.is_promotion()
                || mv.castle != 0;

            if !dangerous {
                debug_assert!(depth == 0);
                self.pruned_nodes += 1;
            } else {
                let do_prune = !in_check && gives_check == 0 && !is_eg;
                if do_prune && fbase + self.board.max_gain(&mv) <= alpha {
                    self.pruned_nodes += 1;
                } else if do_prune && fbase + self.board.see(&mv) <= alpha {
                    self.pruned_nodes += 1;
                } else {
                    self.forward(&mv, gives_check);
                    let score = -self.qsearch(-beta, -alpha, depth - 1);
                    self.backward(&mv);

                    if self.stop_all {
                        return alpha;
                    }
                    if score > alpha {
                        self.stack[ply].best_move = mv;
                        if score >= beta {
                            return score;
                        }
                        alpha = score;
                    }
                }
            }

            match self.next_move(depth) {
                Some(next) => mv = next,
                None => break,
            }
        }
        alpha
    }

    /// One UCI `info` line for the current root state.
    pub fn send_pv(&mut self, score: i32, depth: i32, flag: Bound) {
        if !self.verbose {
            return;
        }
        let elapsed = self.tm.elapsed_ms().max(1);
        let nodes = self.nodes + self.pruned_nodes;
        let nps = nodes as i64 * 1000 / elapsed;
        let score_text = if score::is_mate(score) {
            let plies = MATE - score.abs();
            let mate_moves = (plies + 1) / 2;
            if score > 0 {
                format!("mate {mate_moves}")
            } else {
                format!("mate -{mate_moves}")
            }
        } else {
            format!("cp {score}")
        };
        let bound_text = match flag {
            Bound::Lower => " lowerbound",
            Bound::Upper => " upperbound",
            _ => "",
        };
        let pv = self.pv_to_string();
        println!(
            "info depth {} seldepth {} score {}{} nodes {} time {} nps {} pv {}",
            depth, self.sel_depth, score_text, bound_text, nodes, elapsed, nps, pv
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::options::EngineOptions;
    use std::str::FromStr;

    fn search_fen(fen: &str, depth: i32) -> SearchResult {
        let mut options = EngineOptions::default();
        options.own_book = false;
        let mut search = Search::new(options);
        search.set_position(Board::from_str(fen).unwrap());
        search.go(&SearchLimits {
            depth: Some(depth),
            ..SearchLimits::default()
        })
    }

    #[test]
    fn finds_mate_in_one() {
        let result = search_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4);
        assert_eq!(result.best_move.to_uci(), "a1a8");
        assert!(score::is_mate(result.score));
    }

    #[test]
    fn grabs_a_hanging_queen() {
        let result = search_fen("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1", 4);
        assert_eq!(result.best_move.to_uci(), "d2d5");
    }

    #[test]
    fn reports_mated_positions() {
        let result = search_fen("6k1/5ppp/8/8/8/8/5PPP/q5K1 w - - 0 1", 3);
        assert!(result.best_move.is_empty());
        assert!(result.score <= -score::DEEPEST_MATE);
        let result = search_fen("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1", 3);
        assert!(result.best_move.is_empty());
        assert!(result.score <= -score::DEEPEST_MATE);
    }

    #[test]
    fn avoids_stalemating_with_heavy_material() {
        let result = search_fen("7k/8/6Q1/8/8/8/8/6K1 w - - 0 1", 6);
        // Any legal non-stalemating move keeps a mate score available.
        assert!(!result.best_move.is_empty());
        let mut board = Board::from_str("7k/8/6Q1/8/8/8/8/6K1 w - - 0 1").unwrap();
        let mv = crate::moves::parse_uci_move(&board, &result.best_move.to_uci()).unwrap();
        board.forward(&mv);
        assert!(!crate::moves::legal_moves(&board).is_empty() || board.in_check());
    }

    #[test]
    fn deterministic_research() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3";
        let a = search_fen(fen, 6);
        let b = search_fen(fen, 6);
        assert_eq!(a.best_move, b.best_move);
        assert_eq!(a.score, b.score);
    }
}
