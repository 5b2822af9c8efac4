//! Losers-chess search.
//!
//! The same machinery with the goal turned inside out: shedding every
//! piece wins, and being mated or stalemated wins too. Captures are
//! forcing, so the picker feeds them exclusively whenever one exists,
//! which keeps the tree narrow and deep. A dedicated mate-search mode
//! chases forced self-elimination lines; when it cannot finish inside
//! the horizon it reports a sentinel instead of a false evaluation.

use crate::eval::score::{self, Bound, INF, MATE};
use crate::moves::types::Move;
use crate::search::Search;

/// Returned from a quiet horizon inside our own mate search: the forced
/// sequence is promising but not proven within the remaining depth.
const UNFINISHED_MATE: i32 = 1000;

impl Search {
    /// Shortest conceivable forced self-elimination from here, in
    /// plies; the threshold for entering the mate-search mode.
    fn max_mate_depth(&self) -> i32 {
        2 * self.board.all(self.board.us()).count_ones() as i32 + 1
    }

    /// The variant's principal variation search. `in_mate_search` is -1
    /// outside mate search, else the side (0 black, 1 white) hunting the
    /// forced loss of its own men.
    pub fn losers_pvs(
        &mut self,
        mut alpha: i32,
        mut beta: i32,
        mate_search: i32,
        mut depth: i32,
    ) -> i32 {
        let ply = self.board.ply;
        self.nodes += 1;
        self.stack[ply].pv.clear();

        // A bare king wins; an opponent's bare king means we lost.
        let us = self.board.us();
        if crate::bitboard::max_1(self.board.all(us)) {
            return MATE - ply as i32;
        }
        if crate::bitboard::max_1(self.board.all(!us)) {
            return -MATE + ply as i32;
        }

        if self.is_draw() {
            return self.draw_score();
        }

        if self.abort(false) {
            return alpha;
        }
        self.sel_depth = self.sel_depth.max(ply as i32);
        if ply >= crate::board::MAX_PLY - 1 {
            return crate::eval::losers::evaluate(self);
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

        /*
         * Transposition lookup; the variant-salted key keeps these
         * entries apart from standard chess.
         */
        self.stack[ply].tt_key = self.board.st().hash;
        let mut tt_move = Move::default();
        if depth > 0 {
            if let Some(probe) = self.tables.tt.probe(self.stack[ply].tt_key, ply as i32) {
                tt_move = probe.mv;
                if probe.depth >= depth {
                    match probe.bound {
                        Bound::Exact => return probe.score,
                        Bound::Lower if probe.score >= beta => return probe.score,
                        Bound::Upper if probe.score <= alpha => return probe.score,
                        _ => {}
                    }
                }
            }
        }
        self.stack[ply].tt_move = tt_move;

        // No move at all is checkmate or stalemate: both win here.
        let Some(first) = self.first_move(0) else {
            return MATE - ply as i32;
        };

        /*
         * Quiet horizon handling. Inside our own mate search a quiet
         * position means the forced sequence fizzled; inside theirs it
         * is simply evaluated. Otherwise shallow depths flip into mate
         * search, deeper ones shed a ply to keep the tree bounded.
         */
        let in_check = self.stack[ply].in_check;
        let quiet_pos = !first.is_capture() && !in_check;
        let pv = alpha + 1 < beta;
        let mut mate_search = mate_search;
        let us_ix = us as i32;
        let them_ix = 1 - us_ix;
        if quiet_pos {
            if depth <= 0 {
                if mate_search == us_ix {
                    return UNFINISHED_MATE + ply as i32;
                }
                return crate::eval::losers::evaluate(self);
            } else if mate_search == them_ix {
                return crate::eval::losers::evaluate(self);
            } else if mate_search == -1 && depth < self.max_mate_depth() {
                mate_search = us_ix;
            } else if mate_search == -1 {
                depth -= 1;
            }
        }

        /*
         * The moves loop: plain PVS, no reductions or pruning; the
         * forced-capture rule already prunes harder than heuristics
         * could.
         */
        let mut mv = first;
        self.stack[ply].searched.clear();
        self.stack[ply].best_move.clear();
        let mut best = -INF;
        let mut searched_moves = 0usize;
        let score_max = MATE - ply as i32 - 1;

        loop {
            let gives_check = self.board.gives_check(&mv);
            self.forward(&mv, gives_check);
            let mut score;
            if searched_moves == 0 {
                score = -self.losers_pvs(-beta, -alpha, mate_search, depth - 1);
            } else {
                score = -self.losers_pvs(-alpha - 1, -alpha, mate_search, depth - 1);
                if pv && score > alpha {
                    score = -self.losers_pvs(-beta, -alpha, mate_search, depth - 1);
                }
            }
            self.backward(&mv);

            if self.stop_all {
                return alpha;
            }
            if score > best {
                self.stack[ply].best_move = mv;
                if score >= beta {
                    if depth > 0 {
                        self.tables.tt.store(
                            self.stack[ply].tt_key,
                            self.tt_age(),
                            ply as i32,
                            depth,
                            score,
                            &mv,
                            Bound::Lower,
                        );
                        if !mv.is_capture() && !mv.is_promotion() {
                            self.update_killers(&mv, score);
                            self.update_history(&mv);
                            self.punish_searched(searched_moves);
                        }
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

            match self.next_move(0) {
                Some(next) => mv = next,
                None => break,
            }
        }

        debug_assert!(best > -INF && best < beta);
        if depth > 0 {
            let flag = score::flags(best, alpha, beta);
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
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Variant};
    use crate::options::EngineOptions;
    use crate::search::SearchLimits;
    use std::str::FromStr;

    fn losers_search(fen: &str, depth: i32) -> crate::search::SearchResult {
        let mut options = EngineOptions::default();
        options.wild = Variant::Losers;
        options.own_book = false;
        let mut search = Search::new(options);
        search.set_position(Board::from_str(fen).unwrap());
        search.go(&SearchLimits {
            depth: Some(depth),
            ..SearchLimits::default()
        })
    }

    #[test]
    fn feeds_the_last_piece_to_win() {
        // Offering the knight to the d5 pawn forces dxc4 (or dxe4) and
        // leaves white with the bare king.
        let result = losers_search("4k3/8/8/3p4/8/8/3N4/4K3 w - - 0 1", 6);
        let uci = result.best_move.to_uci();
        assert!(
            uci == "d2c4" || uci == "d2e4",
            "expected a knight sacrifice, got {uci}"
        );
        assert!(score::is_mate(result.score), "score {}", result.score);
    }

    #[test]
    fn forced_capture_is_played() {
        let result = losers_search("4k3/8/8/3p4/2P5/8/8/4K3 w - - 0 1", 4);
        assert_eq!(result.best_move.to_uci(), "c4d5");
    }

    #[test]
    fn losers_and_standard_tt_entries_do_not_collide() {
        let fen = "4k3/8/8/3p4/2P5/8/8/4K3 w - - 0 1";
        let standard = Board::from_fen(fen).unwrap();
        let losers = Board::from_fen_variant(fen, Variant::Losers).unwrap();
        assert_ne!(standard.st().hash, losers.st().hash);
    }
}
