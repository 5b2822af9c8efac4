//! Search context: the per-ply stack, root move bookkeeping and the
//! helpers shared by the standard and losers searches.
//!
//! One `Search` owns the board, the hash tables and a contiguous array of
//! per-ply frames; every cross-ply reference is an index, and each frame
//! carries its own move list and searched-move log so the recursion never
//! allocates.

pub mod losers;
pub mod picker;
pub mod search;
pub mod see;
pub mod time;
pub mod tt;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrayvec::ArrayVec;

use crate::bitboard::bit;
use crate::board::piece::BKING;
use crate::board::{Board, MAX_PLY, Variant};
use crate::eval::score::{self, Score};
use crate::moves::types::{MAX_MOVES, Move, MoveList};
use crate::options::EngineOptions;
use tt::{MaterialEntry, PawnEntry, SearchTables};

const HISTORY_MAX: i32 = 2000;
const HISTORY_DIV: i32 = 64;
const NODES_BETWEEN_POLLS: i32 = 5000;

/// Everything one ply of search owns.
pub struct SearchFrame {
    pub move_list: MoveList,
    /// Quiet-move log for history penalties on a cutoff.
    pub searched: ArrayVec<Move, MAX_MOVES>,
    pub current_move: Move,
    pub best_move: Move,
    pub tt_move: Move,
    /// Mate killer plus two ordinary killers.
    pub killers: [Move; 3],
    pub pv: ArrayVec<Move, MAX_PLY>,
    pub in_check: bool,
    /// Cached static evaluation; `None` until computed, and never
    /// computed in check.
    pub eval_result: Option<i32>,
    /// Per-piece-code evaluation terms, filled by the piece evaluator
    /// and reused by the next ply when the pawn skeleton is unchanged.
    pub pc_score: [Score; 13],
    pub passer_score: [Score; 2],
    /// King-zone pressure per piece code: `mg` counts attackers, `eg`
    /// accumulates square-weight units.
    pub king_attack: [Score; 13],
    /// Squares attacked per piece code on the pawns-and-kings skeleton.
    pub attack: [u64; 13],
    pub pt: PawnEntry,
    pub mt: MaterialEntry,
    pub tt_key: u64,
}

impl Default for SearchFrame {
    fn default() -> Self {
        SearchFrame {
            move_list: MoveList::default(),
            searched: ArrayVec::new(),
            current_move: Move::default(),
            best_move: Move::default(),
            tt_move: Move::default(),
            killers: [Move::default(); 3],
            pv: ArrayVec::new(),
            in_check: false,
            eval_result: None,
            pc_score: [Score::ZERO; 13],
            passer_score: [Score::ZERO; 2],
            king_attack: [Score::ZERO; 13],
            attack: [0; 13],
            pt: PawnEntry::default(),
            mt: MaterialEntry::default(),
            tt_key: 0,
        }
    }
}

pub struct RootMove {
    pub mv: Move,
    pub gives_check: u8,
    pub see: i32,
    /// Subtree size from the last iteration, the sort key and the
    /// easy-move signal.
    pub nodes: u64,
}

#[derive(Default)]
pub struct Root {
    pub moves: Vec<RootMove>,
    pub fifty_count: i32,
    pub in_check: bool,
}

impl Root {
    /// The position is complex when some alternative consumed at least as
    /// many nodes as the first move.
    pub fn is_complex(&self) -> bool {
        let n0 = self.moves[0].nodes;
        self.moves.iter().skip(1).any(|m| m.nodes >= n0)
    }

    /// Easy when the first move's subtree dwarfs every alternative.
    pub fn is_easy(&self) -> bool {
        let n0 = self.moves[0].nodes / 8;
        self.moves.iter().skip(1).all(|m| m.nodes < n0)
    }

    /// Stable sort: previous best move first, then subtree size, with
    /// the static exchange value as the final tie-break.
    pub fn sort_moves(&mut self, best: &Move) {
        self.moves.sort_by(|a, b| {
            let a_best = a.mv == *best;
            let b_best = b.mv == *best;
            b_best
                .cmp(&a_best)
                .then(b.nodes.cmp(&a.nodes))
                .then(b.see.cmp(&a.see))
        });
    }
}

pub struct SearchResult {
    pub best_move: Move,
    pub ponder_move: Move,
    pub score: i32,
    pub depth: i32,
    pub nodes: u64,
}

/// Per-search limits distilled from a `go` command.
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub movetime: Option<i64>,
    pub wtime: Option<i64>,
    pub btime: Option<i64>,
    pub winc: i64,
    pub binc: i64,
    pub movestogo: i64,
    pub infinite: bool,
    pub ponder: bool,
}

pub struct Search {
    pub board: Board,
    pub tables: SearchTables,
    pub options: EngineOptions,
    pub tm: time::TimeManager,
    pub stack: Box<[SearchFrame]>,
    pub root: Root,
    pub history: [[i32; 64]; BKING as usize + 1],
    pub nodes: u64,
    pub pruned_nodes: u64,
    pub max_nodes: u64,
    pub max_depth: i32,
    pub sel_depth: i32,
    pub result_score: i32,
    pub stop_all: bool,
    pub skip_null: bool,
    pub next_poll: i32,
    pub ponder_move: Move,
    /// Set by the driver thread to abort the running search.
    pub stop_signal: Arc<AtomicBool>,
    /// High while `go ponder` is thinking on the opponent's time;
    /// cleared by `ponderhit`.
    pub ponder_flag: Arc<AtomicBool>,
    /// Emit `info`/`bestmove` lines on stdout.
    pub verbose: bool,
}

impl Search {
    pub fn new(options: EngineOptions) -> Search {
        let tables = SearchTables::new(options.hash_mb);
        let mut stack = Vec::with_capacity(MAX_PLY + 2);
        stack.resize_with(MAX_PLY + 2, SearchFrame::default);
        Search {
            board: Board::new(),
            tables,
            options,
            tm: time::TimeManager::default(),
            stack: stack.into_boxed_slice(),
            root: Root::default(),
            history: [[0; 64]; BKING as usize + 1],
            nodes: 0,
            pruned_nodes: 0,
            max_nodes: 0,
            max_depth: MAX_PLY as i32 - 1,
            sel_depth: 0,
            result_score: 0,
            stop_all: false,
            skip_null: false,
            next_poll: 0,
            ponder_move: Move::default(),
            stop_signal: Arc::new(AtomicBool::new(false)),
            ponder_flag: Arc::new(AtomicBool::new(false)),
            verbose: false,
        }
    }

    /// Install a new root position; the variant follows the options.
    pub fn set_position(&mut self, mut board: Board) {
        board.variant = self.options.wild;
        let hash = board.compute_hash();
        board.st_mut().hash = hash;
        self.board = board;
    }

    /// Reset per-search state, keeping the tables warm.
    pub fn prepare(&mut self, limits: &SearchLimits) {
        self.board.rebase();
        self.nodes = 0;
        self.pruned_nodes = 0;
        self.sel_depth = 0;
        self.result_score = 0;
        self.stop_all = false;
        self.skip_null = false;
        self.next_poll = 0;
        self.ponder_move.clear();
        self.root = Root::default();
        self.history = [[0; 64]; BKING as usize + 1];
        for frame in self.stack.iter_mut() {
            *frame = SearchFrame::default();
        }
        self.stop_signal.store(false, Ordering::Relaxed);
        self.ponder_flag.store(limits.ponder, Ordering::Relaxed);

        self.max_depth = limits.depth.unwrap_or(MAX_PLY as i32 - 1).clamp(1, MAX_PLY as i32 - 1);
        self.max_nodes = limits.nodes.unwrap_or(0);
        self.tm.start();
        if let Some(ms) = limits.movetime {
            self.tm.set_move_time(ms);
        } else if limits.wtime.is_some() || limits.btime.is_some() {
            let wtm = self.board.us();
            let (my, opp) = if wtm {
                (limits.wtime.unwrap_or(0), limits.btime.unwrap_or(0))
            } else {
                (limits.btime.unwrap_or(0), limits.wtime.unwrap_or(0))
            };
            let (my_inc, opp_inc) = if wtm {
                (limits.winc, limits.binc)
            } else {
                (limits.binc, limits.winc)
            };
            self.tm.set(my, opp, my_inc, opp_inc, limits.movestogo);
        } else {
            self.tm.set_infinite();
        }
    }

    #[inline(always)]
    pub fn ply(&self) -> usize {
        self.board.ply
    }

    #[inline(always)]
    pub fn timed_search(&self) -> bool {
        !self.tm.is_infinite()
    }

    #[inline(always)]
    pub fn pondering(&self) -> bool {
        self.options.ponder && self.ponder_flag.load(Ordering::Relaxed)
    }

    /// Poll the stop conditions; sets and returns the abort flag.
    pub fn abort(&mut self, force_poll: bool) -> bool {
        let mut result = false;
        if self.max_nodes > 0 && self.nodes >= self.max_nodes {
            result = true;
        } else if self.stop_all || self.stop_signal.load(Ordering::Relaxed) {
            result = true;
        } else {
            self.next_poll -= 1;
            if force_poll || self.next_poll <= 0 {
                self.next_poll = NODES_BETWEEN_POLLS;
                result = !self.pondering()
                    && self.tm.time_is_up()
                    && !self.stack[0].best_move.is_empty();
            }
        }
        self.stop_all = result;
        result
    }

    #[inline(always)]
    pub fn forward(&mut self, mv: &Move, gives_check: u8) {
        let ply = self.ply();
        self.stack[ply].current_move = *mv;
        self.board.forward(mv);
        let next = &mut self.stack[ply + 1];
        next.in_check = gives_check != 0;
        next.eval_result = None;
    }

    #[inline(always)]
    pub fn backward(&mut self, mv: &Move) {
        self.board.backward(mv);
    }

    #[inline(always)]
    pub fn forward_null(&mut self) {
        let ply = self.ply();
        self.skip_null = true;
        self.stack[ply].current_move.clear();
        self.board.forward_null();
        let next = &mut self.stack[ply + 1];
        next.in_check = false;
        next.eval_result = None;
    }

    #[inline(always)]
    pub fn backward_null(&mut self) {
        self.board.backward_null();
        self.skip_null = false;
    }

    /// Prepend `mv` to the child PV.
    pub fn update_pv(&mut self, mv: &Move) {
        let ply = self.ply();
        let child_pv = self.stack[ply + 1].pv.clone();
        let pv = &mut self.stack[ply].pv;
        pv.clear();
        pv.push(*mv);
        for m in child_pv {
            if pv.is_full() {
                break;
            }
            pv.push(m);
        }
    }

    /// Remember a quiet cutoff move; forced-mate cutoffs get the
    /// dedicated slot.
    pub fn update_killers(&mut self, mv: &Move, score: i32) {
        debug_assert!(!mv.is_tactical());
        let killers = &mut self.stack[self.board.ply].killers;
        if score::is_mate(score) {
            killers[0] = *mv;
            return;
        }
        if killers[1] == *mv {
            return;
        }
        killers[2] = killers[1];
        killers[1] = *mv;
    }

    #[inline(always)]
    pub fn is_killer(&self, mv: &Move) -> bool {
        if mv.is_capture() {
            return false;
        }
        let killers = &self.stack[self.board.ply].killers;
        killers.iter().any(|k| k == mv)
    }

    /// Saturating bump toward the cap for a quiet move that cut off.
    pub fn update_history(&mut self, mv: &Move) {
        debug_assert!(!mv.is_tactical());
        let record = &mut self.history[mv.piece as usize][mv.to as usize];
        *record += (HISTORY_MAX - *record) / HISTORY_DIV;
    }

    /// Penalize the quiet moves tried before the cutoff move.
    pub fn punish_searched(&mut self, searched_moves: usize) {
        let ply = self.board.ply;
        let shift = searched_moves.min(31) as u32;
        for i in 0..self.stack[ply].searched.len() {
            let m = self.stack[ply].searched[i];
            if !m.is_tactical() {
                self.history[m.piece as usize][m.to as usize] >>= shift;
            }
        }
    }

    /// Did this move push a passed pawn? Valid once evaluation ran for
    /// the ply.
    #[inline(always)]
    pub fn is_passed_pawn(&self, mv: &Move) -> bool {
        bit(mv.from) & self.stack[self.board.ply].pt.passers != 0
    }

    /// Official draw: dead material, the fifty-move rule or repetition.
    /// The repetition scan walks same-side frames backward, bounded by
    /// the halfmove clock, and consults the game-path table below the
    /// root.
    pub fn is_draw(&self) -> bool {
        if self.board.variant == Variant::Standard && self.board.is_draw_material() {
            return true;
        }
        let fifty = self.board.st().fifty as i32;
        if fifty > 3 {
            let in_check = self.stack[self.board.ply].in_check as i32;
            if fifty >= 100 + in_check {
                return true;
            }
            let ply = self.board.ply as i32;
            let stop_ply = ply - fifty;
            let key = self.board.st().hash;
            let mut back = ply - 4;
            while back >= stop_ply {
                if back >= 0 {
                    if self.board.frame(back as usize).hash == key {
                        return true;
                    }
                } else if self.tables.rep.probe(self.root.fifty_count + back) == key {
                    return true;
                }
                back -= 2;
            }
        }
        false
    }

    #[inline(always)]
    pub fn draw_score(&self) -> i32 {
        score::DRAW
    }

    /// Positional margin for razoring and reverse futility: volatile
    /// terms (king attack, passers) widen it.
    pub fn eval_margin(&self) -> i32 {
        let frame = &self.stack[self.board.ply];
        if frame.in_check {
            return 0;
        }
        debug_assert!(frame.eval_result.is_some());
        let phase = frame.mt.phase as i32;
        (frame.pc_score[crate::board::piece::WKING as usize].interpolate(phase)).abs()
            + (frame.pc_score[BKING as usize].interpolate(phase)).abs()
            + (frame.passer_score[0].interpolate(phase)).abs()
            + (frame.passer_score[1].interpolate(phase)).abs()
    }

    /// Age tag for transposition entries.
    #[inline(always)]
    pub fn tt_age(&self) -> u32 {
        self.board.root_ply & 63
    }

    /// Generate and annotate the root moves; returns the move count.
    pub fn init_root_moves(&mut self) -> usize {
        self.root.moves.clear();
        self.root.fifty_count = self.board.st().fifty as i32;
        self.tables
            .rep
            .store(self.root.fifty_count, self.board.st().hash);

        let tt_move = self
            .tables
            .tt
            .probe(self.board.st().hash, 0)
            .map(|probe| probe.mv)
            .unwrap_or_default();
        self.stack[0].tt_move = tt_move;
        self.stack[0].tt_key = self.board.st().hash;
        self.stack[0].best_move.clear();
        self.stack[0].in_check = self.board.in_check();
        self.root.in_check = self.stack[0].in_check;

        for mut mv in crate::moves::legal_moves(&self.board) {
            let gives_check = self.board.gives_check(&mv);
            let see = self.board.see(&mv);
            mv.score = 0;
            self.root.moves.push(RootMove {
                mv,
                gives_check,
                see,
                nodes: (see / 100).max(0) as u64,
            });
        }
        self.root.moves.len()
    }

    /// Stitch the PV back into the transposition table so the next
    /// iteration re-searches it first.
    pub fn store_pv(&mut self) {
        let pv: Vec<Move> = self.stack[0].pv.iter().copied().collect();
        let mut replayed = 0;
        for (i, mv) in pv.iter().enumerate() {
            if i > 0 {
                let key = self.board.st().hash;
                let stored = self.tables.tt.probe(key, 0).map(|p| p.mv);
                if stored != Some(*mv) {
                    self.tables
                        .tt
                        .store(key, self.tt_age(), 0, 1, 0, mv, score::Bound::None);
                }
            }
            let mut legal = *mv;
            if !self.board.valid(&legal) || !self.board.legal(&mut legal) {
                break;
            }
            self.board.forward(&legal);
            replayed += 1;
        }
        for mv in pv[..replayed].iter().rev() {
            self.board.backward(mv);
        }
    }

    /// Render the PV, extended from the table when it runs short.
    pub fn pv_to_string(&mut self) -> String {
        let pv: Vec<Move> = self.stack[0].pv.iter().copied().collect();
        let mut out = String::new();
        let mut replayed = 0;
        for mv in &pv {
            out.push_str(&mv.to_uci());
            out.push(' ');
            let mut legal = *mv;
            if !self.board.valid(&legal) || !self.board.legal(&mut legal) {
                break;
            }
            self.board.forward(&legal);
            replayed += 1;
        }
        if replayed == pv.len() && pv.len() < 8 {
            let mut extras: Vec<Move> = Vec::new();
            for _ in 0..8 {
                let probe = self.tables.tt.probe(self.board.st().hash, 0);
                let Some(probe) = probe else { break };
                let mut mv = probe.mv;
                if mv.is_empty() || !self.board.valid(&mv) || !self.board.legal(&mut mv) {
                    break;
                }
                out.push_str(&mv.to_uci());
                out.push(' ');
                self.board.forward(&mv);
                extras.push(mv);
            }
            for mv in extras.iter().rev() {
                self.board.backward(mv);
            }
        }
        for mv in pv[..replayed].iter().rev() {
            self.board.backward(mv);
        }
        out.trim_end().to_string()
    }
}
