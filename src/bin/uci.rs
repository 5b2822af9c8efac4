//! The UCI console: line-oriented protocol front-end.
//!
//! The main thread owns stdin and the engine state; `go` hands the
//! search to a worker thread and keeps listening so `stop` and
//! `ponderhit` stay responsive. The worker prints the `bestmove` line
//! itself, derived from the last completed iteration.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use tempo::board::{Board, Variant};
use tempo::options::{EngineOptions, HASH_MB_MAX, HASH_MB_MIN, KING_ATTACK_MAX};
use tempo::search::{Search, SearchLimits};

const NAME: &str = "tempo";
const AUTHOR: &str = "the tempo authors";

struct Engine {
    options: EngineOptions,
    search: Option<Search>,
    worker: Option<JoinHandle<Search>>,
    stop: Arc<AtomicBool>,
    ponder: Arc<AtomicBool>,
}

impl Engine {
    fn new() -> Engine {
        let options = EngineOptions::default();
        let mut search = Search::new(options.clone());
        search.verbose = true;
        Engine {
            options,
            stop: search.stop_signal.clone(),
            ponder: search.ponder_flag.clone(),
            search: Some(search),
            worker: None,
        }
    }

    /// Wait for a running search; the worker gives the engine back.
    fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(search) => self.search = Some(search),
                Err(_) => {
                    warn!("search thread panicked; rebuilding state");
                    let mut search = Search::new(self.options.clone());
                    search.verbose = true;
                    self.stop = search.stop_signal.clone();
                    self.ponder = search.ponder_flag.clone();
                    self.search = Some(search);
                }
            }
        }
    }

    fn stop_search(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.ponder.store(false, Ordering::Relaxed);
        self.join();
    }

    fn idle_search(&mut self) -> &mut Search {
        self.join();
        self.search.as_mut().expect("engine holds the search when idle")
    }

    fn cmd_uci(&self) {
        println!("id name {NAME}");
        println!("id author {AUTHOR}");
        println!(
            "option name Hash type spin default {} min {HASH_MB_MIN} max {HASH_MB_MAX}",
            self.options.hash_mb
        );
        println!("option name Ponder type check default false");
        println!("option name OwnBook type check default true");
        println!("option name BookFile type string default book.bin");
        println!("option name Wild type combo default standard var standard var losers");
        println!("option name NullMove type check default true");
        println!("option name NullVerify type check default true");
        println!("option name NullAdaptiveDepth type check default true");
        println!("option name NullAdaptiveValue type check default true");
        println!("option name AlphaPruning type check default true");
        println!("option name BetaPruning type check default true");
        println!("option name LMR type check default true");
        println!("option name FutilityPruning type check default true");
        println!("option name LateMovePruning type check default true");
        println!("option name PVExtensions type check default true");
        println!("option name KingAttackShelter type spin default 256 min 0 max {KING_ATTACK_MAX}");
        println!("option name KingAttackPieces type spin default 256 min 0 max {KING_ATTACK_MAX}");
        println!("option name UCI_AnalyseMode type check default false");
        println!("option name UCI_Chess960 type check default false");
        println!("option name UCI_Opponent type string default ");
        println!("uciok");
    }

    fn cmd_setoption(&mut self, rest: &str) {
        // setoption name <id ...> [value <x ...>]
        let mut name = String::new();
        let mut value = String::new();
        let mut target: Option<&mut String> = None;
        for token in rest.split_whitespace() {
            match token {
                "name" => target = Some(&mut name),
                "value" => target = Some(&mut value),
                word => {
                    if let Some(buf) = target.as_deref_mut() {
                        if !buf.is_empty() {
                            buf.push(' ');
                        }
                        buf.push_str(word);
                    }
                }
            }
        }
        let name_key = name.replace(' ', "");
        let old_hash = self.options.hash_mb;
        match self.options.set(&name_key, &value) {
            Ok(()) => {
                if name_key.eq_ignore_ascii_case("hash") {
                    if let Ok(requested) = value.parse::<usize>() {
                        if requested != self.options.hash_mb {
                            println!(
                                "info string Hash clamped to {} MB",
                                self.options.hash_mb
                            );
                        }
                    }
                }
                let options = self.options.clone();
                let search = self.idle_search();
                search.options = options;
                if search.options.hash_mb != old_hash {
                    search.tables.resize_tt(search.options.hash_mb);
                }
            }
            Err(err) => println!("info string {err}"),
        }
    }

    fn cmd_position(&mut self, rest: &str) {
        let mut tokens = rest.split_whitespace().peekable();
        let board = match tokens.peek().copied() {
            Some("startpos") => {
                tokens.next();
                Ok(Board::new())
            }
            Some("fen") => {
                tokens.next();
                let mut fen_fields = Vec::new();
                while let Some(&tok) = tokens.peek() {
                    if tok == "moves" {
                        break;
                    }
                    fen_fields.push(tok);
                    tokens.next();
                }
                Board::from_fen(&fen_fields.join(" "))
            }
            _ => Err("position needs startpos or fen".to_string()),
        };
        let mut board = match board {
            Ok(board) => board,
            Err(err) => {
                println!("info string {err}");
                return;
            }
        };

        let wild = self.options.wild;
        let search = self.idle_search();
        search.tables.rep.clear();
        if wild == Variant::Losers {
            board.variant = Variant::Losers;
            let hash = board.compute_hash();
            board.st_mut().hash = hash;
        }
        search
            .tables
            .rep
            .store(board.st().fifty as i32, board.st().hash);

        if tokens.peek() == Some(&"moves") {
            tokens.next();
            for text in tokens {
                let Some(mv) = tempo::moves::parse_uci_move(&board, text) else {
                    println!("info string illegal move {text}");
                    break;
                };
                board.forward(&mv);
                board.root_ply += 1;
                search
                    .tables
                    .rep
                    .store(board.st().fifty as i32, board.st().hash);
                // Keep the frame stack anchored; games outlast MAX_PLY.
                board.rebase();
            }
        }
        search.set_position(board);
    }

    fn cmd_go(&mut self, rest: &str) {
        fn next_num(tokens: &mut std::str::SplitWhitespace<'_>) -> Option<i64> {
            tokens.next().and_then(|v| v.parse().ok())
        }
        let mut limits = SearchLimits::default();
        let mut tokens = rest.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "depth" => limits.depth = next_num(&mut tokens).map(|v| v as i32),
                "nodes" => limits.nodes = next_num(&mut tokens).map(|v| v as u64),
                "movetime" => limits.movetime = next_num(&mut tokens),
                "wtime" => limits.wtime = next_num(&mut tokens),
                "btime" => limits.btime = next_num(&mut tokens),
                "winc" => limits.winc = next_num(&mut tokens).unwrap_or(0),
                "binc" => limits.binc = next_num(&mut tokens).unwrap_or(0),
                "movestogo" => limits.movestogo = next_num(&mut tokens).unwrap_or(0),
                "infinite" => limits.infinite = true,
                "ponder" => limits.ponder = true,
                _ => {}
            }
        }

        self.join();
        let Some(mut search) = self.search.take() else {
            return;
        };
        self.stop = search.stop_signal.clone();
        self.ponder = search.ponder_flag.clone();
        debug!(?limits, "go");
        self.worker = Some(std::thread::spawn(move || {
            let result = search.go(&limits);
            if result.best_move.is_empty() {
                println!("bestmove 0000");
            } else if result.ponder_move.is_empty() {
                println!("bestmove {}", result.best_move.to_uci());
            } else {
                println!(
                    "bestmove {} ponder {}",
                    result.best_move.to_uci(),
                    result.ponder_move.to_uci()
                );
            }
            search
        }));
    }

    fn run(&mut self) {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            let (command, rest) = match line.split_once(' ') {
                Some((head, tail)) => (head, tail),
                None => (line, ""),
            };
            match command {
                "uci" => self.cmd_uci(),
                "isready" => println!("readyok"),
                "ucinewgame" => {
                    let search = self.idle_search();
                    search.tables.clear();
                    search.set_position(Board::new());
                }
                "setoption" => self.cmd_setoption(rest),
                "position" => self.cmd_position(rest),
                "go" => self.cmd_go(rest),
                "stop" => self.stop_search(),
                "ponderhit" => self.ponder.store(false, Ordering::Relaxed),
                "quit" => {
                    self.stop_search();
                    break;
                }
                "" => {}
                other => println!("info string unknown command {other}"),
            }
        }
    }
}

fn main() {
    tempo::logger::init_logging("logs/tempo.log", "tempo=info");
    Engine::new().run();
}
