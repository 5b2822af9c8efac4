//! Criterion benchmarks: raw move generation throughput and the static
//! evaluation, the two hottest paths in the engine.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::str::FromStr;

use tempo::board::Board;
use tempo::eval::evaluate;
use tempo::moves::perft::perft;
use tempo::options::EngineOptions;
use tempo::search::{Search, SearchLimits};

fn perft_startpos(c: &mut Criterion) {
    c.bench_function("perft 4 startpos", |b| {
        let mut board = Board::new();
        b.iter(|| black_box(perft(&mut board, 4)));
    });
}

fn perft_kiwipete(c: &mut Criterion) {
    c.bench_function("perft 3 kiwipete", |b| {
        let mut board =
            Board::from_str("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        b.iter(|| black_box(perft(&mut board, 3)));
    });
}

fn evaluate_middlegame(c: &mut Criterion) {
    c.bench_function("evaluate middlegame", |b| {
        let mut options = EngineOptions::default();
        options.own_book = false;
        let mut search = Search::new(options);
        search.set_position(
            Board::from_str(
                "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
            )
            .unwrap(),
        );
        b.iter(|| {
            search.stack[0].eval_result = None;
            black_box(evaluate(&mut search))
        });
    });
}

fn search_fixed_depth(c: &mut Criterion) {
    c.bench_function("search depth 8", |b| {
        b.iter(|| {
            let mut options = EngineOptions::default();
            options.own_book = false;
            let mut search = Search::new(options);
            search.set_position(
                Board::from_str(
                    "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 3 3",
                )
                .unwrap(),
            );
            black_box(search.go(&SearchLimits {
                depth: Some(8),
                ..SearchLimits::default()
            }))
        });
    });
}

criterion_group!(
    benches,
    perft_startpos,
    perft_kiwipete,
    evaluate_middlegame,
    search_fixed_depth
);
criterion_main!(benches);
