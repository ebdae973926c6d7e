//! Arena throughput benchmarks
//!
//! Run with: cargo bench --bench arena

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crystal_arena::game::arena::Arena;
use crystal_arena::game::state::{ArenaConfig, Screen};
use crystal_arena::game::systems::distribution::explode_crystals;

const KEYS: [&str; 4] = ["ArrowUp", "ArrowRight", "ArrowDown", "ArrowLeft"];

/// Arena of the given size with one player per cell row, plus seeded crystals
fn create_arena(size: i32, players: usize) -> Arena {
    let mut arena = Arena::with_seed(Screen::new(size, size), ArenaConfig::default(), 42);
    arena.seed_crystals(size as usize * 2);
    for i in 0..players {
        arena.add_player(&format!("Player{}", i), None, None);
    }
    arena
}

fn bench_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_player");

    for &players in &[10usize, 100, 500] {
        group.throughput(Throughput::Elements(players as u64));
        group.bench_with_input(BenchmarkId::from_parameter(players), &players, |b, &players| {
            let mut arena = create_arena(100, players);
            let ids: Vec<String> = (0..players).map(|i| format!("Player{}", i)).collect();
            let mut step = 0usize;
            b.iter(|| {
                for id in &ids {
                    arena.move_player(black_box(id), KEYS[step % 4]);
                    step += 1;
                }
            });
        });
    }

    group.finish();
}

fn bench_explosions(c: &mut Criterion) {
    let mut group = c.benchmark_group("explode_crystals");

    for &quantity in &[100u32, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(quantity),
            &quantity,
            |b, &quantity| {
                let mut arena = create_arena(25, 20);
                b.iter(|| explode_crystals(&mut arena, black_box(quantity), 12, 12));
            },
        );
    }

    group.finish();
}

fn bench_crystal_spawn(c: &mut Criterion) {
    c.bench_function("spawn_crystal_100_players", |b| {
        let mut arena = create_arena(50, 100);
        b.iter(|| black_box(arena.spawn_crystal()));
    });
}

criterion_group!(benches, bench_moves, bench_explosions, bench_crystal_spawn);
criterion_main!(benches);
