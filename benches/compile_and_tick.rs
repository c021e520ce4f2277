//! Benchmarks for graph compilation and sandbox ticks
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nodescript_rs::compiler::CodeGenerator;
use nodescript_rs::config::SandboxLimits;
use nodescript_rs::graph::{CanvasPoint, Endpoint, GraphModel, Project, SceneId};
use nodescript_rs::sandbox::SandboxExecutor;
use nodescript_rs::world::{Entity, Screen, Vec2, WorldSnapshot};
use nodescript_rs::NodeCatalog;

/// An OnUpdate root followed by a chain of `len` Move nodes, each fed by an
/// Operator over two constants.
fn chain_project(len: usize) -> Project {
    let catalog = NodeCatalog::global();
    let mut graph = GraphModel::new();
    let root = graph.add_node("OnUpdate", CanvasPoint::default());

    let mut prev = root;
    for i in 0..len {
        let step = graph.add_node("Move", CanvasPoint::default());
        let op = graph.add_node("Operator", CanvasPoint::default());
        let a = graph.add_node("Constant", CanvasPoint::default());
        let b = graph.add_node("Constant", CanvasPoint::default());
        graph.set_parameter(a, "value", i as f64).unwrap();
        graph.set_parameter(b, "value", 0.5).unwrap();

        graph
            .connect(catalog, Endpoint::new(prev, "flow"), Endpoint::new(step, "flow"))
            .unwrap();
        graph
            .connect(catalog, Endpoint::new(a, "value"), Endpoint::new(op, "A"))
            .unwrap();
        graph
            .connect(catalog, Endpoint::new(b, "value"), Endpoint::new(op, "B"))
            .unwrap();
        graph
            .connect(catalog, Endpoint::new(op, "result"), Endpoint::new(step, "dx"))
            .unwrap();
        prev = step;
    }

    Project::new().with_scene(SceneId::new("main"), graph)
}

fn crowded_world(entities: usize) -> WorldSnapshot {
    let mut world = WorldSnapshot::new(Screen::default(), 980.0)
        .with_object("player", Entity::fixed(Vec2::new(0.0, 0.0), Vec2::new(50.0, 50.0)));
    for i in 0..entities {
        let x = (i % 20) as f64 * 30.0;
        let y = (i / 20) as f64 * 30.0;
        world = world.with_object(
            format!("body{}", i),
            Entity::physics(Vec2::new(x, y), Vec2::new(20.0, 20.0)),
        );
    }
    world
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_project");

    for len in [10, 100, 500].iter() {
        let project = chain_project(*len);
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::new("chain", len), &project, |b, project| {
            let generator = CodeGenerator::default();
            b.iter(|| black_box(generator.generate_project(project)));
        });
    }

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("executor_tick");
    let source = CodeGenerator::default()
        .generate_project(&chain_project(20))
        .source;

    for entities in [10, 100, 400].iter() {
        let mut executor = SandboxExecutor::new(&SandboxLimits::default());
        executor.load(&source).unwrap();
        let mut world = crowded_world(*entities);
        executor.init(&mut world).unwrap();

        group.throughput(Throughput::Elements(*entities as u64));
        group.bench_function(BenchmarkId::new("entities", entities), |b| {
            b.iter(|| black_box(executor.tick(&mut world, 1.0 / 60.0).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_tick);
criterion_main!(benches);
