//! Integration tests for the sandbox tick protocol
//!
//! These tests run compiled graphs in the executor:
//! - Physics integration
//! - Edge-triggered collision dispatch and filters
//! - Termination and error reporting

mod common;

use common::builders::{GraphBuilder, NodeBuilder};
use common::worlds::{block, empty_world, number_var, place, player_world};
use nodescript_rs::sandbox::{Phase, SandboxError, SandboxState, TickOutcome};
use nodescript_rs::world::{Entity, Vec2};

const COUNT_COLLISIONS: &str = r#"
fn on_collision(subject, other) {
    if subject == "a" {
        this.variables["hits"] = (this.variables["hits"] ?? 0) + 1;
    }
}
"#;

#[test]
fn test_gravity_step() {
    let mut executor = common::loaded_executor("fn update(delta) {}");
    let mut world = empty_world(1000.0).with_object(
        "ball",
        Entity::physics(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)),
    );
    executor.init(&mut world).unwrap();
    executor.tick(&mut world, 1.0).unwrap();

    let ball = world.object("ball").unwrap();
    assert_eq!(ball.velocity(), Some(Vec2::new(0.0, 1000.0)));
    assert_eq!(ball.position(), Vec2::new(0.0, 1000.0));
}

#[test]
fn test_sustained_overlap_fires_once() {
    let mut executor = common::loaded_executor(COUNT_COLLISIONS);
    let mut world = empty_world(0.0)
        .with_object("a", block(0.0, 0.0))
        .with_object("b", block(5.0, 0.0));
    executor.init(&mut world).unwrap();

    for _ in 0..3 {
        executor.tick(&mut world, 0.016).unwrap();
    }
    assert_eq!(number_var(&world, "hits"), Some(1.0));
    assert!(world.is_colliding("a", "b"));
    assert!(world.is_colliding("b", "a"));

    place(&mut world, "b", 100.0, 0.0);
    executor.tick(&mut world, 0.016).unwrap();
    assert!(world.collisions.is_empty());

    place(&mut world, "b", 5.0, 0.0);
    executor.tick(&mut world, 0.016).unwrap();
    executor.tick(&mut world, 0.016).unwrap();
    assert_eq!(number_var(&world, "hits"), Some(2.0));
}

#[test]
fn test_compiled_collision_filter() {
    let project = GraphBuilder::new()
        .node(
            NodeBuilder::new(1, "OnCollision")
                .param("subject", "player")
                .param("other", "coin"),
        )
        .node(NodeBuilder::new(2, "SetVariable").param("name", "hits"))
        .node(NodeBuilder::new(3, "Variable").param("name", "hits"))
        .node(NodeBuilder::new(4, "Constant").param("value", 1.0))
        .node(NodeBuilder::new(5, "Operator"))
        .then(1, 2)
        .data(3, "value", 5, "A")
        .data(4, "value", 5, "B")
        .data(5, "result", 2, "value")
        .into_project();
    let source = common::compile(&project);

    let mut executor = common::loaded_executor(&source);
    let mut world = player_world()
        .with_object("coin", block(4.0, 0.0))
        .with_object("wall", block(-4.0, 0.0));
    executor.init(&mut world).unwrap();
    executor.tick(&mut world, 0.016).unwrap();

    // (player, coin) matches; (coin, player), (player, wall), (wall, player) do not
    assert_eq!(number_var(&world, "hits"), Some(1.0));
}

#[test]
fn test_end_game_during_update() {
    let project = GraphBuilder::new()
        .node(NodeBuilder::new(1, "OnUpdate"))
        .node(NodeBuilder::new(2, "EndGame"))
        .then(1, 2)
        .into_project();
    let mut executor = common::loaded_executor(&common::compile(&project));
    let mut world = player_world();

    assert_eq!(executor.init(&mut world).unwrap(), TickOutcome::Continue);
    assert_eq!(executor.tick(&mut world, 0.1).unwrap(), TickOutcome::Ended);
    assert_eq!(executor.state(), SandboxState::Ended);
}

#[test]
fn test_end_game_during_init() {
    let project = GraphBuilder::new()
        .node(NodeBuilder::new(1, "OnStart"))
        .node(NodeBuilder::new(2, "EndGame"))
        .then(1, 2)
        .into_project();
    let mut executor = common::loaded_executor(&common::compile(&project));
    let mut world = player_world();
    assert_eq!(executor.init(&mut world).unwrap(), TickOutcome::Ended);
}

#[test]
fn test_runtime_error_is_structured() {
    let mut executor = common::loaded_executor(
        "fn update(delta) {\n    this.variables[\"seen\"] = true;\n    undefined_helper();\n}\n",
    );
    let mut world = player_world();
    executor.init(&mut world).unwrap();

    let err = executor.tick(&mut world, 0.1).unwrap_err();
    let detail = err.detail();
    assert_eq!(detail.phase, Phase::Update);
    assert_eq!(detail.line, Some(3));
    assert!(matches!(err, SandboxError::Runtime { .. }));

    // No rollback of mutations made before the failure
    assert_eq!(world.variable("seen"), Some(&serde_json::json!(true)));

    // The executor keeps running after an error
    assert_eq!(executor.state(), SandboxState::Running);
}

#[test]
fn test_reinit_resets_collision_history() {
    let mut executor = common::loaded_executor(COUNT_COLLISIONS);
    let fresh = empty_world(0.0)
        .with_object("a", block(0.0, 0.0))
        .with_object("b", block(5.0, 0.0));

    let mut world = fresh.clone();
    executor.init(&mut world).unwrap();
    executor.tick(&mut world, 0.016).unwrap();
    assert_eq!(number_var(&world, "hits"), Some(1.0));

    let mut world = fresh;
    executor.init(&mut world).unwrap();
    executor.tick(&mut world, 0.016).unwrap();
    assert_eq!(number_var(&world, "hits"), Some(1.0));
}

#[test]
fn test_timer_driven_end() {
    let project = GraphBuilder::new()
        .node(NodeBuilder::new(1, "OnStart"))
        .node(NodeBuilder::new(2, "StartTimer").param("timer", "t"))
        .node(NodeBuilder::new(3, "OnUpdate"))
        .node(NodeBuilder::new(4, "If"))
        .node(NodeBuilder::new(5, "Compare").param("operator", ">=").param("B", 0.45))
        .node(NodeBuilder::new(6, "TimerElapsed").param("timer", "t"))
        .node(NodeBuilder::new(7, "EndGame"))
        .then(1, 2)
        .then(3, 4)
        .data(6, "elapsed", 5, "A")
        .connection(
            common::builders::ConnectionBuilder::data(5, "result", 4, "condition")
                .ty(nodescript_rs::graph::SocketType::Boolean),
        )
        .connection(common::builders::ConnectionBuilder::flow(4, "true", 7))
        .into_project();

    let mut executor = common::loaded_executor(&common::compile(&project));
    let mut world = player_world();
    executor.init(&mut world).unwrap();

    let mut ticks = 0;
    while executor.tick(&mut world, 0.1).unwrap() == TickOutcome::Continue {
        ticks += 1;
        assert!(ticks < 20, "timer never ended the game");
    }
    assert_eq!(ticks, 4);
    common::assert_float_eq(world.timers["t"].elapsed, 0.5, 1e-9);
}

#[test]
fn test_compiled_division_is_not_truncated() {
    let project = GraphBuilder::new()
        .node(NodeBuilder::new(1, "OnStart"))
        .node(NodeBuilder::new(2, "SetVariable").param("name", "half"))
        .node(NodeBuilder::new(3, "Operator").param("operator", "/"))
        .node(NodeBuilder::new(4, "Constant").param("value", 1.0))
        .node(NodeBuilder::new(5, "Constant").param("value", 2.0))
        .then(1, 2)
        .data(4, "value", 3, "A")
        .data(5, "value", 3, "B")
        .data(3, "result", 2, "value")
        .into_project();
    let source = common::compile(&project);
    assert!(source.contains("1 / 2"));

    let mut executor = common::loaded_executor(&source);
    let mut world = player_world();
    executor.init(&mut world).unwrap();
    assert_eq!(number_var(&world, "half"), Some(0.5));
}
