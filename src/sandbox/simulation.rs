//! Native per-tick simulation: physics integration, timers and collision
//! detection. Runs before any script code each tick.

use crate::world::{CollisionMap, Entity, Vec2, WorldSnapshot};

/// Integrate every physics entity over `delta` seconds.
///
/// Gravity is added to the vertical acceleration, velocity and position are
/// advanced with explicit Euler steps and the acceleration is cleared, so
/// forces applied by scripts last exactly one tick.
pub fn apply_physics(world: &mut WorldSnapshot, delta: f64) {
    let gravity = world.constants.gravity;
    for entity in world.objects.values_mut() {
        if let Entity::Physics {
            position,
            velocity,
            acceleration,
            ..
        } = entity
        {
            acceleration.y += gravity;

            velocity.x += acceleration.x * delta;
            velocity.y += acceleration.y * delta;

            position.x += velocity.x * delta;
            position.y += velocity.y * delta;

            *acceleration = Vec2::ZERO;
        }
    }
}

/// Advance every active timer by `delta` seconds.
pub fn advance_timers(world: &mut WorldSnapshot, delta: f64) {
    for timer in world.timers.values_mut().filter(|t| t.active) {
        timer.elapsed += delta;
    }
}

/// Centered AABB test. Boxes that share an edge overlap.
pub fn overlaps(a: &Entity, b: &Entity) -> bool {
    let (pa, sa) = (a.position(), a.size());
    let (pb, sb) = (b.position(), b.size());

    let separated_x =
        pa.x + sa.x / 2.0 < pb.x - sb.x / 2.0 || pb.x + sb.x / 2.0 < pa.x - sa.x / 2.0;
    let separated_y =
        pa.y + sa.y / 2.0 < pb.y - sb.y / 2.0 || pb.y + sb.y / 2.0 < pa.y - sa.y / 2.0;

    !(separated_x || separated_y)
}

/// Recompute the symmetric collision map for all collidable entities.
/// Entities without any overlap have no entry.
pub fn detect_collisions(world: &WorldSnapshot) -> CollisionMap {
    let collidable: Vec<(&String, &Entity)> = world
        .objects
        .iter()
        .filter(|(_, e)| e.is_collidable())
        .collect();

    let mut map = CollisionMap::new();
    for (i, (id_a, a)) in collidable.iter().enumerate() {
        for (id_b, b) in &collidable[i + 1..] {
            if overlaps(a, b) {
                map.entry((*id_a).clone())
                    .or_default()
                    .insert((*id_b).clone());
                map.entry((*id_b).clone())
                    .or_default()
                    .insert((*id_a).clone());
            }
        }
    }
    map
}

/// Ordered pairs present in `now` but not in `previous`. Each unordered
/// overlap that starts this tick yields both `(a, b)` and `(b, a)`.
pub fn entered_pairs(previous: &CollisionMap, now: &CollisionMap) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (a, others) in now {
        let before = previous.get(a);
        for b in others {
            if !before.is_some_and(|set| set.contains(b)) {
                pairs.push((a.clone(), b.clone()));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Screen, Timer};

    fn boxed(x: f64, y: f64) -> Entity {
        Entity::fixed(Vec2::new(x, y), Vec2::new(10.0, 10.0))
    }

    #[test]
    fn test_gravity_integration() {
        let mut world = WorldSnapshot::new(Screen::default(), 1000.0)
            .with_object("ball", Entity::physics(Vec2::ZERO, Vec2::new(1.0, 1.0)));
        apply_physics(&mut world, 1.0);
        match world.object("ball").unwrap() {
            Entity::Physics {
                position,
                velocity,
                acceleration,
                ..
            } => {
                assert_eq!(*velocity, Vec2::new(0.0, 1000.0));
                assert_eq!(*position, Vec2::new(0.0, 1000.0));
                assert_eq!(*acceleration, Vec2::ZERO);
            }
            other => panic!("unexpected entity {:?}", other),
        }
    }

    #[test]
    fn test_static_entities_do_not_move() {
        let mut world =
            WorldSnapshot::new(Screen::default(), 1000.0).with_object("wall", boxed(5.0, 5.0));
        apply_physics(&mut world, 1.0);
        assert_eq!(world.object("wall").unwrap().position(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_only_active_timers_advance() {
        let mut world = WorldSnapshot::default();
        world.timers.insert(
            "run".into(),
            Timer {
                elapsed: 1.0,
                active: true,
            },
        );
        world.timers.insert(
            "paused".into(),
            Timer {
                elapsed: 1.0,
                active: false,
            },
        );
        advance_timers(&mut world, 0.5);
        assert_eq!(world.timers["run"].elapsed, 1.5);
        assert_eq!(world.timers["paused"].elapsed, 1.0);
    }

    #[test]
    fn test_overlap_edges() {
        assert!(overlaps(&boxed(0.0, 0.0), &boxed(9.0, 0.0)));
        assert!(overlaps(&boxed(0.0, 0.0), &boxed(10.0, 0.0)));
        assert!(!overlaps(&boxed(0.0, 0.0), &boxed(10.5, 0.0)));
        assert!(!overlaps(&boxed(0.0, 0.0), &boxed(0.0, -11.0)));
    }

    #[test]
    fn test_non_collidable_ignored() {
        let world = WorldSnapshot::default()
            .with_object("a", boxed(0.0, 0.0))
            .with_object("ghost", boxed(0.0, 0.0).with_collidable(false));
        assert!(detect_collisions(&world).is_empty());
    }

    #[test]
    fn test_entered_pairs() {
        let world = WorldSnapshot::default()
            .with_object("a", boxed(0.0, 0.0))
            .with_object("b", boxed(5.0, 0.0));
        let now = detect_collisions(&world);
        let first = entered_pairs(&CollisionMap::new(), &now);
        assert_eq!(
            first,
            vec![("a".to_string(), "b".to_string()), ("b".to_string(), "a".to_string())]
        );
        assert!(entered_pairs(&now, &now).is_empty());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_collision_map_is_symmetric(
            boxes in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0, any::<bool>()), 1..12)
        ) {
            let mut world = WorldSnapshot::default();
            for (i, (x, y, collidable)) in boxes.into_iter().enumerate() {
                let entity = boxed(x, y).with_collidable(collidable);
                world = world.with_object(format!("e{}", i), entity);
            }
            let map = detect_collisions(&world);

            for (id, others) in &map {
                // Property: entries exist only for colliding entities, never self
                prop_assert!(!others.is_empty());
                prop_assert!(!others.contains(id));
                for other in others {
                    prop_assert!(map.get(other).is_some_and(|back| back.contains(id)));
                }
            }
        }
    }
}
