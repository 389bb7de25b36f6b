//! The tick schedule and the gameplay systems it drives. Systems run in
//! registration order; events published by a system are delivered to all
//! systems (again in registration order) before the next system starts.

pub mod drop;
pub mod inventory;
pub mod skills;
pub mod spawn;

use crate::combat::rng::CombatRng;
use crate::content::Registries;
use crate::ecs::{World, WorldEvent};

/// Everything a system sees while running: the world, the content
/// registries, the roll source, and the tick delta.
pub struct SystemContext<'a> {
    pub world: &'a mut World,
    pub registries: &'a Registries,
    pub rng: &'a mut dyn CombatRng,
    pub dt: f32,
}

/// One schedulable unit of game logic. `run` executes once per tick;
/// `handle_event` receives every world event published during the tick,
/// in publish order. Neither may block or suspend.
pub trait System {
    fn name(&self) -> &'static str;

    fn run(&mut self, ctx: &mut SystemContext<'_>);

    fn handle_event(&mut self, _ctx: &mut SystemContext<'_>, _event: &WorldEvent) {}
}

/// Priority-ordered system list. Order of `add` calls is both the run
/// order within a tick and the delivery order for events.
#[derive(Default)]
pub struct Schedule {
    systems: Vec<Box<dyn System>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    /// Advances the world by one tick: each system runs, then the events
    /// it published (and any cascades) are delivered before the next
    /// system starts.
    pub fn tick(
        &mut self,
        world: &mut World,
        registries: &Registries,
        rng: &mut dyn CombatRng,
        dt: f32,
    ) {
        world.elapsed_secs += dt as f64;

        for index in 0..self.systems.len() {
            {
                let mut ctx = SystemContext {
                    world: &mut *world,
                    registries,
                    rng: &mut *rng,
                    dt,
                };
                self.systems[index].run(&mut ctx);
            }
            self.deliver_events(world, registries, rng, dt);
        }
    }

    /// Drains the world's event queue into every system. Also called by
    /// the app after message handlers mutate the world outside the
    /// schedule.
    pub fn deliver_events(
        &mut self,
        world: &mut World,
        registries: &Registries,
        rng: &mut dyn CombatRng,
        dt: f32,
    ) {
        while let Some(event) = world.events.pop() {
            for index in 0..self.systems.len() {
                let mut ctx = SystemContext {
                    world: &mut *world,
                    registries,
                    rng: &mut *rng,
                    dt,
                };
                self.systems[index].handle_event(&mut ctx, &event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rng::ScriptedRng;
    use emberfall_shared::types::TilePoint;

    struct Publisher;
    struct Recorder {
        seen: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    }

    impl System for Publisher {
        fn name(&self) -> &'static str {
            "publisher"
        }

        fn run(&mut self, ctx: &mut SystemContext<'_>) {
            let entity = ctx.world.registry.create();
            ctx.world.events.publish(WorldEvent::EntityDeath {
                entity,
                killer: None,
                position: TilePoint::new(0, 0),
                map_id: 0,
            });
        }
    }

    impl System for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn run(&mut self, _ctx: &mut SystemContext<'_>) {
            self.seen.borrow_mut().push("run".into());
        }

        fn handle_event(&mut self, _ctx: &mut SystemContext<'_>, event: &WorldEvent) {
            if matches!(event, WorldEvent::EntityDeath { .. }) {
                self.seen.borrow_mut().push("death".into());
            }
        }
    }

    #[test]
    fn events_are_delivered_before_the_next_system_runs() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut schedule = Schedule::new();
        schedule.add(Box::new(Publisher));
        schedule.add(Box::new(Recorder { seen: seen.clone() }));

        let mut world = World::new();
        let registries = Registries::default();
        let mut rng = ScriptedRng::default();
        schedule.tick(&mut world, &registries, &mut rng, 0.05);

        // The publisher's death event arrives before the recorder's run.
        assert_eq!(*seen.borrow(), vec!["death".to_string(), "run".to_string()]);
        assert!(world.events.is_empty());
    }
}
