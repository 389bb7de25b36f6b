//! Monster AI state-machine behavior, driven tick by tick with a
//! deterministic roll source.

use emberfall_server::ai::MonsterAiSystem;
use emberfall_server::combat::{CombatConfig, ScriptedRng};
use emberfall_server::ecs::{
    Attributes, Combat, Entity, Identity, MonsterAggro, MonsterAi, MonsterState, World, WorldEvent,
};
use emberfall_server::systems::{System, SystemContext};
use emberfall_server::Registries;
use emberfall_shared::config::MonsterAiKind;
use emberfall_shared::types::TilePoint;

struct Rig {
    world: World,
    registries: Registries,
    rng: ScriptedRng,
    system: MonsterAiSystem,
}

impl Rig {
    fn new() -> Self {
        Self {
            world: World::new(),
            registries: Registries::default(),
            rng: ScriptedRng::default(),
            system: MonsterAiSystem::new(CombatConfig::default()),
        }
    }

    fn step(&mut self, dt: f32) {
        let mut ctx = SystemContext {
            world: &mut self.world,
            registries: &self.registries,
            rng: &mut self.rng,
            dt,
        };
        self.system.run(&mut ctx);
    }

    fn deliver(&mut self, event: WorldEvent) {
        let mut ctx = SystemContext {
            world: &mut self.world,
            registries: &self.registries,
            rng: &mut self.rng,
            dt: 0.0,
        };
        self.system.handle_event(&mut ctx, &event);
    }

    fn spawn_monster(&mut self, kind: MonsterAiKind, position: TilePoint) -> Entity {
        let entity = self.world.spawn_at(position, 1);
        self.world.registry.monster_ai.insert(
            entity,
            MonsterAi {
                kind,
                return_position: position,
                ..Default::default()
            },
        );
        self.world
            .registry
            .monster_aggro
            .insert(entity, MonsterAggro::default());
        self.world.registry.attributes.insert(
            entity,
            Attributes {
                hp: 100,
                max_hp: 100,
                attack: 10,
                ..Default::default()
            },
        );
        self.world.registry.combat.insert(
            entity,
            Combat {
                attack_range: 3,
                ..Default::default()
            },
        );
        entity
    }

    fn spawn_player(&mut self, position: TilePoint) -> Entity {
        let entity = self.world.spawn_at(position, 1);
        self.world.registry.identities.insert(
            entity,
            Identity {
                persistent_id: 1,
                account_id: 1,
                name: "player".into(),
                ..Default::default()
            },
        );
        self.world.registry.attributes.insert(
            entity,
            Attributes {
                hp: 200,
                max_hp: 200,
                attack: 5,
                ..Default::default()
            },
        );
        entity
    }

    fn state(&self, monster: Entity) -> MonsterState {
        self.world.registry.monster_ai.get(monster).unwrap().state
    }
}

#[test]
fn idle_monsters_start_patrolling_then_return_to_idle() {
    let mut rig = Rig::new();
    let monster = rig.spawn_monster(MonsterAiKind::Normal, TilePoint::new(10, 10));

    assert_eq!(rig.state(monster), MonsterState::Idle);
    rig.step(1.0);
    assert_eq!(rig.state(monster), MonsterState::Idle);
    rig.step(1.5);
    rig.step(0.1);
    assert_eq!(rig.state(monster), MonsterState::Patrol);

    // Patrol flips back to idle after three seconds.
    rig.step(2.0);
    rig.step(1.5);
    rig.step(0.1);
    assert_eq!(rig.state(monster), MonsterState::Idle);
}

#[test]
fn nearby_player_pulls_a_monster_into_chase_then_attack() {
    let mut rig = Rig::new();
    let monster = rig.spawn_monster(MonsterAiKind::Normal, TilePoint::new(10, 10));
    let player = rig.spawn_player(TilePoint::new(12, 10));

    rig.step(0.1); // proximity aggro + Idle -> Chase
    assert_eq!(rig.state(monster), MonsterState::Chase);
    rig.step(0.1); // distance 2 <= attack range 3 -> Attack
    assert_eq!(rig.state(monster), MonsterState::Attack);

    // Cooldown elapses; the attack lands and damages the player.
    rig.step(1.0);
    assert!(rig.world.registry.attributes.get(player).unwrap().hp < 200);
}

#[test]
fn damage_events_feed_the_hate_list() {
    let mut rig = Rig::new();
    let monster = rig.spawn_monster(MonsterAiKind::Normal, TilePoint::new(0, 0));
    let attacker = rig.spawn_player(TilePoint::new(30, 30));

    rig.deliver(WorldEvent::DamageDealt {
        attacker,
        target: monster,
        damage: 10,
        critical: false,
    });

    let aggro = rig.world.registry.monster_aggro.get_mut(monster).unwrap();
    assert_eq!(aggro.hate.get(attacker), Some(15));
    assert_eq!(aggro.hate.top_target(), Some(attacker));
}

#[test]
fn chase_abandons_distant_targets_and_return_clears_hate() {
    let mut rig = Rig::new();
    let monster = rig.spawn_monster(MonsterAiKind::Normal, TilePoint::new(0, 0));
    let runner = rig.spawn_player(TilePoint::new(40, 40));

    rig.deliver(WorldEvent::DamageDealt {
        attacker: runner,
        target: monster,
        damage: 20,
        critical: false,
    });

    rig.step(0.1); // Idle -> Chase
    assert_eq!(rig.state(monster), MonsterState::Chase);
    rig.step(0.1); // distance > max chase -> Return
    assert_eq!(rig.state(monster), MonsterState::Return);

    rig.step(0.1);
    let aggro = rig.world.registry.monster_aggro.get_mut(monster).unwrap();
    assert!(aggro.hate.is_empty());
    assert!(rig
        .world
        .registry
        .monster_ai
        .get(monster)
        .unwrap()
        .target
        .is_none());
}

#[test]
fn explosive_monsters_die_on_a_successful_hit() {
    let mut rig = Rig::new();
    let monster = rig.spawn_monster(MonsterAiKind::Explosive, TilePoint::new(5, 5));
    let player = rig.spawn_player(TilePoint::new(6, 5));

    rig.step(0.1); // acquire + Chase
    rig.step(0.1); // Attack
    rig.step(1.0); // cooldown ready: hit, then self-destruct

    assert!(rig.world.registry.attributes.get(player).unwrap().hp < 200);
    assert_eq!(rig.world.registry.attributes.get(monster).unwrap().hp, 0);
    // Both the player damage and the monster's own death are on the queue.
    let mut saw_death = false;
    while let Some(event) = rig.world.events.pop() {
        if matches!(event, WorldEvent::EntityDeath { entity, .. } if entity == monster) {
            saw_death = true;
        }
    }
    assert!(saw_death);
}

#[test]
fn poisonous_monsters_add_a_damage_rider() {
    let mut rig = Rig::new();
    let monster = rig.spawn_monster(MonsterAiKind::Poisonous, TilePoint::new(5, 5));
    rig.world
        .registry
        .attributes
        .get_mut(monster)
        .unwrap()
        .attack = 50;
    let player = rig.spawn_player(TilePoint::new(6, 5));

    rig.step(0.1);
    rig.step(0.1);
    rig.step(1.0);

    // Base hit of 50 plus the 1/5 rider.
    let hp = rig.world.registry.attributes.get(player).unwrap().hp;
    assert_eq!(hp, 200 - 50 - 10);
}

#[test]
fn summoners_raise_summon_events_in_attack() {
    let mut rig = Rig::new();
    let monster = rig.spawn_monster(MonsterAiKind::Summoner, TilePoint::new(5, 5));
    let player = rig.spawn_player(TilePoint::new(6, 5));

    rig.step(0.1);
    rig.step(0.1);
    assert_eq!(rig.state(monster), MonsterState::Attack);

    // Sit in Attack long enough for the summon interval.
    for _ in 0..70 {
        rig.step(0.1);
    }

    let mut saw_summon = false;
    while let Some(event) = rig.world.events.pop() {
        if let WorldEvent::MonsterSummon { summoner, .. } = event {
            assert_eq!(summoner, monster);
            saw_summon = true;
        }
    }
    assert!(saw_summon);
    let _ = player;
}

#[test]
fn ranged_monsters_reposition_when_crowded() {
    let mut rig = Rig::new();
    let monster = rig.spawn_monster(MonsterAiKind::Ranged, TilePoint::new(5, 5));
    {
        let ai = rig.world.registry.monster_ai.get_mut(monster).unwrap();
        ai.preferred_distance = 6.0;
    }
    rig.world
        .registry
        .monster_aggro
        .get_mut(monster)
        .unwrap()
        .attack_range = 6;
    let player = rig.spawn_player(TilePoint::new(6, 5));

    rig.step(0.1); // Chase
    rig.step(0.1); // distance 1 <= attack range -> Attack
    assert_eq!(rig.state(monster), MonsterState::Attack);

    // Too close (1 < 0.7 * 6): the attack step bails back to Chase.
    rig.step(0.1);
    assert_eq!(rig.state(monster), MonsterState::Chase);
    let _ = player;
}

#[test]
fn cow_king_enters_crazy_mode_below_thirty_percent() {
    let mut rig = Rig::new();
    let boss = rig.spawn_monster(MonsterAiKind::BossCowKing, TilePoint::new(5, 5));
    {
        let attributes = rig.world.registry.attributes.get_mut(boss).unwrap();
        attributes.max_hp = 1000;
        attributes.hp = 250;
    }
    let cooldown_before = rig.world.registry.monster_ai.get(boss).unwrap().attack_cooldown;

    // Teleport roll declines, whatever it is.
    rig.rng.push(0.99);
    rig.step(0.1);

    let ai = rig.world.registry.monster_ai.get(boss).unwrap();
    assert!(ai.is_crazy_mode);
    assert!((ai.attack_cooldown - cooldown_before * 0.5).abs() < f32::EPSILON);
}

#[test]
fn ambush_monsters_stay_hidden_until_prey_is_close() {
    let mut rig = Rig::new();
    let monster = rig.spawn_monster(MonsterAiKind::Ambush, TilePoint::new(5, 5));
    rig.world
        .registry
        .monster_ai
        .get_mut(monster)
        .unwrap()
        .is_hidden = true;

    // A distant attacker builds hatred but does not reveal the ambusher.
    let sniper = rig.spawn_player(TilePoint::new(50, 50));
    rig.deliver(WorldEvent::DamageDealt {
        attacker: sniper,
        target: monster,
        damage: 5,
        critical: false,
    });
    rig.step(0.1);
    assert!(rig.world.registry.monster_ai.get(monster).unwrap().is_hidden);
    assert_eq!(rig.state(monster), MonsterState::Idle);

    // Once the target is inside the aggro radius, the monster reveals.
    rig.world.set_position(sniper, TilePoint::new(7, 5));
    rig.step(0.1);
    let ai = rig.world.registry.monster_ai.get(monster).unwrap();
    assert!(!ai.is_hidden);
    assert_eq!(ai.state, MonsterState::Attack);
}
