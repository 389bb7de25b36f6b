use emberfall_shared::protocol::messages::combat::{
    AttackReq, AttackRsp, SkillEffect, SkillReq, SkillRsp,
};
use emberfall_shared::protocol::{msg_id, Packet};
use emberfall_shared::types::chebyshev_distance;
use emberfall_shared::ResponseCode;

use crate::combat::{self, AttackError, AttackModifier, AttackType};
use crate::handlers::{entity_from_wire, wire_entity_id, GameContext};
use crate::net::session::SessionId;

fn response_code(error: AttackError) -> ResponseCode {
    match error {
        AttackError::AttackerInvalid => ResponseCode::InvalidAction,
        AttackError::TargetNotFound => ResponseCode::TargetNotFound,
        AttackError::TargetDead => ResponseCode::TargetDead,
        AttackError::TargetOutOfRange => ResponseCode::TargetOutOfRange,
    }
}

pub fn handle_attack(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode::<AttackReq>() else {
        return;
    };
    let Some(attacker) = ctx.session_entity(session_id) else {
        return;
    };
    let target = entity_from_wire(req.target_id);
    let attack_type = AttackType::from_u8(req.attack_type);

    let config = ctx.combat_config;
    let outcome = combat::process_attack_with_type(
        &mut ctx.world,
        attacker,
        target,
        &config,
        attack_type,
        &mut ctx.rng,
    );

    let rsp = match outcome {
        Ok(outcome) => AttackRsp {
            code: ResponseCode::Ok,
            target_id: req.target_id,
            damage: outcome.damage.final_damage,
            critical: outcome.damage.is_critical,
            miss: outcome.damage.is_miss,
            target_died: outcome.target_died,
        },
        Err(error) => AttackRsp {
            code: response_code(error),
            target_id: req.target_id,
            damage: 0,
            critical: false,
            miss: false,
            target_died: false,
        },
    };
    ctx.send(session_id, msg_id::ATTACK_RSP, &rsp);
}

pub fn handle_skill(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode::<SkillReq>() else {
        return;
    };
    let Some(caster) = ctx.session_entity(session_id) else {
        return;
    };

    let fail = |code: ResponseCode| SkillRsp {
        code,
        skill_id: req.skill_id,
        damage: 0,
        cooldown_ms: 0,
    };

    let Some(template) = ctx.registries.skills.get(req.skill_id) else {
        ctx.send(session_id, msg_id::SKILL_RSP, &fail(ResponseCode::InvalidAction));
        return;
    };
    let (mp_cost, cooldown_ms, range, damage_scalar) = (
        template.mp_cost,
        template.cooldown_ms,
        template.range,
        template.damage_scalar,
    );

    let known = ctx
        .world
        .registry
        .skills
        .get(caster)
        .is_some_and(|list| list.has(req.skill_id));
    if !known {
        ctx.send(session_id, msg_id::SKILL_RSP, &fail(ResponseCode::InvalidAction));
        return;
    }

    let now_ms = ctx.world.now_ms();
    let ready = ctx
        .world
        .registry
        .skills
        .get(caster)
        .is_some_and(|list| list.is_ready(req.skill_id, now_ms));
    if !ready {
        ctx.send(session_id, msg_id::SKILL_RSP, &fail(ResponseCode::SkillCooldown));
        return;
    }

    let target = entity_from_wire(req.target_id);
    let in_range = match (
        ctx.world.registry.transforms.get(caster),
        ctx.world.registry.transforms.get(target),
    ) {
        (Some(caster_t), Some(target_t)) => {
            chebyshev_distance(caster_t.position, target_t.position) <= range
        }
        _ => false,
    };
    if !in_range {
        ctx.send(
            session_id,
            msg_id::SKILL_RSP,
            &fail(ResponseCode::TargetOutOfRange),
        );
        return;
    }

    if !combat::consume_mp(&mut ctx.world, caster, mp_cost) {
        ctx.send(
            session_id,
            msg_id::SKILL_RSP,
            &fail(ResponseCode::InsufficientMp),
        );
        return;
    }
    if let Some(list) = ctx.world.registry.skills.get_mut(caster) {
        list.start_cooldown(req.skill_id, cooldown_ms as u64, now_ms);
    }

    // Resolution honors the skill's reach and scalar, not the caster's
    // melee range.
    let modifier = AttackModifier {
        hit_count: 1,
        aoe_radius: None,
        range_override: Some(range),
        damage_scalar,
        miss_chance_delta: 0.0,
    };
    let config = ctx.combat_config;
    let outcome = combat::process_attack_with_modifier(
        &mut ctx.world,
        caster,
        target,
        &config,
        &modifier,
        &mut ctx.rng,
    );

    let rsp = match outcome {
        Ok(outcome) => SkillRsp {
            code: ResponseCode::Ok,
            skill_id: req.skill_id,
            damage: outcome.damage.final_damage,
            cooldown_ms,
        },
        Err(error) => SkillRsp {
            code: response_code(error),
            skill_id: req.skill_id,
            damage: 0,
            cooldown_ms,
        },
    };
    let landed = rsp.code == ResponseCode::Ok;
    ctx.send(session_id, msg_id::SKILL_RSP, &rsp);

    if landed {
        let map_id = ctx
            .world
            .registry
            .transforms
            .get(caster)
            .map_or(0, |t| t.map_id);
        ctx.broadcast_to_map(
            map_id,
            msg_id::SKILL_EFFECT,
            &SkillEffect {
                caster_id: wire_entity_id(caster),
                skill_id: req.skill_id,
                target_id: req.target_id,
                x: req.target_x,
                y: req.target_y,
            },
        );
    }
}
