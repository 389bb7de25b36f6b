use log::{info, warn};

use emberfall_shared::protocol::messages::character::{
    CreateRoleReq, CreateRoleRsp, EnterGameReq, EnterGameRsp, PlayerInfo, RoleListReq, RoleListRsp,
    RoleSummary, SelectRoleReq, SelectRoleRsp,
};
use emberfall_shared::protocol::{msg_id, Packet};
use emberfall_shared::types::{EquipSlot, TilePoint};
use emberfall_shared::ResponseCode;

use crate::ecs::{
    Attributes, Combat, EquipmentSlots, Identity, InventoryOwner, ItemInstance, SkillList,
};
use crate::handlers::GameContext;
use crate::net::session::SessionId;
use crate::persist::{Cache, CharacterData, Database, PersistError};

pub fn handle_role_list(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(_req) = packet.decode::<RoleListReq>() else {
        return;
    };
    let Some(account_id) = ctx.sessions.get(&session_id).and_then(|s| s.account_id) else {
        ctx.send(
            session_id,
            msg_id::ROLE_LIST_RSP,
            &RoleListRsp {
                code: ResponseCode::InvalidAction,
                roles: Vec::new(),
            },
        );
        return;
    };

    let (code, roles) = match ctx.repository.db().load_characters_by_account(account_id) {
        Ok(characters) => (
            ResponseCode::Ok,
            characters
                .into_iter()
                .map(|c| RoleSummary {
                    character_id: c.id,
                    name: c.name,
                    class: c.class,
                    gender: c.gender,
                    level: c.level,
                })
                .collect(),
        ),
        Err(err) => {
            warn!("role list failed for account {account_id}: {err}");
            (ResponseCode::Unknown, Vec::new())
        }
    };

    ctx.send(session_id, msg_id::ROLE_LIST_RSP, &RoleListRsp { code, roles });
}

pub fn handle_create_role(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode::<CreateRoleReq>() else {
        return;
    };
    let Some(account_id) = ctx.sessions.get(&session_id).and_then(|s| s.account_id) else {
        ctx.send(
            session_id,
            msg_id::CREATE_ROLE_RSP,
            &CreateRoleRsp {
                code: ResponseCode::InvalidAction,
                character_id: 0,
            },
        );
        return;
    };

    let (code, character_id) = match create_character(ctx, account_id, req) {
        Ok(character_id) => (ResponseCode::Ok, character_id),
        Err(code) => (code, 0),
    };
    ctx.send(
        session_id,
        msg_id::CREATE_ROLE_RSP,
        &CreateRoleRsp { code, character_id },
    );
}

fn create_character(
    ctx: &mut GameContext,
    account_id: u64,
    req: CreateRoleReq,
) -> Result<u32, ResponseCode> {
    if req.name.is_empty() || req.name.len() > 32 {
        return Err(ResponseCode::InvalidAction);
    }
    match ctx.repository.db().character_name_exists(&req.name) {
        Ok(true) => return Err(ResponseCode::NameExists),
        Ok(false) => {}
        Err(_) => return Err(ResponseCode::Unknown),
    }

    let character_id = ctx
        .repository
        .db()
        .next_character_id()
        .map_err(|_| ResponseCode::Unknown)?;
    let data =
        CharacterData::new_for_class(character_id, account_id, req.name, req.class, req.gender);
    ctx.repository
        .db()
        .save_character(&data)
        .map_err(|_| ResponseCode::Unknown)?;
    info!("created character {character_id} for account {account_id}");
    Ok(character_id)
}

pub fn handle_select_role(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode::<SelectRoleReq>() else {
        return;
    };
    let account_id = ctx.sessions.get(&session_id).and_then(|s| s.account_id);

    let code = match (account_id, ctx.repository.load_character(req.character_id)) {
        (Some(account_id), Ok(data)) if data.account_id == account_id => {
            if let Some(session) = ctx.sessions.get_mut(&session_id) {
                session.character_id = Some(req.character_id);
            }
            ResponseCode::Ok
        }
        (Some(_), Ok(_)) => ResponseCode::InvalidAction,
        (None, _) => ResponseCode::InvalidAction,
        (_, Err(PersistError::CharacterNotFound)) => ResponseCode::AccountNotFound,
        (_, Err(_)) => ResponseCode::Unknown,
    };

    ctx.send(
        session_id,
        msg_id::SELECT_ROLE_RSP,
        &SelectRoleRsp {
            code,
            character_id: req.character_id,
        },
    );
}

pub fn handle_enter_game(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode::<EnterGameReq>() else {
        return;
    };
    let selected = ctx
        .sessions
        .get(&session_id)
        .and_then(|s| s.character_id)
        .filter(|id| *id == req.character_id);
    if selected.is_none() {
        ctx.send(
            session_id,
            msg_id::ENTER_GAME_RSP,
            &EnterGameRsp {
                code: ResponseCode::InvalidAction,
                player: None,
            },
        );
        return;
    }

    let data = match ctx.repository.load_character(req.character_id) {
        Ok(data) => data,
        Err(err) => {
            warn!("enter game failed for character {}: {err}", req.character_id);
            ctx.send(
                session_id,
                msg_id::ENTER_GAME_RSP,
                &EnterGameRsp {
                    code: ResponseCode::AccountNotFound,
                    player: None,
                },
            );
            return;
        }
    };

    let entity = spawn_player(ctx, &data);
    if let Some(session) = ctx.sessions.get_mut(&session_id) {
        session.entity = Some(entity);
    }
    ctx.repository
        .cache()
        .add_player_to_map(data.map_id, data.id);
    announce_entry(ctx, session_id, entity, data.map_id);
    info!(
        "character {} entered map {} at ({}, {})",
        data.id, data.map_id, data.x, data.y
    );

    ctx.send(
        session_id,
        msg_id::ENTER_GAME_RSP,
        &EnterGameRsp {
            code: ResponseCode::Ok,
            player: Some(PlayerInfo {
                character_id: data.id,
                name: data.name.clone(),
                class: data.class,
                level: data.level,
                hp: data.hp,
                max_hp: data.max_hp,
                mp: data.mp,
                max_mp: data.max_mp,
                map_id: data.map_id,
                x: data.x,
                y: data.y,
            }),
        },
    );
}

/// The newcomer appears for everyone on the map, and everything already
/// visible on the map appears for the newcomer.
fn announce_entry(
    ctx: &mut GameContext,
    session_id: SessionId,
    entity: crate::ecs::Entity,
    map_id: u32,
) {
    use emberfall_shared::protocol::messages::game::EntitySpawn;

    if let Some(snapshot) = crate::handlers::snapshot_entity(ctx, entity) {
        ctx.broadcast_to_map(map_id, msg_id::ENTITY_SPAWN, &EntitySpawn { entity: snapshot });
    }

    let visible: Vec<crate::ecs::Entity> = ctx
        .world
        .registry
        .transforms
        .iter()
        .filter(|(other, transform)| *other != entity && transform.map_id == map_id)
        .map(|(other, _)| other)
        .collect();
    for other in visible {
        if let Some(snapshot) = crate::handlers::snapshot_entity(ctx, other) {
            ctx.send(session_id, msg_id::ENTITY_SPAWN, &EntitySpawn { entity: snapshot });
        }
    }
}

/// Builds the in-world entity for a loaded character, including its
/// persisted equipment and bag aggregates.
fn spawn_player(ctx: &mut GameContext, data: &CharacterData) -> crate::ecs::Entity {
    let entity = ctx
        .world
        .spawn_at(TilePoint::new(data.x, data.y), data.map_id);
    ctx.world.registry.identities.insert(
        entity,
        Identity {
            persistent_id: data.id as u64,
            account_id: data.account_id,
            name: data.name.clone(),
            class: data.class,
            gender: data.gender,
        },
    );
    ctx.world.registry.attributes.insert(
        entity,
        Attributes {
            level: data.level,
            exp: data.exp,
            hp: data.hp.clamp(1, data.max_hp),
            max_hp: data.max_hp,
            mp: data.mp.clamp(0, data.max_mp),
            max_mp: data.max_mp,
            attack: data.attack,
            defense: data.defense,
            magic_attack: data.magic_attack,
            magic_defense: data.magic_defense,
            speed: data.speed,
            gold: data.gold,
        },
    );
    ctx.world.registry.combat.insert(entity, Combat::default());
    ctx.world
        .registry
        .equipment
        .insert(entity, EquipmentSlots::default());
    ctx.world
        .registry
        .skills
        .insert(entity, SkillList::default());

    // Rebuild bag items from the persisted aggregate. The rows are also
    // primed into the cache so later write-behind flushes can assemble a
    // full transactional save.
    if let Ok(inventory) = ctx.repository.load_inventory(data.id) {
        ctx.repository.cache().cache_inventory(data.id, &inventory);
        for row in inventory {
            let item = ctx.world.registry.create();
            ctx.world.registry.items.insert(
                item,
                ItemInstance {
                    instance_id: row.instance_id,
                    template_id: row.item_template_id,
                    count: row.quantity,
                    durability: row.durability,
                    enhancement_level: row.enhancement_level as i32,
                    ..Default::default()
                },
            );
            ctx.world.registry.owners.insert(
                item,
                InventoryOwner {
                    owner: Some(entity),
                    slot_index: row.slot,
                },
            );
        }
    }

    // Rebuild equipment; legacy rows with a generic slot fill left
    // before right.
    if let Ok(equipment) = ctx.repository.load_equipment(data.id) {
        ctx.repository.cache().cache_equipment(data.id, &equipment);
        for row in equipment {
            let Some(slot) = EquipSlot::from_index(row.slot as usize) else {
                continue;
            };
            let item = ctx.world.registry.create();
            ctx.world.registry.items.insert(
                item,
                ItemInstance {
                    instance_id: row.instance_id,
                    template_id: row.item_template_id,
                    durability: row.durability,
                    enhancement_level: row.enhancement_level as i32,
                    equip_slot: Some(slot),
                    ..Default::default()
                },
            );
            ctx.world.registry.owners.insert(
                item,
                InventoryOwner {
                    owner: Some(entity),
                    slot_index: -1,
                },
            );
            if let Some(slots) = ctx.world.registry.equipment.get_mut(entity) {
                slots.set(slot, Some(item));
            }
        }
    }

    // Rebuild learned skills.
    if let Ok(skills) = ctx.repository.db().load_skills(data.id) {
        if let Some(list) = ctx.world.registry.skills.get_mut(entity) {
            for row in skills {
                list.add(crate::ecs::LearnedSkill {
                    skill_id: row.skill_id,
                    level: row.level.clamp(0, u8::MAX as i32) as u8,
                    exp: row.experience,
                    hotkey: 0,
                });
            }
        }
    }
    crate::systems::skills::recompute_modifiers(
        &mut ctx.world,
        &ctx.registries.skills,
        entity,
    );

    entity
}
