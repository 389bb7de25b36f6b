//! Frame-level round-trip coverage for every message family.

use emberfall_shared::protocol::messages::character::*;
use emberfall_shared::protocol::messages::combat::*;
use emberfall_shared::protocol::messages::game::*;
use emberfall_shared::protocol::messages::login::*;
use emberfall_shared::protocol::messages::npc::*;
use emberfall_shared::protocol::messages::system::*;
use emberfall_shared::protocol::msg_id;
use emberfall_shared::types::{CharacterClass, Gender};
use emberfall_shared::{
    encode_frame, encode_json_payload, encode_payload, FrameDecoder, ResponseCode, FLAG_JSON_BODY,
};

fn round_trip<T>(msg_id: u16, sequence: u16, value: &T) -> T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let payload = encode_payload(value).unwrap();
    let frame = encode_frame(msg_id, sequence, 0, &payload).unwrap();

    let mut decoder = FrameDecoder::new();
    decoder.feed(&frame);
    let packet = decoder.next_packet().unwrap().expect("one complete frame");
    assert_eq!(packet.msg_id(), msg_id);
    assert_eq!(packet.sequence(), sequence);
    packet.decode().unwrap()
}

#[test]
fn login_messages_round_trip() {
    let req = LoginReq {
        username: "ember".into(),
        password: "secret".into(),
    };
    assert_eq!(round_trip(msg_id::LOGIN_REQ, 1, &req), req);

    let rsp = LoginRsp {
        code: ResponseCode::Ok,
        account_id: 42,
        token: "t".into(),
    };
    assert_eq!(round_trip(msg_id::LOGIN_RSP, 2, &rsp), rsp);

    let hb = HeartbeatReq {
        heartbeat_seq: 9,
        client_time_ms: 123_456,
    };
    assert_eq!(round_trip(msg_id::HEARTBEAT_REQ, 3, &hb), hb);
}

#[test]
fn character_messages_round_trip() {
    let rsp = RoleListRsp {
        code: ResponseCode::Ok,
        roles: vec![RoleSummary {
            character_id: 55,
            name: "Aldric".into(),
            class: CharacterClass::Warrior,
            gender: Gender::Male,
            level: 1,
        }],
    };
    assert_eq!(round_trip(msg_id::ROLE_LIST_RSP, 4, &rsp), rsp);

    let enter = EnterGameRsp {
        code: ResponseCode::Ok,
        player: Some(PlayerInfo {
            character_id: 55,
            name: "Aldric".into(),
            class: CharacterClass::Warrior,
            level: 1,
            hp: 120,
            max_hp: 120,
            mp: 40,
            max_mp: 80,
            map_id: 3,
            x: 11,
            y: 22,
        }),
    };
    assert_eq!(round_trip(msg_id::ENTER_GAME_RSP, 5, &enter), enter);
}

#[test]
fn movement_and_combat_round_trip() {
    let mv = MoveReq {
        target_x: 7,
        target_y: 9,
    };
    assert_eq!(round_trip(msg_id::MOVE_REQ, 6, &mv), mv);

    let atk = AttackRsp {
        code: ResponseCode::TargetOutOfRange,
        target_id: 1234,
        damage: 0,
        critical: false,
        miss: false,
        target_died: false,
    };
    assert_eq!(round_trip(msg_id::ATTACK_RSP, 7, &atk), atk);

    let snapshot = EntityUpdate {
        entity: EntitySnapshot {
            entity_id: 999,
            kind: EntityKind::Monster,
            name: "Bone Archer".into(),
            x: 31,
            y: 17,
            direction: 4,
            map_id: 3,
            hp: 60,
            max_hp: 80,
            mp: 0,
            max_mp: 0,
            level: 12,
            template_id: 2001,
            server_time_ms: 88_000,
        },
    };
    assert_eq!(round_trip(msg_id::ENTITY_UPDATE, 8, &snapshot), snapshot);

    let notice = ServerNotice {
        text: "maintenance in 5 minutes".into(),
        level: 1,
    };
    assert_eq!(round_trip(msg_id::SERVER_NOTICE, 9, &notice), notice);
}

#[test]
fn npc_messages_round_trip_as_json() {
    let dialog = NpcDialogShow {
        npc_id: 77,
        dialog_id: 3,
        text: "Welcome, traveler.".into(),
        options: vec!["Shop".into(), "Leave".into()],
    };
    let payload = encode_json_payload(&dialog).unwrap();
    let frame = encode_frame(msg_id::NPC_DIALOG_SHOW, 10, FLAG_JSON_BODY, &payload).unwrap();

    let mut decoder = FrameDecoder::new();
    decoder.feed(&frame);
    let packet = decoder.next_packet().unwrap().expect("frame");
    assert_eq!(packet.header.flags & FLAG_JSON_BODY, FLAG_JSON_BODY);
    assert_eq!(packet.decode_json::<NpcDialogShow>().unwrap(), dialog);
}

#[test]
fn interleaved_frames_come_out_in_wire_order() {
    let mut decoder = FrameDecoder::new();
    let mut expected = Vec::new();
    for seq in 0..32u16 {
        let mv = MoveReq {
            target_x: seq as i32,
            target_y: -(seq as i32),
        };
        let payload = encode_payload(&mv).unwrap();
        decoder.feed(&encode_frame(msg_id::MOVE_REQ, seq, 0, &payload).unwrap());
        expected.push(mv);
    }
    for (seq, expected) in expected.iter().enumerate() {
        let packet = decoder.next_packet().unwrap().expect("frame");
        assert_eq!(packet.sequence(), seq as u16);
        assert_eq!(&packet.decode::<MoveReq>().unwrap(), expected);
    }
}
