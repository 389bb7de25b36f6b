//! Full-stack flows over real loopback sockets: the TCP transport on
//! both ends, the wire codec in between, and the complete handler
//! families on top.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use emberfall_client::handlers::{Callback, ClientCallbacks};
use emberfall_client::movement::WalkabilityProvider;
use emberfall_client::network::{MessageSender, NetworkManager};
use emberfall_client::transport::{TcpNetworkClient, TransportConfig};
use emberfall_client::GameClient;
use emberfall_server::handlers::wire_entity_id;
use emberfall_shared::protocol::messages::character::{
    EnterGameReq, EnterGameRsp, SelectRoleReq, SelectRoleRsp,
};
use emberfall_shared::protocol::messages::login::{LoginReq, LoginRsp};
use emberfall_shared::protocol::messages::game::MoveRsp;
use emberfall_shared::protocol::msg_id;
use emberfall_shared::types::TilePoint;
use emberfall_shared::ResponseCode;
use emberfall_test::{pump_until, ServerHarness, TEST_CHARACTER_ID};

struct OpenGround;

impl WalkabilityProvider for OpenGround {
    fn is_walkable(&self, _x: i32, _y: i32) -> bool {
        true
    }

    fn is_valid_position(&self, _x: i32, _y: i32) -> bool {
        true
    }
}

fn client_with_callbacks(callbacks: ClientCallbacks) -> GameClient {
    let transport = TcpNetworkClient::new(TransportConfig {
        heartbeat_interval: Duration::from_millis(100),
        ..Default::default()
    });
    GameClient::with_network(NetworkManager::with_client(Box::new(transport)), callbacks)
}

#[test]
fn login_enter_and_move_over_loopback() {
    let mut harness = ServerHarness::start();
    let addr = harness.addr();

    let login_code = Rc::new(Cell::new(None::<ResponseCode>));
    let selected = Rc::new(Cell::new(false));
    let entered = Rc::new(RefCell::new(None::<EnterGameRsp>));
    let move_code = Rc::new(Cell::new(None::<ResponseCode>));

    let mut callbacks = ClientCallbacks::default();
    {
        let login_code = login_code.clone();
        callbacks.login.on_login = Some(Callback::new(move |rsp: &LoginRsp| {
            login_code.set(Some(rsp.code));
        }));
    }
    {
        let selected = selected.clone();
        callbacks.character.on_role_selected = Some(Callback::new(move |rsp: &SelectRoleRsp| {
            selected.set(rsp.code == ResponseCode::Ok);
        }));
    }
    {
        let entered = entered.clone();
        callbacks.character.on_enter_game = Some(Callback::new(move |rsp: &EnterGameRsp| {
            *entered.borrow_mut() = Some(rsp.clone());
        }));
    }
    {
        let move_code = move_code.clone();
        callbacks.movement.on_move = Some(Callback::new(move |rsp: &MoveRsp| {
            move_code.set(Some(rsp.code));
        }));
    }

    let mut client = client_with_callbacks(callbacks);
    assert!(client.connect(&addr.ip().to_string(), addr.port()));

    // Login.
    client.network.send(
        msg_id::LOGIN_REQ,
        &LoginReq {
            username: "user".into(),
            password: "pass".into(),
        },
    );
    assert!(pump_until(&mut harness, &mut client, Duration::from_secs(5), {
        let login_code = login_code.clone();
        move || login_code.get().is_some()
    }));
    assert_eq!(login_code.get(), Some(ResponseCode::Ok));

    // Select and enter the seeded warrior.
    client.network.send(
        msg_id::SELECT_ROLE_REQ,
        &SelectRoleReq {
            character_id: TEST_CHARACTER_ID,
        },
    );
    assert!(pump_until(&mut harness, &mut client, Duration::from_secs(5), {
        let selected = selected.clone();
        move || selected.get()
    }));

    client.network.send(
        msg_id::ENTER_GAME_REQ,
        &EnterGameReq {
            character_id: TEST_CHARACTER_ID,
        },
    );
    assert!(pump_until(&mut harness, &mut client, Duration::from_secs(5), {
        let entered = entered.clone();
        move || entered.borrow().is_some()
    }));
    {
        let entered = entered.borrow();
        let rsp = entered.as_ref().unwrap();
        assert_eq!(rsp.code, ResponseCode::Ok);
        let player = rsp.player.as_ref().expect("player info");
        assert_eq!(player.character_id, TEST_CHARACTER_ID);
        assert_eq!((player.x, player.y), (2, 2));
    }

    // Request a move through the controller; the server confirms and
    // the interpolator glides there.
    {
        let mut movement = client.movement.borrow_mut();
        movement.on_move_response(TilePoint::new(2, 2));
        let accepted = movement.request_move(
            &OpenGround,
            &mut client.network,
            TilePoint::new(2, 2),
            TilePoint::new(7, 9),
        );
        assert!(accepted);
    }
    assert!(pump_until(&mut harness, &mut client, Duration::from_secs(5), {
        let move_code = move_code.clone();
        move || move_code.get().is_some()
    }));
    assert_eq!(move_code.get(), Some(ResponseCode::Ok));

    client.update(500.0);
    assert_eq!(
        client.movement.borrow().tile_position(),
        TilePoint::new(7, 9)
    );
    assert_eq!(
        client.movement.borrow().last_confirmed_position(),
        TilePoint::new(7, 9)
    );
}

#[test]
fn heartbeats_produce_an_rtt_estimate() {
    let mut harness = ServerHarness::start();
    let addr = harness.addr();

    let mut client = client_with_callbacks(ClientCallbacks::default());
    assert!(client.connect(&addr.ip().to_string(), addr.port()));

    // Give the 100 ms heartbeat a few rounds to echo back.
    pump_until(&mut harness, &mut client, Duration::from_secs(1), || false);
    assert!(client.network.rtt_ms().is_some());
}

#[test]
fn wrong_credentials_are_rejected_over_the_wire() {
    let mut harness = ServerHarness::start();
    let addr = harness.addr();

    let login_code = Rc::new(Cell::new(None::<ResponseCode>));
    let mut callbacks = ClientCallbacks::default();
    {
        let login_code = login_code.clone();
        callbacks.login.on_login = Some(Callback::new(move |rsp: &LoginRsp| {
            login_code.set(Some(rsp.code));
        }));
    }

    let mut client = client_with_callbacks(callbacks);
    assert!(client.connect(&addr.ip().to_string(), addr.port()));
    client.network.send(
        msg_id::LOGIN_REQ,
        &LoginReq {
            username: "user".into(),
            password: "wrong".into(),
        },
    );
    assert!(pump_until(&mut harness, &mut client, Duration::from_secs(5), {
        let login_code = login_code.clone();
        move || login_code.get().is_some()
    }));
    assert_eq!(login_code.get(), Some(ResponseCode::PasswordWrong));
}

// Keeps the attack path honest end to end without depending on combat
// randomness: an out-of-range target must come back as such.
#[test]
fn out_of_range_attack_is_refused() {
    use emberfall_shared::protocol::messages::combat::{AttackReq, AttackRsp};

    let mut harness = ServerHarness::start();
    let addr = harness.addr();

    let attack_rsp = Rc::new(RefCell::new(None::<AttackRsp>));
    let mut callbacks = ClientCallbacks::default();
    {
        let attack_rsp = attack_rsp.clone();
        callbacks.combat.on_attack = Some(Callback::new(move |rsp: &AttackRsp| {
            *attack_rsp.borrow_mut() = Some(rsp.clone());
        }));
    }
    let entered = Rc::new(Cell::new(false));
    {
        let entered = entered.clone();
        callbacks.character.on_enter_game = Some(Callback::new(move |_: &EnterGameRsp| {
            entered.set(true);
        }));
    }

    let mut client = client_with_callbacks(callbacks);
    assert!(client.connect(&addr.ip().to_string(), addr.port()));

    client.network.send(
        msg_id::LOGIN_REQ,
        &LoginReq {
            username: "user".into(),
            password: "pass".into(),
        },
    );
    client.network.send(
        msg_id::SELECT_ROLE_REQ,
        &SelectRoleReq {
            character_id: TEST_CHARACTER_ID,
        },
    );
    client.network.send(
        msg_id::ENTER_GAME_REQ,
        &EnterGameReq {
            character_id: TEST_CHARACTER_ID,
        },
    );
    assert!(pump_until(&mut harness, &mut client, Duration::from_secs(5), {
        let entered = entered.clone();
        move || entered.get()
    }));

    // A target far from (2, 2), alive, on the same map.
    let victim = {
        let world = &mut harness.server.ctx.world;
        let victim = world.spawn_at(TilePoint::new(30, 30), 3);
        world.registry.attributes.insert(
            victim,
            emberfall_server::ecs::Attributes {
                hp: 10,
                max_hp: 10,
                ..Default::default()
            },
        );
        victim
    };

    let payload = emberfall_shared::encode_payload(&AttackReq {
        target_id: wire_entity_id(victim),
        attack_type: 0,
    })
    .unwrap();
    client.network.send_message(msg_id::ATTACK_REQ, &payload);

    assert!(pump_until(&mut harness, &mut client, Duration::from_secs(5), {
        let attack_rsp = attack_rsp.clone();
        move || attack_rsp.borrow().is_some()
    }));
    let rsp = attack_rsp.borrow().clone().unwrap();
    assert_eq!(rsp.code, ResponseCode::TargetOutOfRange);
    assert_eq!(rsp.damage, 0);
}
