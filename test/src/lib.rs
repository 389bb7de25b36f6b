//! Shared fixtures for the cross-crate end-to-end suites: an in-process
//! server harness stepped manually on the test thread, plus helpers to
//! interleave client and server pumping over real loopback sockets.

use std::time::{Duration, Instant};

use emberfall_client::GameClient;
use emberfall_server::handlers::login::password_hash;
use emberfall_server::handlers::Repository;
use emberfall_server::net::SessionServer;
use emberfall_server::persist::{
    AccountData, CharacterData, Database, MemoryCache, MemoryDatabase,
};
use emberfall_server::{GameServer, Registries, ServerConfig};
use emberfall_shared::config::SpawnTable;
use emberfall_shared::types::{CharacterClass, Gender};

pub const TEST_ACCOUNT_ID: u64 = 42;
pub const TEST_CHARACTER_ID: u32 = 55;

/// A full game server bound to an ephemeral loopback port, driven by
/// explicit `step` calls instead of its own run loop.
pub struct ServerHarness {
    pub server: GameServer,
    pub listener: SessionServer,
}

impl ServerHarness {
    /// Boots a server with one seeded account ("user"/"pass") and one
    /// warrior character.
    pub fn start() -> Self {
        let mut repository = Repository::new(MemoryDatabase::new(), MemoryCache::new());
        repository
            .db()
            .create_account(&AccountData {
                id: TEST_ACCOUNT_ID,
                username: "user".into(),
                password_hash: password_hash("pass"),
                email: "user@example.com".into(),
                created_at: 0,
                last_login: 0,
                banned: false,
            })
            .expect("seed account");
        let mut warrior = CharacterData::new_for_class(
            TEST_CHARACTER_ID,
            TEST_ACCOUNT_ID,
            "Aldric".into(),
            CharacterClass::Warrior,
            Gender::Male,
        );
        warrior.map_id = 3;
        warrior.x = 2;
        warrior.y = 2;
        repository.db().save_character(&warrior).expect("seed warrior");

        let server = GameServer::new(
            ServerConfig {
                bind_addr: "127.0.0.1:0".into(),
                ..Default::default()
            },
            Registries::default(),
            repository,
            &SpawnTable::default(),
        );
        let listener = SessionServer::bind("127.0.0.1:0").expect("bind loopback");

        Self { server, listener }
    }

    pub fn addr(&self) -> std::net::SocketAddr {
        self.listener.local_addr()
    }

    /// One server iteration: fold connection events, dispatch queued
    /// packets, advance the world one tick.
    pub fn step(&mut self) {
        self.server.pump_network(&self.listener);
        self.server.drain_and_dispatch();
        self.server.tick(0.05);
    }
}

/// Interleaves client and server pumping until `done` reports true or
/// the deadline passes.
pub fn pump_until(
    harness: &mut ServerHarness,
    client: &mut GameClient,
    timeout: Duration,
    mut done: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        harness.step();
        client.update(10.0);
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}
