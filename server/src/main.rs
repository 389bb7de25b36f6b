use emberfall_server::handlers::Repository;
use emberfall_server::persist::{MemoryCache, MemoryDatabase};
use emberfall_server::{GameServer, Registries, ServerConfig};
use emberfall_shared::config::{
    DropTableRegistry, MonsterTemplateRegistry, SkillTemplateRegistry, SpawnTable,
};

fn load_yaml(path: &str) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

fn main() {
    env_logger::init();

    let spawn_table = load_yaml("config/spawn_points.yaml")
        .and_then(|yaml| match SpawnTable::load_from_str(&yaml) {
            Ok(report) => {
                for rejected in &report.rejected {
                    log::warn!(
                        "spawn_points.yaml entry {} rejected: {}",
                        rejected.index,
                        rejected.reason
                    );
                }
                Some(SpawnTable::from_points(report.accepted))
            }
            Err(err) => {
                log::error!("spawn_points.yaml failed to parse: {err}");
                None
            }
        })
        .unwrap_or_default();

    let monsters = load_yaml("config/monsters.yaml")
        .and_then(|yaml| MonsterTemplateRegistry::load_from_str(&yaml).ok())
        .map(|report| MonsterTemplateRegistry::from_templates(report.accepted))
        .unwrap_or_default();
    let drops = load_yaml("config/drop_tables.yaml")
        .and_then(|yaml| DropTableRegistry::load_from_str(&yaml).ok())
        .map(|report| DropTableRegistry::from_tables(report.accepted))
        .unwrap_or_default();
    let skills = load_yaml("config/skills.yaml")
        .and_then(|yaml| SkillTemplateRegistry::load_from_str(&yaml).ok())
        .map(|report| SkillTemplateRegistry::from_templates(report.accepted))
        .unwrap_or_default();

    let registries = Registries::new(monsters, drops, skills);
    let repository = Repository::new(MemoryDatabase::new(), MemoryCache::new());

    let mut server = GameServer::new(ServerConfig::default(), registries, repository, &spawn_table);
    if let Err(err) = server.run() {
        log::error!("server exited: {err}");
        std::process::exit(1);
    }
}
