use emberfall_shared::config::{
    DropTableRegistry, MonsterTemplateRegistry, SkillTemplateRegistry,
};

/// Content registries built once at bootstrap from YAML and handed to
/// systems by reference. There are no process-wide singletons; tests
/// construct their own.
#[derive(Default)]
pub struct Registries {
    pub monsters: MonsterTemplateRegistry,
    pub drops: DropTableRegistry,
    pub skills: SkillTemplateRegistry,
}

impl Registries {
    pub fn new(
        monsters: MonsterTemplateRegistry,
        drops: DropTableRegistry,
        skills: SkillTemplateRegistry,
    ) -> Self {
        Self {
            monsters,
            drops,
            skills,
        }
    }
}
