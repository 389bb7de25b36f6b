use serde::{Deserialize, Serialize};

/// Closed set of response codes returned to clients. Domain failures are
/// always expressed through one of these; they are never fatal to the
/// session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResponseCode {
    #[default]
    Ok = 0,
    AccountNotFound = 1,
    PasswordWrong = 2,
    NameExists = 3,
    TargetDead = 4,
    SkillCooldown = 5,
    InvalidAction = 6,
    TargetNotFound = 7,
    TargetOutOfRange = 8,
    InsufficientMp = 9,
    Unknown = 10,
}

impl ResponseCode {
    pub fn is_ok(self) -> bool {
        self == ResponseCode::Ok
    }
}
