use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerNotice {
    pub text: String,
    /// Severity for client-side presentation: 0 info, 1 warning, 2 urgent.
    pub level: u8,
}
