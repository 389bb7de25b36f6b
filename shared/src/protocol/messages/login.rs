use serde::{Deserialize, Serialize};

use crate::protocol::response::ResponseCode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRsp {
    pub code: ResponseCode,
    pub account_id: u64,
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountReq {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountRsp {
    pub code: ResponseCode,
    pub account_id: u64,
}

/// Client-initiated liveness probe. `client_time_ms` comes back verbatim
/// in the response so the client can derive RTT without clock agreement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatReq {
    pub heartbeat_seq: u32,
    pub client_time_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatRsp {
    pub heartbeat_seq: u32,
    pub client_time_ms: u64,
    pub server_time_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kick {
    pub reason: String,
}
