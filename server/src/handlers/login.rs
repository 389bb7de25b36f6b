use log::{info, warn};
use sha1::{Digest, Sha1};

use emberfall_shared::protocol::messages::login::{
    CreateAccountReq, CreateAccountRsp, HeartbeatReq, HeartbeatRsp, LoginReq, LoginRsp,
};
use emberfall_shared::protocol::{msg_id, Packet};
use emberfall_shared::{ResponseCode, SESSION_TTL};

use crate::handlers::GameContext;
use crate::net::session::{unix_time_ms, SessionId};
use crate::persist::{AccountData, Cache, Database, PersistError};

/// Stored password digest: lowercase hex SHA-1 of the plaintext.
pub fn password_hash(password: &str) -> String {
    let digest = Sha1::digest(password.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

pub fn handle_login(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode::<LoginReq>() else {
        warn!("session {session_id}: malformed LoginReq");
        return;
    };

    let (code, account_id, token) = match ctx.repository.db().load_account(&req.username) {
        Ok(account) if account.banned => (ResponseCode::InvalidAction, 0, String::new()),
        Ok(account) if account.password_hash != password_hash(&req.password) => {
            (ResponseCode::PasswordWrong, 0, String::new())
        }
        Ok(account) => {
            let token = match ctx.id_gen.next_id() {
                Ok(id) => format!("{id:x}"),
                Err(err) => {
                    log::error!("id generation failed: {err}");
                    return;
                }
            };
            ctx.repository
                .cache()
                .set_session(account.id, &token, SESSION_TTL);
            if let Some(session) = ctx.sessions.get_mut(&session_id) {
                session.account_id = Some(account.id);
            }
            info!("account {} logged in on session {session_id}", account.id);
            (ResponseCode::Ok, account.id, token)
        }
        Err(PersistError::AccountNotFound) => (ResponseCode::AccountNotFound, 0, String::new()),
        Err(err) => {
            log::error!("account load failed: {err}");
            (ResponseCode::Unknown, 0, String::new())
        }
    };

    ctx.send(
        session_id,
        msg_id::LOGIN_RSP,
        &LoginRsp {
            code,
            account_id,
            token,
        },
    );
}

pub fn handle_create_account(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode::<CreateAccountReq>() else {
        warn!("session {session_id}: malformed CreateAccountReq");
        return;
    };

    let account_id = match ctx.id_gen.next_id() {
        Ok(id) => id,
        Err(err) => {
            log::error!("id generation failed: {err}");
            return;
        }
    };
    let account = AccountData {
        id: account_id,
        username: req.username,
        password_hash: password_hash(&req.password),
        email: req.email,
        created_at: unix_time_ms() as i64,
        last_login: 0,
        banned: false,
    };

    let code = match ctx.repository.db().create_account(&account) {
        Ok(()) => ResponseCode::Ok,
        Err(PersistError::AccountAlreadyExists) => ResponseCode::NameExists,
        Err(err) => {
            log::error!("account creation failed: {err}");
            ResponseCode::Unknown
        }
    };

    ctx.send(
        session_id,
        msg_id::CREATE_ACCOUNT_RSP,
        &CreateAccountRsp { code, account_id },
    );
}

pub fn handle_heartbeat(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode::<HeartbeatReq>() else {
        return;
    };
    ctx.send(
        session_id,
        msg_id::HEARTBEAT_RSP,
        &HeartbeatRsp {
            heartbeat_seq: req.heartbeat_seq,
            client_time_ms: req.client_time_ms,
            server_time_ms: unix_time_ms(),
        },
    );
}
