// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::{DieselPool, RedisPool},
    services::{
        CredentialService, DeviceTokenService, SessionService, TokenService, Verifier,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub redis_pool: RedisPool,
    pub token_service: Arc<TokenService>,
    pub verifier: Arc<Verifier>,
    pub session_service: Arc<SessionService>,
    pub credential_service: Arc<CredentialService>,
    pub device_token_service: Arc<DeviceTokenService>,
    pub max_connections: u32,
}
