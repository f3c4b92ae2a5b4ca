use crate::{config::Config, websocket::PresenceRegistry};
use actix_middleware::JwtValidator;
use deadpool_postgres::Pool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool,
    pub registry: PresenceRegistry,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtValidator>,
}
