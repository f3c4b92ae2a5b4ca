use actix_middleware::{JwtAuth, JwtValidator};
use actix_web::{web, App, HttpServer};
use messaging_service::{
    config, db, error, logging, routes, state::AppState, websocket::PresenceRegistry,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let db = db::init_pool(&cfg.database_url, cfg.db_pool_size)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    let registry = PresenceRegistry::new();
    let jwt = Arc::new(JwtValidator::new(&cfg.jwt_secret));

    let state = AppState {
        db,
        registry,
        config: cfg.clone(),
        jwt: jwt.clone(),
    };

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting messaging-service");

    let cors_origin = cfg.cors_origin.clone();

    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => actix_cors::Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
                .max_age(3600),
            None => actix_cors::Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
        };

        App::new()
            .wrap(cors)
            .wrap(actix_middleware::RequestId::new())
            .wrap(actix_middleware::Logging)
            .app_data(web::Data::new(state.clone()))
            .service(
                web::scope("/messages")
                    .wrap(JwtAuth::new(jwt.clone()))
                    .service(routes::messages::send_message)
                    .service(routes::messages::get_messages)
                    .service(routes::messages::get_recent_chats)
                    .service(routes::messages::mark_as_read),
            )
            .service(routes::wsroute::ws_handler)
            .route("/health", web::get().to(|| async { "OK" }))
    })
    .bind(&bind_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind: {e}")))?
    .run()
    .await
    .map_err(|e| error::AppError::StartServer(format!("server: {e}")))
}
