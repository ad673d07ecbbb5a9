use actix_web::{web, App, HttpServer};
use chat_service::{
    config, db, error, logging,
    middleware::{RequestLogging, SessionAuth},
    services::{PgConversationStore, RedisPublisher},
    state::AppState,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let pool = db::init_pool(&cfg)?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    let publisher = RedisPublisher::from_url(&cfg.redis_url)
        .await
        .map_err(|e| error::AppError::StartServer(format!("redis: {e}")))?;

    let state = AppState::new(
        Arc::new(PgConversationStore::new(pool)),
        Arc::new(publisher),
    );
    let auth = SessionAuth::new(&cfg.jwt_secret);

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting chat-service");

    HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(auth.clone())
            .wrap(RequestLogging)
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(chat_service::configure)
    })
    .bind(&bind_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind REST: {e}")))?
    .run()
    .await
    .map_err(|e| error::AppError::StartServer(format!("REST server: {e}")))
}
