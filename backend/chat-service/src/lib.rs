pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use actix_web::web;

/// Register every API route on an actix `App`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::conversations::get_conversations)
        .service(routes::conversations::create_conversation)
        .service(routes::conversations::delete_conversation)
        .service(routes::messages::send_message)
        .route("/health", web::get().to(|| async { "OK" }));
}
