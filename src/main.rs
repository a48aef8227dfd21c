use std::time::Duration;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod services;
mod storage;
mod store;
mod utils;

use config::Config;
use db::init_db;
use docs::ApiDoc;
use routes::Limiters;
use storage::Storage;
use store::mysql::MySqlStore;
use utils::email_index::EmailIndex;
use utils::token_blacklist::TokenBlacklist;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let level = config
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", config.upload_dir))?;

    let store = Data::new(MySqlStore::new(pool.clone()));
    let storage = Data::new(Storage::new(&config.upload_dir));
    let emails = Data::new(EmailIndex::new());
    let blacklist = Data::new(TokenBlacklist::new(Duration::from_secs(
        config.access_token_ttl,
    )));
    let limiters = Limiters::new(&config)?;

    let warm_index = emails.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warm_index.warmup(&pool, 500).await {
            warn!(error = %e, "Failed to warm up email index");
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets match
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(storage.clone())
            .app_data(emails.clone())
            .app_data(blacklist.clone())
            .app_data(config_data.clone())
            .configure(|cfg| routes::configure(cfg, &config_data, &limiters))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    Ok(())
}
