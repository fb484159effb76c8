use actix_web::{middleware::Logger, App, HttpServer};
use book_gate::config::Config;
use book_gate::db::{BookStore, SinglePrincipalStore};
use book_gate::models::Principal;
use book_gate::AppState;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Refusing to start: {}", e);
            std::process::exit(1);
        }
    };

    let credentials = SinglePrincipalStore::new(&Principal::member(), bcrypt::DEFAULT_COST)
        .map_err(std::io::Error::other)?;

    let addr = config.bind_addr();
    info!("Starting with {:?}", config);

    let state = AppState::new(config, Arc::new(credentials), BookStore::seeded());

    info!("Listening on: {}", addr);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| state.configure(cfg))
    })
    .bind(addr)?
    .run()
    .await
}
