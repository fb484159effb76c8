pub mod auth;
pub mod book_handlers;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod site_handlers;
pub mod user_handlers;

use actix_web::middleware::from_fn;
use actix_web::{error::JsonPayloadError, web, HttpRequest};
use actix_web_httpauth::middleware::HttpAuthentication;
use auth::{Authenticator, TokenCodec};
use config::Config;
use db::{BookStore, CredentialStore};
use error::ApiError;
use std::sync::Arc;

/// Everything the handlers share. Cloned into each worker's `App`.
#[derive(Clone)]
pub struct AppState {
    pub codec: web::Data<TokenCodec>,
    pub authenticator: web::Data<Authenticator>,
    pub books: web::Data<BookStore>,
    pub config: web::Data<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
        books: BookStore,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(config.jwt_secret.as_bytes()));
        let authenticator =
            Authenticator::new(credentials, Arc::clone(&codec), config.token_ttl);

        Self {
            codec: web::Data::from(codec),
            authenticator: web::Data::new(authenticator),
            books: web::Data::new(books),
            config: web::Data::new(config),
        }
    }

    /// Registers shared state, the public routes and the gated routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.codec.clone())
            .app_data(self.authenticator.clone())
            .app_data(self.books.clone())
            .app_data(self.config.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::PathConfig::default().error_handler(|err, _| {
                ApiError::BadRequest(err.to_string()).into()
            }))
            .service(user_handlers::login)
            .service(site_handlers::api_docs)
            .service(site_handlers::swagger_ui)
            .service(
                // stage 2 is wrapped first so it runs after stage 1
                web::scope("")
                    .wrap(from_fn(middleware::require_admin))
                    .wrap(HttpAuthentication::bearer(middleware::validator))
                    .service(book_handlers::list_books)
                    .service(book_handlers::get_book)
                    .service(book_handlers::create_book)
                    .service(book_handlers::update_book)
                    .service(book_handlers::delete_book)
                    .service(site_handlers::upload_file)
                    .service(site_handlers::test_html)
                    .service(user_handlers::show_config),
            );
    }
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}
