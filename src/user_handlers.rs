use crate::auth::Authenticator;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse};
use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

#[post("/login")]
pub async fn login(
    authenticator: web::Data<Authenticator>,
    data: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let authenticator = authenticator.get_ref().clone();
    let request = data.into_inner();

    // bcrypt verification is CPU-bound; keep it off the worker thread
    let token = web::block(move || authenticator.login(&request))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login success",
        token,
    }))
}

/// Shows the display secret, never the signing key.
#[get("/config")]
pub async fn show_config(config: web::Data<Config>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "SECRET": config.display_secret }))
}
