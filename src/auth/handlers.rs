use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::info;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::config::Config;
use crate::models::{LoginReq, LoginResponse};

/// Admin login. Credentials come from configuration (single principal, no
/// user store); the session leaves here as a signed token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "error": "Invalid username or password"
        }))
    ),
    tag = "Auth"
)]
pub async fn login(config: web::Data<Config>, payload: web::Json<LoginReq>) -> impl Responder {
    let username = payload.username.trim();

    let credentials_ok = username == config.admin_username
        && verify_password(&payload.password, &config.admin_password_hash).is_ok();

    if !credentials_ok {
        return HttpResponse::Unauthorized().json(json!({
            "error": "Invalid username or password"
        }));
    }

    info!(username, "admin logged in");

    let token = generate_access_token(username, &config.jwt_secret, config.access_token_ttl);

    HttpResponse::Ok().json(LoginResponse {
        access_token: token,
        token_type: "Bearer".into(),
        expires_in: config.access_token_ttl,
    })
}
