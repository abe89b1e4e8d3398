use dotenvy::dotenv;
use std::env;

use crate::auth::password::hash_password;
use crate::utils::clock::DEFAULT_TZ_OFFSET_HOURS;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_ttl: usize,

    /// Single admin principal. Default admin/admin123 — matches the original
    /// deployment and is not production-grade; override via env.
    pub admin_username: String,
    pub admin_password_hash: String,

    /// Wall-clock offset in hours; attendance dates and schedule comparisons
    /// run in this zone.
    pub tz_offset_hours: i32,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_clock_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),

            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password_hash: hash_password(&admin_password),

            tz_offset_hours: env::var("TZ_OFFSET_HOURS")
                .unwrap_or_else(|_| DEFAULT_TZ_OFFSET_HOURS.to_string())
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_clock_per_min: env::var("RATE_CLOCK_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }

    /// Config for tests; no env access.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".into(),
            database_url: "sqlite::memory:".into(),
            jwt_secret: "test-secret".into(),
            access_token_ttl: 900,
            admin_username: "admin".into(),
            admin_password_hash: hash_password("admin123"),
            tz_offset_hours: DEFAULT_TZ_OFFSET_HOURS,
            rate_login_per_min: 30,
            rate_clock_per_min: 120,
            rate_protected_per_min: 1000,
            api_prefix: "/api/v1".into(),
        }
    }
}
