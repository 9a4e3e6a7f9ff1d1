use chrono::Duration;
use serde::Deserialize;
use std::env;

/// Application settings, grouped per concern.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_hours: i64,
}

/// Longest accepted session lifetime, one year.
pub const MAX_TOKEN_HOURS: i64 = 24 * 365;

impl JwtConfig {
    /// Session lifetime, clamped to `1..=MAX_TOKEN_HOURS`.
    pub fn token_ttl(&self) -> Duration {
        Duration::hours(self.expires_in_hours.clamp(1, MAX_TOKEN_HOURS))
    }

    fn check(&self) -> Result<(), config::ConfigError> {
        if !(1..=MAX_TOKEN_HOURS).contains(&self.expires_in_hours) {
            return Err(config::ConfigError::Message(format!(
                "jwt.expires_in_hours must be between 1 and {}, got {}",
                MAX_TOKEN_HOURS, self.expires_in_hours
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Required to register an admin account. Unset means admin registration is closed.
    #[serde(default)]
    pub admin_role_password: Option<String>,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_captcha: bool,
}

impl Config {
    /// Defaults, then `config/local.*`, then `APP_*` variables (`APP_DATABASE__POOL_SIZE`),
    /// then the usual unprefixed variables such as `DATABASE_URL` and `PORT`.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "movie_reservation=debug,tower_http=debug")?
            .set_default("database.pool_size", 20)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("jwt.expires_in_hours", 24)?
            .set_default("auth.bcrypt_cost", 10)?
            .set_default("features.enable_captcha", true)?
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_override_option("app.host", env::var("HOST").ok())?
            .set_override_option("app.port", env::var("PORT").ok())?
            .set_override_option("app.environment", env::var("ENVIRONMENT").ok())?
            .set_override_option("app.rust_log", env::var("RUST_LOG").ok())?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("database.pool_size", env::var("DB_POOL_SIZE").ok())?
            .set_override_option("redis.url", env::var("REDIS_URL").ok())?
            .set_override_option("jwt.secret", env::var("JWT_SECRET").ok())?
            .set_override_option(
                "auth.admin_role_password",
                env::var("ADMIN_ROLE_PASSWORD").ok(),
            )?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.jwt.check()?;
        Ok(config)
    }
}
