#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;

use movie_reservation::cache::MemoryChallengeStore;
use movie_reservation::config::{
    AppConfig, AuthConfig, Config, DatabaseConfig, FeatureFlags, JwtConfig, RedisConfig,
};
use movie_reservation::models::{Hall, Movie, NewHall, NewMovie, NewShowtime, NewUser, Showtime, User, UserRole};
use movie_reservation::services::{halls, movies, showtimes};
use movie_reservation::store::{MemoryStore, Store};
use movie_reservation::AppState;

pub const ADMIN_ROLE_PASSWORD: &str = "let-me-admin";

pub fn test_config() -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            environment: "test".into(),
            rust_log: "movie_reservation=debug".into(),
        },
        database: DatabaseConfig {
            url: String::new(),
            pool_size: 1,
            acquire_timeout_secs: 1,
        },
        redis: RedisConfig { url: String::new() },
        jwt: JwtConfig {
            secret: "integration-test-secret".into(),
            expires_in_hours: 1,
        },
        auth: AuthConfig {
            admin_role_password: Some(ADMIN_ROLE_PASSWORD.into()),
            bcrypt_cost: 4,
        },
        features: FeatureFlags {
            enable_captcha: true,
        },
    }
}

pub fn test_state() -> Arc<AppState> {
    AppState::new(
        test_config(),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryChallengeStore::new()),
    )
}

/// Inserts a user straight into the store, skipping password hashing.
pub async fn seed_user(store: &dyn Store) -> User {
    let base: String = Name().fake();
    let mut tx = store.begin().await.unwrap();
    let taken = tx.user_by_name(&base).await.unwrap().is_some();
    let name = if taken {
        format!("{} {}", base, uuid::Uuid::new_v4())
    } else {
        base
    };
    let user = tx
        .insert_user(&NewUser {
            name,
            hashed_password: "not-a-real-hash".into(),
            role: UserRole::User,
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    user
}

pub async fn seed_movie(store: &dyn Store) -> Movie {
    let description: String = Sentence(3..8).fake();
    movies::create_movie(
        store,
        NewMovie {
            title: format!("Feature {}", uuid::Uuid::new_v4()),
            description,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_hall(store: &dyn Store, rows: i32, cols: i32) -> Hall {
    halls::create_hall(
        store,
        NewHall {
            name: format!("Hall {}", uuid::Uuid::new_v4()),
            seat_count: rows * cols,
            rows,
            cols,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_showtime(store: &dyn Store, movie: &Movie, hall: &Hall) -> Showtime {
    showtimes::create_showtime(
        store,
        NewShowtime {
            movie_id: movie.id,
            hall_id: hall.id,
            start_at: Utc::now() + Duration::days(1),
        },
    )
    .await
    .unwrap()
}

/// Seat id at a grid position of the hall.
pub async fn seat_at(store: &dyn Store, hall: &Hall, row: i32, col: i32) -> i64 {
    halls::hall_seats(store, hall.id)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.row == row && s.col == col)
        .map(|s| s.id)
        .unwrap()
}

/// Answers an issued captcha question such as `"7 * 3"`.
pub fn solve_captcha(question: &str) -> Option<i64> {
    let mut parts = question.split_whitespace();
    let a: i64 = parts.next()?.parse().ok()?;
    let op = parts.next()?;
    let b: i64 = parts.next()?.parse().ok()?;
    match op {
        "+" => Some(a + b),
        "-" => Some(a - b),
        "*" => Some(a * b),
        _ => None,
    }
}
