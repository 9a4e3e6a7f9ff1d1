//! Arithmetic challenge gate in front of register and login.
//!
//! `issue` stores a digest of the answer under a fresh key, `verify` consumes it and, on a
//! correct answer, leaves a one-shot "passed" marker under the same key. `consume_pass` is
//! what register and login call; each marker admits exactly one of them.

use base64::{engine::general_purpose, Engine as _};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::cache::ChallengeStore;
use crate::error::{ServiceError, ServiceResult};

pub const CHALLENGE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub key: String,
    pub question: String,
}

fn answer_key(key: &str) -> String {
    format!("captcha:{}", key)
}

fn passed_key(key: &str) -> String {
    format!("captcha:{}:passed", key)
}

fn digest(answer: &str) -> String {
    let hash = Sha256::digest(answer.trim().as_bytes());
    general_purpose::STANDARD.encode(hash)
}

fn generate() -> (String, i64) {
    let mut rng = rand::thread_rng();
    let a: i64 = rng.gen_range(1..=20);
    let b: i64 = rng.gen_range(1..=20);
    match rng.gen_range(0..3) {
        0 => (format!("{} + {}", a, b), a + b),
        1 => (format!("{} - {}", a.max(b), a.min(b)), a.max(b) - a.min(b)),
        _ => (format!("{} * {}", a, b), a * b),
    }
}

pub async fn issue(cache: &dyn ChallengeStore) -> ServiceResult<Challenge> {
    let (question, answer) = generate();
    let key = Uuid::new_v4().to_string();
    cache
        .put(&answer_key(&key), &digest(&answer.to_string()), CHALLENGE_TTL_SECS)
        .await?;
    debug!("challenge {} issued", key);
    Ok(Challenge { key, question })
}

/// Checks an answer. Each challenge can be answered once, right or wrong.
pub async fn verify(cache: &dyn ChallengeStore, key: &str, answer: &str) -> ServiceResult<bool> {
    let Some(expected) = cache.take(&answer_key(key)).await? else {
        return Ok(false);
    };
    let passed = expected == digest(answer);
    if passed {
        cache.put(&passed_key(key), "1", CHALLENGE_TTL_SECS).await?;
    }
    debug!("challenge {} answered, passed={}", key, passed);
    Ok(passed)
}

pub async fn consume_pass(cache: &dyn ChallengeStore, key: &str) -> ServiceResult<()> {
    match cache.take(&passed_key(key)).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::Unauthorized("captcha not passed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryChallengeStore;

    fn solve(question: &str) -> Option<i64> {
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

    #[tokio::test]
    async fn correct_answer_grants_one_pass() {
        let cache = MemoryChallengeStore::new();
        let challenge = issue(&cache).await.unwrap();
        let answer = solve(&challenge.question).unwrap();

        assert!(verify(&cache, &challenge.key, &answer.to_string()).await.unwrap());
        assert!(consume_pass(&cache, &challenge.key).await.is_ok());
        assert!(consume_pass(&cache, &challenge.key).await.is_err());
    }

    #[tokio::test]
    async fn wrong_answer_burns_the_challenge() {
        let cache = MemoryChallengeStore::new();
        let challenge = issue(&cache).await.unwrap();
        let answer = solve(&challenge.question).unwrap();

        assert!(!verify(&cache, &challenge.key, &(answer + 1).to_string()).await.unwrap());
        assert!(!verify(&cache, &challenge.key, &answer.to_string()).await.unwrap());
        assert!(matches!(
            consume_pass(&cache, &challenge.key).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn generated_questions_are_solvable() {
        for _ in 0..100 {
            let (question, answer) = generate();
            assert_eq!(solve(&question), Some(answer));
        }
    }
}
