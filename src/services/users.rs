use tokio::task;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{NewUser, User, UserRole};
use crate::security;
use crate::store::{constraints, Store};

use super::finish;

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub password: String,
    pub role: UserRole,
    pub admin_password: Option<String>,
}

/// Admin accounts need the configured admin role password; plain users need nothing extra.
fn check_role(reg: &Registration, auth: &AuthConfig) -> ServiceResult<()> {
    if reg.role != UserRole::Admin {
        return Ok(());
    }
    let Some(given) = reg.admin_password.as_deref().filter(|p| !p.is_empty()) else {
        return Err(ServiceError::InvalidInput(
            "admin_role_password is required to register an admin".into(),
        ));
    };
    match auth.admin_role_password.as_deref() {
        Some(expected) if expected == given => Ok(()),
        _ => {
            warn!("rejected admin registration for {}", reg.name);
            Err(ServiceError::Unauthorized("wrong admin role password"))
        }
    }
}

pub async fn register(store: &dyn Store, reg: Registration, auth: &AuthConfig) -> ServiceResult<User> {
    check_role(&reg, auth)?;
    let password = reg.password.clone();
    let cost = auth.bcrypt_cost;
    let hashed_password =
        task::spawn_blocking(move || security::hash_password(&password, cost)).await??;

    let mut tx = store.begin().await?;
    let result = tx
        .insert_user(&NewUser {
            name: reg.name.clone(),
            hashed_password,
            role: reg.role,
        })
        .await
        .map_err(|e| {
            if e.is_unique_violation(constraints::USER_NAME) {
                ServiceError::AlreadyExists("user")
            } else {
                ServiceError::Store(e)
            }
        });
    let user = finish(tx, result).await?;
    info!("user {} registered as {}", user.id, user.role);
    Ok(user)
}

/// Unknown names and wrong passwords are indistinguishable to the caller.
pub async fn authenticate(store: &dyn Store, name: &str, password: &str) -> ServiceResult<User> {
    let mut tx = store.begin().await?;
    let result = tx.user_by_name(name).await.map_err(ServiceError::from);
    let user = finish(tx, result).await?;

    let Some(user) = user else {
        return Err(ServiceError::InvalidCredential);
    };
    let password = password.to_string();
    let hashed = user.hashed_password.clone();
    let matches = task::spawn_blocking(move || security::verify_password(&password, &hashed)).await?;
    if matches {
        Ok(user)
    } else {
        Err(ServiceError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn auth(admin: Option<&str>) -> AuthConfig {
        AuthConfig {
            admin_role_password: admin.map(str::to_string),
            bcrypt_cost: 4,
        }
    }

    fn reg(role: UserRole, admin_password: Option<&str>) -> Registration {
        Registration {
            name: "trinity".into(),
            password: "pw".into(),
            role,
            admin_password: admin_password.map(str::to_string),
        }
    }

    #[test]
    fn admin_role_needs_matching_password() {
        let cfg = auth(Some("sesame"));
        assert!(check_role(&reg(UserRole::User, None), &cfg).is_ok());
        assert!(check_role(&reg(UserRole::Admin, Some("sesame")), &cfg).is_ok());
        assert!(matches!(
            check_role(&reg(UserRole::Admin, None), &cfg),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            check_role(&reg(UserRole::Admin, Some("guess")), &cfg),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn admin_registration_closed_without_configured_password() {
        assert!(check_role(&reg(UserRole::Admin, Some("x")), &auth(None)).is_err());
    }

    #[tokio::test]
    async fn registered_user_can_authenticate() {
        let store = MemoryStore::new();
        let user = register(&store, reg(UserRole::User, None), &auth(None)).await.unwrap();
        assert_ne!(user.hashed_password, "pw");

        let found = authenticate(&store, "trinity", "pw").await.unwrap();
        assert_eq!(found.id, user.id);
        assert!(matches!(
            authenticate(&store, "trinity", "wrong").await,
            Err(ServiceError::InvalidCredential)
        ));
        assert!(matches!(
            authenticate(&store, "nobody", "pw").await,
            Err(ServiceError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let store = MemoryStore::new();
        register(&store, reg(UserRole::User, None), &auth(None)).await.unwrap();
        assert!(matches!(
            register(&store, reg(UserRole::User, None), &auth(None)).await,
            Err(ServiceError::AlreadyExists("user"))
        ));
    }
}
