use tracing::info;

use crate::config::BootstrapConfig;
use crate::models::shared::{normalize_email, validate_email};
use crate::store::{NewUser, Role, Store, StoreResult};
use crate::utils::hash;

/// Make sure the configured superuser exists with the configured email and
/// password.
///
/// An existing account with that username is promoted rather than recreated,
/// so its reviews and comments survive restarts.
pub async fn ensure_superuser(store: &dyn Store, cfg: &BootstrapConfig) -> anyhow::Result<()> {
    validate_email(cfg.email.trim())
        .map_err(|e| anyhow::anyhow!("Invalid bootstrap email {:?}: {e}", cfg.email))?;
    let email = normalize_email(&cfg.email);
    let password = hash::hash_password(&cfg.password)
        .map_err(|e| anyhow::anyhow!("Password hash error: {e}"))?;

    match store.find_user_by_username(&cfg.username).await? {
        Some(mut existing) => {
            existing.is_superuser = true;
            existing.role = Role::Admin;
            existing.email = email;
            existing.password = password;
            store.update_user(existing).await?;
            info!(username = %cfg.username, "Bootstrap superuser updated");
        }
        None => {
            insert_superuser(store, cfg, email, password).await?;
            info!(username = %cfg.username, "Bootstrap superuser created");
        }
    }
    Ok(())
}

async fn insert_superuser(
    store: &dyn Store,
    cfg: &BootstrapConfig,
    email: String,
    password: String,
) -> StoreResult<()> {
    let user = NewUser {
        password,
        is_superuser: true,
        ..NewUser::signup(cfg.username.clone(), email, String::new())
    };
    store.insert_user(user).await.map(|_| ())
}
