use tracing::info;

use crate::config::BootstrapConfig;
use crate::models::{
    role,
    user::{self, UserForm},
};
use crate::state::AppState;

/// Seeds the `user` and `superuser` roles and, when configured, an admin
/// account holding both. Safe to run on every start.
pub async fn seed(state: &AppState, boot: Option<&BootstrapConfig>) -> anyhow::Result<()> {
    let user_role = role::ensure(&state.db, role::USER, Some("Regular account")).await?;
    let super_role = role::ensure(&state.db, role::SUPERUSER, Some("Full access to the admin views")).await?;

    let Some(boot) = boot else {
        return Ok(());
    };
    let (Some(email), Some(password)) = (boot.admin_email.as_deref(), boot.admin_password.as_deref()) else {
        return Ok(());
    };

    if user::find_by_email(&state.db, email).await?.is_some() {
        info!("Bootstrap admin {} already exists", email);
        return Ok(());
    }

    let form = UserForm {
        first_name: boot.admin_first_name.clone().or_else(|| Some("Admin".to_string())),
        last_name: None,
        email: email.to_string(),
        password: Some(password.to_string()),
        active: Some(true),
        confirmed_at: Some(chrono::Utc::now()),
        roles: Some(vec![user_role.id, super_role.id]),
    };
    let admin = user::create(&state.db, &state.crypto, form).await?;
    info!(user_id = admin.id, "Bootstrap admin {} created", admin.email);
    Ok(())
}
