use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

const DEFAULT_CATEGORIES: &[&str] = &[
    "Genetics",
    "Molecular Biology",
    "Cell Biology",
    "Ecology",
    "Evolution",
    "Biochemistry",
];

/// Make sure at least one teacher account exists so the platform is usable
/// after a fresh deployment.
pub(crate) async fn ensure_initial_teacher(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_teacher_password.is_empty() {
        tracing::warn!("FIRST_TEACHER_PASSWORD not configured; skipping initial teacher creation");
        return Ok(());
    }

    if repositories::users::any_teacher_exists(state.db()).await? {
        tracing::info!("Teacher account already present; skipping initial teacher creation");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_teacher_password)?;
    let now = primitive_now_utc();

    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &admin.first_teacher_username,
            hashed_password,
            full_name: "Administrator",
            role: UserRole::Teacher,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(username = %admin.first_teacher_username, "Created initial teacher account");
    Ok(())
}

/// Seed the stock biology categories when the table is empty.
pub(crate) async fn ensure_default_categories(state: &AppState) -> anyhow::Result<()> {
    if !state.settings().admin().seed_default_categories {
        return Ok(());
    }

    if repositories::categories::count(state.db()).await? > 0 {
        return Ok(());
    }

    for name in DEFAULT_CATEGORIES {
        repositories::categories::create(state.db(), &Uuid::new_v4().to_string(), name).await?;
    }

    tracing::info!(count = DEFAULT_CATEGORIES.len(), "Seeded default categories");
    Ok(())
}
