use sqlx::SqlitePool;
use tracing::info;

/// Centralized SQLite migrations.
///
/// Each migration is safe to call multiple times (idempotent) by using
/// `IF NOT EXISTS` throughout. Timestamps are stored as RFC 3339 text in
/// UTC.
pub(crate) async fn migrate_all(pool: &SqlitePool) -> anyhow::Result<()> {
    migrate_users(pool).await?;
    migrate_profiles(pool).await?;
    migrate_reminders(pool).await?;
    migrate_care_team(pool).await?;
    migrate_plans(pool).await?;
    migrate_subscriptions(pool).await?;
    Ok(())
}

async fn migrate_users(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            api_token TEXT NOT NULL,
            created_at TEXT NOT NULL,
            is_pro INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_token ON users(api_token)")
        .execute(pool)
        .await?;

    info!("Users table migration complete");
    Ok(())
}

async fn migrate_profiles(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            age INTEGER,
            gender TEXT NOT NULL DEFAULT '',
            weight_kg REAL,
            height_cm REAL,
            conditions TEXT NOT NULL DEFAULT '',
            allergies TEXT NOT NULL DEFAULT '',
            medications TEXT NOT NULL DEFAULT '',
            emergency_contact TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            notify_email INTEGER NOT NULL DEFAULT 1,
            notify_sms INTEGER NOT NULL DEFAULT 0,
            tz TEXT NOT NULL DEFAULT 'UTC',
            goals TEXT NOT NULL DEFAULT '',
            diet_prefs TEXT NOT NULL DEFAULT '',
            activity_limits TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Profiles table migration complete");
    Ok(())
}

async fn migrate_reminders(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reminders (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'general',
            due_at TEXT NOT NULL,
            pre_notify_min INTEGER NOT NULL DEFAULT 0,
            notes TEXT NOT NULL DEFAULT '',
            sent_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reminders_user_due
         ON reminders(user_id, due_at ASC)",
    )
    .execute(pool)
    .await?;

    // The dispatch scan only ever touches unsent rows; a partial index
    // keeps it cheap as sent reminders accumulate.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reminders_unsent
         ON reminders(due_at) WHERE sent_at IS NULL",
    )
    .execute(pool)
    .await?;

    info!("Reminders table migration complete");
    Ok(())
}

async fn migrate_care_team(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS care_team (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id TEXT NOT NULL,
            caregiver_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'viewer',
            UNIQUE(patient_id, caregiver_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_care_team_patient ON care_team(patient_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_care_team_caregiver ON care_team(caregiver_id)")
        .execute(pool)
        .await?;

    info!("Care team table migration complete");
    Ok(())
}

async fn migrate_plans(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plans (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'assistant',
            content TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_plans_user_created
         ON plans(user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    info!("Plans table migration complete");
    Ok(())
}

async fn migrate_subscriptions(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subscriptions (
            user_id TEXT PRIMARY KEY,
            stripe_customer_id TEXT,
            stripe_subscription_id TEXT,
            status TEXT NOT NULL DEFAULT 'inactive',
            current_period_end TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_customer
         ON subscriptions(stripe_customer_id)",
    )
    .execute(pool)
    .await?;

    info!("Subscriptions table migration complete");
    Ok(())
}
