//! Database seeder for Tally development and testing.
//!
//! Runs pending migrations, then seeds the default chart of accounts and one
//! demo customer and vendor for a tenant. The tenant comes from
//! `TALLY_SEED_TENANT_ID`, falling back to a fixed demo ID. Re-running is
//! safe: existing accounts and contacts are left alone.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tally_core::documents::CounterpartyKind;
use tally_db::repositories::{
    AccountRepository, ContactError, ContactRepository, CreateContactInput,
};
use tally_db::Migrator;
use tally_shared::AppConfig;
use tally_shared::types::TenantId;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Demo tenant used when `TALLY_SEED_TENANT_ID` is unset.
const DEMO_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=info,sea_orm=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let tenant_id = seed_tenant_id()?;

    let db = tally_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    Migrator::up(&db, None).await.context("failed to run migrations")?;
    info!("Migrations applied");

    let inserted = AccountRepository::new(db.clone())
        .seed_default_chart(tenant_id)
        .await?;
    info!(%tenant_id, inserted, "Seeded chart of accounts");

    let contacts = ContactRepository::new(db);
    for input in demo_contacts() {
        let code = input.code.clone();
        match contacts.create(tenant_id, input).await {
            Ok(contact) => info!(code = %contact.code, kind = %contact.kind, "Seeded contact"),
            Err(ContactError::DuplicateCode(_)) => info!(%code, "Contact already exists, skipping"),
            Err(err) => return Err(err.into()),
        }
    }

    info!("Seeding complete");
    Ok(())
}

fn seed_tenant_id() -> anyhow::Result<TenantId> {
    let raw = std::env::var("TALLY_SEED_TENANT_ID").unwrap_or_else(|_| DEMO_TENANT_ID.to_string());
    let uuid = Uuid::parse_str(&raw).with_context(|| format!("invalid tenant id '{raw}'"))?;
    Ok(TenantId::from_uuid(uuid))
}

fn demo_contacts() -> [CreateContactInput; 2] {
    [
        CreateContactInput {
            kind: CounterpartyKind::Customer,
            code: "C001".to_string(),
            name: "Siam Trading Co., Ltd.".to_string(),
            tax_id: Some("0105551234567".to_string()),
        },
        CreateContactInput {
            kind: CounterpartyKind::Vendor,
            code: "V001".to_string(),
            name: "Bangkok Office Supplies".to_string(),
            tax_id: Some("0105557654321".to_string()),
        },
    ]
}
