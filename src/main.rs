use std::sync::Arc;

use bytes::Bytes;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use customer_service::config::AppConfig;
use customer_service::domain::customer::{
    CustomerError, CustomerService, CustomerValuesService, MultimediaService, PatchOperation,
};
use customer_service::infra::{seed, InMemoryCustomerRepository, InMemoryMediaStore, InMemoryUserDirectory};
use customer_service::messaging::{LogMailOutput, Mailer};
use customer_service::metrics::Metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // RUST_LOG wins over the configured filter
    // Example: RUST_LOG=trace cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .init();

    tracing::info!("🚀 Starting customer service demo");
    tracing::debug!(?config, "Configuration loaded");

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);

    // === 2. Collaborators ===
    let repo = Arc::new(InMemoryCustomerRepository::new());
    let directory = Arc::new(InMemoryUserDirectory::with_users(seed::users()));
    let media = Arc::new(InMemoryMediaStore::new());
    let mailer = Arc::new(Mailer::new(
        Arc::new(LogMailOutput),
        config.mail.clone(),
        config.circuit_breaker.clone(),
        metrics.clone(),
    ));

    if config.populate {
        seed::populate(repo.as_ref()).await?;
    }

    // === 3. Services ===
    let service = CustomerService::new(
        repo.clone(),
        directory.clone(),
        mailer,
        metrics.clone(),
        config.service.clone(),
    );
    let values = CustomerValuesService::new(repo.clone(), config.service.clone());
    let multimedia = MultimediaService::new(repo.clone(), media, config.service.clone());

    tracing::info!("📊 {} customers stored", values.count().await?);

    // === 4. Reads ===
    let alpha_id = Uuid::from_u128(1).to_string();
    if let Some(alpha) = service.find_by_id(&alpha_id, "alpha1").await? {
        tracing::info!(customer_id = %alpha_id, email = %alpha.email, "✅ Owner read");
    }
    match service.find_by_id(&alpha_id, "delta").await {
        Err(CustomerError::AccessForbidden { roles }) => {
            tracing::info!(?roles, "🔒 Read by another customer refused")
        }
        other => tracing::warn!(?other, "Unexpected read outcome"),
    }
    let found = service.find(&[("nachname", "alpha")]).await?;
    tracing::info!("🔎 {} customers named Alpha", found.len());

    // === 5. Full update and patch ===
    let Some(version) = values.version_by_id(&alpha_id).await? else {
        anyhow::bail!("seed customer {alpha_id} is missing");
    };
    let Some(current) = service.find_by_id(&alpha_id, "admin").await? else {
        anyhow::bail!("seed customer {alpha_id} is missing");
    };

    let mut candidate = current.clone();
    candidate.category = 5;
    if let Some(updated) = service.update(candidate, &alpha_id, &version.to_string()).await? {
        tracing::info!(version = ?updated.version, "✅ Customer updated");
    }

    let operations = [
        PatchOperation::replace("/email", "alpha.neu@acme.de"),
        PatchOperation::add("/interessen", "SPORT"),
    ];
    let patched = service
        .patch(&alpha_id, "alpha1", &operations, &(version + 1).to_string())
        .await?;
    if let Some(patched) = patched {
        tracing::info!(version = ?patched.version, email = %patched.email, "✅ Customer patched");
    }

    // === 6. Conflicts ===
    match service
        .patch(&alpha_id, "alpha1", &operations, &version.to_string())
        .await
    {
        Err(err @ CustomerError::InvalidVersion(_)) => tracing::info!(error = %err, "⚠️ Stale version refused"),
        other => tracing::warn!(?other, "Unexpected patch outcome"),
    }
    let taken = [PatchOperation::replace("/email", "delta@acme.uk")];
    match service
        .patch(&alpha_id, "alpha1", &taken, &(version + 2).to_string())
        .await
    {
        Err(err @ CustomerError::EmailExists(_)) => tracing::info!(error = %err, "⚠️ Duplicate email refused"),
        other => tracing::warn!(?other, "Unexpected patch outcome"),
    }

    // === 7. Multimedia ===
    if let Some(stored) = multimedia
        .save(&alpha_id, Bytes::from_static(b"\x89PNG"), "image/png")
        .await?
    {
        tracing::info!(content_type = %stored.content_type, "🖼️ Media stored");
    }

    tracing::info!("🎉 Demo complete!");
    println!("{}", metrics.render()?);

    Ok(())
}
