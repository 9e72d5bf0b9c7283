use std::sync::Arc;

use common::mail::{Mailer, console::ConsoleMailer, memory::MemoryMailer};
use common::storage::{
    BlobStore, filesystem::FilesystemBlobStore, memory::MemoryBlobStore, s3::S3BlobStore,
};
use tracing::{Level, info};

use server::config::{AppConfig, MailBackendKind, StorageBackendKind};
use server::state::AppState;
use server::{database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;
    seed::seed_role_permissions(&db).await?;

    let blob_store = build_blob_store(&config).await?;
    let mailer = build_mailer(&config)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        db,
        config,
        blob_store,
        mailer,
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_blob_store(config: &AppConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    let storage = &config.storage;
    let store: Arc<dyn BlobStore> = match storage.backend {
        StorageBackendKind::Filesystem => Arc::new(
            FilesystemBlobStore::new(storage.filesystem.root.clone(), storage.max_resume_size)
                .await?,
        ),
        StorageBackendKind::S3 => {
            let s3 = storage
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("storage.backend = \"s3\" requires [storage.s3]"))?;
            Arc::new(S3BlobStore::new(
                &s3.bucket,
                &s3.region,
                s3.endpoint.as_deref(),
                &s3.access_key,
                &s3.secret_key,
                storage.max_resume_size,
            )?)
        }
        StorageBackendKind::Memory => Arc::new(MemoryBlobStore::new()),
    };
    Ok(store)
}

fn build_mailer(config: &AppConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match config.mail.backend {
        MailBackendKind::Console => Arc::new(ConsoleMailer::new()),
        MailBackendKind::Smtp => {
            let smtp = config
                .mail
                .smtp
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("mail.backend = \"smtp\" requires [mail.smtp]"))?;
            Arc::new(common::mail::smtp::SmtpMailer::new(
                &smtp.host,
                smtp.port,
                &smtp.username,
                &smtp.password,
                &config.mail.from,
            )?)
        }
        MailBackendKind::Memory => Arc::new(MemoryMailer::new()),
    };
    Ok(mailer)
}
