//! Service wiring: picks the store, mailer and token implementations from
//! [`AppConfig`] and builds the application services over them.

use std::sync::Arc;

use taskboard_auth::{Hs256Jwt, JwtValidator, PasswordHasher};
use taskboard_infra::{
    config::AppConfig,
    mailer::{LogMailSender, MailSender, SmtpMailSender},
    services::{AuthService, ProjectService},
    store::{InMemoryDocumentStore, ProjectStore, UserStore},
};

/// Everything a request handler needs, shared behind an `Arc`.
pub struct AppServices {
    pub auth: AuthService,
    pub projects: ProjectService,
    pub jwt: Arc<dyn JwtValidator>,
}

impl AppServices {
    pub fn new(
        users: Arc<dyn UserStore>,
        projects: Arc<dyn ProjectStore>,
        mailer: Arc<dyn MailSender>,
        config: &AppConfig,
    ) -> Self {
        let jwt = Arc::new(Hs256Jwt::with_ttl(&config.jwt_secret, config.session_ttl));

        Self {
            auth: AuthService::new(
                users.clone(),
                mailer,
                jwt.clone(),
                PasswordHasher::new(config.bcrypt_cost),
                config.mail_from.clone(),
            ),
            projects: ProjectService::new(projects, users),
            jwt,
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let mailer = build_mailer(config)?;
    let (users, projects) = build_stores(config).await?;
    Ok(AppServices::new(users, projects, mailer, config))
}

fn build_mailer(config: &AppConfig) -> anyhow::Result<Arc<dyn MailSender>> {
    match &config.smtp_url {
        Some(url) => {
            let sender = SmtpMailSender::from_url(url)?;
            tracing::info!("mail delivery via SMTP");
            Ok(Arc::new(sender))
        }
        None => {
            tracing::info!("SMTP_URL not set; outgoing mail is logged only");
            Ok(Arc::new(LogMailSender))
        }
    }
}

#[cfg(feature = "postgres")]
async fn build_stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn UserStore>, Arc<dyn ProjectStore>)> {
    use anyhow::Context;
    use taskboard_infra::store::PostgresDocumentStore;

    if let (true, Some(url)) = (config.use_persistent_stores, config.database_url.as_deref()) {
        let store = PostgresDocumentStore::connect(url)
            .await
            .context("failed to connect to DATABASE_URL")?;
        store
            .ensure_schema()
            .await
            .context("failed to prepare document tables")?;
        tracing::info!("using Postgres document store");
        let store = Arc::new(store);
        return Ok((store.clone(), store));
    }

    Ok(in_memory_stores())
}

#[cfg(not(feature = "postgres"))]
async fn build_stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn UserStore>, Arc<dyn ProjectStore>)> {
    if config.use_persistent_stores {
        tracing::warn!(
            "USE_PERSISTENT_STORES=true but the `postgres` feature is disabled; using in-memory store"
        );
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> (Arc<dyn UserStore>, Arc<dyn ProjectStore>) {
    let store = Arc::new(InMemoryDocumentStore::new());
    tracing::info!("using in-memory document store");
    (store.clone(), store)
}
