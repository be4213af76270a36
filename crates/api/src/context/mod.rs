//! Application context - dependency injection container

use std::sync::Arc;

use pslang_core::{
    AccountDeps, AccountService, AdminService, AnalyticsClient, ChatProviderClient,
    ConnectorLinker, EmailSender, IdentityProvider, ProviderRegistry, StateSigner, SyncService,
    TierGateService,
};
use pslang_domain::{Config, PsLangError, Result};
use pslang_infra::{
    provider_clients, DbManager, HttpAnalyticsClient, HttpClient, HttpEmailSender,
    HttpIdentityProvider, SqlCipherAccountRepository, SqlCipherConversationRepository,
    SqlCipherCredentialRepository, SqlCipherPreferenceRepository,
};
use tracing::info;

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Builds a fresh analytics client for one visitor session.
pub type AnalyticsFactory = Arc<dyn Fn() -> Arc<dyn AnalyticsClient> + Send + Sync>;

/// External-service adapters the context is wired with.
pub struct Adapters {
    pub identity: Arc<dyn IdentityProvider>,
    pub chat_clients: Vec<Arc<dyn ChatProviderClient>>,
    pub email: Arc<dyn EmailSender>,
    pub analytics: AnalyticsFactory,
}

impl Adapters {
    /// HTTP adapters for every external service named in `config`.
    pub fn http(config: &Config) -> Result<Self> {
        let http = HttpClient::new()?;

        let analytics_config = config.analytics.clone();
        let analytics_http = http.clone();
        let analytics: AnalyticsFactory = Arc::new(move || {
            Arc::new(HttpAnalyticsClient::new(&analytics_config, analytics_http.clone()))
                as Arc<dyn AnalyticsClient>
        });

        Ok(Self {
            identity: Arc::new(HttpIdentityProvider::new(&config.identity, http.clone())),
            chat_clients: provider_clients(config, &http),
            email: Arc::new(HttpEmailSender::new(&config.email, http)),
            analytics,
        })
    }
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub identity: Arc<dyn IdentityProvider>,
    pub tier_gate: Arc<TierGateService>,
    pub linker: Arc<ConnectorLinker>,
    pub sync: Arc<SyncService>,
    pub accounts: Arc<AccountService>,
    pub admin: Arc<AdminService>,
    analytics: AnalyticsFactory,
}

impl AppContext {
    /// Open the database and wire the HTTP adapters from `config`.
    pub fn new(config: Config) -> Result<Self> {
        let db = open_database(&config)?;
        let adapters = Adapters::http(&config)?;
        Self::with_adapters(config, db, adapters)
    }

    /// Wire services over an open database and the given adapters.
    pub fn with_adapters(config: Config, db: Arc<DbManager>, adapters: Adapters) -> Result<Self> {
        let signer = Arc::new(StateSigner::new(
            &config.oauth.state_secret,
            config.oauth.state_ttl_seconds,
        )?);
        let registry = Arc::new(ProviderRegistry::new(adapters.chat_clients));

        let preferences = Arc::new(SqlCipherPreferenceRepository::new(db.clone()));
        let credentials = Arc::new(SqlCipherCredentialRepository::new(db.clone()));
        let conversations = Arc::new(SqlCipherConversationRepository::new(db.clone()));
        let account_records = Arc::new(SqlCipherAccountRepository::new(db.clone()));

        let tier_gate = Arc::new(TierGateService::new(preferences.clone()));
        let linker =
            Arc::new(ConnectorLinker::new(registry.clone(), credentials.clone(), signer));
        let sync =
            Arc::new(SyncService::new(registry.clone(), credentials.clone(), conversations.clone()));
        let accounts = Arc::new(
            AccountService::new(AccountDeps {
                accounts: account_records,
                preferences,
                credentials,
                conversations,
                email: adapters.email,
                registry,
            })
            .with_feedback_notifications(config.email.notify_address.clone()),
        );
        let admin = Arc::new(AdminService::new(adapters.identity.clone(), accounts.clone()));

        info!("application context initialized");
        Ok(Self {
            config,
            db,
            identity: adapters.identity,
            tier_gate,
            linker,
            sync,
            accounts,
            admin,
            analytics: adapters.analytics,
        })
    }

    /// Public origin used for redirects back to the site.
    pub fn public_url(&self) -> &str {
        &self.config.server.public_url
    }

    /// Analytics client for a single visitor session.
    pub fn analytics_session(&self) -> Arc<dyn AnalyticsClient> {
        (self.analytics)()
    }

    /// Check health of all application components
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new().add_component(self.check_database_health().await);
        status.calculate_score();
        status
    }

    /// Runs a trivial query on a pooled connection off the async runtime.
    async fn check_database_health(&self) -> ComponentHealth {
        let db = self.db.clone();
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(())) => ComponentHealth::healthy("database"),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "database health check failed");
                ComponentHealth::unhealthy("database", format!("query failed: {e}"))
            }
            Err(e) => {
                tracing::error!(error = %e, "database health check task panicked");
                ComponentHealth::unhealthy("database", format!("task panic: {e}"))
            }
        }
    }
}

/// Open (and migrate) the encrypted database named in `config`.
pub fn open_database(config: &Config) -> Result<Arc<DbManager>> {
    let key = config.database.encryption_key.as_deref();
    if key.map_or(true, |k| k.trim().is_empty()) {
        return Err(PsLangError::Config("PSLANG_DB_ENCRYPTION_KEY is not set".into()));
    }

    let db = DbManager::new(&config.database.path, config.database.pool_size, key)?;
    db.run_migrations()?;
    info!(path = %config.database.path, "database ready");
    Ok(Arc::new(db))
}
