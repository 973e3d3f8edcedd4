//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::DashboardConfig;
use crate::i18n::{Locale, MessageKey, t};
use crate::services::EmailService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    pool: PgPool,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// An email service is built when SMTP is configured; a broken SMTP
    /// setup is logged and treated as absent.
    #[must_use]
    pub fn new(config: DashboardConfig, pool: PgPool) -> Self {
        let email = config.email.as_ref().and_then(|email_config| {
            EmailService::new(email_config)
                .inspect_err(|e| tracing::error!(error = %e, "Failed to configure SMTP"))
                .ok()
        });
        if email.is_none() {
            tracing::warn!("Email delivery disabled; password reset links will not be sent");
        }

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
            }),
        }
    }

    /// Get a reference to the dashboard configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The email service, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Deployment locale.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.inner.config.locale
    }

    /// Translate a message in the deployment locale.
    #[must_use]
    pub fn t(&self, key: MessageKey) -> &'static str {
        t(self.locale(), key)
    }
}
