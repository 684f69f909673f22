//! Shared application state handed to every handler through axum's
//! `State` extractor. Built once at startup from [`AppConfig`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use lib_common::auth::TokenIssuer;
use lib_common::connections::{Database, ParcelStore, UserStore};
use lib_common::geo::GeoapifyClient;
use lib_common::mailer::{Mailer, MailerConfig, MailerHandle};
use lib_common::payments::StripeClient;

use crate::parcel_logic::config::AppConfig;

/// Immutable shared state. Cloning the `Arc` is cheap; every inner
/// client is itself a thin handle over pooled resources.
pub struct AppState {
    pub parcels: ParcelStore,
    pub users: UserStore,
    pub geo: Option<GeoapifyClient>,
    pub stripe: Option<StripeClient>,
    pub mailer: Option<MailerHandle>,
    pub tokens: TokenIssuer,
    pub upload_dir: PathBuf,
    pub stream_poll_interval: Duration,
    pub contact_inbox: Option<String>,
}

impl AppState {
    /// Connects to PostgreSQL, verifies the connection, prepares the
    /// upload directory, and spawns the mail consumer when configured.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Arc<Self>> {
        let database = Database::new(&config.db_url, config.db_max_connections)
            .await
            .context("Failed to create database pool")?;
        database.ping().await.context("Database ping failed")?;
        info!("Database connection verified");

        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .with_context(|| format!("Failed to create upload dir {:?}", config.upload_dir))?;

        let geo = match &config.geoapify_api_key {
            Some(key) => Some(GeoapifyClient::new(key.clone())),
            None => {
                warn!("GEOAPIFY_API_KEY not set, geo enrichment disabled");
                None
            }
        };

        let stripe = match &config.stripe_secret_key {
            Some(key) => Some(StripeClient::new(key.clone())),
            None => {
                warn!("STRIPE_SECRET_KEY not set, payments disabled");
                None
            }
        };

        let mailer = match (&config.mail_relay_url, &config.mail_default_sender) {
            (Some(relay_url), Some(sender)) => Some(Mailer::spawn(MailerConfig {
                relay_url: relay_url.clone(),
                sender: sender.clone(),
            })),
            _ => {
                warn!("Mail relay not configured, notifications disabled");
                None
            }
        };

        let tokens = TokenIssuer::new(
            config.jwt_secret_key.clone(),
            config.jwt_access_expires_minutes,
            config.jwt_refresh_expires_days,
        );

        Ok(Arc::new(Self {
            parcels: ParcelStore::new(database.pool.clone()),
            users: UserStore::new(database.pool),
            geo,
            stripe,
            mailer,
            tokens,
            upload_dir: config.upload_dir.clone(),
            stream_poll_interval: Duration::from_secs(config.stream_poll_seconds),
            contact_inbox: config.mail_contact_inbox.clone(),
        }))
    }
}
