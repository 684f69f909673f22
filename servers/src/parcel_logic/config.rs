//! # Server Configuration
//!
//! Runtime configuration for the parcel API server, resolved by `clap` from
//! command-line flags with environment-variable fallbacks. A `.env` file is
//! loaded by the binary before parsing, so deployments can ship a flat env
//! file and override individual values on the command line.

use std::path::PathBuf;

use clap::Parser;

/// Command-line and environment configuration for `server_parcels`.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about = "Parcel delivery tracking API server.")]
pub struct AppConfig {
    /// PostgreSQL connection string.
    #[clap(long, env = "DATABASE_URL")]
    pub db_url: String,

    /// Maximum number of pooled database connections.
    #[clap(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,

    /// TCP port to listen on.
    #[clap(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Secret used to sign and verify JWTs.
    #[clap(long, env = "JWT_SECRET_KEY")]
    pub jwt_secret_key: String,

    /// Access token lifetime in minutes.
    #[clap(long, env = "JWT_ACCESS_EXPIRES_MINUTES", default_value_t = 50)]
    pub jwt_access_expires_minutes: i64,

    /// Refresh token lifetime in days.
    #[clap(long, env = "JWT_REFRESH_EXPIRES_DAYS", default_value_t = 30)]
    pub jwt_refresh_expires_days: i64,

    /// Geoapify API key. When absent, streams degrade to bare status
    /// payloads and the route/quote endpoints report the provider as
    /// unavailable.
    #[clap(long, env = "GEOAPIFY_API_KEY")]
    pub geoapify_api_key: Option<String>,

    /// Stripe secret key for creating payment intents.
    #[clap(long, env = "STRIPE_SECRET_KEY")]
    pub stripe_secret_key: Option<String>,

    /// HTTP mail relay endpoint. Mail is disabled when unset.
    #[clap(long, env = "MAIL_RELAY_URL")]
    pub mail_relay_url: Option<String>,

    /// Sender address for outbound notification mail.
    #[clap(long, env = "MAIL_DEFAULT_SENDER")]
    pub mail_default_sender: Option<String>,

    /// Inbox that receives contact-form submissions.
    #[clap(long, env = "MAIL_USERNAME")]
    pub mail_contact_inbox: Option<String>,

    /// Directory for parcel and proof-of-delivery images.
    #[clap(long, env = "UPLOAD_DIR", default_value = "./uploads")]
    pub upload_dir: PathBuf,

    /// Seconds between tracking stream polling cycles.
    #[clap(long, env = "STREAM_POLL_SECONDS", default_value_t = 2)]
    pub stream_poll_seconds: u64,
}
