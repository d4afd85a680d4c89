use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// SMTP connection settings, read once at startup.
///
/// `secure` selects implicit TLS on connect, `require_tls` forces a STARTTLS
/// upgrade; with both unset a remote host gets opportunistic STARTTLS.
#[derive(Clone)]
pub struct SmtpConfig {
  pub host: String,
  pub port: u16,
  pub secure: bool,
  pub require_tls: bool,
  pub username: String,
  pub password: String,
  pub from_email: String,
  pub reply_to: String,
}

impl std::fmt::Debug for SmtpConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SmtpConfig")
      .field("host", &self.host)
      .field("port", &self.port)
      .field("secure", &self.secure)
      .field("require_tls", &self.require_tls)
      .field("username", &"[redacted]")
      .field("password", &"[redacted]")
      .field("from_email", &self.from_email)
      .field("reply_to", &self.reply_to)
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
  pub window: Duration,
  pub max_requests: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub smtp: SmtpConfig,
  pub templates_dir: PathBuf,
  pub error_log_file: PathBuf,
  pub send_timeout: Duration,
  pub verify_on_startup: bool,
  pub port: u16,
  pub rate_limit: RateLimitConfig,
}

impl AppConfig {
  /// Builds the whole configuration from environment variables. Credentials
  /// are required, everything else has a default.
  pub fn from_env() -> anyhow::Result<Self> {
    let smtp = SmtpConfig {
      host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
      port: env_parse("SMTP_PORT", 587),
      secure: env_bool("SMTP_SECURE", false),
      require_tls: env_bool("SMTP_REQUIRE_TLS", false),
      username: env::var("SMTP_USER").context("SMTP_USER environment variable must be set")?,
      password: env::var("SMTP_PASS").context("SMTP_PASS environment variable must be set")?,
      from_email: env::var("SMTP_FROM").context("SMTP_FROM environment variable must be set")?,
      reply_to: env::var("SMTP_REPLY_TO").unwrap_or_else(|_| {
        env::var("SMTP_FROM").unwrap_or_default()
      }),
    };

    Ok(AppConfig {
      smtp,
      templates_dir: PathBuf::from(env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string())),
      error_log_file: PathBuf::from(
        env::var("ERROR_LOG_FILE").unwrap_or_else(|_| "logs/send-email.log".to_string()),
      ),
      send_timeout: Duration::from_secs(env_parse("SMTP_SEND_TIMEOUT_SECS", 30)),
      verify_on_startup: env_bool("SMTP_VERIFY_ON_STARTUP", false),
      port: env_parse("PORT", 4000),
      rate_limit: RateLimitConfig {
        window: Duration::from_secs(env_parse("RATE_LIMIT_WINDOW_SECS", 60)),
        max_requests: env_parse("RATE_LIMIT_MAX_REQUESTS", 30),
      },
    })
  }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
  env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
  env::var(key).map(|v| v == "true" || v == "1").unwrap_or(default)
}
