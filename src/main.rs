use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::signal;

use verimail_api::app::create_app;
use verimail_api::config::AppConfig;
use verimail_api::email::dispatcher::MailDispatcher;
use verimail_api::email::service::VerificationService;
use verimail_api::email::template::TemplateRenderer;
use verimail_api::email::transport::{Mailer, SmtpMailer};
use verimail_api::logging::FileErrorLog;
use verimail_api::middleware::rate_limit::RateLimiter;
use verimail_api::state::SharedAppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenv().ok();

  tracing_subscriber::fmt::init();

  let config = AppConfig::from_env()?;

  let renderer = TemplateRenderer::new(&config.templates_dir)?;
  let mailer = Arc::new(SmtpMailer::new(config.smtp.clone()));

  if config.verify_on_startup {
    mailer
      .verify()
      .await
      .map_err(|e| anyhow::anyhow!("smtp verification failed: {}", e))?;
    tracing::info!("smtp connection verified");
  }

  let dispatcher = MailDispatcher::new(mailer, config.send_timeout);
  let error_log = Arc::new(FileErrorLog::new(config.error_log_file.clone()));
  let service = VerificationService::new(renderer, dispatcher, error_log);

  let state = SharedAppState::new(Arc::new(service));
  let limiter = RateLimiter::new(&config.rate_limit);
  let app = create_app(state, limiter);

  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
  let listener = tokio::net::TcpListener::bind(addr).await?;

  tracing::info!("server running on http://{}", addr);

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
  };

  #[cfg(unix)]
  let terminate = async {
    signal::unix::signal(signal::unix::SignalKind::terminate())
      .expect("Failed to install signal handler")
      .recv()
      .await;
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
      _ = ctrl_c => {},
      _ = terminate => {},
  }

  tracing::info!("received termination signal, shutting down gracefully");
}
