use actix_web::{middleware, web, App, HttpServer};
use actix_cors::Cors;
use r2d2_sqlite::SqliteConnectionManager;
use color_eyre::Result;
use eyre::WrapErr;
use log::{debug, info};
use std::sync::Arc;
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::config::{Config, MailgunSettings, SiteInfo};
use crate::db::{Pool, SqliteCommentStore};
use crate::notifications::NotificationService;
use crate::notifications::mailgun::MailgunMailer;
use crate::pipelines::Pipelines;
use crate::rebuild::WebhookTrigger;
use error::JsonError;
mod handlers;
mod error;

// Declare app state struct:
pub struct AppState {
  pub pipelines: Pipelines
}

// Everything external gets built here from the
// config and handed to the pipelines, nothing else
// reads the config afterwards.
fn build_app_state(config: &Config) -> Result<AppState> {
  let manager = SqliteConnectionManager::file(&config.db_path);
  let pool = Pool::new(manager)
    .context("Database connection failed")?;
  let store = SqliteCommentStore::open(pool)
    .context("Could not create the comments table")?;

  let mailer = MailgunMailer::new(&MailgunSettings::from(config));
  let notifications = NotificationService::new(
    Arc::new(mailer),
    SiteInfo::from(config)
  ).context("Fatal: email templates are invalid")?;

  let rebuild = WebhookTrigger::new(&config.rebuild_hook_url);

  Ok(AppState {
    pipelines: Pipelines::new(
      Arc::new(store),
      notifications,
      Arc::new(rebuild)
    )
  })
}

// Function to start the server.
// Has to be async because there should be a .await at the end.
pub async fn run() -> Result<()> {
  let config = Config::from_env()
    .context("Configuration (environment or .env file) is missing")?;
  debug!("Current bind address: {}, database: {}", config.bind_address, config.db_path);

  let app_state = web::Data::new(build_app_state(&config)?);
  let bind_address = config.bind_address.clone();
  info!("Starting server on {}", bind_address);

  HttpServer::new(move|| {
    App::new()
      .app_data(app_state.clone())
      // The comment widget is served from the blog
      // domain, which isn't ours.
      .wrap(Cors::permissive())
      .wrap(middleware::Logger::default())
      .configure(base_endpoints_config)
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(bind_address)?
  .run()
  .await
  .context("Start Actix web server")
}

// Route configuration:
fn base_endpoints_config(cfg: &mut web::ServiceConfig) {
  cfg.app_data(web::PathConfig::default().error_handler(|_, _| {
      actix_web::error::ErrorBadRequest("Invalid path arguments")
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _| {
      JsonError(error::Error::BadRequest(err.to_string())).into()
    }))
    .route("/", web::get().to(handlers::approved_comments))
    .route("/new", web::post().to(handlers::new_comment))
    .route("/approval/{commentId}", web::get().to(handlers::approval))
    .route("/delete/{commentId}", web::get().to(handlers::delete))
    .route("/request-delete/{email}", web::post().to(handlers::request_delete));
}
