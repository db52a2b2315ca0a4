mod app;
mod config;
mod db;
mod notifications;
mod pipelines;
mod rebuild;
mod utils;
mod validation;
use color_eyre::Result;
use dotenv::dotenv;
use std::env;

#[actix_web::main]
async fn main() -> Result<()> {
  dotenv().ok();
  // Default to info logging when RUST_LOG is
  // absent.
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info");
  }
  env_logger::init();
  color_eyre::install()?;

  app::run().await
}
