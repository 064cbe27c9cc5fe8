use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use finote_engine::blob::SqliteBlobStore;
use finote_engine::config::{CliArgs, Config};
use finote_engine::session::SessionManager;

fn main() {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);

    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if config.logging.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let blobs = match SqliteBlobStore::new(&config.storage.path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(path = %config.storage.path, error = %e, "cannot open blob store");
            std::process::exit(1);
        }
    };

    let mut session = SessionManager::new(blobs);
    if let Err(e) = session.login(&cli.user) {
        tracing::error!(user = %cli.user, error = %e, "login failed");
        std::process::exit(1);
    }

    let expenses = session.expenses();
    println!("user:     {}", cli.user);
    println!("expenses: {}", expenses.len());
    if let Some(latest) = expenses.first() {
        println!(
            "latest:   {} {} ({})",
            latest.date, latest.amount, latest.description
        );
    }
    println!("budgets:  {}", session.budgets().len());
    println!("streak:   {}", session.streak());
    for badge in session.badges() {
        println!("badge:    {}", badge);
    }

    session.logout();
}
