mod app;
mod config;
mod error;
mod ui;
mod wallet;

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_tracing(config.log_file.as_deref())?;

    let mut app = app::App::new(config)?;
    app.run().await?;
    Ok(())
}

/// The terminal owns stdout, so tracing either goes to a file or nowhere.
fn init_tracing(log_file: Option<&str>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
