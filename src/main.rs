// Entrypoint for the CLI application.
// - Sets up logging, reads configuration and hands over to the UI loop.
// - Returns `anyhow::Result` so setup failures print with their context.

use tracing_subscriber::EnvFilter;
use whapi_cli::{config::ClientConfig, ui::main_menu};

fn main() -> anyhow::Result<()> {
    // Quiet by default so log lines don't fight with the prompts.
    // `RUST_LOG=whapi_cli=debug` shows every request.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("whapi_cli=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // `WHAPI_BASE_URL` / `WHAPI_TIMEOUT_SECS`; the UI asks for the base URL
    // when it isn't set.
    let config = ClientConfig::from_env()?;

    main_menu(config)?;
    Ok(())
}
