use app::config::Config;
use tracing_subscriber::{EnvFilter, fmt};

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  vocab-server");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VOCAB_BIND_ADDR            (default 127.0.0.1)");
    eprintln!("  VOCAB_PORT                 (default 8080)");
    eprintln!("  VOCAB_DB_URL               (default sqlite://vocabulary.sqlite3)");
    eprintln!("  VOCAB_CATALOG_DIR          (default data)");
    eprintln!("  VOCAB_FLUSH_INTERVAL_SECS  (default 30)");
    eprintln!("  VOCAB_MAX_PENDING          (default 1024)");
    eprintln!("  RUST_LOG                   (default info)");
}

#[tokio::main]
async fn main() {
    if std::env::args()
        .skip(1)
        .any(|arg| arg == "--help" || arg == "-h")
    {
        print_usage();
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let result = match Config::load() {
        Ok(config) => app::run(config).await,
        Err(err) => Err(err.into()),
    };
    if let Err(err) = result {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
