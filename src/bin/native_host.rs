use bookmark_host::config::Config;
use bookmark_host::db::Database;
use bookmark_host::logging;
use bookmark_host::native::NativeHost;
use clap::Parser;

/// Launched by the browser, which appends its own arguments (extension
/// origin, manifest path, `--parent-window=N`); those are accepted and ignored.
#[derive(Parser)]
#[command(name = "bookmark-native-host")]
#[command(about = "Native messaging host for the bookmark extension")]
struct Cli {
    #[arg(short = 'c', long = "config", env = "BOOKMARK_HOST_CONFIG")]
    config_path: Option<String>,

    #[arg(allow_hyphen_values = true, trailing_var_arg = true, hide = true)]
    browser_args: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Cli::parse();

    let cfg = Config::load(args.config_path.as_deref()).unwrap_or_else(|e| {
        eprintln!("failed to load config file: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = logging::init_file(&cfg.native.log_path) {
        logging::init_stderr();
        tracing::warn!("{:#}, logging to stderr", e);
    }

    tracing::info!("native host started");
    if !args.browser_args.is_empty() {
        tracing::debug!(args = ?args.browser_args, "launched with browser arguments");
    }

    let db = match Database::from_config(&cfg).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("fatal error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db.ensure_schema().await {
        tracing::error!("fatal error: {}", e);
        std::process::exit(1);
    }

    let host = NativeHost::new(db, cfg.native.max_message_bytes);
    let handled = host.serve(tokio::io::stdin(), tokio::io::stdout()).await;

    tracing::info!(handled, "native host stopped");
}
