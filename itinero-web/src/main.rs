//! Itinero Web Server
//!
//! REST API entry point for the Itinero travel-agency CRM.

use clap::Parser;
use itinero_core::logging::{init_logging, LogFormat, LoggingConfig};
use itinero_web::server::ItineroServerBuilder;
use itinero_web::WebConfig;

/// Itinero CRM API server
#[derive(Parser)]
#[command(name = "itinero-web")]
#[command(about = "REST API server for the Itinero travel-agency CRM")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Database URL (e.g. sqlite:itinero.db); in-memory stores when omitted
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load environment variables before reading configuration
    dotenvy::dotenv().ok();

    let logging = LoggingConfig {
        level: args.log_level.clone(),
        format: if args.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Compact
        },
        ..Default::default()
    };
    if let Err(e) = init_logging(&logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let mut config = WebConfig::from_env();
    config.host = args.host;
    config.port = args.port;
    config.dev_mode = args.dev;
    if args.database_url.is_some() {
        config.database_url = args.database_url;
    }

    println!("🚀 Starting Itinero Web Server");
    println!("📍 Server: http://{}", config.address());
    println!("🔧 Development mode: {}", config.dev_mode);
    match &config.database_url {
        Some(db_url) => println!("🗄️  Database: {}", db_url),
        None => println!("🗄️  Database: in-memory (state is lost on shutdown)"),
    }

    if std::env::var("JWT_SECRET").is_err() {
        println!("⚠️  Warning: JWT_SECRET is not set; using the built-in development secret.");
        println!("   Set JWT_SECRET before exposing this server to anything real.");
    }

    let server = match ItineroServerBuilder::new()
        .host(config.host.clone())
        .port(config.port)
        .dev_mode(config.dev_mode)
        .database_url(config.database_url.clone())
        .build()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            eprintln!("❌ Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        eprintln!("❌ Server failed to start: {}", e);
        std::process::exit(1);
    }
}
