//! Startup banner and URL display

use super::config::{AppConfig, is_all_interfaces};
use super::constants::APP_NAME;
use crate::utils::terminal::terminal_link;

/// Print the startup banner with URLs
pub fn print_banner(config: &AppConfig) {
    let host = config.server.host.as_str();
    let port = config.server.port;

    // Use localhost for display when binding to all interfaces
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    // Label width: "API docs:" plus padding
    const W: usize = 12;

    let api_url = format!("http://{}:{}/api/v1", display_host, port);
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "API:",
        terminal_link(&api_url)
    );

    let docs_url = format!("http://{}:{}/api/docs", display_host, port);
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "API docs:",
        terminal_link(&docs_url)
    );

    if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }

    let fields = if config.fields.is_empty() {
        "none configured (use --fields)".to_string()
    } else {
        config.fields.names().collect::<Vec<_>>().join(", ")
    };
    println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Fields:", fields);

    for source in &config.sources {
        println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Config:", source);
    }

    println!();
}
