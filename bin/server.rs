// Coffee Payer - Web Server
// Order form at /, JSON API under /api

use anyhow::Result;
use coffee_payer::{init_tracing, server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::load()?;
    println!("☕ Coffee Payer - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("\n🚀 Starting server on http://{}", config.bind_addr);
    println!("   API: http://{}/api/ledger", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    server::serve(&config).await
}
