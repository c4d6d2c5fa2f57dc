// kswatch CLI entry point

use kswatch_cli::router::CommandRouter;

#[tokio::main]
async fn main() {
    if let Err(e) = CommandRouter::route().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
