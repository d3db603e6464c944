//! Transaction Gateway server
//!
//! Serves the v1 transaction API over HTTP.
//!
//! # Usage
//!
//! ```bash
//! cargo run
//! cargo run -- --port 8443 --authorizer approve --authorization-delay-ms 500
//! RUST_LOG=debug cargo run -- --max-in-progress 1
//! ```
//!
//! # Authorizers
//!
//! - **manual**: Transactions wait for `approve`/`decline` commands on stdin (default)
//! - **approve**: Every transaction is approved after the configured delay
//! - **decline**: Every transaction is declined after the configured delay
//!
//! # Exit Codes
//!
//! - 0: Clean shutdown (Ctrl-C)
//! - 1: Error (runtime could not start, address in use, etc.)

use log::{error, info};
use std::process;
use transaction_gateway::cli;
use transaction_gateway::core::{create_authorizer, GatewayEngine};
use transaction_gateway::{GatewayError, OperatorConsole, Server};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments using clap
    let args = cli::parse_args();
    let config = args.to_server_config();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    let result: Result<(), GatewayError> = runtime.block_on(async {
        let setup = create_authorizer(args.authorizer, args.authorization_delay());
        let engine = GatewayEngine::new(args.to_registry_config(), setup.authorizer);
        let server = Server::bind(config, engine.clone()).await?;

        if let Some(manual) = setup.manual {
            info!("Manual authorization: type 'help' for operator commands");
            let console = OperatorConsole::new(engine, manual);
            tokio::spawn(async move {
                let input = tokio::io::BufReader::new(tokio::io::stdin());
                if let Err(e) = console.run(input, tokio::io::stdout()).await {
                    error!("console: {}", e);
                }
            });
        }

        server.run().await
    });

    // A console blocked on stdin must not hold up exit
    runtime.shutdown_background();

    if let Err(e) = result {
        error!("Error: {}", e);
        process::exit(1);
    }
}
