// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pipeline-executor entry point: parses CLI arguments, resolves
//! configuration, and either runs a single executor in-process
//! (`--local`) or spawns `numExecutors` sibling processes (Supervisor).

use std::sync::Arc;

use clap::Parser;

use pe_core::proxy::{ServerProxy, TcpServerProxy};
use pe_executor::cli::Cli;
use pe_executor::discovery::EnvNameServiceResolver;
use pe_executor::error::ExecutorError;
use pe_executor::{lifecycle, logging, supervisor, Config};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    let _log_guard = match logging::setup_logging(config.log_file.as_deref()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: failed to set up logging: {e}");
            std::process::exit(1);
        }
    };

    if !config.local {
        let exe = match std::env::current_exe() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "failed to resolve own executable path");
                std::process::exit(1);
            }
        };
        let args: Vec<String> = std::env::args().skip(1).collect();
        if let Err(e) = supervisor::run(&exe, &args, config.num_executors).await {
            tracing::error!(error = %e, "supervisor failed");
            std::process::exit(1);
        }
        return;
    }

    let exit_code = run_local(config).await;
    std::process::exit(exit_code);
}

async fn run_local(config: Config) -> i32 {
    let resolver = EnvNameServiceResolver;
    let server_uri = match lifecycle::resolve_server_uri(&config.discovery, &resolver).await {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(error = %e, "failed to resolve server URI");
            return e.exit_code();
        }
    };

    let proxy: Arc<dyn ServerProxy> = match TcpServerProxy::connect(&server_uri).await {
        Ok(p) => Arc::new(p),
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to pipeline server");
            return ExecutorError::Registration(e.to_string()).exit_code();
        }
    };

    match lifecycle::run_one(config, proxy).await {
        Ok(lifecycle::ExitDisposition::Clean) => 0,
        Ok(lifecycle::ExitDisposition::Faulted) => 1,
        Err(e) => {
            tracing::error!(error = %e, "executor failed");
            e.exit_code()
        }
    }
}
