#![forbid(unsafe_code)]

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use log::info;
use poem::listener::{Listener, RustlsCertificate, RustlsConfig};
use poem::listener::TcpListener;

// Server Utilities
use crate::utils::config::{init_dirs, init_log, init_runtime_context, RuntimeCtx,
                           SERVER_ARGS, TLS_CERT_FILE, TLS_KEY_FILE};
use crate::utils::errors::Errors;
use crate::utils::user_store::UserStore;
use crate::v1::api::{make_api_service, make_routes, API_PREFIX};

// Modules
mod utils;
mod v1;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "UserDemoServer"; // for poem logging

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<()> {
    // --------------- Initialize Server --------------
    // Announce ourselves.
    println!("Starting user_demo_server!");

    // Create or validate the data directories first since logging
    // and configuration live in them.
    let dirs = init_dirs()?;
    if SERVER_ARGS.create_dirs_only {
        println!("Data directories initialized under {}.", dirs.root_dir);
        return Ok(());
    }
    let ctx = server_init(dirs)?;
    let config = &ctx.parms.config;

    // The store is created once and shared by every user endpoint.
    let store = Arc::new(UserStore::new());
    info!("User store initialized with {} seed records.", store.len()?);

    // --------------- Main Loop Set Up ---------------
    // Assign base URL.
    let server_url = format!("{}:{}{}", config.http_addr, config.http_port, API_PREFIX);
    let api_service = make_api_service(store, config.list_delay(), &config.title, &server_url);
    let app = make_routes(api_service);

    // ------------------ Main Loop -------------------
    let addr = format!("{}{}", "0.0.0.0:", config.http_port);
    info!("Listening on {} (tls={}), API served at {}.", addr, config.enable_tls, server_url);
    if config.enable_tls {
        let key = fs::read(ctx.dirs.certs_dir.clone() + TLS_KEY_FILE)?;
        let cert = fs::read(ctx.dirs.certs_dir.clone() + TLS_CERT_FILE)?;
        poem::Server::new(
            TcpListener::bind(addr).rustls(
                RustlsConfig::new().fallback(RustlsCertificate::new().key(key).cert(cert)),
            ),
        )
        .name(SERVER_NAME)
        .run(app)
        .await?;
    } else {
        poem::Server::new(TcpListener::bind(addr))
            .name(SERVER_NAME)
            .run(app)
            .await?;
    }

    Ok(())
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// server_init:
// ---------------------------------------------------------------------------
/** Initialize logging, read the configuration and log what we're running. */
fn server_init(dirs: utils::config::DemoDirs) -> Result<RuntimeCtx> {
    // Configure our log.
    init_log(&dirs)?;

    // Read the input parameters.
    let ctx = init_runtime_context(dirs)?;
    match &ctx.parms.config_file {
        Some(f) => info!("Configuration loaded from {}.", f),
        None => info!("No configuration file found, running with defaults."),
    }
    info!("{}", Errors::InputParms(format!("{:#?}", ctx)));

    // Log build info.
    print_version_info();
    Ok(ctx)
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    info!("\n*** Running USER_DEMO={}, BRANCH={}, COMMIT={}, DIRTY={}, SRC_TS={}, RUSTC={}.",
          option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
          env!("GIT_BRANCH"),
          env!("GIT_COMMIT_SHORT"),
          env!("GIT_DIRTY"),
          env!("SOURCE_TIMESTAMP"),
          env!("RUSTC_VERSION"));
}
