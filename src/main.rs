//! Edge Authz - Main Entry Point
//!
//! Serves the ext_authz and ext_proc callouts on one gRPC port.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tonic::transport::Server;
use tracing::info;

use edge_authz::authz::Authorizer;
use edge_authz::config::Config;
use edge_authz::grpc::{CheckService, ProcessService};
use edge_authz::jwt::TokenValidator;
use edge_authz::observability::{LoggingConfig, init_logging};
use edge_authz::proto::envoy::service::auth::v3::authorization_server::AuthorizationServer;
use edge_authz::proto::envoy::service::ext_proc::v3::external_processor_server::ExternalProcessorServer;
use edge_authz::shutdown::{self, run_with_graceful_shutdown, wait_for_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("config error")?;

    init_logging(&LoggingConfig::default().with_format(config.log_format))
        .context("logging init error")?;

    let key = config.verification_key().context("read public key error")?;
    let addr = config.listen_addr()?;

    let validator =
        TokenValidator::new(Arc::new(key)).with_leeway(config.clock_skew_seconds);
    let authorizer = Authorizer::new(validator);

    let (trigger, shutdown_signal) = shutdown::channel();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.fire();
    });

    let server = Server::builder()
        .add_service(AuthorizationServer::new(CheckService::new(authorizer.clone())))
        .add_service(ExternalProcessorServer::new(ProcessService::new(authorizer)))
        .serve_with_shutdown(addr, shutdown_signal.clone().recv());

    info!(%addr, "edge-authz listening");

    run_with_graceful_shutdown(
        server,
        shutdown_signal,
        Duration::from_secs(config.shutdown_timeout_seconds),
    )
    .await
    .context("grpc server error")?;

    info!("edge-authz stopped");
    Ok(())
}
