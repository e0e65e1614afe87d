use anyhow::Result;
use tracing::Level;

use terranotes_core::{DocumentSet, SyncCoordinator};
use terranotes_proto::ReplicaId;
use terranotes_server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    // initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let bind = std::env::var("TERRANOTES_BIND").unwrap_or_else(|_| "0.0.0.0:8081".to_string());

    // The registry is constructed here and handed to the coordinator; it is
    // the only shared mutable state in the process.
    let replica = ReplicaId::new();
    let coordinator = SyncCoordinator::new(DocumentSet::new(replica));

    let server = Server::builder().bind_address(bind).coordinator(coordinator).build()?;
    server.run().await
}
