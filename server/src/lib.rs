pub mod server;
pub mod state;

pub use server::{router, Server, ServerBuilder};
pub use state::ServerState;
