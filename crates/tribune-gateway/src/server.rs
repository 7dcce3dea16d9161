use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use tribune_api::{AppState, AppStateInner};
use tribune_db::Database;

use crate::GatewayConfig;
use crate::connection;
use crate::dispatcher::Dispatcher;

/// Accepts clients and spawns one task per connection.
#[derive(Clone)]
pub struct Server {
    state: AppState,
    dispatcher: Dispatcher,
    config: GatewayConfig,
}

impl Server {
    pub fn new(db: Database, config: GatewayConfig) -> Self {
        let dispatcher = Dispatcher::new();
        let state = Arc::new(AppStateInner::new(db, Arc::new(dispatcher.clone())));
        Self {
            state,
            dispatcher,
            config,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs the accept loop until the task is cancelled.
    pub async fn run(self, listener: TcpListener) {
        if let Ok(addr) = listener.local_addr() {
            info!("Accepting connections on {}", addr);
        }
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    tokio::spawn(connection::handle_connection(
                        stream,
                        addr,
                        self.state.clone(),
                        self.dispatcher.clone(),
                        self.config,
                    ));
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}
