use std::net::SocketAddr;
use std::time::Duration;

use anyhow::anyhow;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tribune_api::session::GUEST_NAME;
use tribune_api::{AppState, Session};

use crate::GatewayConfig;
use crate::dispatcher::Dispatcher;
use crate::protocol;

/// How long a cleanly closed connection may take to flush its queued responses.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Serves one client until it disconnects or its transport fails.
///
/// Every outbound line (responses and pushes alike) goes through the
/// connection's queue and is written by a single writer task, so a push
/// raised by another connection can never interleave with a response.
pub async fn handle_connection(
    stream: TcpStream,
    address: SocketAddr,
    state: AppState,
    dispatcher: Dispatcher,
    config: GatewayConfig,
) {
    let conn_id = Uuid::new_v4();
    if let Err(e) = socket2::SockRef::from(&stream).set_nodelay(true) {
        debug!("Could not set TCP_NODELAY for {}: {}", address, e);
    }

    let (reader, writer) = stream.into_split();
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(config.max_line_bytes));
    let mut sink = FramedWrite::new(writer, LinesCodec::new());

    let (tx, mut rx) = mpsc::channel::<String>(config.outbound_capacity);
    dispatcher.register(conn_id, address, tx.clone());
    info!("{} connected ({})", address, conn_id);

    // Writer task: the only owner of the socket's write half.
    let mut write_handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Err(e) = sink.send(line).await {
                debug!("Write to {} failed: {}", address, e);
                break;
            }
        }
    });

    let mut session = Session::new(conn_id, address);
    let (result, writer_done) = tokio::select! {
        result = read_loop(&mut lines, &tx, &state, &mut session) => (result, false),
        _ = &mut write_handle => (Err(anyhow!("write half closed")), true),
    };

    // --- Cleanup ---
    dispatcher.unregister(conn_id);
    if let Some(token) = session.token.take() {
        state.sessions.revoke(&token);
    }

    // With every sender gone the writer flushes what is queued, then exits.
    drop(tx);
    if !writer_done {
        if result.is_ok() {
            if timeout(DRAIN_TIMEOUT, &mut write_handle).await.is_err() {
                debug!("Outbound queue for {} not drained in time", address);
                write_handle.abort();
            }
        } else {
            write_handle.abort();
        }
    }

    match result {
        Ok(()) => info!("{} ({}) disconnected", address, session_label(&session)),
        Err(e) => warn!("{} ({}) dropped: {}", address, session_label(&session), e),
    }
}

async fn read_loop(
    lines: &mut FramedRead<OwnedReadHalf, LinesCodec>,
    tx: &mpsc::Sender<String>,
    state: &AppState,
    session: &mut Session,
) -> anyhow::Result<()> {
    while let Some(line) = lines.next().await {
        let line = line?;
        let Some(req) = protocol::decode(&line)? else {
            continue;
        };
        let resp = protocol::dispatch(state, session, &req);
        tx.send(resp.encode())
            .await
            .map_err(|_| anyhow!("outbound queue closed"))?;
    }
    Ok(())
}

fn session_label(session: &Session) -> &str {
    session.user_id.as_deref().unwrap_or(GUEST_NAME)
}
