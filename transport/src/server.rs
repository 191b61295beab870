//! TCP accept loop, per-connection CSV read/write tasks, and the UDP
//! multicast fan-out for market data.
//!
//! Client connections speak the line-oriented CSV protocol; the binary
//! frame protocol and its multicast wrapper are used only for the
//! market-data feed, keeping unicast client traffic on the simpler text
//! protocol the accompanying `cli` crate also speaks.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use engine_core::{EngineError, InputMessage, MatchingEngine, OutputMessage, Symbol};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};
use wire_protocol::csv;
use wire_protocol::multicast::MulticastSequencer;

use crate::config::ServiceConfig;
use crate::engine_thread::{self, EngineHandle};
use crate::error::TransportError;
use crate::registry::ClientRegistry;

/// Binds the TCP listener and multicast socket, spawns the engine thread
/// and the accept loop as a background task, and returns the bound TCP
/// address (useful for tests that bind to an ephemeral port). The returned
/// `shutdown` flag stops the engine thread's polling loop when set; the
/// accept loop itself runs until the listener is dropped.
pub async fn bind_and_serve(config: ServiceConfig) -> Result<(SocketAddr, Arc<AtomicBool>), TransportError> {
    let shutdown = Arc::new(AtomicBool::new(false));

    let mut matching_engine = MatchingEngine::new(config.engine_limits());
    for symbol_text in &config.known_symbols {
        matching_engine
            .register_symbol(Symbol::pack(symbol_text))
            .map_err(|err| match err {
                EngineError::SymbolCapacityExceeded { max } => TransportError::SymbolRegistryFull { max },
                other => unreachable!("register_symbol only ever fails with SymbolCapacityExceeded: {other}"),
            })?;
    }

    let (engine, output_rx, _engine_join) =
        engine_thread::spawn(matching_engine, config.inbound_queue_capacity, shutdown.clone());

    let registry = Arc::new(ClientRegistry::new());
    let multicast_socket = UdpSocket::bind("0.0.0.0:0").await?;
    multicast_socket.connect(&config.multicast_addr).await?;

    spawn_router(output_rx, registry.clone(), multicast_socket, config.multicast_queue_capacity);

    let listener = TcpListener::bind(&config.tcp_listen_addr).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "transport listening for CSV client connections");

    tokio::spawn(async move {
        loop {
            let (socket, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    continue;
                }
            };
            let engine = engine.clone();
            let registry = registry.clone();
            tokio::spawn(async move {
                handle_connection(socket, peer, engine, registry).await;
            });
        }
    });

    Ok((addr, shutdown))
}

/// Drains engine output and routes each message: acks go to their
/// originating client, trades go to both counterparties plus the
/// multicast sink, and top-of-book updates go to the multicast sink only.
fn spawn_router(
    mut output_rx: mpsc::UnboundedReceiver<Vec<OutputMessage>>,
    registry: Arc<ClientRegistry>,
    multicast_socket: UdpSocket,
    multicast_queue_capacity: usize,
) {
    let (multicast_tx, mut multicast_rx) = mpsc::channel::<OutputMessage>(multicast_queue_capacity);
    let multicast_dropped = Arc::new(AtomicU64::new(0));

    tokio::spawn(async move {
        let mut sequencer = MulticastSequencer::new();
        while let Some(msg) = multicast_rx.recv().await {
            let packet = sequencer.encode(&msg);
            if let Err(err) = multicast_socket.send(&packet).await {
                warn!(error = %err, "multicast send failed");
            }
        }
    });

    tokio::spawn(async move {
        while let Some(batch) = output_rx.recv().await {
            for msg in batch {
                route_one(&registry, &multicast_tx, &multicast_dropped, msg).await;
            }
        }
    });
}

async fn route_one(
    registry: &ClientRegistry,
    multicast_tx: &mpsc::Sender<OutputMessage>,
    multicast_dropped: &Arc<AtomicU64>,
    msg: OutputMessage,
) {
    match &msg {
        OutputMessage::Ack(a) => registry.send_to(a.user_id, msg.clone()),
        OutputMessage::CancelAck(x) => registry.send_to(x.user_id, msg.clone()),
        OutputMessage::Trade(t) => {
            registry.send_to(t.buy_user_id, msg.clone());
            if t.sell_user_id != t.buy_user_id {
                registry.send_to(t.sell_user_id, msg.clone());
            }
            send_multicast(multicast_tx, multicast_dropped, msg).await;
        }
        OutputMessage::TopOfBook(_) => {
            send_multicast(multicast_tx, multicast_dropped, msg).await;
        }
    }
}

async fn send_multicast(tx: &mpsc::Sender<OutputMessage>, dropped: &Arc<AtomicU64>, msg: OutputMessage) {
    if tx.try_send(msg).is_err() {
        let total = dropped.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(total_dropped = total, "multicast queue full; message dropped");
    }
}

fn message_user_id(msg: &InputMessage) -> Option<u32> {
    match msg {
        InputMessage::NewOrder(o) => Some(o.user_id),
        InputMessage::Cancel(c) => Some(c.user_id),
        InputMessage::Flush | InputMessage::TopOfBookQuery(_) => None,
    }
}

async fn handle_connection(socket: TcpStream, peer: SocketAddr, engine: EngineHandle, registry: Arc<ClientRegistry>) {
    debug!(%peer, "client connected");
    let (read_half, mut write_half) = socket.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let (out_tx, mut out_rx): (UnboundedSender<OutputMessage>, _) = mpsc::unbounded_channel();
    let write_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let line = format!("{}\n", csv::encode_output(&msg));
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut registered_user: Option<u32> = None;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match csv::decode_input(&line) {
                Ok(msg) => {
                    if let Some(uid) = message_user_id(&msg) {
                        if registered_user != Some(uid) {
                            registry.register(uid, out_tx.clone());
                            registered_user = Some(uid);
                        }
                    }
                    if engine.try_submit(msg).is_err() {
                        debug!(%peer, "message dropped under backpressure");
                    }
                }
                Err(wire_protocol::DecodeError::BlankLine) => {}
                Err(err) => warn!(%peer, error = %err, "malformed input line discarded"),
            },
            Ok(None) => break,
            Err(err) => {
                warn!(%peer, error = %err, "connection read error");
                break;
            }
        }
    }

    drop(out_tx);
    let _ = write_task.await;
    debug!(%peer, "client disconnected");
}
