//! Command-line client speaking the raw CSV line protocol directly over
//! TCP. `submit`/`cancel`/`flush` open one connection, write a single CSV
//! line, and print whatever response lines arrive before a short idle
//! timeout.
//!
//! `depth` is different: per the routing contract, TOP_OF_BOOK updates are
//! delivered only to the market-data (multicast) sink, never to the
//! originating client's own socket (see `transport::server::route_one`).
//! So `depth` sends its query over TCP to trigger a fresh top-of-book
//! computation, then listens on the multicast feed itself, the same way
//! any other market-data subscriber would.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{Parser, Subcommand};
use engine_core::{Cancel, InputMessage, NewOrder, OutputMessage, Side, Symbol, TopOfBookQuery};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use wire_protocol::csv;

/// How long to keep reading response lines after sending a request before
/// giving up; the server never closes the socket on its own.
const RESPONSE_IDLE_TIMEOUT: Duration = Duration::from_millis(500);

/// How long `depth` waits on the multicast feed for both sides of the
/// queried symbol before giving up.
const MARKET_DATA_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "hftx-cli")]
#[command(about = "Command line client for the matching engine transport")]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    server: String,
    /// Market-data (UDP multicast) address, used only by `depth`.
    #[arg(short, long, default_value = "239.1.1.1:30001")]
    market_data: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new order.
    Submit {
        #[arg(short, long)]
        symbol: String,
        #[arg(long, value_parser = parse_side)]
        side: Side,
        /// Order price; 0 submits a market order.
        #[arg(short, long)]
        price: u32,
        #[arg(short, long)]
        quantity: u32,
        #[arg(short, long)]
        user_id: u32,
        #[arg(long)]
        order_id: u32,
    },
    /// Cancel a previously submitted order.
    Cancel {
        #[arg(short, long)]
        user_id: u32,
        #[arg(long)]
        order_id: u32,
    },
    /// Clear every book on the engine.
    Flush,
    /// Query the current top of book for a symbol.
    Depth {
        #[arg(short, long)]
        symbol: String,
    },
}

fn parse_side(s: &str) -> Result<Side, String> {
    match s.to_lowercase().as_str() {
        "buy" | "b" => Ok(Side::Buy),
        "sell" | "s" => Ok(Side::Sell),
        _ => Err(format!("invalid side `{s}`, expected `buy` or `sell`")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Depth { symbol } = cli.command {
        return run_depth(&cli.server, &cli.market_data, &symbol).await;
    }

    let request = match cli.command {
        Commands::Submit {
            symbol,
            side,
            price,
            quantity,
            user_id,
            order_id,
        } => InputMessage::NewOrder(NewOrder {
            user_id,
            user_order_id: order_id,
            symbol: Symbol::pack(&symbol),
            price,
            quantity,
            side,
        }),
        Commands::Cancel { user_id, order_id } => InputMessage::Cancel(Cancel {
            user_id,
            user_order_id: order_id,
        }),
        Commands::Flush => InputMessage::Flush,
        Commands::Depth { .. } => unreachable!("handled above"),
    };

    let stream = TcpStream::connect(&cli.server).await?;
    let (read_half, mut write_half) = stream.into_split();
    let line = format!("{}\n", csv::encode_input(&request));
    write_half.write_all(line.as_bytes()).await?;

    let mut lines = BufReader::new(read_half).lines();
    loop {
        match timeout(RESPONSE_IDLE_TIMEOUT, lines.next_line()).await {
            Ok(Ok(Some(line))) => println!("{line}"),
            Ok(Ok(None)) => break,
            Ok(Err(err)) => {
                eprintln!("connection error: {err}");
                break;
            }
            Err(_) => break,
        }
    }

    Ok(())
}

/// Triggers a fresh top-of-book computation over TCP, then reads the
/// result off the multicast feed (joining the group first if `market_data`
/// names a genuine multicast address).
async fn run_depth(server: &str, market_data: &str, symbol: &str) -> Result<(), Box<dyn std::error::Error>> {
    let market_data_addr: SocketAddr = market_data.parse()?;
    let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), market_data_addr.port())).await?;
    if let IpAddr::V4(group) = market_data_addr.ip() {
        if group.is_multicast() {
            socket.join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)?;
        }
    }

    let stream = TcpStream::connect(server).await?;
    let (_, mut write_half) = stream.into_split();
    let query = InputMessage::TopOfBookQuery(TopOfBookQuery {
        symbol: Symbol::pack(symbol),
    });
    write_half.write_all(format!("{}\n", csv::encode_input(&query)).as_bytes()).await?;

    let target = Symbol::pack(symbol);
    let mut seen_bid = false;
    let mut seen_ask = false;
    let mut buf = [0u8; 1024];

    while !(seen_bid && seen_ask) {
        let n = match timeout(MARKET_DATA_TIMEOUT, socket.recv(&mut buf)).await {
            Ok(Ok(n)) => n,
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => break,
        };
        let Ok((_, OutputMessage::TopOfBook(tob))) = wire_protocol::multicast::decode(&buf[..n]) else {
            continue;
        };
        if tob.symbol != target {
            continue;
        }
        println!(
            "{} {}: price={} quantity={} eliminated={}",
            symbol,
            if tob.side == Side::Buy { "bid" } else { "ask" },
            tob.price,
            tob.quantity,
            tob.eliminated
        );
        match tob.side {
            Side::Buy => seen_bid = true,
            Side::Sell => seen_ask = true,
        }
    }

    Ok(())
}
