use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{ArgAction, Parser, Subcommand};
use tokio::io::BufReader;

use netcore::codec::DataPayload;
use netcore::config::load_or_default;
use netcore::http::DataClient;
use netcore::net::{TcpClient, UdpClient};
use netcore::observability::init_logging;
use netcore::runtime::{self, BlockingScheduler};

#[derive(Parser)]
#[command(name = "netcore-cli")]
#[command(about = "Clients for the netcore TCP, UDP and HTTP endpoints", long_about = None)]
struct Cli {
    /// TOML configuration file; its [client] section supplies defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send stdin lines over TCP until EOF or the exit sentinel
    Tcp {
        #[arg(long)]
        addr: Option<String>,
    },
    /// Send each stdin line as one UDP datagram
    Udp {
        #[arg(long)]
        addr: Option<String>,
    },
    /// POST a data payload over HTTP
    Post {
        #[arg(long)]
        number: u32,
        #[arg(long, action = ArgAction::Set)]
        boolean: bool,
        #[arg(long)]
        url: Option<String>,
    },
    /// Run a 5s and a 3s sleep and report completion order
    Sleeps {
        /// Run the sleeps back to back on this thread instead
        #[arg(long)]
        blocking: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    init_logging(&config.observability);
    let client = config.client;

    match cli.command {
        Commands::Tcp { addr } => {
            let addr = addr.unwrap_or(client.tcp_address.clone());
            let conn = TcpClient::connect(&addr, &client).await?;
            println!("Connected to {}. Type '{}' to quit.", conn.peer_addr(), client.exit_sentinel);

            let (mut reader, mut sender) = conn.into_split();
            let echoes = runtime::spawn("tcp-echoes", async move {
                while let Ok(Some(line)) = reader.read_line().await {
                    println!("< {line}");
                }
            });

            let sent = sender.run(BufReader::new(tokio::io::stdin())).await?;
            if tokio::time::timeout(Duration::from_secs(2), echoes).await.is_err() {
                eprintln!("Server did not close the connection");
            }
            println!("Sent {sent} line(s)");
        }
        Commands::Udp { addr } => {
            let target: SocketAddr = addr.unwrap_or(client.udp_address.clone()).parse()?;
            let udp = UdpClient::from_config(&client, &config.udp, target).await?;
            println!("Sending to {target}. Type '{}' to quit.", client.exit_sentinel);
            let sent = udp
                .send_lines(BufReader::new(tokio::io::stdin()), &client.exit_sentinel)
                .await?;
            println!("Sent {sent} datagram(s)");
        }
        Commands::Post { number, boolean, url } => {
            let http = DataClient::new(url.unwrap_or(client.http_url.clone()));
            let reply = http.post(&DataPayload::new(number, boolean)).await?;
            println!("{} {}", reply.status, reply.body);
        }
        Commands::Sleeps { blocking } => {
            if blocking {
                run_blocking_sleeps().await?;
            } else {
                run_concurrent_sleeps().await?;
            }
        }
    }

    Ok(())
}

const SLEEPS: [(&str, u64); 2] = [("sleep-5s", 5), ("sleep-3s", 3)];

async fn run_concurrent_sleeps() -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let handles: Vec<_> = SLEEPS
        .iter()
        .map(|&(name, secs)| {
            runtime::spawn(name, async move {
                runtime::sleep(Duration::from_secs(secs)).await;
                println!("{name} done after {:.1?}", started.elapsed());
            })
        })
        .collect();

    for handle in handles {
        handle.await?;
    }
    println!("Total {:.1?}", started.elapsed());
    Ok(())
}

async fn run_blocking_sleeps() -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let finished = tokio::task::spawn_blocking(move || {
        let mut scheduler = BlockingScheduler::new();
        for &(name, secs) in &SLEEPS {
            scheduler.spawn(name, move || std::thread::sleep(Duration::from_secs(secs)));
        }
        scheduler.run()
    })
    .await?;

    for job in &finished {
        println!("{} done after {:.1?}", job.name, job.elapsed);
    }
    println!("Total {:.1?}", started.elapsed());
    Ok(())
}
