//! BLE sender tool for Sealink receivers
//!
//! Scans for receivers, sends RSA-encrypted (or plain) messages and
//! follows the receiver's notifications.

use clap::{Parser, Subcommand};
use sealink_send::ble::{self, Notification};
use sealink_send::seal;

#[derive(Parser)]
#[command(name = "sealink-send")]
#[command(about = "Send encrypted messages to Sealink receivers over BLE")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for receivers
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Encrypt a message with the receiver's public key and send it
    Send {
        /// Device name or address to connect to
        #[arg(short, long)]
        device: Option<String>,
        /// Receiver public key (PEM, PKCS#1 or SPKI)
        #[arg(short = 'k', long, default_value = "public.pem", conflicts_with = "plain")]
        public_key: String,
        /// Message text
        #[arg(short, long)]
        message: String,
        /// Send as plain text (receiver running without a key)
        #[arg(long)]
        plain: bool,
    },
    /// Stay connected and print notifications
    Watch {
        /// Device name or address to connect to
        #[arg(short, long)]
        device: Option<String>,
        /// How long to stay connected, in seconds
        #[arg(short = 't', long, default_value = "30")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { duration, json } => {
            scan_devices(duration, json).await?;
        }
        Commands::Send { device, public_key, message, plain } => {
            send_message(device.as_deref(), &public_key, &message, plain).await?;
        }
        Commands::Watch { device, duration } => {
            println!("Watching notifications for {} seconds...", duration);
            ble::watch(device.as_deref(), duration, |n| match n {
                Notification::Tick(t) => println!("  tick {}", t),
                Notification::Ack(a) => println!("  ack: {}", String::from_utf8_lossy(&a)),
            })
            .await?;
        }
    }

    Ok(())
}

async fn scan_devices(duration: u64, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !json {
        println!("Scanning for Sealink receivers ({} seconds)...", duration);
    }

    let devices = ble::scan(duration).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    println!("\nFound {} devices:", devices.len());
    for device in devices {
        let rssi = device.rssi.map(|r| format!("{} dBm", r)).unwrap_or_else(|| "N/A".to_string());
        let marker = if device.is_receiver { " [SEALINK]" } else { "" };
        println!("  {} ({}) RSSI: {}{}", device.name, device.address, rssi, marker);
    }
    Ok(())
}

async fn send_message(
    device: Option<&str>,
    public_key: &str,
    message: &str,
    plain: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = if plain {
        message.as_bytes().to_vec()
    } else {
        let key = seal::load_public_key(public_key)?;
        let ciphertext = seal::seal(&key, message.as_bytes(), &mut rand::thread_rng())?;
        println!("Encrypted {} bytes -> {} bytes", message.len(), ciphertext.len());
        ciphertext
    };

    println!("Connecting and sending...");
    match ble::send(device, &payload).await? {
        Some(ack) => println!("Receiver says: {}", String::from_utf8_lossy(&ack)),
        None => println!("Sent, but no acknowledgement arrived"),
    }
    Ok(())
}
