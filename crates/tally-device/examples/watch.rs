//! Watch a vMix tally feed and print color snapshots.

use clap::Parser;
use tally_device::{Device, VmixConfig, VmixDevice};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

/// Watch the tally feed of a vMix instance.
///
/// Subscribes to the TCP API and prints a line of wire color codes
/// whenever a camera changes between off, preview and program.
#[derive(Debug, Parser)]
#[clap(verbatim_doc_comment)]
struct CliParser {
    /// Address of the vMix host.
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// TCP API port.
    #[clap(short, long, default_value = "8099")]
    pub port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .compact()
        .init();

    let opts = CliParser::parse();
    let mut device = VmixDevice::new(VmixConfig {
        host: opts.host,
        port: opts.port,
        ..VmixConfig::default()
    });
    device.init().await;

    let mut polls: u32 = 0;
    loop {
        if let Some(snapshot) = device.handle_data().await {
            info!("tally: {:02X?}", snapshot.encode());
        }

        // Connection checks run on a much slower cadence than polling
        polls = polls.wrapping_add(1);
        if polls % 50 == 0 {
            device.check_connection().await;
        }
    }
}
