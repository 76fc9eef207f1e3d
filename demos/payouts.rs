//! Checks the allow-listed server IP, sends a payout and reads it back.
//!
//! Needs `OXAPAY_PAYOUT_KEY` in addition to the merchant settings, plus
//! `PAYOUT_ADDRESS` for the destination.

use oxapay_client_sdk::gateway::{Client, PayoutRequest};
use rust_decimal_macros::dec;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::from_env()?;

    let ip = client.server_ip().await?;
    info!(ip = ?ip.get_str("ip"), "add this address to the payout API allow-list");

    let address = std::env::var("PAYOUT_ADDRESS")?;
    let request = PayoutRequest::builder()
        .currency("USDT")
        .amount(dec!(1.5))
        .address(address)
        .network("TRC20")
        .build();

    let payout = client.create_payout(&request).await?;
    info!(data = ?payout.data, "payout submitted");

    if let Some(txid) = payout.get_str("trackId") {
        let status = client.payout_info(txid).await?;
        info!(%txid, status = ?status.status, data = ?status.data, "payout status");
    } else {
        warn!("payout response has no trackId; skipping inquiry");
    }

    let history = client.payout_history().await?;
    info!(data = ?history.data, "payout history");

    Ok(())
}
