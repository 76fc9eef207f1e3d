//! Creates a hosted payment and a white-label checkout for the same order.
//!
//! Reads `OXAPAY_*` variables from the environment; see the README.

use oxapay_client_sdk::gateway::{Client, Design, PaymentRequest, Theme, WhiteLabelRequest};
use oxapay_client_sdk::generate_order_id;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::from_env()?;
    let order_id = generate_order_id();

    let request = PaymentRequest::builder()
        .amount(dec!(24.90))
        .order_id(order_id.clone())
        .email("buyer@example.com")
        .description(format!("Storefront order {order_id}"))
        .build();

    let payment = client.create_payment(&request).await?;
    info!(
        %order_id,
        track_id = ?payment.get_str("trackId"),
        pay_link = ?payment.get_str("payLink"),
        "payment created"
    );

    let white_label = WhiteLabelRequest::new(request)
        .with_design(Design::default().with_theme(Theme::Dark).with_color("#1f6feb"));
    match client.create_white_label(&white_label).await {
        Ok(response) => info!(data = ?response.data, "white label checkout created"),
        Err(e) => tracing::error!(error = %e, kind = ?e.kind(), "white label checkout failed"),
    }

    Ok(())
}
