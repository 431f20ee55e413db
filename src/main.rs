use donation_sync::{DonationClient, DonationConfig, DonationSnapshot, SyncError};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger (set RUST_LOG=debug for verbose output, RUST_LOG=info for normal)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("status");

    let client = DonationClient::new(DonationConfig::from_env());

    if let Err(e) = client.reconcile_on_startup().await {
        log::warn!("Could not restore previous session: {}", e.user_message());
    }

    match command {
        "status" => {}
        "connect" => {
            client.connect().await.map_err(report)?;
        }
        "donate" => {
            let amount = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("usage: donation-sync donate <amount>"))?;
            if !client.session().is_connected() {
                client.connect().await.map_err(report)?;
            }
            let record = client.donate(amount).await.map_err(report)?;
            println!("Donation successful: {} TTK in {}", record.amount, record.tx_hash);
        }
        "disconnect" => {
            client.disconnect().await;
            println!("Disconnected");
            return Ok(());
        }
        other => anyhow::bail!(
            "unknown command '{}' (expected status, connect, donate <amount>, disconnect)",
            other
        ),
    }

    print_status(&client);
    Ok(())
}

fn report(e: SyncError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

fn print_status(client: &DonationClient) {
    let session = client.session();
    match session.connected_address() {
        Some(address) => println!("Connected account: {}", address),
        None => {
            println!("No wallet connected");
            return;
        }
    }

    if let Some(DonationSnapshot {
        total_donations,
        user_donation,
        token_balance,
        as_of,
        stale,
        ..
    }) = client.snapshot()
    {
        println!("Total donations: {} TTK", total_donations);
        println!("Your donations:  {} TTK", user_donation);
        println!("Token balance:   {} TTK", token_balance);
        println!("As of {}{}", as_of, if stale { " (stale)" } else { "" });
    }
    if let Some(advisory) = client.advisory() {
        println!("{}", advisory.user_message());
    }
}
