//! Bond zapper operator tool
//!
//! Runs a single preview, approval or zap-in against a configured network and
//! prints the result as JSON.

use anyhow::{anyhow, Context, Result};
use bond_zapper::{
    metrics, AccountStore, Bond, ChainClient, Collaborators, EthersClient, InMemoryPendingTxns,
    NetworkContext, Settings, Token, TracingNotifier, ZapOutcome, Zapper,
};
use clap::{Args, Parser, Subcommand};
use ethers::types::Address;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "bond-zapper")]
#[command(about = "Preview, approve and execute bond zap-ins")]
struct Cli {
    /// Chain id of the configured network to use
    #[arg(long, default_value_t = 56)]
    network: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate the LP amount an input would yield
    Preview {
        #[command(flatten)]
        bond: BondArgs,
        #[command(flatten)]
        token: TokenArgs,
        /// Human-readable input amount, e.g. 1.5
        #[arg(long)]
        value: String,
    },
    /// Approve the zapper to spend the input token
    Approve {
        #[command(flatten)]
        token: TokenArgs,
    },
    /// Swap the input token into the bond
    Zap {
        #[command(flatten)]
        bond: BondArgs,
        #[command(flatten)]
        token: TokenArgs,
        #[arg(long)]
        value: String,
        /// Slippage tolerance in percent (2 = 2%)
        #[arg(long)]
        slippage: Option<f64>,
        /// Wait for the post-zap account refresh before exiting
        #[arg(long)]
        wait_refresh: bool,
    },
}

#[derive(Args, Debug)]
struct BondArgs {
    #[arg(long = "bond-name")]
    name: String,
    /// Reserve asset address of the bond
    #[arg(long = "bond-reserve")]
    reserve: Address,
    /// Bond depository address
    #[arg(long = "bond-deposit")]
    deposit: Address,
    /// The bond is priced in an LP pair
    #[arg(long = "bond-lp")]
    is_lp: bool,
}

#[derive(Args, Debug)]
struct TokenArgs {
    #[arg(long = "token")]
    address: Address,
    #[arg(long = "token-name")]
    name: String,
    #[arg(long = "token-symbol")]
    symbol: Option<String>,
    #[arg(long = "token-decimals", default_value_t = 18)]
    decimals: u32,
}

impl BondArgs {
    fn bond(&self, network: u64) -> Bond {
        Bond::new(self.name.clone(), self.is_lp).with_network(network, self.reserve, self.deposit)
    }
}

impl TokenArgs {
    fn token(&self) -> Token {
        Token {
            address: self.address,
            name: self.name.clone(),
            symbol: self.symbol.clone().unwrap_or_else(|| self.name.clone()),
            decimals: self.decimals,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    info!("Starting bond-zapper v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;
    let network = settings
        .get_network_by_id(cli.network)
        .ok_or_else(|| anyhow!("Network {} is not configured", cli.network))?;

    let wallet = EthersClient::wallet_from_env().context("Failed to load ZAPPER_PRIVATE_KEY")?;
    let client = EthersClient::new(network, wallet)
        .with_context(|| format!("Failed to connect to {}", network.name))?;
    let owner = client.wallet_address();
    let client: Arc<dyn ChainClient> = Arc::new(client);
    debug!("Connected to {} (wallet {:?})", network.name, owner);

    let tracker = Arc::new(InMemoryPendingTxns::new());
    let account = Arc::new(AccountStore::new());
    let zapper = Zapper::new(
        &settings,
        Collaborators {
            tracker: tracker.clone(),
            notifier: Arc::new(TracingNotifier),
            account: account.clone(),
            routes: None,
        },
    );

    // Approve and zap need a signer; without one they report a disconnected wallet.
    let signing_ctx = NetworkContext::new(
        cli.network,
        owner.map(|_| client.clone()),
        owner.unwrap_or_default(),
    );

    let output = match cli.command {
        Command::Preview { bond, token, value } => {
            let ctx =
                NetworkContext::new(cli.network, Some(client.clone()), owner.unwrap_or_default());
            let estimate = zapper
                .lp_token_details(&ctx, &bond.bond(cli.network), &token.token(), &value)
                .await;
            serde_json::to_value(estimate)?
        }
        Command::Approve { token } => {
            let token = token.token();
            let outcome = zapper.change_approval(&signing_ctx, &token).await;
            json!({
                "outcome": outcome,
                "allowance": account.allowance(&token.name).map(|a| a.to_string()),
            })
        }
        Command::Zap {
            bond,
            token,
            value,
            slippage,
            wait_refresh,
        } => {
            let bond = bond.bond(cli.network);
            let outcome = zapper
                .zapin_mint(&signing_ctx, &bond, &token.token(), &value, slippage)
                .await;
            match outcome {
                ZapOutcome::Confirmed { tx_hash, refresh } => {
                    if wait_refresh {
                        refresh.await.context("Account refresh task panicked")?;
                    }
                    let position = account.bond(cli.network, signing_ctx.owner, &bond.name);
                    json!({
                        "status": "confirmed",
                        "tx_hash": format!("{:?}", tx_hash),
                        "position": position,
                    })
                }
                ZapOutcome::Failed(kind) => json!({ "status": "failed", "error": kind }),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    debug!("Pending transactions left: {}", tracker.len());
    debug!("Metrics:\n{}", metrics::render());

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bond_zapper=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}
