use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use prompthash::blockchain::{
    ContractClient, LocalSigner, NetworkId, PromptHashContract, RpcClient, WalletSession,
};
use prompthash::config::{load_or_default, MarketConfig};
use prompthash::observability::logging;
use prompthash::workflow::{
    submit_listing, ListingForm, ListingWorkflow, SubmitOutcome, WorkflowSettings,
};

#[derive(Parser)]
#[command(name = "prompthash-cli")]
#[command(about = "Operator CLI for the PromptHash marketplace", long_about = None)]
struct Cli {
    /// Configuration file (defaults are used when omitted)
    #[arg(short, long, env = "PROMPTHASH_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of a running marketplace server
    #[arg(short, long, default_value = "http://localhost:5000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a prompt listing and approve the marketplace to transfer it.
    /// Signs with the key in PROMPTHASH_SIGNER_KEY.
    List {
        #[arg(long)]
        image_url: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "2")]
        price: String,
    },
    /// Show the id the next mint will receive
    NextToken,
    /// List users, or look one up by wallet
    Users {
        #[arg(long)]
        wallet: Option<String>,
    },
    /// List prompts, optionally filtered
    Prompts {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        wallet: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    logging::init_logging(&config.observability);

    match cli.command {
        Commands::List {
            image_url,
            title,
            description,
            category,
            price,
        } => {
            let mut form = ListingForm {
                image_url,
                title,
                description,
                category,
                price,
            };
            return list(&config, &mut form).await;
        }
        Commands::NextToken => {
            let Some(contract) = contract(&config)? else {
                eprintln!("Error: no RPC endpoint configured (blockchain.rpc_url)");
                return Ok(ExitCode::FAILURE);
            };
            println!("{}", contract.next_token().await?);
        }
        Commands::Users { wallet } => {
            let client = reqwest::Client::new();
            let mut req = client.get(format!("{}/api/user", cli.api_url));
            if let Some(wallet) = wallet {
                req = req.query(&[("walletAddress", wallet)]);
            }
            print_response(req.send().await?).await?;
        }
        Commands::Prompts { category, wallet } => {
            let client = reqwest::Client::new();
            let mut params = Vec::new();
            if let Some(category) = category {
                params.push(("category", category));
            }
            if let Some(wallet) = wallet {
                params.push(("walletAddress", wallet));
            }
            let res = client
                .get(format!("{}/api/prompts", cli.api_url))
                .query(&params)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn rpc_client(config: &MarketConfig) -> Result<Option<Arc<RpcClient>>, Box<dyn std::error::Error>> {
    match config.blockchain.endpoint() {
        Some(url) => Ok(Some(Arc::new(RpcClient::new(
            url,
            config.blockchain.rpc_timeout_secs,
        )?))),
        None => Ok(None),
    }
}

fn network(config: &MarketConfig) -> NetworkId {
    NetworkId::from(config.blockchain.network_passphrase.as_str())
}

fn contract(config: &MarketConfig) -> Result<Option<PromptHashContract>, Box<dyn std::error::Error>> {
    Ok(rpc_client(config)?.map(|rpc| {
        PromptHashContract::new(rpc, config.blockchain.contract_id.clone(), network(config))
    }))
}

async fn list(
    config: &MarketConfig,
    form: &mut ListingForm,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let Some(rpc) = rpc_client(config)? else {
        eprintln!("Error: no RPC endpoint configured (blockchain.rpc_url)");
        return Ok(ExitCode::FAILURE);
    };
    let contract = PromptHashContract::new(
        rpc.clone(),
        config.blockchain.contract_id.clone(),
        network(config),
    );

    let signer = LocalSigner::from_env()?;
    let address = signer.address();
    let session = WalletSession::connected(signer, network(config), address);

    let workflow = ListingWorkflow::new(
        contract,
        &session,
        Some(rpc),
        WorkflowSettings::from_config(&config.blockchain),
    );

    match submit_listing(form, &workflow).await {
        SubmitOutcome::Invalid(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("{}: {}", field, message);
            }
            Ok(ExitCode::from(2))
        }
        SubmitOutcome::Failed => {
            eprintln!("Listing failed; see logs for details");
            Ok(ExitCode::FAILURE)
        }
        SubmitOutcome::Listed { redirect } => {
            println!("Listed. Browse at {}", redirect);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
