//! IBC Bank Deployer CLI
//!
//! - `ibc-deployer plan`          - print the deployment order
//! - `ibc-deployer deploy`        - deploy every unit not yet in the session
//! - `ibc-deployer prepare-demo`  - approve + deposits against the deployed bank
//! - `ibc-deployer all`           - deploy, then prepare the demo
//! - `ibc-deployer balances`      - token and bank balances of demo accounts

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deployer::demo::{BANK_UNIT, TOKEN_UNIT};
use deployer::evm::{bank_denom, BalanceReader, EvmSubmitter};
use deployer::{
    demo_steps, DependencyGraph, DeployerConfig, DeploymentPlan, DeploymentSession,
    DirectoryRegistry, Manifest, NetworkSubmitter, TransactionRunner,
};

#[derive(Parser)]
#[command(name = "ibc-deployer")]
#[command(about = "Deploy the IBC stack and ICS20 bank contracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON-RPC endpoint (overrides DEPLOYER_RPC_URL)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Expected chain id (overrides DEPLOYER_CHAIN_ID)
    #[arg(long, global = true)]
    chain_id: Option<u64>,

    /// Compiled artifacts directory (overrides DEPLOYER_ARTIFACTS_DIR)
    #[arg(long, global = true)]
    artifacts_dir: Option<PathBuf>,

    /// Unit manifest (overrides DEPLOYER_MANIFEST)
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Session output file (overrides DEPLOYER_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved deployment order without touching the network
    Plan,

    /// Deploy every unit that is not yet recorded in the session file
    Deploy,

    /// Run the approve + deposit sequence against the deployed bank
    PrepareDemo,

    /// Deploy, then prepare the demo
    All,

    /// Show token and bank balances of the deployer and demo recipients
    Balances,
}

impl Cli {
    fn apply(&self, config: &mut DeployerConfig) -> Result<()> {
        if let Some(url) = &self.rpc_url {
            config.network.rpc_url = url.parse().wrap_err("Invalid --rpc-url")?;
        }
        if let Some(chain_id) = self.chain_id {
            config.network.chain_id = chain_id;
        }
        if let Some(dir) = &self.artifacts_dir {
            config.artifacts_dir = dir.clone();
        }
        if let Some(manifest) = &self.manifest {
            config.manifest = Some(manifest.clone());
        }
        if let Some(session) = &self.session_file {
            config.session_file = session.clone();
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = DeployerConfig::load()?;
    cli.apply(&mut config)?;
    info!(
        rpc_url = %config.network.rpc_url,
        chain_id = config.network.chain_id,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Plan => plan(&config),
        Commands::Deploy => deploy(&config).await,
        Commands::PrepareDemo => prepare_demo(&config).await,
        Commands::All => {
            deploy(&config).await?;
            prepare_demo(&config).await
        }
        Commands::Balances => balances(&config).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,deployer=debug,ibc_deployer=debug"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_manifest(config: &DeployerConfig) -> Result<Manifest> {
    match &config.manifest {
        Some(path) => Manifest::from_file(path),
        None => Ok(Manifest::ibc_stack(&config.demo.token)),
    }
}

fn plan(config: &DeployerConfig) -> Result<()> {
    let manifest = load_manifest(config)?;
    let graph = DependencyGraph::new(&manifest)?;
    let order = graph.topological_order()?;

    println!("Deployment order ({} units):", order.len());
    for (i, unit) in order.iter().enumerate() {
        let deps = graph.dependencies_of(&unit.name);
        if deps.is_empty() {
            println!("  {:>2}. {}", i + 1, unit.name);
        } else {
            println!("  {:>2}. {}  <- {}", i + 1, unit.name, deps.join(", "));
        }
    }
    Ok(())
}

async fn deploy(config: &DeployerConfig) -> Result<()> {
    let manifest = load_manifest(config)?;
    let registry = DirectoryRegistry::new(&config.artifacts_dir);
    let plan = DeploymentPlan::build(&manifest, &registry)?;
    info!(order = ?plan.order(), "Resolved deployment order");

    let mut session = DeploymentSession::open(&config.session_file, config.network.chain_id)?;
    let submitter = EvmSubmitter::connect(&config.network).await?;

    let deployed = plan.execute(&mut session, &submitter).await?;
    info!(
        new = deployed.len(),
        total = session.len(),
        session_file = %config.session_file.display(),
        "Deployment finished"
    );

    if let Some(env_file) = &config.env_file {
        session.export_env(env_file)?;
    }

    for handle in session.handles() {
        println!("{:<24} {}", handle.name, handle.address);
    }
    Ok(())
}

async fn prepare_demo(config: &DeployerConfig) -> Result<()> {
    let session = DeploymentSession::load(&config.session_file, config.network.chain_id)
        .wrap_err("Deploy first: no usable session file")?;
    let submitter = EvmSubmitter::connect(&config.network).await?;

    info!(deployer = %submitter.sender(), "Preparing demo");
    let steps = demo_steps(&config.demo);
    let receipts = TransactionRunner::new(&session, &submitter)
        .run(&steps)
        .await?;

    for r in &receipts {
        println!("tx result: {:<48} {}", r.step, r.receipt.tx_hash);
    }
    Ok(())
}

async fn balances(config: &DeployerConfig) -> Result<()> {
    let session = DeploymentSession::load(&config.session_file, config.network.chain_id)?;
    let token = session
        .get(TOKEN_UNIT)
        .ok_or_else(|| eyre!("{} not deployed in this session", TOKEN_UNIT))?
        .address;
    let bank = session
        .get(BANK_UNIT)
        .ok_or_else(|| eyre!("{} not deployed in this session", BANK_UNIT))?
        .address;

    let reader = BalanceReader::new(config.network.rpc_url.clone());
    let denom = bank_denom(token);

    let mut accounts = Vec::new();
    if config.network.private_key.is_some() {
        let deployer = EvmSubmitter::new(&config.network)?.sender();
        let allowance = reader.token_allowance(token, deployer, bank).await?;
        println!("{}  allowance[bank]={}", deployer, allowance);
        accounts.push(deployer);
    }
    accounts.extend(config.demo.recipients.iter().copied());

    for account in accounts {
        let held = reader.token_balance(token, account).await?;
        let banked = reader.bank_balance(bank, account, &denom).await?;
        println!("{}  token={}  bank[{}]={}", account, held, denom, banked);
    }
    Ok(())
}
