//! CLI commands
//!
//! Implements all command handlers for the `voting` binary.

use crate::api::{create_router, ApiState, SharedTallyView, WsBroadcaster};
use crate::client::{ClientConfig, ConsoleView, VotingClient};
use crate::contract::{ContractCompiler, ContractSource, SolcCompiler};
use crate::deploy::{DeployConfig, Deployer};
use crate::rpc::{ChainNode, HttpNode};
use crate::storage::DescriptorStore;
use ethers::types::Address;
use std::path::Path;
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// List the node's unlocked accounts
pub async fn cmd_accounts(endpoint: &str) -> CliResult<()> {
    let node = HttpNode::connect(endpoint)?;
    let accounts = node.accounts().await?;

    if accounts.is_empty() {
        println!("👛 Node at {} exposes no accounts.", endpoint);
    } else {
        println!("👛 Accounts ({}):", accounts.len());
        for (index, account) in accounts.iter().enumerate() {
            println!("   [{}] {:?}", index, account);
        }
    }
    Ok(())
}

/// Compile a contract and show its artifact
pub async fn cmd_compile(source: &Path, contract_name: &str, solc: Option<&Path>) -> CliResult<()> {
    println!("📜 Compiling {} from {:?}...", contract_name, source);

    let compiler = solc_compiler(solc);
    let artifact = compiler.compile(&ContractSource::read(source)?, contract_name)?;

    println!("✅ Compiled!");
    println!("   Bytecode: {} bytes", artifact.bytecode.len() / 2);
    println!("\n   ABI:");
    for line in artifact.abi_json()?.lines() {
        println!("   {}", line);
    }
    Ok(())
}

/// Compile, deploy and write the descriptor
pub async fn cmd_deploy(config: DeployConfig, source: &Path, solc: Option<&Path>) -> CliResult<()> {
    println!(
        "🚀 Deploying {} from {:?} via {}...",
        config.contract_name, source, config.endpoint
    );
    println!("   Constructor arguments: {:?}", config.constructor_args);
    println!("   Gas limit: {}", config.gas_limit);

    let node = Arc::new(HttpNode::connect(&config.endpoint)?);
    let deployer = Deployer::new(node, config);
    let compiler = solc_compiler(solc);

    let descriptor = deployer.deploy(&compiler, source).await?;

    println!("✅ Contract mined!");
    println!("   Address: {}", descriptor.address);
    println!("   Descriptor: {:?}", deployer.config().descriptor_path);
    Ok(())
}

/// Show every candidate's tally
pub async fn cmd_tally(config: ClientConfig) -> CliResult<()> {
    let node = Arc::new(HttpNode::connect(&config.endpoint)?);
    let client = VotingClient::initialize(node, Arc::new(ConsoleView), config)?;

    println!("🗳️  Ballot at {:?}:", client.contract().address());
    client.render_all().await?;
    Ok(())
}

/// Vote for a candidate and show its new tally
pub async fn cmd_vote(config: ClientConfig, candidate: &str, sender: Option<Address>) -> CliResult<()> {
    let node = Arc::new(HttpNode::connect(&config.endpoint)?);
    let client = VotingClient::initialize(node, Arc::new(ConsoleView), config)?;

    let sender = match sender {
        Some(address) => address,
        None => client.default_sender().await?,
    };
    println!("🗳️  Voting for {:?} from {:?}...", candidate, sender);

    client.vote(candidate, sender).await?;
    println!("✅ Vote recorded!");
    Ok(())
}

/// Serve the ballot page
pub async fn cmd_serve(config: ClientConfig, port: u16) -> CliResult<()> {
    let descriptor = DescriptorStore::new(&config.descriptor_path).load()?;
    let node = Arc::new(HttpNode::connect(&config.endpoint)?);

    let view = Arc::new(SharedTallyView::new(Arc::new(WsBroadcaster::new())));
    let client = VotingClient::initialize(node, view.clone(), config)?;
    let default_sender = client.default_sender().await?;

    // Render once so the page has tallies before the first refresh
    if let Err(e) = client.render_all().await {
        log::warn!("Initial render incomplete: {}", e);
    }

    let state = ApiState {
        client: Arc::new(client),
        view,
        descriptor: Arc::new(descriptor),
        default_sender,
    };
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    println!("🚀 Ballot page on http://localhost:{}", port);
    println!();
    println!("📖 Available endpoints:");
    println!("   GET  /                 - Ballot page");
    println!("   GET  /contract.json    - Deployment descriptor");
    println!("   GET  /api/candidates   - Candidates and tallies");
    println!("   GET  /api/tallies      - Display locations");
    println!("   POST /api/refresh      - Re-read all tallies");
    println!("   POST /api/vote         - Cast a vote");
    println!("   GET  /ws               - WebSocket updates");
    println!();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            println!("\n📴 Shutting down...");
        })
        .await?;
    Ok(())
}

fn solc_compiler(solc: Option<&Path>) -> SolcCompiler {
    match solc {
        Some(path) => SolcCompiler::with_path(path),
        None => SolcCompiler::new(),
    }
}
