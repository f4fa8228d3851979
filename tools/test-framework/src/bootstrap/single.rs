/*!
   Helper functions for bootstrapping a standalone chain, such as the
   provider chain of a test.
*/

use core::time::Duration;
use tracing::info;

use crate::chain::config;
use crate::chain::cosmos::{CosmosChain, FAUCET_KEY, RELAYER_KEY, VALIDATOR_KEY};
use crate::chain::descriptor::ConfigFileOverride;
use crate::chain::driver::ChainDriver;
use crate::chain::ext::bootstrap::ChainBootstrapMethodsExt;
use crate::chain::ext::wait::wait_for_chain_height;
use crate::chain::genesis::apply_genesis_overrides;
use crate::error::Error;
use crate::types::config::TestConfig;
use crate::types::wallet::{ChainWallets, Wallet};

const GENESIS_FILE: &str = "genesis.json";

const TIMEOUT_COMMIT: Duration = Duration::from_secs(2);

const LOG_LEVEL: &str = "info";

/**
   Bootstrap a chain whose validator set is created from its own gentxs,
   and start every node of it on `network`.

   Returns once the chain has produced its first block.
*/
pub fn bootstrap_single_chain(
    chain: &mut CosmosChain,
    network: &str,
    test_config: &TestConfig,
) -> Result<(), Error> {
    init_node_homes(chain)?;

    let primary = chain.primary_node()?;
    let genesis_amount = &chain.config.genesis_amounts.genesis_amount;
    let self_delegation = &chain.config.genesis_amounts.self_delegation;

    let mut validators = Vec::with_capacity(chain.validators.len());

    for validator in &chain.validators {
        let wallet = validator.add_wallet(VALIDATOR_KEY)?;

        validator.add_genesis_account(&wallet.address, &[genesis_amount])?;
        validator.add_genesis_validator(&wallet.id, self_delegation)?;

        if validator.node_name != primary.node_name {
            primary.add_genesis_account(&wallet.address, &[genesis_amount])?;
            copy_gentxs(validator, primary)?;
        }

        validators.push(wallet);
    }

    let (faucet, relayer) = add_shared_wallets(chain)?;

    primary.collect_gen_txs()?;

    primary.update_genesis_file(GENESIS_FILE, |genesis| {
        apply_genesis_overrides(genesis, &chain.config.genesis_overrides)
    })?;

    distribute_genesis(chain)?;
    configure_nodes(chain)?;

    chain.wallets = Some(ChainWallets {
        validators,
        faucet,
        relayer,
    });

    start_chain(chain, network, test_config)
}

/// Create the host directories of every node and initialize them.
pub fn init_node_homes(chain: &CosmosChain) -> Result<(), Error> {
    for node in chain.nodes() {
        node.prepare_home()?;
        node.initialize()?;
    }

    Ok(())
}

/**
   Create the faucet and relayer wallets in the primary node and give
   each of them the genesis amount of the chain.
*/
pub fn add_shared_wallets(chain: &CosmosChain) -> Result<(Wallet, Wallet), Error> {
    let primary = chain.primary_node()?;
    let genesis_amount = &chain.config.genesis_amounts.genesis_amount;

    let faucet = primary.add_wallet(FAUCET_KEY)?;
    primary.add_genesis_account(&faucet.address, &[genesis_amount])?;

    let relayer = primary.add_wallet(RELAYER_KEY)?;
    primary.add_genesis_account(&relayer.address, &[genesis_amount])?;

    Ok((faucet, relayer))
}

fn copy_gentxs(from: &ChainDriver, to: &ChainDriver) -> Result<(), Error> {
    for file in from.list_files("config/gentx")? {
        let path = format!("config/gentx/{}", file);
        let gentx = from.read_file(&path)?;
        to.write_file(&path, &gentx)?;
    }

    Ok(())
}

/// Copy the genesis file of the primary node to every other node.
pub fn distribute_genesis(chain: &CosmosChain) -> Result<(), Error> {
    let primary = chain.primary_node()?;
    let genesis_path = format!("config/{}", GENESIS_FILE);
    let genesis = primary.read_file(&genesis_path)?;

    for node in chain.nodes() {
        if node.node_name != primary.node_name {
            node.write_file(&genesis_path, &genesis)?;
        }
    }

    Ok(())
}

/**
   Write the `config.toml` and `app.toml` of every node: listen addresses,
   block time, peers, log level, minimum gas price and the configured
   overrides. The REST API server is disabled.
*/
pub fn configure_nodes(chain: &CosmosChain) -> Result<(), Error> {
    let mut peers = Vec::new();
    for node in chain.nodes() {
        peers.push((node.node_name.clone(), node.p2p_address(&node.node_id()?)));
    }

    for node in chain.nodes() {
        let node_peers = peers
            .iter()
            .filter(|(name, _)| name != &node.node_name)
            .map(|(_, address)| address.clone())
            .collect::<Vec<_>>();

        node.update_chain_config("config.toml", |value| {
            config::set_rpc_port(value, config::RPC_PORT)?;
            config::set_p2p_port(value, config::P2P_PORT)?;
            config::set_timeout_commit(value, TIMEOUT_COMMIT)?;
            config::set_allow_duplicate_ip(value, true)?;
            config::set_persistent_peers(value, &node_peers)?;
            config::set_log_level(value, LOG_LEVEL)?;

            apply_overrides(value, "config.toml", &chain.config.config_file_overrides)
        })?;

        node.update_chain_config("app.toml", |value| {
            config::set_minimum_gas_price(value, &chain.config.gas_prices)?;
            config::set_grpc_port(value, config::GRPC_PORT)?;
            config::disable_api(value)?;

            apply_overrides(value, "app.toml", &chain.config.config_file_overrides)
        })?;
    }

    Ok(())
}

fn apply_overrides(
    value: &mut toml::Value,
    file: &str,
    overrides: &[ConfigFileOverride],
) -> Result<(), Error> {
    for config_override in overrides.iter().filter(|o| o.file == file) {
        config::apply_config_override(value, config_override)?;
    }

    Ok(())
}

/**
   Start every node of the chain and wait until the chain committed its
   first block.
*/
pub fn start_chain(
    chain: &mut CosmosChain,
    network: &str,
    test_config: &TestConfig,
) -> Result<(), Error> {
    chain.start_all(network)?;

    let height = wait_for_chain_height(
        &*chain,
        1,
        test_config.block_wait_timeout,
        test_config.poll_interval,
    )?;

    info!(
        "chain {} is producing blocks, at height {}",
        chain.config.chain_id, height
    );

    Ok(())
}
