/*!
   Helper functions for bootstrapping an interchain security consumer
   chain on top of a running provider chain.
*/

use core::time::Duration;
use serde_json as json;
use tracing::info;

use crate::bootstrap::single::{
    add_shared_wallets, configure_nodes, distribute_genesis, init_node_homes, start_chain,
};
use crate::chain::cli::provider::{
    consumer_addition_proposal, query_consumer_genesis, submit_consumer_chain_proposal,
};
use crate::chain::cli::query::query_key_address;
use crate::chain::cosmos::{CosmosChain, VALIDATOR_KEY};
use crate::chain::ext::bootstrap::ChainBootstrapMethodsExt;
use crate::chain::ext::proposal::poll_for_proposal_status;
use crate::chain::genesis::{apply_genesis_overrides, set_genesis_value};
use crate::chain::handle::ChainHandle;
use crate::error::{handle_generic_error, Error};
use crate::types::config::TestConfig;
use crate::types::proposal::{ProposalStatus, VoteOption};
use crate::types::token::Token;
use crate::types::wallet::{ChainWallets, Wallet};
use crate::util::retry::assert_eventually_succeed;

const PRIV_VALIDATOR_KEY_FILE: &str = "config/priv_validator_key.json";

/// Blocks after submission within which the consumer addition must pass.
const CONSUMER_PROPOSAL_BLOCKS: u64 = 40;

const CONSUMER_PROPOSAL_DEPOSIT: u128 = 10_000_000;

/// Genesis key receiving the consumer genesis state created by the provider.
pub const CCV_CONSUMER_GENESIS_KEY: &str = "app_state.ccvconsumer";

/**
   Bootstrap `consumer` as a consumer chain of the running `provider` and
   start it on `network`.

   The consumer validators sign with the consensus keys of the provider
   validators, so the consumer cannot have more validators than the
   provider. No gentx is collected: the validator set comes from the
   consumer genesis state that the provider creates once the
   `consumer-addition` proposal passed.
*/
pub fn bootstrap_consumer_chain(
    provider: &CosmosChain,
    consumer: &mut CosmosChain,
    network: &str,
    test_config: &TestConfig,
) -> Result<(), Error> {
    if consumer.validators.len() > provider.validators.len() {
        return Err(Error::invalid_network(format!(
            "consumer {} has {} validators but provider {} only has {}",
            consumer.config.chain_id,
            consumer.validators.len(),
            provider.config.chain_id,
            provider.validators.len()
        )));
    }

    init_node_homes(consumer)?;

    let provider_wallets = provider.wallets()?;
    let primary = consumer.primary_node()?;
    let genesis_amount = &consumer.config.genesis_amounts.genesis_amount;

    let mut validators = Vec::with_capacity(consumer.validators.len());

    for (i, validator) in consumer.validators.iter().enumerate() {
        let provider_validator = &provider.validators[i];
        let provider_wallet = &provider_wallets.validators[i];

        let key = provider_validator.read_file(PRIV_VALIDATOR_KEY_FILE)?;
        validator.write_file(PRIV_VALIDATOR_KEY_FILE, &key)?;

        validator.restore_wallet(provider_wallet)?;
        let address = query_key_address(validator, VALIDATOR_KEY)?;

        let wallet = Wallet::new(
            VALIDATOR_KEY.to_string(),
            address,
            provider_wallet.mnemonic.clone(),
        );

        primary.add_genesis_account(&wallet.address, &[genesis_amount])?;

        validators.push(wallet);
    }

    let (faucet, relayer) = add_shared_wallets(consumer)?;

    let ccv_genesis = add_consumer_to_provider(provider, &consumer.config.chain_id, test_config)?;

    primary.update_genesis_file("genesis.json", |genesis| {
        apply_genesis_overrides(genesis, &consumer.config.genesis_overrides)?;
        set_genesis_value(genesis, CCV_CONSUMER_GENESIS_KEY, ccv_genesis)
    })?;

    distribute_genesis(consumer)?;
    configure_nodes(consumer)?;

    consumer.wallets = Some(ChainWallets {
        validators,
        faucet,
        relayer,
    });

    start_chain(consumer, network, test_config)
}

/**
   Pass a `consumer-addition` proposal for `consumer_chain_id` on the
   provider and return the consumer genesis state the provider created.
*/
pub fn add_consumer_to_provider(
    provider: &CosmosChain,
    consumer_chain_id: &str,
    test_config: &TestConfig,
) -> Result<json::Value, Error> {
    let primary = provider.primary_node()?;

    let deposit = Token::new(provider.config.denom.clone(), CONSUMER_PROPOSAL_DEPOSIT);
    let proposal = consumer_addition_proposal(consumer_chain_id, &deposit.to_string());

    let proposal_file = format!("consumer-addition-{}.json", consumer_chain_id);
    primary.write_file(
        &proposal_file,
        &json::to_string_pretty(&proposal).map_err(handle_generic_error)?,
    )?;

    let height = provider.height()?;
    let proposal_id = submit_consumer_chain_proposal(primary, VALIDATOR_KEY, &proposal_file)?;

    provider.vote_on_proposal_all_validators(&proposal_id, VoteOption::Yes)?;

    poll_for_proposal_status(
        provider,
        height,
        height + CONSUMER_PROPOSAL_BLOCKS,
        &proposal_id,
        ProposalStatus::Passed,
        test_config.poll_interval,
    )?;

    info!(
        "consumer addition proposal {} for {} passed on {}",
        proposal_id, consumer_chain_id, provider.config.chain_id
    );

    // the consumer genesis is created in the block after the proposal passed
    assert_eventually_succeed(
        &format!("consumer genesis of {} is available", consumer_chain_id),
        20,
        Duration::from_secs(1),
        || query_consumer_genesis(primary, consumer_chain_id),
    )
}
