/*!
   Methods of the interchain security `provider` module.
*/

use serde_json as json;

use crate::chain::cli::proposal::proposal_id_from_tx;
use crate::chain::cli::query::{parse_json_or_yaml, query_tx_hash};
use crate::chain::cli::tx_args;
use crate::chain::driver::ChainDriver;
use crate::error::Error;
use crate::types::proposal::ProposalId;

/**
   Spawn time of consumer chains. A time in the past makes the provider
   create the consumer genesis as soon as the proposal passes.
*/
pub const CONSUMER_SPAWN_TIME: &str = "2023-05-31T12:09:47.048227Z";

/// Unbonding period proposed for consumer chains, longer than the
/// trusting period of their light clients.
pub const CONSUMER_UNBONDING_PERIOD: &str = "1728000s";

/**
   The content of a `consumer-addition` proposal for `consumer_chain_id`.
*/
pub fn consumer_addition_proposal(consumer_chain_id: &str, deposit: &str) -> json::Value {
    json::json!({
        "title": format!("Add consumer chain {}", consumer_chain_id),
        "description": "Launch a consumer chain secured by the provider validators",
        "chain_id": consumer_chain_id,
        "initial_height": {
            "revision_number": 1,
            "revision_height": 1
        },
        "genesis_hash": "Z2VuX2hhc2g=",
        "binary_hash": "YmluX2hhc2g=",
        "spawn_time": CONSUMER_SPAWN_TIME,
        "unbonding_period": CONSUMER_UNBONDING_PERIOD,
        "ccv_timeout_period": "2419200s",
        "transfer_timeout_period": "3600s",
        "consumer_redistribution_fraction": "0.75",
        "blocks_per_distribution_transmission": 1000,
        "historical_entries": 10000,
        "deposit": deposit
    })
}

/**
   Submit the `consumer-addition` proposal stored at `proposal_file`,
   a path relative to the node home.
*/
pub fn submit_consumer_chain_proposal(
    driver: &ChainDriver,
    from: &str,
    proposal_file: &str,
) -> Result<ProposalId, Error> {
    let proposal_path = format!("{}/{}", driver.container_home, proposal_file);

    let mut args = vec![
        "tx",
        "gov",
        "submit-proposal",
        "consumer-addition",
        proposal_path.as_str(),
    ];

    let tx_args = tx_args(driver, from);
    args.extend(tx_args.iter().map(String::as_str));

    let output = driver.exec_bin("submit consumer addition proposal", &args)?;

    let tx = query_tx_hash(driver, &output.stdout)?;

    proposal_id_from_tx(&tx)
}

/**
   Query the CCV consumer genesis state that the provider created for the
   given consumer chain.
*/
pub fn query_consumer_genesis(
    driver: &ChainDriver,
    consumer_chain_id: &str,
) -> Result<json::Value, Error> {
    let output = driver.exec_bin(
        "query consumer genesis",
        &[
            "query",
            "provider",
            "consumer-genesis",
            consumer_chain_id,
            "--node",
            driver.rpc_listen_address().as_str(),
            "--output",
            "json",
        ],
    )?;

    parse_json_or_yaml(&output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_targets_consumer() {
        let proposal = consumer_addition_proposal("onex-1", "10000000anom");

        assert_eq!(proposal["chain_id"], "onex-1");
        assert_eq!(proposal["spawn_time"], CONSUMER_SPAWN_TIME);
        assert_eq!(proposal["deposit"], "10000000anom");
        assert_eq!(proposal["initial_height"]["revision_number"], 1);
    }
}
