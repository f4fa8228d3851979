/*!
   Functions wrapping the command line of a Cosmos SDK chain binary.

   Every function takes the [`ChainDriver`] of the node to run the command
   against. Transactions are broadcast in sync mode and then looked up by
   hash, so that the returned value reflects the result of the delivered
   transaction.
*/

pub mod bootstrap;
pub mod proposal;
pub mod provider;
pub mod query;
pub mod transfer;

use crate::chain::driver::ChainDriver;

/// Gas limit of every transaction sent by the tests.
pub const DEFAULT_GAS_LIMIT: &str = "1000000";

/**
   Flags shared by every `tx` subcommand, signing with the key `from` of
   the node's test keyring.
*/
pub fn tx_args(driver: &ChainDriver, from: &str) -> Vec<String> {
    [
        "--chain-id",
        driver.chain_id.as_str(),
        "--home",
        driver.container_home.as_str(),
        "--node",
        driver.rpc_listen_address().as_str(),
        "--keyring-backend",
        "test",
        "--from",
        from,
        "--gas",
        DEFAULT_GAS_LIMIT,
        "--gas-prices",
        driver.gas_prices.as_str(),
        "--broadcast-mode",
        "sync",
        "--yes",
        "--output",
        "json",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}
