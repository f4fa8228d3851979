use tracing::debug;

use crate::chain::driver::ChainDriver;
use crate::error::Error;

pub fn initialize(driver: &ChainDriver) -> Result<(), Error> {
    driver.exec_bin(
        "initialize",
        &[
            "init",
            driver.node_name.as_str(),
            "--chain-id",
            driver.chain_id.as_str(),
            "--home",
            driver.container_home.as_str(),
        ],
    )?;

    Ok(())
}

/**
   Create a key in the test keyring and return the JSON description of it,
   which includes the mnemonic.
*/
pub fn add_wallet(driver: &ChainDriver, wallet_id: &str) -> Result<String, Error> {
    let output = driver.exec_bin(
        "add wallet",
        &[
            "keys",
            "add",
            wallet_id,
            "--home",
            driver.container_home.as_str(),
            "--keyring-backend",
            "test",
            "--output",
            "json",
        ],
    )?;

    // older SDK versions print the new key to stderr
    if output.stdout.trim().is_empty() {
        Ok(output.stderr)
    } else {
        Ok(output.stdout)
    }
}

/**
   Restore a key from its mnemonic, so that several nodes can sign with
   the same account. The mnemonic is piped into the key prompt by a shell
   inside the container.
*/
pub fn restore_wallet(driver: &ChainDriver, wallet_id: &str, mnemonic: &str) -> Result<(), Error> {
    driver.exec_program(
        "restore wallet",
        "sh",
        &[
            "-c",
            r#"printf '%s\n' "$0" | "$@""#,
            mnemonic,
            driver.command_path.as_str(),
            "keys",
            "add",
            wallet_id,
            "--recover",
            "--home",
            driver.container_home.as_str(),
            "--keyring-backend",
            "test",
        ],
    )?;

    Ok(())
}

pub fn add_genesis_account(
    driver: &ChainDriver,
    wallet_address: &str,
    amounts: &[String],
) -> Result<(), Error> {
    let amounts_str = itertools::join(amounts, ",");

    driver.exec_bin(
        "add genesis account",
        &[
            "add-genesis-account",
            wallet_address,
            &amounts_str,
            "--home",
            driver.container_home.as_str(),
        ],
    )?;

    Ok(())
}

pub fn add_genesis_validator(
    driver: &ChainDriver,
    wallet_id: &str,
    amount: &str,
) -> Result<(), Error> {
    driver.exec_bin(
        "add genesis validator",
        &[
            "gentx",
            wallet_id,
            amount,
            "--moniker",
            driver.node_name.as_str(),
            "--chain-id",
            driver.chain_id.as_str(),
            "--keyring-backend",
            "test",
            "--home",
            driver.container_home.as_str(),
        ],
    )?;

    Ok(())
}

pub fn collect_gen_txs(driver: &ChainDriver) -> Result<(), Error> {
    driver.exec_bin(
        "collect gentxs",
        &[
            "collect-gentxs",
            "--home",
            driver.container_home.as_str(),
        ],
    )?;

    Ok(())
}

/// The CometBFT node ID derived from the node key.
pub fn show_node_id(driver: &ChainDriver) -> Result<String, Error> {
    let output = driver.exec_bin(
        "show node id",
        &[
            "tendermint",
            "show-node-id",
            "--home",
            driver.container_home.as_str(),
        ],
    )?;

    let node_id = output.stdout.trim().to_string();

    debug!("node {} has id {}", driver.container_name, node_id);

    Ok(node_id)
}
