use core::time::Duration;
use eyre::eyre;
use serde_json as json;
use serde_yaml as yaml;

use crate::chain::driver::ChainDriver;
use crate::error::{handle_generic_error, Error};
use crate::types::token::{RawCoin, Token};
use crate::util::retry::assert_eventually_succeed;

const WAIT_TX_ATTEMPTS: u16 = 30;

/// Latest block height reported by `<bin> status`.
pub fn query_height(driver: &ChainDriver) -> Result<u64, Error> {
    let output = driver.exec_bin(
        "query status",
        &["status", "--node", driver.rpc_listen_address().as_str()],
    )?;

    // SDK v0.45 prints the status to stderr
    let raw = if output.stdout.trim().is_empty() {
        output.stderr
    } else {
        output.stdout
    };

    parse_status_height(&raw)
}

pub fn parse_status_height(raw: &str) -> Result<u64, Error> {
    let status: json::Value = json::from_str(raw.trim()).map_err(handle_generic_error)?;

    let height = status
        .get("SyncInfo")
        .or_else(|| status.get("sync_info"))
        .and_then(|sync_info| sync_info.get("latest_block_height"))
        .and_then(|height| height.as_str())
        .ok_or_else(|| eyre!("expected latest_block_height in status output"))?;

    let height = height.parse().map_err(handle_generic_error)?;

    Ok(height)
}

pub fn query_balances(driver: &ChainDriver, address: &str) -> Result<Vec<Token>, Error> {
    let output = driver.exec_bin(
        "query balances",
        &[
            "query",
            "bank",
            "balances",
            address,
            "--node",
            driver.rpc_listen_address().as_str(),
            "--output",
            "json",
        ],
    )?;

    parse_balances(&output.stdout)
}

pub fn parse_balances(raw: &str) -> Result<Vec<Token>, Error> {
    let value = parse_json_or_yaml(raw)?;

    let balances = value
        .get("balances")
        .cloned()
        .ok_or_else(|| eyre!("expected balances field"))?;

    let coins: Vec<RawCoin> = json::from_value(balances).map_err(handle_generic_error)?;

    coins.into_iter().map(Token::try_from).collect()
}

/// Light clients hosted by the chain, as `(client_id, chain_id)` pairs.
pub fn query_client_states(driver: &ChainDriver) -> Result<Vec<(String, String)>, Error> {
    let output = driver.exec_bin(
        "query client states",
        &[
            "query",
            "ibc",
            "client",
            "states",
            "--node",
            driver.rpc_listen_address().as_str(),
            "--output",
            "json",
        ],
    )?;

    parse_client_states(&output.stdout)
}

pub fn parse_client_states(raw: &str) -> Result<Vec<(String, String)>, Error> {
    let value = parse_json_or_yaml(raw)?;

    let states = value
        .get("client_states")
        .and_then(|states| states.as_array())
        .ok_or_else(|| eyre!("expected client_states field"))?;

    states
        .iter()
        .map(|state| {
            let client_id = state
                .get("client_id")
                .and_then(|id| id.as_str())
                .ok_or_else(|| eyre!("expected client_id in client state"))?;

            let chain_id = state
                .get("client_state")
                .and_then(|client_state| client_state.get("chain_id"))
                .and_then(|id| id.as_str())
                .ok_or_else(|| eyre!("expected chain_id in client state {}", client_id))?;

            Ok((client_id.to_string(), chain_id.to_string()))
        })
        .collect()
}

pub fn query_key_address(driver: &ChainDriver, wallet_id: &str) -> Result<String, Error> {
    let output = driver.exec_bin(
        "query key address",
        &[
            "keys",
            "show",
            wallet_id,
            "--address",
            "--home",
            driver.container_home.as_str(),
            "--keyring-backend",
            "test",
        ],
    )?;

    Ok(output.stdout.trim().to_string())
}

/**
   Wait for the transaction broadcast with the given `tx` output to be
   included in a block, and return the delivered transaction.

   Fails if either the check or the delivery of the transaction
   returned a non-zero code.
*/
pub fn query_tx_hash(driver: &ChainDriver, tx_output: &str) -> Result<json::Value, Error> {
    let broadcast = parse_json_or_yaml(tx_output)?;

    check_tx_code(&broadcast)?;

    let tx_hash = broadcast
        .get("txhash")
        .and_then(|hash| hash.as_str())
        .ok_or_else(|| eyre!("expected txhash in broadcast output"))?
        .to_string();

    let delivered = assert_eventually_succeed(
        &format!("tx {} is included in a block", tx_hash),
        WAIT_TX_ATTEMPTS,
        Duration::from_secs(1),
        || {
            let output = driver.exec_bin(
                "query tx",
                &[
                    "query",
                    "tx",
                    tx_hash.as_str(),
                    "--node",
                    driver.rpc_listen_address().as_str(),
                    "--output",
                    "json",
                ],
            )?;

            parse_json_or_yaml(&output.stdout)
        },
    )?;

    check_tx_code(&delivered)?;

    Ok(delivered)
}

fn check_tx_code(tx: &json::Value) -> Result<(), Error> {
    let code = tx.get("code").and_then(|code| code.as_u64()).unwrap_or(0);

    if code != 0 {
        let raw_log = tx
            .get("raw_log")
            .and_then(|log| log.as_str())
            .unwrap_or_default();

        return Err(Error::generic(eyre!(
            "transaction failed with code {}: {}",
            code,
            raw_log
        )));
    }

    Ok(())
}

pub fn query_proposal(driver: &ChainDriver, proposal_id: &str) -> Result<json::Value, Error> {
    let output = driver.exec_bin(
        "query proposal",
        &[
            "query",
            "gov",
            "proposal",
            proposal_id,
            "--node",
            driver.rpc_listen_address().as_str(),
            "--output",
            "json",
        ],
    )?;

    parse_json_or_yaml(&output.stdout)
}

/**
   Some subcommands ignore `--output json` and print YAML instead, so we
   fall back to parsing YAML before giving up.
*/
pub fn parse_json_or_yaml(raw: &str) -> Result<json::Value, Error> {
    match json::from_str(raw) {
        Ok(res) => Ok(res),
        _ => {
            let value: yaml::Value = yaml::from_str(raw).map_err(handle_generic_error)?;
            yaml_to_json_value(value)
        }
    }
}

// Hack to convert yaml::Value to json::Value. Unfortunately there is
// no builtin conversion provided even though both Value types are
// essentially the same. We just convert the two types to and from
// strings as a shortcut.
fn yaml_to_json_value(value: yaml::Value) -> Result<json::Value, Error> {
    let json_str = json::to_string(&value).map_err(handle_generic_error)?;

    let parsed = json::from_str(&json_str).map_err(handle_generic_error)?;

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_status_layouts() -> Result<(), Error> {
        let legacy = r#"{"NodeInfo":{},"SyncInfo":{"latest_block_height":"42"}}"#;
        let current = r#"{"node_info":{},"sync_info":{"latest_block_height":"7"}}"#;

        assert_eq!(parse_status_height(legacy)?, 42);
        assert_eq!(parse_status_height(current)?, 7);
        assert!(parse_status_height(r#"{"sync_info":{}}"#).is_err());

        Ok(())
    }

    #[test]
    fn parses_json_and_yaml_balances() -> Result<(), Error> {
        let json_balances = r#"{"balances":[{"denom":"anom","amount":"10000000000"}],"pagination":{}}"#;

        let yaml_balances = "balances:\n- amount: \"25\"\n  denom: anom\npagination:\n  next_key: null\n";

        assert_eq!(
            parse_balances(json_balances)?,
            vec![Token::new("anom", 10_000_000_000)]
        );
        assert_eq!(parse_balances(yaml_balances)?, vec![Token::new("anom", 25)]);

        Ok(())
    }

    #[test]
    fn parses_client_states() -> Result<(), Error> {
        let raw = r#"{
            "client_states": [
                {
                    "client_id": "07-tendermint-0",
                    "client_state": {
                        "@type": "/ibc.lightclients.tendermint.v1.ClientState",
                        "chain_id": "onex-1"
                    }
                },
                {
                    "client_id": "07-tendermint-1",
                    "client_state": {
                        "@type": "/ibc.lightclients.tendermint.v1.ClientState",
                        "chain_id": "onex-2"
                    }
                }
            ],
            "pagination": { "next_key": null, "total": "0" }
        }"#;

        assert_eq!(
            parse_client_states(raw)?,
            vec![
                ("07-tendermint-0".to_string(), "onex-1".to_string()),
                ("07-tendermint-1".to_string(), "onex-2".to_string()),
            ]
        );

        assert!(parse_client_states(r#"{"client_states":[{"client_id":"07-tendermint-0"}]}"#).is_err());

        Ok(())
    }

    #[test]
    fn rejects_failed_tx() {
        let failed = json::json!({ "code": 5, "raw_log": "insufficient funds" });
        let ok = json::json!({ "code": 0, "txhash": "AB" });

        assert!(check_tx_code(&failed).is_err());
        assert!(check_tx_code(&ok).is_ok());
    }
}
