/*!
    Helper functions for modifying the Cosmos SDK node config in TOML,
    and the governance parameters of the genesis file in JSON.

    Since we do not need to understand the full structure of the
    CosmosSDK config, we are updating the config as dynamic TOML
    values instead of serializing them into proper types.
*/

use core::time::Duration;
use eyre::{eyre, Report as Error};
use toml::Value;

use crate::chain::descriptor::ConfigFileOverride;

/// Standard CometBFT ports, identical in every container.
pub const RPC_PORT: u16 = 26657;
pub const P2P_PORT: u16 = 26656;
pub const GRPC_PORT: u16 = 9090;

/// Set the `rpc` field in the full node config.
pub fn set_rpc_port(config: &mut Value, port: u16) -> Result<(), Error> {
    config
        .get_mut("rpc")
        .ok_or_else(|| eyre!("expect rpc section"))?
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?
        .insert(
            "laddr".to_string(),
            format!("tcp://0.0.0.0:{}", port).into(),
        );

    Ok(())
}

/// Set the `p2p` field in the full node config.
pub fn set_p2p_port(config: &mut Value, port: u16) -> Result<(), Error> {
    config
        .get_mut("p2p")
        .ok_or_else(|| eyre!("expect p2p section"))?
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?
        .insert(
            "laddr".to_string(),
            format!("tcp://0.0.0.0:{}", port).into(),
        );

    Ok(())
}

/// Set `p2p.persistent_peers` to the comma separated `id@host:port` list.
pub fn set_persistent_peers(config: &mut Value, peers: &[String]) -> Result<(), Error> {
    config
        .get_mut("p2p")
        .ok_or_else(|| eyre!("expect p2p section"))?
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?
        .insert("persistent_peers".to_string(), peers.join(",").into());

    Ok(())
}

/// Nodes of one chain share the docker network, so they may resolve to
/// addresses that CometBFT considers duplicated.
pub fn set_allow_duplicate_ip(config: &mut Value, allow: bool) -> Result<(), Error> {
    config
        .get_mut("p2p")
        .ok_or_else(|| eyre!("expect p2p section"))?
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?
        .insert("allow_duplicate_ip".to_string(), allow.into());

    Ok(())
}

/// Set the `consensus.timeout_commit` field in the full node config.
pub fn set_timeout_commit(config: &mut Value, duration: Duration) -> Result<(), Error> {
    config
        .get_mut("consensus")
        .ok_or_else(|| eyre!("expect consensus section"))?
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?
        .insert(
            "timeout_commit".to_string(),
            format!("{}ms", duration.as_millis()).into(),
        );

    Ok(())
}

/// Set the `log_level` field in the full node config.
pub fn set_log_level(config: &mut Value, log_level: &str) -> Result<(), Error> {
    config
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?
        .insert("log_level".to_string(), log_level.into());

    Ok(())
}

pub fn set_minimum_gas_price(config: &mut Value, price: &str) -> Result<(), Error> {
    config
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?
        .insert("minimum-gas-prices".to_string(), price.into());

    Ok(())
}

pub fn set_grpc_port(config: &mut Value, port: u16) -> Result<(), Error> {
    config
        .get_mut("grpc")
        .ok_or_else(|| eyre!("expect grpc section"))?
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?
        .insert("address".to_string(), format!("0.0.0.0:{}", port).into());

    Ok(())
}

pub fn disable_api(config: &mut Value) -> Result<(), Error> {
    if let Some(field) = config.get_mut("api") {
        field
            .as_table_mut()
            .ok_or_else(|| eyre!("expect object"))?
            .insert("enable".to_string(), false.into());
    }

    Ok(())
}

/**
   Apply a [`ConfigFileOverride`] to an already parsed config file.
   Intermediate tables are created when missing.
*/
pub fn apply_config_override(config: &mut Value, config_override: &ConfigFileOverride) -> Result<(), Error> {
    let segments: Vec<&str> = config_override.key.split('.').collect();

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| eyre!("empty config key"))?;

    let mut table = config
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?;

    for segment in parents {
        table = table
            .entry(segment.to_string())
            .or_insert_with(|| Value::Table(Default::default()))
            .as_table_mut()
            .ok_or_else(|| {
                eyre!(
                    "`{}` in key `{}` is not a table in {}",
                    segment,
                    config_override.key,
                    config_override.file
                )
            })?;
    }

    table.insert(last.to_string(), config_override.value.clone());

    Ok(())
}

pub fn set_max_deposit_period(genesis: &mut serde_json::Value, period: &str) -> Result<(), Error> {
    let deposit_params = genesis
        .get_mut("app_state")
        .and_then(|app_state| app_state.get_mut("gov"))
        .and_then(|gov| gov.get_mut("deposit_params"))
        .and_then(|deposit_params| deposit_params.as_object_mut())
        .ok_or_else(|| eyre!("failed to update max_deposit_period in genesis file"))?;

    deposit_params
        .insert(
            "max_deposit_period".to_owned(),
            serde_json::Value::String(period.to_string()),
        )
        .ok_or_else(|| eyre!("failed to update max_deposit_period in genesis file"))?;

    Ok(())
}

pub fn set_voting_period(genesis: &mut serde_json::Value, period: &str) -> Result<(), Error> {
    let voting_params = genesis
        .get_mut("app_state")
        .and_then(|app_state| app_state.get_mut("gov"))
        .and_then(|gov| gov.get_mut("voting_params"))
        .and_then(|voting_params| voting_params.as_object_mut())
        .ok_or_else(|| eyre!("failed to update voting_period in genesis file"))?;

    voting_params
        .insert(
            "voting_period".to_owned(),
            serde_json::Value::String(period.to_string()),
        )
        .ok_or_else(|| eyre!("failed to update voting_period in genesis file"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
log_level = "info"

[rpc]
laddr = "tcp://127.0.0.1:26657"

[p2p]
laddr = "tcp://0.0.0.0:26656"
persistent_peers = ""
allow_duplicate_ip = false

[consensus]
timeout_commit = "5s"
"#;

    #[test]
    fn updates_node_config() -> Result<(), Error> {
        let mut config: Value = toml::from_str(CONFIG)?;

        set_rpc_port(&mut config, RPC_PORT)?;
        set_timeout_commit(&mut config, Duration::from_secs(2))?;
        set_allow_duplicate_ip(&mut config, true)?;
        set_persistent_peers(
            &mut config,
            &["a@onomy-1-val-1:26656".to_string(), "b@onomy-1-val-2:26656".to_string()],
        )?;

        assert_eq!(config["rpc"]["laddr"].as_str(), Some("tcp://0.0.0.0:26657"));
        assert_eq!(config["consensus"]["timeout_commit"].as_str(), Some("2000ms"));
        assert_eq!(config["p2p"]["allow_duplicate_ip"].as_bool(), Some(true));
        assert_eq!(
            config["p2p"]["persistent_peers"].as_str(),
            Some("a@onomy-1-val-1:26656,b@onomy-1-val-2:26656")
        );

        Ok(())
    }

    #[test]
    fn applies_dotted_overrides() -> Result<(), Error> {
        let mut config: Value = toml::from_str(CONFIG)?;

        apply_config_override(
            &mut config,
            &ConfigFileOverride::new("config.toml", "consensus.timeout_propose", "1s"),
        )?;
        apply_config_override(
            &mut config,
            &ConfigFileOverride::new("config.toml", "instrumentation.prometheus", true),
        )?;

        assert_eq!(config["consensus"]["timeout_propose"].as_str(), Some("1s"));
        assert_eq!(config["instrumentation"]["prometheus"].as_bool(), Some(true));

        let res = apply_config_override(
            &mut config,
            &ConfigFileOverride::new("config.toml", "log_level.verbose", true),
        );
        assert!(res.is_err());

        Ok(())
    }

    #[test]
    fn updates_gov_periods() -> Result<(), Error> {
        let mut genesis = serde_json::json!({
            "app_state": { "gov": {
                "voting_params": { "voting_period": "172800s" },
                "deposit_params": { "max_deposit_period": "172800s" }
            } }
        });

        set_voting_period(&mut genesis, "15s")?;
        set_max_deposit_period(&mut genesis, "10s")?;

        assert_eq!(genesis["app_state"]["gov"]["voting_params"]["voting_period"], "15s");
        assert_eq!(
            genesis["app_state"]["gov"]["deposit_params"]["max_deposit_period"],
            "10s"
        );

        Ok(())
    }
}
