/*!
   Driver for the Hermes relayer.

   Hermes has no notion of named paths, so the paths are tracked here and
   every command is given the chain, client and connection identifiers
   explicitly.
*/

use serde::Serialize;
use serde_json as json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

use crate::chain::cosmos::CosmosChain;
use crate::error::{handle_generic_error, Error};
use crate::relayer::container::{RelayerContainer, RELAYER_CONTAINER_HOME};
use crate::relayer::{ChainRole, ChannelOptions, Relayer, RelayerImpl};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize)]
pub struct HermesConfig {
    pub global: GlobalConfig,
    pub mode: ModeConfig,
    pub rest: ServiceConfig,
    pub telemetry: ServiceConfig,
    pub chains: Vec<HermesChainConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeConfig {
    pub clients: ClientsMode,
    pub connections: EnabledMode,
    pub channels: EnabledMode,
    pub packets: PacketsMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientsMode {
    pub enabled: bool,
    pub refresh: bool,
    pub misbehaviour: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnabledMode {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PacketsMode {
    pub enabled: bool,
    pub clear_interval: u64,
    pub clear_on_start: bool,
    pub tx_confirmation: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSource {
    pub mode: String,
    pub url: String,
    pub batch_delay: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GasPrice {
    pub price: f64,
    pub denom: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrustThreshold {
    pub numerator: String,
    pub denominator: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HermesChainConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub chain_type: String,
    pub rpc_addr: String,
    pub grpc_addr: String,
    pub event_source: EventSource,
    pub rpc_timeout: String,
    pub trusted_node: bool,
    pub account_prefix: String,
    pub key_name: String,
    pub key_store_type: String,
    pub key_store_folder: String,
    pub store_prefix: String,
    pub max_gas: u64,
    pub gas_multiplier: f64,
    pub gas_price: GasPrice,
    pub max_block_time: String,
    pub clock_drift: String,
    pub trusting_period: String,
    pub trust_threshold: TrustThreshold,
    /// Must be set for consumer chains, which have no staking module.
    pub ccv_consumer_chain: bool,
}

impl Default for HermesConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig {
                log_level: "info".to_string(),
            },
            mode: ModeConfig {
                clients: ClientsMode {
                    enabled: true,
                    refresh: true,
                    misbehaviour: false,
                },
                connections: EnabledMode { enabled: false },
                channels: EnabledMode { enabled: false },
                packets: PacketsMode {
                    enabled: true,
                    clear_interval: 100,
                    clear_on_start: true,
                    tx_confirmation: false,
                },
            },
            rest: ServiceConfig {
                enabled: false,
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            telemetry: ServiceConfig {
                enabled: false,
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            chains: Vec::new(),
        }
    }
}

impl HermesChainConfig {
    pub fn new(chain: &CosmosChain, role: ChainRole) -> Result<Self, Error> {
        let node = chain.primary_node()?;
        let (price, denom) = split_gas_price(&chain.config.gas_prices)?;

        Ok(Self {
            id: chain.config.chain_id.clone(),
            chain_type: "CosmosSdk".to_string(),
            rpc_addr: node.rpc_address(),
            grpc_addr: node.grpc_address(),
            event_source: EventSource {
                mode: "push".to_string(),
                url: node.websocket_address(),
                batch_delay: "500ms".to_string(),
            },
            rpc_timeout: "10s".to_string(),
            trusted_node: false,
            account_prefix: chain.config.bech32_prefix.clone(),
            key_name: crate::chain::cosmos::RELAYER_KEY.to_string(),
            key_store_type: "Test".to_string(),
            key_store_folder: format!("{}/keys", RELAYER_CONTAINER_HOME),
            store_prefix: "ibc".to_string(),
            max_gas: 3_000_000,
            gas_multiplier: 1.5_f64.max(chain.config.gas_adjustment),
            gas_price: GasPrice { price, denom },
            max_block_time: "30s".to_string(),
            clock_drift: "5s".to_string(),
            trusting_period: chain.config.trusting_period.clone(),
            trust_threshold: TrustThreshold {
                numerator: "1".to_string(),
                denominator: "3".to_string(),
            },
            ccv_consumer_chain: role == ChainRole::Consumer,
        })
    }
}

/// Split a gas price such as `0.025uatom` into its amount and denomination.
pub fn split_gas_price(gas_prices: &str) -> Result<(f64, String), Error> {
    let split = gas_prices
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(gas_prices.len());

    let (amount, denom) = gas_prices.split_at(split);

    if amount.is_empty() || denom.is_empty() {
        return Err(eyre::eyre!("invalid gas price `{}`", gas_prices).into());
    }

    let price = amount.parse().map_err(handle_generic_error)?;

    Ok((price, denom.to_string()))
}

#[derive(Debug, Clone)]
struct HermesPath {
    src_chain_id: String,
    dst_chain_id: String,
    src_client_id: Option<String>,
    dst_client_id: Option<String>,
    src_connection_id: Option<String>,
}

#[derive(Debug)]
pub struct HermesRelayer {
    container: RelayerContainer,
    config: HermesConfig,
    hd_paths: BTreeMap<String, String>,
    paths: BTreeMap<String, HermesPath>,
}

impl HermesRelayer {
    pub fn new(container: RelayerContainer) -> Self {
        Self {
            container,
            config: HermesConfig::default(),
            hd_paths: BTreeMap::new(),
            paths: BTreeMap::new(),
        }
    }

    fn config_arg(&self) -> String {
        format!("{}/{}", RELAYER_CONTAINER_HOME, CONFIG_FILE)
    }

    fn save_config(&self) -> Result<(), Error> {
        let config_str = toml::to_string_pretty(&self.config).map_err(handle_generic_error)?;

        self.container.write_file(CONFIG_FILE, &config_str)?;

        info!("written hermes config.toml:\n{}", config_str);

        Ok(())
    }

    fn path(&self, path: &str) -> Result<&HermesPath, Error> {
        self.paths
            .get(path)
            .ok_or_else(|| eyre::eyre!("unknown hermes path `{}`", path).into())
    }

    fn exec_json(&self, desc: &str, args: &[&str]) -> Result<json::Value, Error> {
        let config = self.config_arg();

        let mut full_args = vec!["--json", "--config", config.as_str()];
        full_args.extend_from_slice(args);

        let output = self.container.exec(desc, &full_args)?;

        parse_hermes_result(&output.stdout)
    }
}

/**
   Hermes prints one JSON object per line in `--json` mode, the last one
   holding the result of the command.
*/
pub fn parse_hermes_result(stdout: &str) -> Result<json::Value, Error> {
    for line in stdout.lines().rev() {
        if let Ok(value) = json::from_str::<json::Value>(line.trim()) {
            if let Some(result) = value.get("result") {
                if value.get("status").and_then(|s| s.as_str()) == Some("error") {
                    return Err(eyre::eyre!("hermes command failed: {}", result).into());
                }

                return Ok(result.clone());
            }
        }
    }

    Err(eyre::eyre!("no result found in hermes output: {}", stdout).into())
}

impl Relayer for HermesRelayer {
    fn implementation(&self) -> RelayerImpl {
        RelayerImpl::Hermes
    }

    fn config_path(&self) -> PathBuf {
        self.container.home_path.join(CONFIG_FILE)
    }

    fn add_chain(&mut self, chain: &CosmosChain, role: ChainRole) -> Result<(), Error> {
        let chain_config = HermesChainConfig::new(chain, role)?;

        self.config
            .chains
            .retain(|existing| existing.id != chain_config.id);
        self.config.chains.push(chain_config);

        self.hd_paths
            .insert(chain.config.chain_id.clone(), chain.config.hd_path());

        self.save_config()?;

        let wallet = &chain.wallets()?.relayer;
        self.restore_key(&chain.config.chain_id, wallet.key_name(), &wallet.mnemonic)
    }

    fn restore_key(&mut self, chain_id: &str, key_name: &str, mnemonic: &str) -> Result<(), Error> {
        let mnemonic_file = self
            .container
            .write_file(&format!("{}-{}.mnemonic", chain_id, key_name), mnemonic)?;

        let hd_path = self
            .hd_paths
            .get(chain_id)
            .cloned()
            .unwrap_or_else(|| "m/44'/118'/0'/0/0".to_string());

        self.exec_json(
            "restore relayer key",
            &[
                "keys",
                "add",
                "--chain",
                chain_id,
                "--key-name",
                key_name,
                "--mnemonic-file",
                mnemonic_file.as_str(),
                "--hd-path",
                hd_path.as_str(),
                "--overwrite",
            ],
        )?;

        Ok(())
    }

    fn generate_path(
        &mut self,
        src_chain_id: &str,
        dst_chain_id: &str,
        path: &str,
    ) -> Result<(), Error> {
        self.paths.insert(
            path.to_string(),
            HermesPath {
                src_chain_id: src_chain_id.to_string(),
                dst_chain_id: dst_chain_id.to_string(),
                src_client_id: None,
                dst_client_id: None,
                src_connection_id: None,
            },
        );

        Ok(())
    }

    fn update_path_clients(
        &mut self,
        path: &str,
        src_client_id: &str,
        dst_client_id: &str,
    ) -> Result<(), Error> {
        let entry = self
            .paths
            .get_mut(path)
            .ok_or_else(|| eyre::eyre!("unknown hermes path `{}`", path))?;

        entry.src_client_id = Some(src_client_id.to_string());
        entry.dst_client_id = Some(dst_client_id.to_string());

        Ok(())
    }

    fn create_connections(&mut self, path: &str) -> Result<(), Error> {
        let entry = self.path(path)?.clone();

        let (src_client, dst_client) = match (&entry.src_client_id, &entry.dst_client_id) {
            (Some(src), Some(dst)) => (src.clone(), dst.clone()),
            _ => return Err(eyre::eyre!("clients of path `{}` are not set", path).into()),
        };

        let result = self.exec_json(
            "create connection",
            &[
                "create",
                "connection",
                "--a-chain",
                entry.src_chain_id.as_str(),
                "--a-client",
                src_client.as_str(),
                "--b-client",
                dst_client.as_str(),
            ],
        )?;

        let connection_id = result
            .get("a_side")
            .and_then(|side| side.get("connection_id"))
            .and_then(|id| id.as_str())
            .ok_or_else(|| eyre::eyre!("no connection id in hermes result: {}", result))?
            .to_string();

        info!(
            "created connection {} from {} to {} on path {}",
            connection_id, entry.src_chain_id, entry.dst_chain_id, path
        );

        if let Some(entry) = self.paths.get_mut(path) {
            entry.src_connection_id = Some(connection_id);
        }

        Ok(())
    }

    fn create_channel(&mut self, path: &str, options: &ChannelOptions) -> Result<(), Error> {
        let entry = self.path(path)?.clone();

        let connection_id = entry
            .src_connection_id
            .ok_or_else(|| eyre::eyre!("connection of path `{}` is not created", path))?;

        self.exec_json(
            "create channel",
            &[
                "create",
                "channel",
                "--a-chain",
                entry.src_chain_id.as_str(),
                "--a-connection",
                connection_id.as_str(),
                "--a-port",
                options.src_port.as_str(),
                "--b-port",
                options.dst_port.as_str(),
                "--order",
                options.order.as_str(),
                "--channel-version",
                options.version.as_str(),
            ],
        )?;

        info!(
            "created {} channel {} -> {} on path {}",
            options.order.as_str(),
            options.src_port,
            options.dst_port,
            path
        );

        Ok(())
    }

    fn start_relayer(&mut self, paths: &[&str]) -> Result<(), Error> {
        for path in paths {
            self.path(path)?;
        }

        let config = self.config_arg();
        self.container.spawn(&["--config", config.as_str(), "start"])
    }

    fn stop_relayer(&mut self) -> Result<(), Error> {
        self.container.kill()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_gas_prices() -> Result<(), Error> {
        assert_eq!(split_gas_price("0anom")?, (0.0, "anom".to_string()));
        assert_eq!(split_gas_price("0.025uatom")?, (0.025, "uatom".to_string()));
        assert!(split_gas_price("anom").is_err());
        assert!(split_gas_price("100").is_err());

        Ok(())
    }

    #[test]
    fn parses_last_result_line() -> Result<(), Error> {
        let stdout = concat!(
            r#"{"timestamp":"t","level":"INFO","fields":{"message":"creating connection"}}"#,
            "\n",
            r#"{"result":{"a_side":{"connection_id":"connection-0"}},"status":"success"}"#,
        );

        let result = parse_hermes_result(stdout)?;
        assert_eq!(result["a_side"]["connection_id"], "connection-0");

        let failed = r#"{"result":"client not found","status":"error"}"#;
        assert!(parse_hermes_result(failed).is_err());

        Ok(())
    }

    #[test]
    fn serializes_config() -> Result<(), Error> {
        let config = HermesConfig::default();
        let config_str = toml::to_string_pretty(&config).map_err(handle_generic_error)?;

        assert!(config_str.contains("[mode.packets]"));
        assert!(config_str.contains("clear_interval = 100"));

        Ok(())
    }
}
