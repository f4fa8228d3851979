/*!
   Driver for the Go relayer `rly`.

   Chains are registered under their chain id, so the chain ids passed to
   [`Relayer`] methods double as `rly` chain names.
*/

use serde_json as json;
use std::path::PathBuf;
use tracing::info;

use crate::chain::cosmos::{CosmosChain, RELAYER_KEY};
use crate::error::{handle_generic_error, Error};
use crate::relayer::container::{RelayerContainer, RELAYER_CONTAINER_HOME};
use crate::relayer::{ChainRole, ChannelOptions, Relayer, RelayerImpl};

#[derive(Debug)]
pub struct CosmosRelayer {
    container: RelayerContainer,
}

impl CosmosRelayer {
    /// Wrap a started relayer container and initialize the `rly` config.
    pub fn new(container: RelayerContainer) -> Result<Self, Error> {
        let relayer = Self { container };

        relayer.exec("initialize relayer config", &["config", "init"])?;

        Ok(relayer)
    }

    fn exec(&self, desc: &str, args: &[&str]) -> Result<(), Error> {
        let mut full_args = args.to_vec();
        full_args.extend_from_slice(&["--home", RELAYER_CONTAINER_HOME]);

        self.container.exec(desc, &full_args)?;

        Ok(())
    }
}

/// The chain description that `rly chains add --file` accepts.
pub fn rly_chain_config(chain: &CosmosChain) -> Result<json::Value, Error> {
    let node = chain.primary_node()?;

    Ok(json::json!({
        "type": "cosmos",
        "value": {
            "key": RELAYER_KEY,
            "chain-id": chain.config.chain_id,
            "rpc-addr": node.rpc_address(),
            "account-prefix": chain.config.bech32_prefix,
            "keyring-backend": "test",
            "gas-adjustment": chain.config.gas_adjustment,
            "gas-prices": chain.config.gas_prices,
            "min-gas-amount": 0,
            "debug": true,
            "timeout": "20s",
            "output-format": "json",
            "sign-mode": "direct",
            "trusting-period": chain.config.trusting_period,
        }
    }))
}

impl Relayer for CosmosRelayer {
    fn implementation(&self) -> RelayerImpl {
        RelayerImpl::CosmosRly
    }

    fn config_path(&self) -> PathBuf {
        self.container.home_path.join("config").join("config.yaml")
    }

    fn add_chain(&mut self, chain: &CosmosChain, _role: ChainRole) -> Result<(), Error> {
        let chain_id = chain.config.chain_id.as_str();

        let config = rly_chain_config(chain)?;
        let config_file = self.container.write_file(
            &format!("chains/{}.json", chain_id),
            &json::to_string_pretty(&config).map_err(handle_generic_error)?,
        )?;

        self.exec(
            "add chain to relayer",
            &["chains", "add", "--file", config_file.as_str(), chain_id],
        )?;

        info!("added chain {} to rly", chain_id);

        let wallet = &chain.wallets()?.relayer;
        self.restore_key(chain_id, wallet.key_name(), &wallet.mnemonic)
    }

    fn restore_key(&mut self, chain_id: &str, key_name: &str, mnemonic: &str) -> Result<(), Error> {
        self.exec(
            "restore relayer key",
            &["keys", "restore", chain_id, key_name, mnemonic],
        )
    }

    fn generate_path(
        &mut self,
        src_chain_id: &str,
        dst_chain_id: &str,
        path: &str,
    ) -> Result<(), Error> {
        self.exec(
            "generate relayer path",
            &["paths", "new", src_chain_id, dst_chain_id, path],
        )
    }

    fn update_path_clients(
        &mut self,
        path: &str,
        src_client_id: &str,
        dst_client_id: &str,
    ) -> Result<(), Error> {
        self.exec(
            "update path clients",
            &[
                "paths",
                "update",
                path,
                "--src-client-id",
                src_client_id,
                "--dst-client-id",
                dst_client_id,
            ],
        )
    }

    fn create_connections(&mut self, path: &str) -> Result<(), Error> {
        self.exec("create connection", &["tx", "connection", path])?;

        info!("created connection on path {}", path);

        Ok(())
    }

    fn create_channel(&mut self, path: &str, options: &ChannelOptions) -> Result<(), Error> {
        self.exec(
            "create channel",
            &[
                "tx",
                "channel",
                path,
                "--src-port",
                options.src_port.as_str(),
                "--dst-port",
                options.dst_port.as_str(),
                "--order",
                options.order.as_str(),
                "--version",
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
        let mut args = vec!["start"];
        args.extend_from_slice(paths);
        args.extend_from_slice(&["--home", RELAYER_CONTAINER_HOME, "--debug"]);

        self.container.spawn(&args)
    }

    fn stop_relayer(&mut self) -> Result<(), Error> {
        self.container.kill()
    }
}
