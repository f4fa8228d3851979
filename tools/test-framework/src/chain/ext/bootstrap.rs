use eyre::eyre;
use serde_json as json;
use tracing::debug;

use crate::chain::cli::bootstrap::{
    add_genesis_account, add_genesis_validator, add_wallet, collect_gen_txs, initialize,
    restore_wallet, show_node_id,
};
use crate::chain::driver::ChainDriver;
use crate::error::{handle_generic_error, Error};
use crate::types::token::Token;
use crate::types::wallet::{Wallet, WalletAddress, WalletId};

/**
   Methods used while bootstrapping a chain node. Files are read and
   written from inside the node image, as the node home is owned by the
   user of the image rather than the user running the tests.
*/
pub trait ChainBootstrapMethodsExt {
    /**
       Read the content at a file path relative to the chain home
       directory, and return the result as a string.

       This is not efficient but is sufficient for testing purposes.
    */
    fn read_file(&self, file_path: &str) -> Result<String, Error>;

    /**
       Write the string content to a file path relative to the chain home
       directory.

       This is not efficient but is sufficient for testing purposes.
    */
    fn write_file(&self, file_path: &str, content: &str) -> Result<(), Error>;

    /// Names of the files in a directory relative to the chain home.
    fn list_files(&self, dir_path: &str) -> Result<Vec<String>, Error>;

    /**
       Modify the node config which is saved in toml format.
    */
    fn update_chain_config(
        &self,
        file: &str,
        cont: impl FnOnce(&mut toml::Value) -> Result<(), Error>,
    ) -> Result<(), Error>;

    /**
       Initialized the chain data stores.
    */
    fn initialize(&self) -> Result<(), Error>;

    /**
       Modify the genesis file.
    */
    fn update_genesis_file(
        &self,
        file: &str,
        cont: impl FnOnce(&mut serde_json::Value) -> Result<(), Error>,
    ) -> Result<(), Error>;

    /**
       Add a wallet with the given ID to the node's keyring.
    */
    fn add_wallet(&self, wallet_id: &str) -> Result<Wallet, Error>;

    /**
       Restore an existing wallet into the node's keyring.
    */
    fn restore_wallet(&self, wallet: &Wallet) -> Result<(), Error>;

    /**
       Add a wallet address to the genesis account list for an uninitialized
       node.
    */
    fn add_genesis_account(&self, wallet: &WalletAddress, amounts: &[&Token]) -> Result<(), Error>;

    /**
       Add a wallet ID with the given stake amount to be the genesis validator
       for an uninitialized chain.
    */
    fn add_genesis_validator(&self, wallet_id: &WalletId, token: &Token) -> Result<(), Error>;

    /**
       Call `collect-gentxs` to generate the genesis transactions.
    */
    fn collect_gen_txs(&self) -> Result<(), Error>;

    /// The node ID used by peers to connect to this node.
    fn node_id(&self) -> Result<String, Error>;
}

impl ChainBootstrapMethodsExt for ChainDriver {
    fn read_file(&self, file_path: &str) -> Result<String, Error> {
        let full_path = format!("{}/{}", self.container_home, file_path);

        let output = self.exec_program("read file", "cat", &[full_path.as_str()])?;

        Ok(output.stdout)
    }

    fn write_file(&self, file_path: &str, content: &str) -> Result<(), Error> {
        let full_path = format!("{}/{}", self.container_home, file_path);

        self.write_home_file(&full_path, content)?;

        debug!("created new file {:?} in {}", full_path, self.container_name);

        Ok(())
    }

    fn list_files(&self, dir_path: &str) -> Result<Vec<String>, Error> {
        let full_path = format!("{}/{}", self.container_home, dir_path);

        let output = self.exec_program("list files", "ls", &["-1", full_path.as_str()])?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    fn update_chain_config(
        &self,
        file: &str,
        cont: impl FnOnce(&mut toml::Value) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let config_path = format!("config/{}", file);

        let config1 = self.read_file(&config_path)?;

        let mut config2 = toml::from_str(&config1).map_err(handle_generic_error)?;

        cont(&mut config2)?;

        let config3 = toml::to_string_pretty(&config2).map_err(handle_generic_error)?;

        self.write_file(&config_path, &config3)?;

        Ok(())
    }

    fn initialize(&self) -> Result<(), Error> {
        initialize(self)
    }

    fn update_genesis_file(
        &self,
        file: &str,
        cont: impl FnOnce(&mut serde_json::Value) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let genesis_path = format!("config/{}", file);

        let config1 = self.read_file(&genesis_path)?;

        let mut config2 = serde_json::from_str(&config1).map_err(handle_generic_error)?;

        cont(&mut config2)?;

        let config3 = serde_json::to_string_pretty(&config2).map_err(handle_generic_error)?;

        self.write_file(&genesis_path, &config3)?;

        Ok(())
    }

    fn add_wallet(&self, wallet_id: &str) -> Result<Wallet, Error> {
        let seed_content = add_wallet(self, wallet_id)?;

        let json_val: json::Value = json::from_str(&seed_content).map_err(handle_generic_error)?;

        let wallet_address = json_val
            .get("address")
            .ok_or_else(|| eyre!("expect address string field to be present in json result"))?
            .as_str()
            .ok_or_else(|| eyre!("expect address string field to be present in json result"))?
            .to_string();

        let mnemonic = json_val
            .get("mnemonic")
            .and_then(|mnemonic| mnemonic.as_str())
            .ok_or_else(|| eyre!("expect mnemonic string field to be present in json result"))?
            .to_string();

        let seed_path = format!("{}-seed.json", wallet_id);
        self.write_file(&seed_path, &seed_content)?;

        Ok(Wallet::new(wallet_id.to_string(), wallet_address, mnemonic))
    }

    fn restore_wallet(&self, wallet: &Wallet) -> Result<(), Error> {
        restore_wallet(self, wallet.key_name(), &wallet.mnemonic)
    }

    fn add_genesis_account(&self, wallet: &WalletAddress, amounts: &[&Token]) -> Result<(), Error> {
        let amounts_str = amounts.iter().map(|t| t.to_string()).collect::<Vec<_>>();

        add_genesis_account(self, &wallet.0, &amounts_str)
    }

    fn add_genesis_validator(&self, wallet_id: &WalletId, token: &Token) -> Result<(), Error> {
        add_genesis_validator(self, &wallet_id.0, &token.to_string())
    }

    fn collect_gen_txs(&self) -> Result<(), Error> {
        collect_gen_txs(self)
    }

    fn node_id(&self) -> Result<String, Error> {
        show_node_id(self)
    }
}
