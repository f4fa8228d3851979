/*!
   A Cosmos SDK chain made of validator and full node containers.
*/

use eyre::eyre;
use std::path::Path;
use tracing::info;

use crate::chain::cli::proposal::{submit_software_upgrade, vote_proposal};
use crate::chain::cli::query::{
    query_balances, query_client_states, query_height, query_proposal,
};
use crate::chain::cli::transfer::local_transfer_token;
use crate::chain::descriptor::ChainConfig;
use crate::chain::driver::ChainDriver;
use crate::chain::encoding::{EncodingConfig, SOFTWARE_UPGRADE_PROPOSAL_URL};
use crate::chain::ext::bootstrap::ChainBootstrapMethodsExt;
use crate::chain::handle::ChainHandle;
use crate::docker::Docker;
use crate::error::Error;
use crate::types::env::{prefix_writer, EnvWriter, ExportEnv};
use crate::types::proposal::{ProposalId, ProposalStatus, SoftwareUpgradeProposal, VoteOption};
use crate::types::token::Token;
use crate::types::wallet::{ChainWallets, Wallet};
use crate::util::cancel::CancelToken;

/// Key name of the validator account in every validator keyring.
pub const VALIDATOR_KEY: &str = "validator";
pub const FAUCET_KEY: &str = "faucet";
pub const RELAYER_KEY: &str = "relayer";

#[derive(Debug)]
pub struct CosmosChain {
    pub config: ChainConfig,

    /// Built from [`ChainConfig::encoding`] when the chain is created.
    pub encoding: EncodingConfig,

    pub validators: Vec<ChainDriver>,

    pub full_nodes: Vec<ChainDriver>,

    /// Available once the chain genesis has been created.
    pub wallets: Option<ChainWallets>,

    /// Docker network the nodes were last started on.
    pub network: Option<String>,
}

impl CosmosChain {
    pub fn new(
        config: ChainConfig,
        num_validators: usize,
        num_full_nodes: usize,
        test_name: &str,
        chain_store_dir: &Path,
        docker: &Docker,
        cancel: &CancelToken,
    ) -> Result<Self, Error> {
        config.validate()?;

        if num_validators == 0 {
            return Err(Error::invalid_chain_config(
                config.name.clone(),
                "at least one validator is required".into(),
            ));
        }

        let encoding = (config.encoding)()?;

        let validators = (0..num_validators)
            .map(|i| {
                ChainDriver::create(
                    &config,
                    &format!("val-{i}"),
                    test_name,
                    chain_store_dir,
                    docker,
                    cancel,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let full_nodes = (0..num_full_nodes)
            .map(|i| {
                ChainDriver::create(
                    &config,
                    &format!("fn-{i}"),
                    test_name,
                    chain_store_dir,
                    docker,
                    cancel,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            encoding,
            validators,
            full_nodes,
            wallets: None,
            network: None,
        })
    }

    /// The first validator, used to run queries and transactions.
    pub fn primary_node(&self) -> Result<&ChainDriver, Error> {
        self.validators
            .first()
            .ok_or_else(|| eyre!("chain {} has no validator", self.config.chain_id).into())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ChainDriver> {
        self.validators.iter().chain(self.full_nodes.iter())
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut ChainDriver> {
        self.validators.iter_mut().chain(self.full_nodes.iter_mut())
    }

    pub fn wallets(&self) -> Result<&ChainWallets, Error> {
        self.wallets.as_ref().ok_or_else(|| {
            eyre!("wallets of chain {} are not created yet", self.config.chain_id).into()
        })
    }

    /// Start every node container on the given docker network.
    pub fn start_all(&mut self, network: &str) -> Result<(), Error> {
        for node in self.nodes_mut() {
            node.start(network)?;
        }

        self.network = Some(network.to_string());

        Ok(())
    }

    /// Start the nodes again on the network they were last started on.
    pub fn restart_all(&mut self) -> Result<(), Error> {
        let network = self
            .network
            .clone()
            .ok_or_else(|| eyre!("chain {} was never started", self.config.chain_id))?;

        self.start_all(&network)
    }

    /// Stop every node container, keeping the node homes.
    pub fn stop_all(&mut self) -> Result<(), Error> {
        for node in self.nodes_mut() {
            node.stop()?;
        }

        Ok(())
    }

    /// Switch every node to another version of the chain image.
    pub fn set_image_version(&mut self, version: &str) {
        for node in self.nodes_mut() {
            node.set_image_version(version);
        }

        if let Some(image) = self.config.images.first_mut() {
            *image = image.with_version(version);
        }
    }
}

impl ChainHandle for CosmosChain {
    fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn height(&self) -> Result<u64, Error> {
        query_height(self.primary_node()?)
    }

    fn client_id_for_chain(&self, counterparty_chain_id: &str) -> Result<String, Error> {
        query_client_states(self.primary_node()?)?
            .into_iter()
            .find(|(_, chain_id)| chain_id == counterparty_chain_id)
            .map(|(client_id, _)| client_id)
            .ok_or_else(|| {
                eyre!(
                    "chain {} hosts no client of chain {}",
                    self.config.chain_id,
                    counterparty_chain_id
                )
                .into()
            })
    }

    fn all_balances(&self, address: &str) -> Result<Vec<Token>, Error> {
        query_balances(self.primary_node()?, address)
    }

    fn create_key(&self, key_name: &str) -> Result<Wallet, Error> {
        self.primary_node()?.add_wallet(key_name)
    }

    fn faucet(&self) -> Result<&Wallet, Error> {
        Ok(&self.wallets()?.faucet)
    }

    fn send_funds(&self, from_key: &str, to_address: &str, token: &Token) -> Result<(), Error> {
        local_transfer_token(
            self.primary_node()?,
            from_key,
            to_address,
            &token.to_string(),
        )
    }

    fn submit_upgrade_proposal(
        &self,
        key_name: &str,
        proposal: &SoftwareUpgradeProposal,
    ) -> Result<ProposalId, Error> {
        self.encoding.require(SOFTWARE_UPGRADE_PROPOSAL_URL)?;

        let proposal_id = submit_software_upgrade(self.primary_node()?, key_name, proposal)?;

        info!(
            "submitted upgrade proposal {} on {} with halt height {}",
            proposal_id, self.config.chain_id, proposal.height
        );

        Ok(proposal_id)
    }

    fn vote_on_proposal_all_validators(
        &self,
        proposal_id: &ProposalId,
        option: VoteOption,
    ) -> Result<(), Error> {
        for validator in &self.validators {
            vote_proposal(validator, VALIDATOR_KEY, proposal_id, option)?;
        }

        Ok(())
    }

    fn proposal_status(&self, proposal_id: &ProposalId) -> Result<ProposalStatus, Error> {
        let proposal = query_proposal(self.primary_node()?, proposal_id.as_str())?;

        if let Some(content) = proposal.get("content") {
            self.encoding.unpack_any(content)?;
        }

        proposal
            .get("status")
            .and_then(|status| status.as_str())
            .ok_or_else(|| eyre!("expected status field in proposal {}", proposal_id))?
            .parse()
    }
}

impl ExportEnv for CosmosChain {
    fn export_env(&self, writer: &mut impl EnvWriter) {
        writer.write_env("CHAIN_ID", &self.config.chain_id);
        writer.write_env("DENOM", &self.config.denom);

        for node in self.nodes() {
            node.export_env(&mut prefix_writer(
                &node.node_name.to_uppercase().replace('-', "_"),
                writer,
            ));
        }

        if let Some(wallets) = &self.wallets {
            wallets.export_env(&mut prefix_writer("WALLETS", writer));
        }
    }
}
