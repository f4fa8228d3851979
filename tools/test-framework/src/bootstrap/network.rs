/*!
   Assembly of an interchain network: a provider chain, its consumer
   chains and the relayer linking them, all attached to one Docker network
   that is private to the test.

   A network is described with the [`Interchain`] builder and brought up
   with [`Interchain::build`], which returns an [`InterchainNetwork`] that
   tears everything down again when dropped.
*/

use core::time::Duration;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::bootstrap::consumer::bootstrap_consumer_chain;
use crate::bootstrap::single::bootstrap_single_chain;
use crate::chain::cosmos::CosmosChain;
use crate::docker::network::DockerNetwork;
use crate::docker::Docker;
use crate::error::Error;
use crate::relayer::{link_consumer, ChainRole, Relayer};
use crate::types::config::TestConfig;
use crate::types::env::{prefix_writer, write_env, EnvWriter, ExportEnv};
use crate::types::link::ProviderConsumerLink;
use crate::util::cancel::CancelToken;
use crate::util::random::{random_string, sanitize_name};

/// Name of the file in the chain store directory receiving the exported envs.
pub const ENV_FILE: &str = "interchain.env";

/**
   Create the Docker client, the test network and the cancellation token
   shared by every step of building a network for `test_name`.

   The network name doubles as the run id that labels every container of
   the test, so that containers left behind by an aborted build are found
   when the network is removed.
*/
pub fn docker_setup(
    test_config: &TestConfig,
    test_name: &str,
) -> Result<(Docker, DockerNetwork, CancelToken), Error> {
    let network_name = format!("ics-{}-{}", sanitize_name(test_name), random_string(6));

    let docker = Docker::connect(&network_name, test_config.keep_containers)?;
    let cancel = CancelToken::new();

    let network = DockerNetwork::create(&docker, &network_name, &cancel)?;

    info!("created docker network {} for test {}", network.name, test_name);

    Ok((docker, network, cancel))
}

/**
   Options for [`Interchain::build`].

   The Docker network is moved into the built [`InterchainNetwork`], so
   that it is removed only after every container attached to it.
*/
pub struct InterchainBuildOptions {
    pub test_name: String,

    pub test_config: TestConfig,

    pub network: DockerNetwork,

    pub cancel: CancelToken,

    /// Register the relayer paths without creating connections and channels.
    pub skip_path_creation: bool,

    /// Cancel the build if it takes longer than this.
    pub build_timeout: Option<Duration>,
}

impl InterchainBuildOptions {
    pub fn new(
        test_name: &str,
        test_config: &TestConfig,
        network: DockerNetwork,
        cancel: &CancelToken,
    ) -> Self {
        Self {
            test_name: test_name.to_string(),
            test_config: test_config.clone(),
            network,
            cancel: cancel.clone(),
            skip_path_creation: false,
            build_timeout: test_config.build_timeout,
        }
    }

    pub fn skip_path_creation(mut self, skip: bool) -> Self {
        self.skip_path_creation = skip;
        self
    }
}

/**
   Builder for an interchain network. Chains are referred to by their
   chain id in links.
*/
#[derive(Default)]
pub struct Interchain {
    chains: Vec<CosmosChain>,
    relayer: Option<(String, Box<dyn Relayer>)>,
    links: Vec<ProviderConsumerLink>,
}

impl Interchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_chain(mut self, chain: CosmosChain) -> Self {
        self.chains.push(chain);
        self
    }

    pub fn add_relayer(mut self, name: &str, relayer: Box<dyn Relayer>) -> Self {
        self.relayer = Some((name.to_string(), relayer));
        self
    }

    pub fn add_provider_consumer_link(mut self, link: ProviderConsumerLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        let chain_ids = self
            .chains
            .iter()
            .map(|chain| chain.config.chain_id.as_str())
            .collect::<Vec<_>>();

        validate_topology(&chain_ids, &self.links, self.relayer.is_some())
    }

    /**
       Bring up the network: bootstrap and start the provider chain, then
       every consumer chain in link order, register all chains with the
       relayer and create one path per link.

       On failure, everything started so far is torn down and the error
       is returned; a partially built network is never handed out.
    */
    pub fn build(self, options: InterchainBuildOptions) -> Result<InterchainNetwork, Error> {
        self.validate()?;

        let _timer = options
            .build_timeout
            .map(|timeout| options.cancel.cancel_after(timeout));

        let Interchain {
            mut chains,
            relayer,
            links,
        } = self;

        let network_name = options.network.name.clone();
        let test_config = &options.test_config;

        let provider_id = match links.first() {
            Some(link) => link.provider.clone(),
            None => chains
                .first()
                .map(|chain| chain.config.chain_id.clone())
                .ok_or_else(|| Error::invalid_network("no chain has been added".into()))?,
        };

        let mut provider = take_chain(&mut chains, &provider_id)?;

        info!("bootstrapping provider chain {}", provider_id);

        bootstrap_single_chain(&mut provider, &network_name, test_config)?;

        let mut built = vec![provider];

        for link in &links {
            let mut consumer = take_chain(&mut chains, &link.consumer)?;

            info!(
                "bootstrapping consumer chain {} of {}",
                link.consumer, link.provider
            );

            bootstrap_consumer_chain(&built[0], &mut consumer, &network_name, test_config)?;

            built.push(consumer);
        }

        let (relayer_name, mut relayer) = match relayer {
            Some((name, relayer)) => (Some(name), Some(relayer)),
            None => (None, None),
        };

        if let Some(relayer) = relayer.as_mut() {
            relayer.add_chain(&built[0], ChainRole::Provider)?;

            for (link, consumer) in links.iter().zip(&built[1..]) {
                relayer.add_chain(consumer, ChainRole::Consumer)?;
                relayer.generate_path(&link.consumer, &link.provider, &link.path)?;

                if options.skip_path_creation {
                    info!("skipping creation of path {}", link.path);
                } else {
                    link_consumer(&mut **relayer, &built[0], link, test_config.poll_interval)?;
                    info!(
                        "linked consumer {} to provider {} on path {}",
                        link.consumer, link.provider, link.path
                    );
                }
            }
        }

        let interchain = InterchainNetwork {
            chains: built,
            relayer,
            relayer_name,
            links,
            env_path: test_config.chain_store_dir.join(ENV_FILE),
            network: options.network,
        };

        write_env(&interchain.env_path, &interchain)?;

        info!(
            "interchain network for {} is ready, environment exported to {}",
            options.test_name,
            interchain.env_path.display()
        );

        Ok(interchain)
    }
}

fn take_chain(chains: &mut Vec<CosmosChain>, chain_id: &str) -> Result<CosmosChain, Error> {
    let position = chains
        .iter()
        .position(|chain| chain.config.chain_id == chain_id)
        .ok_or_else(|| Error::unknown_chain(chain_id.to_string()))?;

    Ok(chains.remove(position))
}

/**
   Check the shape of a network before anything is started:

   - chain ids are unique, and links only refer to added chains;
   - a network without links holds exactly one chain;
   - all links share one provider that is not itself a consumer;
   - every other chain is the consumer of exactly one link;
   - path names are unique, and a relayer is present to create them.
*/
pub fn validate_topology(
    chain_ids: &[&str],
    links: &[ProviderConsumerLink],
    has_relayer: bool,
) -> Result<(), Error> {
    let mut known = HashSet::new();
    for chain_id in chain_ids {
        if !known.insert(*chain_id) {
            return Err(Error::duplicate_chain_id(chain_id.to_string()));
        }
    }

    let first = match links.first() {
        Some(link) => link,
        None => {
            return match chain_ids.len() {
                1 => Ok(()),
                0 => Err(Error::invalid_network("no chain has been added".into())),
                n => Err(Error::invalid_network(format!(
                    "{} chains were added without any provider-consumer link",
                    n
                ))),
            };
        }
    };

    if !has_relayer {
        return Err(Error::relayer_not_configured());
    }

    let mut consumers = HashSet::new();
    let mut paths = HashSet::new();

    for link in links {
        for chain_id in [&link.provider, &link.consumer] {
            if !known.contains(chain_id.as_str()) {
                return Err(Error::unknown_chain(chain_id.clone()));
            }
        }

        if link.provider != first.provider {
            return Err(Error::invalid_network(format!(
                "links have more than one provider: {} and {}",
                first.provider, link.provider
            )));
        }

        if link.consumer == link.provider {
            return Err(Error::invalid_network(format!(
                "chain {} is linked to itself",
                link.consumer
            )));
        }

        if !consumers.insert(link.consumer.as_str()) {
            return Err(Error::invalid_network(format!(
                "consumer {} has more than one link to the provider",
                link.consumer
            )));
        }

        if !paths.insert(link.path.as_str()) {
            return Err(Error::duplicate_path_name(link.path.clone()));
        }
    }

    for chain_id in chain_ids {
        if *chain_id != first.provider && !consumers.contains(chain_id) {
            return Err(Error::invalid_network(format!(
                "chain {} is neither the provider nor linked as a consumer",
                chain_id
            )));
        }
    }

    Ok(())
}

/**
   A running interchain network. The provider chain is always the first
   chain, followed by the consumers in link order.

   Dropping the network stops the relayer loop, saves the node logs next
   to the node homes and removes every container and the Docker network,
   unless containers are kept for debugging.
*/
pub struct InterchainNetwork {
    pub chains: Vec<CosmosChain>,

    relayer: Option<Box<dyn Relayer>>,

    pub relayer_name: Option<String>,

    pub links: Vec<ProviderConsumerLink>,

    /// The `.env` file the network was exported to.
    pub env_path: PathBuf,

    // dropped last, after every container attached to it
    network: DockerNetwork,
}

impl InterchainNetwork {
    pub fn provider(&self) -> &CosmosChain {
        &self.chains[0]
    }

    pub fn provider_mut(&mut self) -> &mut CosmosChain {
        &mut self.chains[0]
    }

    pub fn consumers(&self) -> &[CosmosChain] {
        &self.chains[1..]
    }

    pub fn chain(&self, chain_id: &str) -> Result<&CosmosChain, Error> {
        self.chains
            .iter()
            .find(|chain| chain.config.chain_id == chain_id)
            .ok_or_else(|| Error::unknown_chain(chain_id.to_string()))
    }

    pub fn chain_mut(&mut self, chain_id: &str) -> Result<&mut CosmosChain, Error> {
        self.chains
            .iter_mut()
            .find(|chain| chain.config.chain_id == chain_id)
            .ok_or_else(|| Error::unknown_chain(chain_id.to_string()))
    }

    pub fn relayer_mut(&mut self) -> Result<&mut (dyn Relayer + 'static), Error> {
        self.relayer
            .as_deref_mut()
            .ok_or_else(Error::relayer_not_configured)
    }

    pub fn network_name(&self) -> &str {
        &self.network.name
    }

    /// Path names of all links, in link order.
    pub fn path_names(&self) -> Vec<&str> {
        self.links.iter().map(|link| link.path.as_str()).collect()
    }
}

impl ExportEnv for InterchainNetwork {
    fn export_env(&self, writer: &mut impl EnvWriter) {
        writer.write_env("NETWORK", &self.network.name);

        for chain in &self.chains {
            let prefix = chain.config.chain_id.to_uppercase().replace('-', "_");
            chain.export_env(&mut prefix_writer(&prefix, writer));
        }

        if let (Some(name), Some(relayer)) = (&self.relayer_name, &self.relayer) {
            writer.write_env("RELAYER_NAME", name);
            writer.write_env("RELAYER_IMPL", relayer.implementation().as_str());
            writer.write_env(
                "RELAYER_CONFIG",
                &relayer.config_path().display().to_string(),
            );
        }

        for (i, link) in self.links.iter().enumerate() {
            link.export_env(&mut prefix_writer(&format!("LINK_{}", i), writer));
        }
    }
}

impl Drop for InterchainNetwork {
    fn drop(&mut self) {
        if let Some(relayer) = self.relayer.as_mut() {
            if let Err(e) = relayer.stop_relayer() {
                warn!("failed to stop relayer: {}", e);
            }
        }

        if self.network.is_kept() {
            return;
        }

        for chain in self.chains.iter_mut().rev() {
            if let Err(e) = chain.stop_all() {
                warn!("failed to stop chain {}: {}", chain.config.chain_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::presets::onomy_config;
    use crate::error::ErrorDetail;
    use crate::relayer::RelayerImpl;

    fn unit_test_config(chain_store_dir: PathBuf) -> TestConfig {
        TestConfig {
            chain_store_dir,
            relayer: RelayerImpl::CosmosRly,
            relayer_image: RelayerImpl::CosmosRly.default_image(),
            hang_on_fail: false,
            keep_containers: true,
            upgrade_version: None,
            block_wait_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
            build_timeout: None,
        }
    }

    fn link(provider: &str, consumer: &str, path: &str) -> ProviderConsumerLink {
        ProviderConsumerLink::new(provider, consumer, path)
    }

    #[test]
    fn single_chain_needs_no_link() -> Result<(), Error> {
        validate_topology(&["onomy-1"], &[], false)?;

        assert!(validate_topology(&[], &[], false).is_err());
        assert!(validate_topology(&["onomy-1", "onex-1"], &[], true).is_err());

        Ok(())
    }

    #[test]
    fn links_need_a_relayer() {
        let links = [link("onomy-1", "onex-1", "ics-path")];

        let message = validate_topology(&["onomy-1", "onex-1"], &links, false)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();

        assert!(message.contains("no relayer"), "{message}");
    }

    #[test]
    fn path_names_must_be_unique() -> Result<(), Error> {
        let chains = ["onomy-1", "onex-1", "onex-2"];

        let links = [
            link("onomy-1", "onex-1", "ics-path"),
            link("onomy-1", "onex-2", "ics-path"),
        ];
        let message = validate_topology(&chains, &links, true)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(message.contains("ics-path"), "{message}");

        let links = [
            link("onomy-1", "onex-1", "ics-path"),
            link("onomy-1", "onex-2", "ics-path-2"),
        ];
        validate_topology(&chains, &links, true)
    }

    #[test]
    fn exactly_one_provider() {
        let chains = ["onomy-1", "onex-1", "onex-2"];

        let links = [
            link("onomy-1", "onex-1", "ics-path"),
            link("onex-1", "onex-2", "ics-path-2"),
        ];
        assert!(validate_topology(&chains, &links, true).is_err());

        let links = [link("onomy-1", "onomy-1", "ics-path")];
        assert!(validate_topology(&["onomy-1"], &links, true).is_err());
    }

    #[test]
    fn every_consumer_has_one_link() {
        let chains = ["onomy-1", "onex-1", "onex-2"];

        let links = [link("onomy-1", "onex-1", "ics-path")];
        assert!(validate_topology(&chains, &links, true).is_err());

        let links = [
            link("onomy-1", "onex-1", "ics-path"),
            link("onomy-1", "onex-1", "ics-path-2"),
        ];
        assert!(validate_topology(&chains, &links, true).is_err());
    }

    #[test]
    fn links_refer_to_added_chains() {
        let links = [link("onomy-1", "onex-9", "ics-path")];

        let message = validate_topology(&["onomy-1", "onex-1"], &links, true)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();

        assert!(message.contains("onex-9"), "{message}");
    }

    #[test]
    fn duplicate_chain_ids_are_rejected() {
        assert!(validate_topology(&["onomy-1", "onomy-1"], &[], false).is_err());
    }

    #[test]
    fn expired_build_timeout_cancels_the_build() -> Result<(), Error> {
        let store_dir = std::env::temp_dir().join(format!("ics-unit-{}", random_string(6)));
        let test_config = unit_test_config(store_dir.clone());

        let docker = Docker::connect("ics-unit-timeout", true)?;
        let cancel = CancelToken::new();

        let chain = CosmosChain::new(onomy_config(), 1, 0, "unit", &store_dir, &docker, &cancel)?;

        let mut options = InterchainBuildOptions::new(
            "unit",
            &test_config,
            DockerNetwork::existing(&docker, "ics-unit-timeout"),
            &cancel,
        );
        options.build_timeout = Some(Duration::ZERO);

        let result = Interchain::new().add_chain(chain).build(options);

        let _ = std::fs::remove_dir_all(&store_dir);

        match result {
            Err(e) => match e.detail() {
                ErrorDetail::Cancelled(_) => {}
                _ => panic!("expected the build to be cancelled, got: {e}"),
            },
            Ok(_) => panic!("expected the build to be cancelled"),
        }

        assert!(cancel.is_cancelled());

        Ok(())
    }
}
