/*!
   Construction of the chain handles of a test from an ordered list of
   chain specifications.

   By convention the first specification is the provider chain and every
   following one is a consumer chain.
*/

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

use crate::chain::cosmos::CosmosChain;
use crate::chain::descriptor::ChainConfig;
use crate::chain::handle::ChainHandle;
use crate::chain::presets::onomy_config;
use crate::docker::Docker;
use crate::error::Error;
use crate::util::cancel::CancelToken;

/**
   Specification of one chain of a test.
*/
#[derive(Debug, Clone)]
pub struct ChainSpec {
    /// Name the produced chain is known by. Replaces the name of `config`.
    pub name: String,

    pub config: ChainConfig,

    pub num_validators: usize,

    pub num_full_nodes: usize,
}

impl ChainSpec {
    pub fn new(config: ChainConfig, num_validators: usize, num_full_nodes: usize) -> Self {
        Self {
            name: config.name.clone(),
            config,
            num_validators,
            num_full_nodes,
        }
    }
}

/**
   The specifications of an onomy provider chain followed by a consumer
   chain built from `consumer_config`, both with the same number of
   validators and full nodes.
*/
pub fn provider_consumer_specs(
    num_validators: usize,
    num_full_nodes: usize,
    consumer_config: ChainConfig,
) -> Vec<ChainSpec> {
    vec![
        ChainSpec::new(onomy_config(), num_validators, num_full_nodes),
        ChainSpec::new(consumer_config, num_validators, num_full_nodes),
    ]
}

/**
   Produces [`CosmosChain`] handles from [`ChainSpec`]s. The chains are not
   started; this is done when the
   [`Interchain`](crate::bootstrap::network::Interchain) is built.
*/
pub struct ChainFactory {
    pub test_name: String,

    pub chain_store_dir: PathBuf,

    pub docker: Docker,

    pub cancel: CancelToken,
}

impl ChainFactory {
    pub fn new(
        test_name: &str,
        chain_store_dir: PathBuf,
        docker: Docker,
        cancel: CancelToken,
    ) -> Self {
        Self {
            test_name: test_name.to_string(),
            chain_store_dir,
            docker,
            cancel,
        }
    }

    /**
       Build one chain per specification, in order. Fails without producing
       any chain if a single specification is invalid or its image cannot
       be pulled.
    */
    pub fn build_chains(&self, specs: &[ChainSpec]) -> Result<Vec<CosmosChain>, Error> {
        let configs = specs
            .iter()
            .map(|spec| ChainConfig {
                name: spec.name.clone(),
                ..spec.config.clone()
            })
            .collect::<Vec<_>>();

        check_unique_chain_ids(&configs)?;

        for config in &configs {
            config.validate()?;
            self.docker.ensure_image(config.image()?, &self.cancel)?;
        }

        let mut chains = Vec::with_capacity(specs.len());

        for (spec, config) in specs.iter().zip(configs) {
            let chain = CosmosChain::new(
                config,
                spec.num_validators,
                spec.num_full_nodes,
                &self.test_name,
                &self.chain_store_dir,
                &self.docker,
                &self.cancel,
            )?;

            info!(
                "created chain {} ({}) with {} validators and {} full nodes",
                chain.config.name, chain.config.chain_id, spec.num_validators, spec.num_full_nodes
            );

            chains.push(chain);
        }

        check_chain_order(specs, &chains)?;

        Ok(chains)
    }

    /**
       Build the onomy provider chain and a consumer chain with a custom
       configuration. The provider is always at position 0.
    */
    pub fn create_chains_with_custom_consumer_config(
        &self,
        num_validators: usize,
        num_full_nodes: usize,
        consumer_config: ChainConfig,
    ) -> Result<Vec<CosmosChain>, Error> {
        self.build_chains(&provider_consumer_specs(
            num_validators,
            num_full_nodes,
            consumer_config,
        ))
    }
}

/**
   Check that `chains` holds exactly one chain per specification, in the
   order of the specifications.
*/
pub fn check_chain_order<Chain: ChainHandle>(
    specs: &[ChainSpec],
    chains: &[Chain],
) -> Result<(), Error> {
    if specs.len() != chains.len() {
        return Err(Error::chain_count_mismatch(specs.len(), chains.len()));
    }

    for (position, (spec, chain)) in specs.iter().zip(chains).enumerate() {
        if spec.name != chain.config().name {
            return Err(Error::chain_order_mismatch(
                position,
                spec.name.clone(),
                chain.config().name.clone(),
            ));
        }
    }

    Ok(())
}

pub fn check_unique_chain_ids(configs: &[ChainConfig]) -> Result<(), Error> {
    let mut seen = HashSet::new();

    for config in configs {
        if !seen.insert(config.chain_id.as_str()) {
            return Err(Error::duplicate_chain_id(config.chain_id.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChain;
    use crate::chain::presets::{onex_config, onex_config_with_chain_id};

    #[test]
    fn provider_comes_first() -> Result<(), Error> {
        let specs = provider_consumer_specs(1, 0, onex_config());

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "onomy");
        assert_eq!(specs[1].name, "onex");

        Ok(())
    }

    #[test]
    fn order_is_checked_by_name() {
        let specs = vec![
            ChainSpec::new(onomy_config(), 1, 0),
            ChainSpec::new(onomy_config(), 1, 0),
        ];

        let chains = vec![MockChain::new("onomy-1", 1), MockChain::new("onomy-2", 1)];
        assert!(check_chain_order(&specs, &chains).is_ok());

        let specs = vec![
            ChainSpec::new(onomy_config(), 1, 0),
            ChainSpec::new(onex_config(), 1, 0),
        ];
        let message = check_chain_order(&specs, &chains)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(message.contains("position 1"), "{message}");

        let message = check_chain_order(&specs[..1], &chains)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(message.contains("expected 1 chains"), "{message}");
    }

    #[test]
    fn consumer_chain_id_must_differ_from_provider() -> Result<(), Error> {
        let factory = ChainFactory::new(
            "unit",
            PathBuf::from("data/unit"),
            Docker::connect("ics-unit", true)?,
            CancelToken::new(),
        );

        let message = factory
            .create_chains_with_custom_consumer_config(1, 0, onex_config_with_chain_id("onomy-1"))
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();

        assert!(message.contains("onomy-1"), "{message}");

        Ok(())
    }

    #[test]
    fn chain_ids_must_be_unique() {
        let configs = vec![onomy_config(), onex_config(), onex_config()];

        let message = check_unique_chain_ids(&configs)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(message.contains("onex-1"), "{message}");

        let configs = vec![
            onomy_config(),
            onex_config(),
            onex_config_with_chain_id("onex-2"),
        ];
        assert!(check_unique_chain_ids(&configs).is_ok());
    }
}
