/*!
   Constructs for running test cases against a provider chain and its
   consumer chains, linked by a relayer.
*/

use tracing::info;

use crate::bootstrap::chains::{ChainFactory, ChainSpec};
use crate::bootstrap::network::{docker_setup, Interchain, InterchainBuildOptions, InterchainNetwork};
use crate::chain::descriptor::ChainConfig;
use crate::error::Error;
use crate::framework::base::{run_basic_test, BasicTest, HasOverrides, TestConfigOverride};
use crate::relayer::build_relayer;
use crate::types::config::TestConfig;
use crate::types::link::{path_name_for, ProviderConsumerLink};
use crate::util::suspend::hang_on_error;

/**
   Runs a test case that implements [`InterchainTest`].
*/
pub fn run_interchain_test<Test, Overrides>(test: &Test) -> Result<(), Error>
where
    Test: InterchainTest,
    Test: HasOverrides<Overrides = Overrides>,
    Overrides: TestConfigOverride + ChainConfigOverride + NodeCountOverride + PathOverride,
{
    run_basic_test(&RunInterchainTest { test })
}

/**
   A test case that is run with a provider chain, its consumer chains and
   a relayer. The relayer paths are created, but the relayer loop is not
   started: the test starts it when it needs packets to be relayed.
*/
pub trait InterchainTest {
    /// Test runner
    fn run(&self, config: &TestConfig, network: &mut InterchainNetwork) -> Result<(), Error>;
}

/**
   An internal trait that can be implemented by test cases to override
   the chains that are created. Test writers should implement
   [`TestOverrides`](crate::framework::overrides::TestOverrides) instead.
*/
pub trait ChainConfigOverride {
    fn provider_config(&self) -> ChainConfig;

    fn consumer_configs(&self) -> Vec<ChainConfig>;
}

pub trait NodeCountOverride {
    fn num_validators(&self) -> usize;

    fn num_full_nodes(&self) -> usize;
}

pub trait PathOverride {
    fn path_name(&self) -> String;

    fn skip_path_creation(&self) -> bool;
}

/**
   A wrapper type that lifts a test case that implements [`InterchainTest`]
   into a test case the implements [`BasicTest`].
*/
pub struct RunInterchainTest<'a, Test> {
    /// Inner test
    pub test: &'a Test,
}

impl<'a, Test, Overrides> BasicTest for RunInterchainTest<'a, Test>
where
    Test: InterchainTest,
    Test: HasOverrides<Overrides = Overrides>,
    Overrides: ChainConfigOverride + NodeCountOverride + PathOverride,
{
    fn run(&self, config: &TestConfig, test_name: &str) -> Result<(), Error> {
        let overrides = self.test.get_overrides();

        let num_validators = overrides.num_validators();
        let num_full_nodes = overrides.num_full_nodes();

        let mut specs = vec![ChainSpec::new(
            overrides.provider_config(),
            num_validators,
            num_full_nodes,
        )];

        for consumer_config in overrides.consumer_configs() {
            specs.push(ChainSpec::new(consumer_config, num_validators, num_full_nodes));
        }

        let (docker, docker_network, cancel) = docker_setup(config, test_name)?;

        let factory = ChainFactory::new(
            test_name,
            config.chain_store_dir.clone(),
            docker.clone(),
            cancel.clone(),
        );

        let chains = factory.build_chains(&specs)?;

        let relayer = build_relayer(config, test_name, &docker, &docker_network.name, &cancel)?;

        let provider_id = chains[0].config.chain_id.clone();
        let path_name = overrides.path_name();

        let mut interchain = Interchain::new().add_relayer("relayer", relayer);

        for (i, chain) in chains.into_iter().enumerate() {
            if i > 0 {
                interchain = interchain.add_provider_consumer_link(ProviderConsumerLink::new(
                    &provider_id,
                    &chain.config.chain_id,
                    &path_name_for(&path_name, i - 1),
                ));
            }

            interchain = interchain.add_chain(chain);
        }

        let options = InterchainBuildOptions::new(test_name, config, docker_network, &cancel)
            .skip_path_creation(overrides.skip_path_creation());

        let mut network = interchain.build(options)?;

        info!(
            "running test {} on paths {:?}",
            test_name,
            network.path_names()
        );

        let env_path = network.env_path.display().to_string();

        hang_on_error(config.hang_on_fail, &env_path, || {
            self.test.run(config, &mut network)
        })
    }
}

impl<'a, Test, Overrides> HasOverrides for RunInterchainTest<'a, Test>
where
    Test: HasOverrides<Overrides = Overrides>,
{
    type Overrides = Overrides;

    fn get_overrides(&self) -> &Self::Overrides {
        self.test.get_overrides()
    }
}
