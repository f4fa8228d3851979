/*!
   Constructs for running test cases against a single standalone chain,
   without consumer chains or relayer.
*/

use crate::bootstrap::chains::{ChainFactory, ChainSpec};
use crate::bootstrap::network::{docker_setup, Interchain, InterchainBuildOptions};
use crate::chain::cosmos::CosmosChain;
use crate::error::Error;
use crate::framework::base::{run_basic_test, BasicTest, HasOverrides, TestConfigOverride};
use crate::framework::interchain::{ChainConfigOverride, NodeCountOverride};
use crate::types::config::TestConfig;
use crate::util::suspend::hang_on_error;

/**
   Runs a test case that implements [`SingleChainTest`] against the
   provider chain configuration of the test.
*/
pub fn run_single_chain_test<Test, Overrides>(test: &Test) -> Result<(), Error>
where
    Test: SingleChainTest,
    Test: HasOverrides<Overrides = Overrides>,
    Overrides: TestConfigOverride + ChainConfigOverride + NodeCountOverride,
{
    run_basic_test(&RunSingleChainTest { test })
}

pub trait SingleChainTest {
    /// Test runner
    fn run(&self, config: &TestConfig, chain: &mut CosmosChain) -> Result<(), Error>;
}

pub struct RunSingleChainTest<'a, Test> {
    /// Inner test
    pub test: &'a Test,
}

impl<'a, Test, Overrides> BasicTest for RunSingleChainTest<'a, Test>
where
    Test: SingleChainTest,
    Test: HasOverrides<Overrides = Overrides>,
    Overrides: ChainConfigOverride + NodeCountOverride,
{
    fn run(&self, config: &TestConfig, test_name: &str) -> Result<(), Error> {
        let overrides = self.test.get_overrides();

        let spec = ChainSpec::new(
            overrides.provider_config(),
            overrides.num_validators(),
            overrides.num_full_nodes(),
        );

        let (docker, docker_network, cancel) = docker_setup(config, test_name)?;

        let factory = ChainFactory::new(
            test_name,
            config.chain_store_dir.clone(),
            docker,
            cancel.clone(),
        );

        let mut interchain = Interchain::new();
        for chain in factory.build_chains(&[spec])? {
            interchain = interchain.add_chain(chain);
        }

        let options = InterchainBuildOptions::new(test_name, config, docker_network, &cancel);
        let mut network = interchain.build(options)?;

        let env_path = network.env_path.display().to_string();

        hang_on_error(config.hang_on_fail, &env_path, || {
            self.test.run(config, network.provider_mut())
        })
    }
}

impl<'a, Test, Overrides> HasOverrides for RunSingleChainTest<'a, Test>
where
    Test: HasOverrides<Overrides = Overrides>,
{
    type Overrides = Overrides;

    fn get_overrides(&self) -> &Self::Overrides {
        self.test.get_overrides()
    }
}
