/*!
   Constructs for implementing overrides for test cases.
*/

use crate::chain::descriptor::ChainConfig;
use crate::chain::presets::{onex_config, onomy_config, IBC_PATH};
use crate::framework::base::{HasOverrides, TestConfigOverride};
use crate::framework::interchain::{ChainConfigOverride, NodeCountOverride, PathOverride};
use crate::types::config::TestConfig;

/**
   This trait should be implemented for all test cases to allow overriding
   some parts of the behavior during the test setup.

   Since all methods in this trait have default implementation, test cases
   that do not need any override can have an empty implementation body for
   this trait.

   The test case can then be run with the
   [`run_interchain_test`](crate::framework::interchain::run_interchain_test)
   or [`run_single_chain_test`](crate::framework::single::run_single_chain_test)
   runners.
*/
pub trait TestOverrides {
    /**
       Override the full test config that is loaded from the environment,
       e.g. to select another relayer implementation.
    */
    fn modify_test_config(&self, _config: &mut TestConfig) {}

    /**
       The configuration of the provider chain. Genesis overrides and
       `config.toml`/`app.toml` edits are made on the returned value.
    */
    fn provider_config(&self) -> ChainConfig {
        onomy_config()
    }

    /**
       The configurations of the consumer chains, each linked to the
       provider on its own path. Ignored by single chain tests.
    */
    fn consumer_configs(&self) -> Vec<ChainConfig> {
        vec![onex_config()]
    }

    fn num_validators(&self) -> usize {
        1
    }

    fn num_full_nodes(&self) -> usize {
        0
    }

    /// Name of the path of the first consumer; later ones get a suffix.
    fn path_name(&self) -> String {
        IBC_PATH.to_string()
    }

    /**
       Register the relayer paths without creating the connections and
       channels, for tests that create them themselves.
    */
    fn skip_path_creation(&self) -> bool {
        false
    }
}

impl<Test: TestOverrides> HasOverrides for Test {
    type Overrides = Self;

    fn get_overrides(&self) -> &Self {
        self
    }
}

impl<Test: TestOverrides> TestConfigOverride for Test {
    fn modify_test_config(&self, config: &mut TestConfig) {
        TestOverrides::modify_test_config(self, config)
    }
}

impl<Test: TestOverrides> ChainConfigOverride for Test {
    fn provider_config(&self) -> ChainConfig {
        TestOverrides::provider_config(self)
    }

    fn consumer_configs(&self) -> Vec<ChainConfig> {
        TestOverrides::consumer_configs(self)
    }
}

impl<Test: TestOverrides> NodeCountOverride for Test {
    fn num_validators(&self) -> usize {
        TestOverrides::num_validators(self)
    }

    fn num_full_nodes(&self) -> usize {
        TestOverrides::num_full_nodes(self)
    }
}

impl<Test: TestOverrides> PathOverride for Test {
    fn path_name(&self) -> String {
        TestOverrides::path_name(self)
    }

    fn skip_path_creation(&self) -> bool {
        TestOverrides::skip_path_creation(self)
    }
}
