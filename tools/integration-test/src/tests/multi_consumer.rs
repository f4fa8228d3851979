//! Link two consumer chains to one provider, each on its own path.

use ics_test_framework::prelude::*;

const FUNDS: u128 = 1_000_000_000;

#[test]
#[cfg_attr(not(feature = "docker"), ignore)]
fn test_multiple_consumers() -> Result<(), Error> {
    run_interchain_test(&MultipleConsumersTest)
}

pub struct MultipleConsumersTest;

impl TestOverrides for MultipleConsumersTest {
    fn consumer_configs(&self) -> Vec<ChainConfig> {
        vec![onex_config(), onex_config_with_chain_id("onex-2")]
    }
}

impl InterchainTest for MultipleConsumersTest {
    fn run(&self, config: &TestConfig, network: &mut InterchainNetwork) -> Result<(), Error> {
        let paths = network
            .path_names()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        assert_eq(
            "each consumer should have its own path",
            &paths,
            &vec![IBC_PATH.to_string(), format!("{}-2", IBC_PATH)],
        )?;

        let path_refs = paths.iter().map(String::as_str).collect::<Vec<_>>();
        network.relayer_mut()?.start_relayer(&path_refs)?;

        let consumers = network
            .consumers()
            .iter()
            .map(|chain| chain as &dyn ChainHandle)
            .collect::<Vec<_>>();

        wait_for_blocks(
            5,
            &consumers,
            config.block_wait_timeout,
            config.poll_interval,
        )?;

        let users = get_and_fund_test_users("test_multiple_consumers", FUNDS, &consumers)?;

        for (chain, user) in network.consumers().iter().zip(&users) {
            let balances = chain.all_balances(user.formatted_address())?;

            assert_gte(
                "every consumer user should hold the funded amount",
                &balance_of(&balances, &chain.config.denom),
                &FUNDS,
            )?;
        }

        Ok(())
    }
}
