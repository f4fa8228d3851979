//! Fund a user on the consumer chain while the relayer is running on the
//! CCV channel.

use ics_test_framework::prelude::*;

const FUNDS: u128 = 10_000_000_000;

#[test]
#[cfg_attr(not(feature = "docker"), ignore)]
fn test_relayed_funding() -> Result<(), Error> {
    run_interchain_test(&RelayedFundingTest)
}

pub struct RelayedFundingTest;

impl TestOverrides for RelayedFundingTest {}

impl InterchainTest for RelayedFundingTest {
    fn run(&self, config: &TestConfig, network: &mut InterchainNetwork) -> Result<(), Error> {
        wait_for_blocks(
            5,
            &[network.provider(), &network.consumers()[0]],
            config.block_wait_timeout,
            config.poll_interval,
        )?;

        info!("starting relayer on path {}", IBC_PATH);

        network.relayer_mut()?.start_relayer(&[IBC_PATH])?;

        wait_for_blocks(
            5,
            &[network.provider(), &network.consumers()[0]],
            config.block_wait_timeout,
            config.poll_interval,
        )?;

        let onex = &network.consumers()[0];

        let users = get_and_fund_test_users("test_relayed_funding", FUNDS, &[onex])?;
        let onex_user = &users[0];

        let balances = onex.all_balances(onex_user.formatted_address())?;

        info!("onex balances of {}: {:?}", onex_user.address, balances);

        assert_gte(
            "consumer user should hold the funded amount",
            &balance_of(&balances, &onex.config.denom),
            &FUNDS,
        )?;

        info!("number of chains: {}", network.chains.len());

        Ok(())
    }
}
