//! Run the provider chain alone and check that it keeps producing blocks
//! with the shortened governance periods.

use ics_test_framework::prelude::*;

const BLOCKS: u64 = 15;

#[test]
#[cfg_attr(not(feature = "docker"), ignore)]
fn test_single_chain() -> Result<(), Error> {
    run_single_chain_test(&SingleChainBlocksTest)
}

pub struct SingleChainBlocksTest;

impl TestOverrides for SingleChainBlocksTest {
    fn provider_config(&self) -> ChainConfig {
        let mut config = onomy_config();

        config.genesis_overrides.extend([
            GenesisOverride::new("app_state.gov.voting_params.voting_period", "15s"),
            GenesisOverride::new("app_state.gov.deposit_params.max_deposit_period", "10s"),
        ]);

        config
    }
}

impl SingleChainTest for SingleChainBlocksTest {
    fn run(&self, config: &TestConfig, chain: &mut CosmosChain) -> Result<(), Error> {
        let start = chain.height()?;

        wait_for_blocks(
            BLOCKS,
            &[&*chain],
            config.block_wait_timeout,
            config.poll_interval,
        )?;

        let end = chain.height()?;

        assert_gte(
            "chain should advance while running alone",
            &end,
            &(start + BLOCKS),
        )?;

        info!("chain {} advanced from {} to {}", chain.config.chain_id, start, end);

        Ok(())
    }
}
