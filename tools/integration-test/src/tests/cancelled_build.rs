//! Cancel a network build halfway through and check that no container of
//! the test is left behind once the build has failed.

use ics_test_framework::bootstrap::chains::{ChainFactory, ChainSpec};
use ics_test_framework::bootstrap::init::init_test;
use ics_test_framework::bootstrap::network::docker_setup;
use ics_test_framework::error::ErrorDetail;
use ics_test_framework::prelude::*;
use ics_test_framework::relayer::build_relayer;

const TEST_NAME: &str = "test_cancelled_build";

/// Far too short for bootstrapping a provider and a consumer chain.
const BUILD_TIMEOUT: Duration = Duration::from_secs(10);

#[test]
#[cfg_attr(not(feature = "docker"), ignore)]
fn test_cancelled_build() -> Result<(), Error> {
    let mut config = init_test()?;
    config.keep_containers = false;

    let (docker, network, cancel) = docker_setup(&config, TEST_NAME)?;

    let factory = ChainFactory::new(
        TEST_NAME,
        config.chain_store_dir.clone(),
        docker.clone(),
        cancel.clone(),
    );

    let mut chains = factory.build_chains(&[
        ChainSpec::new(onomy_config(), 1, 0),
        ChainSpec::new(onex_config(), 1, 0),
    ])?;

    let relayer = build_relayer(&config, TEST_NAME, &docker, &network.name, &cancel)?;

    let consumer = chains.remove(1);
    let provider = chains.remove(0);

    let link = ProviderConsumerLink::new(
        &provider.config.chain_id,
        &consumer.config.chain_id,
        IBC_PATH,
    );

    let mut options = InterchainBuildOptions::new(TEST_NAME, &config, network, &cancel);
    options.build_timeout = Some(BUILD_TIMEOUT);

    let result = Interchain::new()
        .add_chain(provider)
        .add_chain(consumer)
        .add_relayer("relayer", relayer)
        .add_provider_consumer_link(link)
        .build(options);

    match result {
        Err(e) => match e.detail() {
            ErrorDetail::Cancelled(_) => info!("build was cancelled: {}", e),
            _ => return Err(e),
        },
        Ok(_) => return Err(eyre!("build finished within {:?}", BUILD_TIMEOUT).into()),
    }

    let leftover = docker.run_containers()?;

    assert_eq(
        "no container of a cancelled build should be left behind",
        &leftover,
        &Vec::<String>::new(),
    )?;

    Ok(())
}
