/*!
   Drivers for the relayer that links the provider chain with its consumer
   chains.

   The relayer runs in its own container on the test network. Every
   operation is a CLI invocation inside that container, and the relayer
   loop itself runs as a background `docker exec` whose output is written
   to the test directory.

   Two implementations are available through [`RelayerImpl`]: the Go
   relayer `rly`, used by default, and Hermes.
*/

pub mod container;
pub mod hermes;
pub mod rly;

use core::fmt::{self, Display};
use core::str::FromStr;
use core::time::Duration;
use std::path::PathBuf;
use tracing::debug;

use crate::chain::cosmos::CosmosChain;
use crate::chain::descriptor::DockerImage;
use crate::chain::handle::ChainHandle;
use crate::docker::Docker;
use crate::error::Error;
use crate::types::config::TestConfig;
use crate::types::link::{
    ProviderConsumerLink, CCV_VERSION, CONSUMER_GENESIS_CLIENT_ID, CONSUMER_PORT, PROVIDER_PORT,
};
use crate::util::cancel::CancelToken;
use crate::util::retry::assert_eventually_succeed;

use self::container::RelayerContainer;
use self::hermes::HermesRelayer;
use self::rly::CosmosRelayer;

/// File in the relayer home receiving the output of the relayer loop.
pub const RELAYER_LOG_FILE: &str = "relayer.log";

/// Attempts at finding the client that the provider created for a consumer.
const CLIENT_LOOKUP_ATTEMPTS: u16 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelayerImpl {
    #[default]
    CosmosRly,
    Hermes,
}

impl RelayerImpl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CosmosRly => "rly",
            Self::Hermes => "hermes",
        }
    }

    /// Image used when `$RELAYER_IMAGE` is not set.
    pub fn default_image(&self) -> DockerImage {
        match self {
            Self::CosmosRly => DockerImage::new("ghcr.io/cosmos/relayer", "v2.4.2", "100:1000"),
            Self::Hermes => {
                DockerImage::new("ghcr.io/informalsystems/hermes", "1.7.4", "1000:1000")
            }
        }
    }
}

impl Display for RelayerImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelayerImpl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "rly" | "cosmos-rly" | "cosmosrly" => Ok(Self::CosmosRly),
            "hermes" => Ok(Self::Hermes),
            _ => Err(Error::unknown_relayer(s.to_string())),
        }
    }
}

/// Role of a chain within a provider-consumer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainRole {
    Provider,
    Consumer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ordered,
    Unordered,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Unordered => "unordered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOptions {
    pub src_port: String,
    pub dst_port: String,
    pub order: Order,
    pub version: String,
}

impl ChannelOptions {
    /// The CCV channel, opened from the consumer side of a path.
    pub fn ccv() -> Self {
        Self {
            src_port: CONSUMER_PORT.to_string(),
            dst_port: PROVIDER_PORT.to_string(),
            order: Order::Ordered,
            version: CCV_VERSION.to_string(),
        }
    }
}

/**
   The capability interface of a relayer. Paths are identified by name and
   always go from `src` to `dst`, where for provider-consumer links the
   consumer is the source.
*/
pub trait Relayer {
    fn implementation(&self) -> RelayerImpl;

    /// Host path of the relayer configuration, exported for manual use.
    fn config_path(&self) -> PathBuf;

    /// Register a chain with the relayer and import its relayer key.
    fn add_chain(&mut self, chain: &CosmosChain, role: ChainRole) -> Result<(), Error>;

    fn restore_key(&mut self, chain_id: &str, key_name: &str, mnemonic: &str)
        -> Result<(), Error>;

    fn generate_path(&mut self, src_chain_id: &str, dst_chain_id: &str, path: &str)
        -> Result<(), Error>;

    fn update_path_clients(
        &mut self,
        path: &str,
        src_client_id: &str,
        dst_client_id: &str,
    ) -> Result<(), Error>;

    fn create_connections(&mut self, path: &str) -> Result<(), Error>;

    fn create_channel(&mut self, path: &str, options: &ChannelOptions) -> Result<(), Error>;

    /// Start relaying packets on the given paths in the background.
    fn start_relayer(&mut self, paths: &[&str]) -> Result<(), Error>;

    fn stop_relayer(&mut self) -> Result<(), Error>;

    /**
       Establish the CCV channel of a provider-consumer path. Interchain
       security creates the light clients of both sides, so only the
       connection and the channel are created.

       The consumer always tracks its provider with the first client of
       its genesis, while the provider creates one client per consumer it
       adds and `provider_client_id` must be the one of this consumer.
    */
    fn link_provider_consumer(
        &mut self,
        path: &str,
        provider_client_id: &str,
    ) -> Result<(), Error> {
        self.update_path_clients(path, CONSUMER_GENESIS_CLIENT_ID, provider_client_id)?;
        self.create_connections(path)?;
        self.create_channel(path, &ChannelOptions::ccv())
    }
}

/**
   Link the consumer of `link` to its provider, looking up the client the
   provider created for that consumer. The provider creates the client at
   the spawn time of the consumer, so the lookup is retried.
*/
pub fn link_consumer(
    relayer: &mut dyn Relayer,
    provider: &dyn ChainHandle,
    link: &ProviderConsumerLink,
    interval: Duration,
) -> Result<(), Error> {
    let provider_client_id = assert_eventually_succeed(
        &format!(
            "provider {} hosts a client of consumer {}",
            link.provider, link.consumer
        ),
        CLIENT_LOOKUP_ATTEMPTS,
        interval,
        || provider.client_id_for_chain(&link.consumer),
    )?;

    debug!(
        "provider {} tracks consumer {} with client {}",
        link.provider, link.consumer, provider_client_id
    );

    relayer.link_provider_consumer(&link.path, &provider_client_id)
}

/**
   Start the relayer container of the configured implementation on the
   test network and return a driver for it.
*/
pub fn build_relayer(
    test_config: &TestConfig,
    test_name: &str,
    docker: &Docker,
    network: &str,
    cancel: &CancelToken,
) -> Result<Box<dyn Relayer>, Error> {
    docker.ensure_image(&test_config.relayer_image, cancel)?;

    let container = RelayerContainer::start(
        test_config.relayer,
        &test_config.relayer_image,
        test_name,
        &test_config.chain_store_dir.join("relayer"),
        docker,
        network,
        cancel,
    )?;

    let relayer: Box<dyn Relayer> = match test_config.relayer {
        RelayerImpl::CosmosRly => Box::new(CosmosRelayer::new(container)?),
        RelayerImpl::Hermes => Box::new(HermesRelayer::new(container)),
    };

    Ok(relayer)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChain;

    /// Records the client ids every path is bound to.
    #[derive(Default)]
    struct RecordingRelayer {
        clients: Vec<(String, String, String)>,
        channels: Vec<(String, ChannelOptions)>,
    }

    impl Relayer for RecordingRelayer {
        fn implementation(&self) -> RelayerImpl {
            RelayerImpl::CosmosRly
        }

        fn config_path(&self) -> PathBuf {
            PathBuf::from("relayer/config.yaml")
        }

        fn add_chain(&mut self, _chain: &CosmosChain, _role: ChainRole) -> Result<(), Error> {
            Ok(())
        }

        fn restore_key(&mut self, _: &str, _: &str, _: &str) -> Result<(), Error> {
            Ok(())
        }

        fn generate_path(&mut self, _: &str, _: &str, _: &str) -> Result<(), Error> {
            Ok(())
        }

        fn update_path_clients(
            &mut self,
            path: &str,
            src_client_id: &str,
            dst_client_id: &str,
        ) -> Result<(), Error> {
            self.clients.push((
                path.to_string(),
                src_client_id.to_string(),
                dst_client_id.to_string(),
            ));
            Ok(())
        }

        fn create_connections(&mut self, _path: &str) -> Result<(), Error> {
            Ok(())
        }

        fn create_channel(&mut self, path: &str, options: &ChannelOptions) -> Result<(), Error> {
            self.channels.push((path.to_string(), options.clone()));
            Ok(())
        }

        fn start_relayer(&mut self, _paths: &[&str]) -> Result<(), Error> {
            Ok(())
        }

        fn stop_relayer(&mut self) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn each_consumer_is_bound_to_its_provider_client() -> Result<(), Error> {
        let provider = MockChain::new("onomy-1", 10).with_clients(&[
            ("07-tendermint-0", "onex-1"),
            ("07-tendermint-1", "onex-2"),
        ]);

        let mut relayer = RecordingRelayer::default();

        for link in [
            ProviderConsumerLink::new("onomy-1", "onex-1", "ics-path"),
            ProviderConsumerLink::new("onomy-1", "onex-2", "ics-path-2"),
        ] {
            link_consumer(&mut relayer, &provider, &link, Duration::from_millis(1))?;
        }

        assert_eq!(
            relayer.clients,
            vec![
                (
                    "ics-path".to_string(),
                    "07-tendermint-0".to_string(),
                    "07-tendermint-0".to_string()
                ),
                (
                    "ics-path-2".to_string(),
                    "07-tendermint-0".to_string(),
                    "07-tendermint-1".to_string()
                ),
            ]
        );

        assert!(relayer
            .channels
            .iter()
            .all(|(_, options)| *options == ChannelOptions::ccv()));

        Ok(())
    }

    #[test]
    fn missing_provider_client_fails_the_link() {
        let provider =
            MockChain::new("onomy-1", 10).with_clients(&[("07-tendermint-0", "onex-1")]);
        let mut relayer = RecordingRelayer::default();

        let link = ProviderConsumerLink::new("onomy-1", "onex-3", "ics-path-3");
        let res = link_consumer(&mut relayer, &provider, &link, Duration::from_millis(1));

        assert!(res.is_err());
        assert!(relayer.clients.is_empty());
    }

    #[test]
    fn parses_relayer_names() -> Result<(), Error> {
        assert_eq!("rly".parse::<RelayerImpl>()?, RelayerImpl::CosmosRly);
        assert_eq!("Hermes".parse::<RelayerImpl>()?, RelayerImpl::Hermes);
        assert!("go-relayer".parse::<RelayerImpl>().is_err());

        Ok(())
    }

    #[test]
    fn default_images() {
        assert_eq!(
            RelayerImpl::CosmosRly.default_image().reference(),
            "ghcr.io/cosmos/relayer:v2.4.2"
        );
        assert_eq!(RelayerImpl::Hermes.default_image().uid_gid, "1000:1000");
    }
}
