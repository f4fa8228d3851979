/*!
   A provider-consumer link that the relayer establishes between two chains.
*/

use crate::types::env::{EnvWriter, ExportEnv};

/// Port bound by the consumer side of the CCV channel.
pub const CONSUMER_PORT: &str = "consumer";

/// Port bound by the provider side of the CCV channel.
pub const PROVIDER_PORT: &str = "provider";

/// Channel version of the CCV channel.
pub const CCV_VERSION: &str = "1";

/**
   Client ID of the provider client created in the genesis of every
   consumer chain. The provider side has one client per consumer, which
   is looked up with
   [`ChainHandle::client_id_for_chain`](crate::chain::handle::ChainHandle::client_id_for_chain).
*/
pub const CONSUMER_GENESIS_CLIENT_ID: &str = "07-tendermint-0";

/**
   Chains are referred to by their chain id, as the chain values are owned
   by the [`Interchain`](crate::bootstrap::network::Interchain) builder.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConsumerLink {
    pub provider: String,
    pub consumer: String,
    pub path: String,
}

impl ProviderConsumerLink {
    pub fn new(provider: &str, consumer: &str, path: &str) -> Self {
        Self {
            provider: provider.to_string(),
            consumer: consumer.to_string(),
            path: path.to_string(),
        }
    }
}

/**
   Derive the relayer path name for the `index`th consumer of a network.
   The first consumer uses `base` unchanged so that single consumer tests
   keep the conventional path name.
*/
pub fn path_name_for(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, index + 1)
    }
}

impl ExportEnv for ProviderConsumerLink {
    fn export_env(&self, writer: &mut impl EnvWriter) {
        writer.write_env("PROVIDER", &self.provider);
        writer.write_env("CONSUMER", &self.consumer);
        writer.write_env("PATH_NAME", &self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_names_are_unique_per_consumer() {
        let names: Vec<_> = (0..3).map(|i| path_name_for("ics-path", i)).collect();
        assert_eq!(names, vec!["ics-path", "ics-path-2", "ics-path-3"]);
    }
}
