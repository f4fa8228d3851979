/*!
   Re-export of common constructs that are used by test cases.
*/

pub use core::time::Duration;
pub use eyre::eyre;
pub use std::thread::sleep;
pub use tracing::{debug, error, info, warn};

pub use crate::bootstrap::network::{Interchain, InterchainBuildOptions, InterchainNetwork};
pub use crate::chain::cosmos::{CosmosChain, FAUCET_KEY, RELAYER_KEY, VALIDATOR_KEY};
pub use crate::chain::descriptor::{ChainConfig, ConfigFileOverride, DockerImage};
pub use crate::chain::ext::fund::get_and_fund_test_users;
pub use crate::chain::ext::proposal::poll_for_proposal_status;
pub use crate::chain::ext::upgrade::{upgrade_nodes, wait_for_halt};
pub use crate::chain::ext::wait::{wait_for_blocks, wait_for_chain_height};
pub use crate::chain::genesis::GenesisOverride;
pub use crate::chain::handle::ChainHandle;
pub use crate::chain::presets::{
    onex_config, onex_config_with_chain_id, onomy_config, CONSUMER_DENOM, IBC_PATH,
    PROVIDER_DENOM,
};
pub use crate::error::{handle_generic_error, Error};
pub use crate::framework::base::HasOverrides;
pub use crate::framework::interchain::{run_interchain_test, InterchainTest};
pub use crate::framework::overrides::TestOverrides;
pub use crate::framework::single::{run_single_chain_test, SingleChainTest};
pub use crate::relayer::{Relayer, RelayerImpl};
pub use crate::types::config::TestConfig;
pub use crate::types::link::ProviderConsumerLink;
pub use crate::types::proposal::{
    ProposalId, ProposalStatus, SoftwareUpgradeProposal, VoteOption,
};
pub use crate::types::token::{balance_of, Token};
pub use crate::types::wallet::{Wallet, WalletAddress, WalletId};
pub use crate::util::assert::*;
pub use crate::util::retry::assert_eventually_succeed;
pub use crate::util::suspend::suspend;
