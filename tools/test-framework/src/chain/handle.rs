/*!
   The capability interface through which scenarios drive a running chain.

   Scenario helpers such as
   [`wait_for_blocks`](crate::chain::ext::wait::wait_for_blocks) and
   [`poll_for_proposal_status`](crate::chain::ext::proposal::poll_for_proposal_status)
   are written against [`ChainHandle`] only, so that they can run against
   the Docker backed [`CosmosChain`](crate::chain::cosmos::CosmosChain) as
   well as against an in-memory chain in unit tests.
*/

use crate::chain::descriptor::ChainConfig;
use crate::error::Error;
use crate::types::proposal::{ProposalId, ProposalStatus, SoftwareUpgradeProposal, VoteOption};
use crate::types::token::Token;
use crate::types::wallet::Wallet;

pub trait ChainHandle {
    fn config(&self) -> &ChainConfig;

    fn chain_id(&self) -> &str {
        &self.config().chain_id
    }

    /// Latest committed block height.
    fn height(&self) -> Result<u64, Error>;

    /**
       ID of the light client tracking `counterparty_chain_id` that is
       hosted on this chain.
    */
    fn client_id_for_chain(&self, counterparty_chain_id: &str) -> Result<String, Error>;

    /// Full balance set of an address.
    fn all_balances(&self, address: &str) -> Result<Vec<Token>, Error>;

    /// Create a new key in the keyring of the chain's primary node.
    fn create_key(&self, key_name: &str) -> Result<Wallet, Error>;

    /// The genesis funded wallet used to fund test users.
    fn faucet(&self) -> Result<&Wallet, Error>;

    /// Send `token` from the key `from_key` to `to_address`.
    fn send_funds(&self, from_key: &str, to_address: &str, token: &Token) -> Result<(), Error>;

    fn submit_upgrade_proposal(
        &self,
        key_name: &str,
        proposal: &SoftwareUpgradeProposal,
    ) -> Result<ProposalId, Error>;

    /// Every validator votes `option` with its own validator key.
    fn vote_on_proposal_all_validators(
        &self,
        proposal_id: &ProposalId,
        option: VoteOption,
    ) -> Result<(), Error>;

    fn proposal_status(&self, proposal_id: &ProposalId) -> Result<ProposalStatus, Error>;
}
