/*!
   An in-memory [`ChainHandle`] producing one block per height query, used
   to test the scenario helpers without Docker.
*/

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

use crate::chain::descriptor::ChainConfig;
use crate::chain::handle::ChainHandle;
use crate::chain::presets::onomy_config;
use crate::error::Error;
use crate::types::proposal::{ProposalId, ProposalStatus, SoftwareUpgradeProposal, VoteOption};
use crate::types::token::Token;
use crate::types::wallet::Wallet;

pub struct MockChain {
    config: ChainConfig,
    height: Cell<u64>,
    producing: bool,
    block_step: u64,
    height_queries: Cell<usize>,
    failing_queries: Cell<usize>,
    cancelled: bool,
    clients: Vec<(String, String)>,
    faucet: Wallet,
    keys: Cell<usize>,
    balances: RefCell<BTreeMap<String, Vec<Token>>>,
    statuses: RefCell<VecDeque<ProposalStatus>>,
    proposals: RefCell<Vec<SoftwareUpgradeProposal>>,
    votes: RefCell<Vec<(ProposalId, VoteOption)>>,
}

impl MockChain {
    pub fn new(chain_id: &str, height: u64) -> Self {
        let config = ChainConfig {
            chain_id: chain_id.to_string(),
            ..onomy_config()
        };

        Self {
            config,
            height: Cell::new(height),
            producing: true,
            block_step: 1,
            height_queries: Cell::new(0),
            failing_queries: Cell::new(0),
            cancelled: false,
            clients: Vec::new(),
            faucet: Wallet::new(
                "faucet".to_string(),
                format!("onomy1faucet{chain_id}"),
                String::new(),
            ),
            keys: Cell::new(0),
            balances: RefCell::new(BTreeMap::new()),
            statuses: RefCell::new(VecDeque::new()),
            proposals: RefCell::new(Vec::new()),
            votes: RefCell::new(Vec::new()),
        }
    }

    /// The chain stops producing blocks.
    pub fn halted(mut self) -> Self {
        self.producing = false;
        self
    }

    /// Blocks produced between two height queries.
    pub fn with_block_step(mut self, step: u64) -> Self {
        self.block_step = step;
        self
    }

    /// The first `count` height queries fail like a node that is starting.
    pub fn failing_height_queries(self, count: usize) -> Self {
        self.failing_queries.set(count);
        self
    }

    /// Every height query fails as cancelled.
    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    /// Light clients hosted by the chain, as `(client_id, chain_id)`.
    pub fn with_clients(mut self, clients: &[(&str, &str)]) -> Self {
        self.clients = clients
            .iter()
            .map(|(client_id, chain_id)| (client_id.to_string(), chain_id.to_string()))
            .collect();
        self
    }

    /**
       Statuses returned by successive proposal queries. The last status
       keeps being returned once the others are consumed.
    */
    pub fn with_statuses(self, statuses: &[ProposalStatus]) -> Self {
        *self.statuses.borrow_mut() = statuses.iter().copied().collect();
        self
    }

    pub fn current_height(&self) -> u64 {
        self.height.get()
    }

    pub fn height_queries(&self) -> usize {
        self.height_queries.get()
    }

    pub fn votes(&self) -> Vec<(ProposalId, VoteOption)> {
        self.votes.borrow().clone()
    }

    pub fn proposals(&self) -> Vec<SoftwareUpgradeProposal> {
        self.proposals.borrow().clone()
    }
}

impl ChainHandle for MockChain {
    fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn height(&self) -> Result<u64, Error> {
        self.height_queries.set(self.height_queries.get() + 1);

        if self.cancelled {
            return Err(Error::cancelled("query height".to_string()));
        }

        let failing = self.failing_queries.get();
        if failing > 0 {
            self.failing_queries.set(failing - 1);

            return Err(Error::command(
                "onomyd status".to_string(),
                Some(1),
                "connection refused".to_string(),
            ));
        }

        let height = self.height.get();

        if self.producing {
            self.height.set(height + self.block_step);
        }

        Ok(height)
    }

    fn client_id_for_chain(&self, counterparty_chain_id: &str) -> Result<String, Error> {
        self.clients
            .iter()
            .find(|(_, chain_id)| chain_id == counterparty_chain_id)
            .map(|(client_id, _)| client_id.clone())
            .ok_or_else(|| Error::unknown_chain(counterparty_chain_id.to_string()))
    }

    fn all_balances(&self, address: &str) -> Result<Vec<Token>, Error> {
        Ok(self
            .balances
            .borrow()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    fn create_key(&self, key_name: &str) -> Result<Wallet, Error> {
        let index = self.keys.get();
        self.keys.set(index + 1);

        Ok(Wallet::new(
            key_name.to_string(),
            format!("onomy1user{index}"),
            String::new(),
        ))
    }

    fn faucet(&self) -> Result<&Wallet, Error> {
        Ok(&self.faucet)
    }

    fn send_funds(&self, _from_key: &str, to_address: &str, token: &Token) -> Result<(), Error> {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.entry(to_address.to_string()).or_default();

        match balance.iter_mut().find(|t| t.denom == token.denom) {
            Some(existing) => existing.amount += token.amount,
            None => balance.push(token.clone()),
        }

        Ok(())
    }

    fn submit_upgrade_proposal(
        &self,
        _key_name: &str,
        proposal: &SoftwareUpgradeProposal,
    ) -> Result<ProposalId, Error> {
        let mut proposals = self.proposals.borrow_mut();
        proposals.push(proposal.clone());

        Ok(ProposalId(proposals.len().to_string()))
    }

    fn vote_on_proposal_all_validators(
        &self,
        proposal_id: &ProposalId,
        option: VoteOption,
    ) -> Result<(), Error> {
        self.votes.borrow_mut().push((proposal_id.clone(), option));
        Ok(())
    }

    fn proposal_status(&self, _proposal_id: &ProposalId) -> Result<ProposalStatus, Error> {
        let mut statuses = self.statuses.borrow_mut();

        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().copied()
        };

        Ok(status.unwrap_or(ProposalStatus::VotingPeriod))
    }
}
