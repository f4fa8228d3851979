/*!
   Swapping the binary of a chain that halted for a software upgrade.
*/

use core::time::Duration;
use std::thread::sleep;
use std::time::Instant;
use tracing::{debug, info};

use crate::chain::cosmos::CosmosChain;
use crate::chain::ext::wait::wait_for_chain_height;
use crate::chain::handle::ChainHandle;
use crate::error::Error;

/// Consecutive polls without a new block after which a chain is halted.
const HALT_CONFIRMATIONS: u32 = 3;

/**
   Block until `chain` halts for an upgrade scheduled at `halt_height` and
   return the last height it reported.

   The node stops before committing the halt height, so the chain is
   considered halted once it reached `halt_height - 1` and no new block
   was produced for [`HALT_CONFIRMATIONS`] polls. Once that height is
   reached, a failing height query also counts as halted, since the node
   process may have exited.
*/
pub fn wait_for_halt(
    chain: &dyn ChainHandle,
    halt_height: u64,
    timeout: Duration,
    interval: Duration,
) -> Result<u64, Error> {
    let last_block = halt_height.saturating_sub(1);
    let reached = wait_for_chain_height(chain, last_block, timeout, interval)?;

    let deadline = Instant::now() + timeout;
    let mut last_height = reached;
    let mut unchanged = 0;

    while unchanged < HALT_CONFIRMATIONS {
        if last_height > halt_height {
            return Err(Error::assertion(format!(
                "chain {} did not halt at upgrade height {}, it is at height {}",
                chain.chain_id(),
                halt_height,
                last_height
            )));
        }

        if Instant::now() >= deadline {
            return Err(Error::height_timeout(
                chain.chain_id().to_string(),
                halt_height,
                format!(
                    "chain did not halt, last observed height was {}",
                    last_height
                ),
            ));
        }

        sleep(interval);

        match chain.height() {
            Ok(height) if height == last_height => unchanged += 1,
            Ok(height) => {
                last_height = height;
                unchanged = 0;
            }
            Err(e) => {
                debug!(
                    "height query failed on halted chain {}: {}",
                    chain.chain_id(),
                    e
                );
                break;
            }
        }
    }

    info!("chain {} halted at height {}", chain.chain_id(), last_height);

    Ok(last_height)
}

/**
   Perform the node side of a software upgrade: wait for the chain to halt
   at `halt_height`, stop every node, switch the node image to `version`
   and start the nodes again, then wait until the upgraded chain produces
   blocks past the halt height.
*/
pub fn upgrade_nodes(
    chain: &mut CosmosChain,
    halt_height: u64,
    version: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<u64, Error> {
    wait_for_halt(&*chain, halt_height, timeout, interval)?;

    chain.stop_all()?;
    chain.set_image_version(version);

    {
        let node = chain.primary_node()?;
        node.docker.ensure_image(&node.image, &node.cancel)?;
    }

    chain.restart_all()?;

    let height = wait_for_chain_height(&*chain, halt_height + 1, timeout, interval)?;

    info!(
        "chain {} upgraded to version {} and reached height {}",
        chain.config.chain_id, version, height
    );

    Ok(height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ext::proposal::poll_for_proposal_status;
    use crate::chain::mock::MockChain;
    use crate::types::proposal::{
        ProposalId, ProposalPhase, ProposalStatus, SoftwareUpgradeProposal, VoteOption,
    };
    use crate::types::token::Token;

    const INTERVAL: Duration = Duration::from_millis(1);

    #[test]
    fn halted_chain_is_detected() -> Result<(), Error> {
        let chain = MockChain::new("onomy-1", 24).halted();

        let height = wait_for_halt(&chain, 25, Duration::from_secs(1), INTERVAL)?;
        assert_eq!(height, 24);

        Ok(())
    }

    #[test]
    fn chain_running_past_halt_height_fails() {
        let chain = MockChain::new("onomy-1", 30);

        let res = wait_for_halt(&chain, 25, Duration::from_secs(1), INTERVAL);

        let message = res.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("did not halt"), "{message}");
    }

    #[test]
    fn upgrade_proposal_passes_with_all_validator_votes() -> Result<(), Error> {
        let chain = MockChain::new("onex-1", 40).with_statuses(&[
            ProposalStatus::VotingPeriod,
            ProposalStatus::VotingPeriod,
            ProposalStatus::Passed,
        ]);

        let height = chain.height()?;
        let halt_height = height + 10;

        let proposal = SoftwareUpgradeProposal {
            deposit: Token::new("anom", 500_000_000).to_string(),
            title: "Software Upgrade".to_string(),
            name: "upgrade-1".to_string(),
            description: "Software Upgrade".to_string(),
            height: halt_height,
            info: "ipfs://CID".to_string(),
        };

        let proposal_id = chain.submit_upgrade_proposal("user", &proposal)?;
        chain.vote_on_proposal_all_validators(&proposal_id, VoteOption::Yes)?;

        let record = poll_for_proposal_status(
            &chain,
            height,
            halt_height + 10,
            &proposal_id,
            ProposalStatus::Passed,
            INTERVAL,
        )?;

        assert_eq!(record.phase(), ProposalPhase::Passed);

        let proposals = chain.proposals();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].height, 50);
        assert_eq!(proposals[0].deposit, "500000000anom");

        assert_eq!(
            chain.votes(),
            vec![(ProposalId("1".to_string()), VoteOption::Yes)]
        );

        Ok(())
    }
}
