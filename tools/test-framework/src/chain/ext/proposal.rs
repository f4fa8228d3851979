/*!
   Polling of governance proposals until they reach a status.
*/

use core::time::Duration;
use std::thread::sleep;
use tracing::{debug, info};

use crate::chain::handle::ChainHandle;
use crate::error::Error;
use crate::types::proposal::{ProposalId, ProposalRecord, ProposalStatus};

/**
   Poll the status of a proposal at each new block, starting at
   `start_height`, until `target` is observed.

   Fails once the chain passes `max_height` without the proposal reaching
   `target`, when the proposal ends in a different terminal status, or when
   the observed status moves backwards. If the chain jumps past
   `max_height` between two polls, the status is queried one last time
   before giving up, so that a status reached at `max_height` is not missed.
*/
pub fn poll_for_proposal_status(
    chain: &dyn ChainHandle,
    start_height: u64,
    max_height: u64,
    proposal_id: &ProposalId,
    target: ProposalStatus,
    interval: Duration,
) -> Result<ProposalRecord, Error> {
    let mut record = ProposalRecord::new(proposal_id.clone(), Some(max_height));
    let mut last_polled = None;

    loop {
        let height = chain.height()?;

        if height > max_height {
            let polled_deadline = last_polled.is_some_and(|polled| polled >= max_height);

            if !polled_deadline
                && observe_status(chain, &mut record, height, target)? == Some(target)
            {
                return Ok(record);
            }

            record.expire();

            return Err(Error::proposal_timeout(
                proposal_id.to_string(),
                max_height,
                record
                    .last_status()
                    .map(|status| status.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ));
        }

        if height >= start_height && last_polled != Some(height) {
            last_polled = Some(height);

            if observe_status(chain, &mut record, height, target)? == Some(target) {
                return Ok(record);
            }
        }

        sleep(interval);
    }
}

/**
   Query and record the current status of the proposal. Returns the status
   once it reached `target`, and fails on any other terminal status.
*/
fn observe_status(
    chain: &dyn ChainHandle,
    record: &mut ProposalRecord,
    height: u64,
    target: ProposalStatus,
) -> Result<Option<ProposalStatus>, Error> {
    let proposal_id = record.id.clone();

    let status = chain.proposal_status(&proposal_id)?;
    let phase = record.observe(status)?;

    debug!(
        "proposal {} on {} at height {}: {} ({:?})",
        proposal_id,
        chain.chain_id(),
        height,
        status,
        phase
    );

    if status == target {
        info!(
            "proposal {} on {} reached {} at height {}",
            proposal_id,
            chain.chain_id(),
            status,
            height
        );

        return Ok(Some(status));
    }

    if status.is_terminal() {
        return Err(Error::unexpected_proposal_status(
            proposal_id.to_string(),
            target.to_string(),
            status.to_string(),
        ));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChain;
    use crate::types::proposal::ProposalPhase;

    const INTERVAL: Duration = Duration::from_millis(1);

    fn proposal_id() -> ProposalId {
        ProposalId("1".to_string())
    }

    #[test]
    fn polls_until_passed() -> Result<(), Error> {
        let chain = MockChain::new("onex-1", 10).with_statuses(&[
            ProposalStatus::VotingPeriod,
            ProposalStatus::VotingPeriod,
            ProposalStatus::Passed,
        ]);

        let record = poll_for_proposal_status(
            &chain,
            10,
            30,
            &proposal_id(),
            ProposalStatus::Passed,
            INTERVAL,
        )?;

        assert_eq!(record.phase(), ProposalPhase::Passed);
        assert!(chain.current_height() <= 31);

        Ok(())
    }

    #[test]
    fn status_reached_while_skipping_past_deadline_is_seen() -> Result<(), Error> {
        // heights 10, 20, ... so the deadline height 15 is never observed
        let chain = MockChain::new("onex-1", 10)
            .with_block_step(10)
            .with_statuses(&[ProposalStatus::VotingPeriod, ProposalStatus::Passed]);

        let record = poll_for_proposal_status(
            &chain,
            10,
            15,
            &proposal_id(),
            ProposalStatus::Passed,
            INTERVAL,
        )?;

        assert_eq!(record.last_status(), Some(ProposalStatus::Passed));

        Ok(())
    }

    #[test]
    fn deadline_expires_open_proposal() {
        let chain = MockChain::new("onex-1", 10).with_statuses(&[ProposalStatus::VotingPeriod]);

        let res = poll_for_proposal_status(
            &chain,
            10,
            15,
            &proposal_id(),
            ProposalStatus::Passed,
            INTERVAL,
        );

        let message = res.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("PROPOSAL_STATUS_VOTING_PERIOD"), "{message}");
    }

    #[test]
    fn rejected_proposal_fails() {
        let chain = MockChain::new("onex-1", 10)
            .with_statuses(&[ProposalStatus::VotingPeriod, ProposalStatus::Rejected]);

        let res = poll_for_proposal_status(
            &chain,
            10,
            30,
            &proposal_id(),
            ProposalStatus::Passed,
            INTERVAL,
        );

        let message = res.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("PROPOSAL_STATUS_REJECTED"), "{message}");
    }

    #[test]
    fn regression_is_reported() {
        let chain = MockChain::new("onex-1", 10).with_statuses(&[
            ProposalStatus::VotingPeriod,
            ProposalStatus::DepositPeriod,
        ]);

        let res = poll_for_proposal_status(
            &chain,
            10,
            30,
            &proposal_id(),
            ProposalStatus::Passed,
            INTERVAL,
        );

        let message = res.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("regressed"), "{message}");
    }
}
