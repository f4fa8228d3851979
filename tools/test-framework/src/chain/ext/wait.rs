/*!
   Blocking waits on the block height of running chains.
*/

use core::time::Duration;
use std::thread::sleep;
use std::time::Instant;
use tracing::{debug, trace};

use crate::chain::handle::ChainHandle;
use crate::error::{Error, ErrorDetail};

/**
   Block until every chain in `chains` has advanced its height by `delta`
   blocks from the height observed when this function is called.

   Fails with [`Error::height_timeout`] if any chain does not reach its
   target height within `timeout`.
*/
pub fn wait_for_blocks(
    delta: u64,
    chains: &[&dyn ChainHandle],
    timeout: Duration,
    interval: Duration,
) -> Result<(), Error> {
    let deadline = Instant::now() + timeout;

    let mut targets = Vec::with_capacity(chains.len());
    for chain in chains {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let height = wait_for_chain_height(*chain, 0, remaining, interval)?;
        targets.push((*chain, height + delta));
    }

    for (chain, target) in targets {
        let remaining = deadline.saturating_duration_since(Instant::now());
        wait_for_chain_height(chain, target, remaining, interval)?;
    }

    Ok(())
}

/**
   Block until `chain` reaches at least `target` and return the observed
   height. Returns immediately if the target was already reached.

   A failing height query counts as the chain not being ready yet: a node
   that was just started refuses RPC connections for a while. The last
   failure is reported if the target is not reached within `timeout`.
   Cancellation is never retried.
*/
pub fn wait_for_chain_height(
    chain: &dyn ChainHandle,
    target: u64,
    timeout: Duration,
    interval: Duration,
) -> Result<u64, Error> {
    let deadline = Instant::now() + timeout;
    let mut last_observed = "no height query succeeded".to_string();

    loop {
        match chain.height() {
            Ok(height) if height >= target => {
                debug!("chain {} reached height {}", chain.chain_id(), height);
                return Ok(height);
            }
            Ok(height) => {
                trace!(
                    "chain {} at height {}, waiting for {}",
                    chain.chain_id(),
                    height,
                    target
                );

                last_observed = format!("last observed height was {}", height);
            }
            Err(e) => {
                if let ErrorDetail::Cancelled(_) = e.detail() {
                    return Err(e);
                }

                trace!("chain {} is not ready yet: {}", chain.chain_id(), e);

                last_observed = format!("last height query failed: {}", e);
            }
        }

        if Instant::now() >= deadline {
            return Err(Error::height_timeout(
                chain.chain_id().to_string(),
                target,
                last_observed,
            ));
        }

        sleep(interval);
    }
}
