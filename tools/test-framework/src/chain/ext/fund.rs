/*!
   Creation of funded test users.
*/

use core::time::Duration;
use tracing::info;

use crate::chain::handle::ChainHandle;
use crate::error::Error;
use crate::types::token::{balance_of, Token};
use crate::types::wallet::Wallet;
use crate::util::random::{random_string, sanitize_name};
use crate::util::retry::assert_eventually_succeed;

/**
   Number of times to query the balance of a newly funded user before
   giving up, with [`FUND_WAIT_INTERVAL`] between attempts.
*/
const FUND_WAIT_ATTEMPTS: u16 = 60;

const FUND_WAIT_INTERVAL: Duration = Duration::from_secs(1);

/**
   Create one user per chain, funded with `amount` of the chain's
   denomination from the chain's faucet. Returns the users in the order of
   `chains`, once every balance is visible on chain.

   Key names are `<test-name>-<chain-name>-<random>`, so that calling this
   several times within a test creates distinct users.
*/
pub fn get_and_fund_test_users(
    test_name: &str,
    amount: u128,
    chains: &[&dyn ChainHandle],
) -> Result<Vec<Wallet>, Error> {
    let mut users = Vec::with_capacity(chains.len());

    for chain in chains {
        let config = chain.config();

        let key_name = format!(
            "{}-{}-{}",
            sanitize_name(test_name),
            config.name,
            random_string(3)
        );

        let user = chain.create_key(&key_name)?;
        let token = Token::new(config.denom.clone(), amount);

        chain.send_funds(chain.faucet()?.key_name(), user.formatted_address(), &token)?;

        assert_eventually_succeed(
            &format!("user {} is funded with {}", key_name, token),
            FUND_WAIT_ATTEMPTS,
            FUND_WAIT_INTERVAL,
            || {
                let balances = chain.all_balances(user.formatted_address())?;
                let balance = balance_of(&balances, &token.denom);

                if balance >= amount {
                    Ok(())
                } else {
                    Err(Error::assertion(format!(
                        "expected balance of at least {} but got {}{}",
                        token, balance, token.denom
                    )))
                }
            },
        )?;

        info!(
            "funded user {} on {} with {}",
            user.formatted_address(),
            chain.chain_id(),
            token
        );

        users.push(user);
    }

    Ok(users)
}
