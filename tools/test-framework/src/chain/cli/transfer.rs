/*!
   Methods for performing local token transfers on a chain.
*/

use crate::chain::cli::query::query_tx_hash;
use crate::chain::cli::tx_args;
use crate::chain::driver::ChainDriver;
use crate::error::Error;

pub fn local_transfer_token(
    driver: &ChainDriver,
    sender: &str,
    recipient: &str,
    token: &str,
) -> Result<(), Error> {
    let mut args = vec!["tx", "bank", "send", sender, recipient, token];

    let tx_args = tx_args(driver, sender);
    args.extend(tx_args.iter().map(String::as_str));

    let output = driver.exec_bin("bank send", &args)?;

    query_tx_hash(driver, &output.stdout)?;

    Ok(())
}
