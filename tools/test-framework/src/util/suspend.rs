/*!
   Utilities to suspend a failed test, so that the chains and the relayer
   it spawned can still be inspected.
*/

use core::time::Duration;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::thread::sleep;
use tracing::{error, warn};

use crate::error::Error;

/**
   Call this function in the middle of a test code of interest,
   so that we can suspend the test and still interact with the
   spawned chains and relayer for debugging.
*/
pub fn suspend<R>() -> R {
    warn!("suspending the test indefinitely. you can still interact with any spawned chains and relayers");

    loop {
        sleep(Duration::from_secs(999_999_999))
    }
}

/**
   Run `cont` and suspend the test if it fails or panics while
   `hang_on_fail` is set. The environment exported to `env_path` can be
   sourced to interact with the suspended network.
*/
pub fn hang_on_error<R>(
    hang_on_fail: bool,
    env_path: &str,
    cont: impl FnOnce() -> Result<R, Error>,
) -> Result<R, Error> {
    let result = catch_unwind(AssertUnwindSafe(cont));

    match result {
        Err(e) => {
            if hang_on_fail {
                error!(
                    "test panicked with HANG_ON_FAIL=1, suspending the test. source {} to interact with the network",
                    env_path
                );
                suspend()
            } else {
                error!("test panicked. set HANG_ON_FAIL=1 to suspend the test on failure for debugging.");
                resume_unwind(e)
            }
        }
        Ok(Err(e)) => {
            if hang_on_fail {
                error!(
                    "test failure occured with HANG_ON_FAIL=1, suspending the test. source {} to interact with the network: {:?}",
                    env_path, e
                );
                suspend()
            } else {
                error!("test failure occured. set HANG_ON_FAIL=1 to suspend the test on failure for debugging: {:?}", e);
                Err(e)
            }
        }
        Ok(Ok(res)) => Ok(res),
    }
}
