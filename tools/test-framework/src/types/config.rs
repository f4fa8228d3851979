/*!
   Definition for the test configuration.
*/

use core::time::Duration;
use std::path::PathBuf;

use crate::chain::descriptor::DockerImage;
use crate::relayer::RelayerImpl;

/**
   The test configuration, loaded from the environment by
   [`init_test`](crate::bootstrap::init::init_test) and then passed
   explicitly to every component that needs it.
*/
#[derive(Debug, Clone)]
pub struct TestConfig {
    /**
       The directory where the node homes, relayer home and exported
       `.env` files of a test are stored.

       Defaults to `data/test-<random>`. Can be overridden with the
       `$CHAIN_STORE_DIR` environment variable, which sets the base
       directory.
    */
    pub chain_store_dir: PathBuf,

    /**
       Relayer implementation used to link the chains.
       Defaults to the Cosmos relayer. Overridden with `$RELAYER`.
    */
    pub relayer: RelayerImpl,

    /**
       Image of the relayer, in the form `repository:version`.
       Overridden with `$RELAYER_IMAGE`.
    */
    pub relayer_image: DockerImage,

    /**
       When set to true, the test will suspend instead of tearing down the
       network if it fails. Controlled by `$HANG_ON_FAIL=1`.
    */
    pub hang_on_fail: bool,

    /**
       Leave containers in place after the test finishes.
       Controlled by `$KEEP_CONTAINERS=1`.
    */
    pub keep_containers: bool,

    /**
       Chain image version used when upgrading nodes after a software
       upgrade proposal passed. Set with `$UPGRADE_VERSION`.
    */
    pub upgrade_version: Option<String>,

    /**
       Upper bound for every block height wait.
       Set in seconds with `$BLOCK_WAIT_TIMEOUT_SECS`.
    */
    pub block_wait_timeout: Duration,

    /// Interval between two height queries while waiting on a chain.
    pub poll_interval: Duration,

    /**
       Upper bound for the whole network build, after which every further
       Docker operation of the build is cancelled. Set in seconds with `$BUILD_TIMEOUT_SECS`.
    */
    pub build_timeout: Option<Duration>,
}
