/*!
   Functions for initializing each test at the beginning of a Rust test
   session.
*/

use core::time::Duration;
use eyre::eyre;
use std::env;
use std::fs;
use std::io::IsTerminal;
use std::sync::Once;
use tracing::warn;
use tracing_subscriber::{
    self as ts,
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::chain::descriptor::DockerImage;
use crate::error::Error;
use crate::relayer::RelayerImpl;
use crate::types::config::TestConfig;
use crate::util::random::random_u32;

static INIT: Once = Once::new();

const DEFAULT_BLOCK_WAIT_TIMEOUT_SECS: u64 = 120;

const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 500;

/**
   Initialize the test with a global logger and error handlers,
   read the environment variables and return a [`TestConfig`].
*/
pub fn init_test() -> Result<TestConfig, Error> {
    let no_color_log = env_flag("NO_COLOR_LOG");

    INIT.call_once(|| {
        if std::io::stderr().is_terminal() && !no_color_log {
            if let Err(e) = color_eyre::install() {
                eprintln!("failed to install color-eyre: {e}");
            }
        }
        install_logger(!no_color_log);
    });

    let base_chain_store_dir = env::var("CHAIN_STORE_DIR").unwrap_or_else(|_| "data".to_string());

    let chain_store_dir = format!("{}/test-{}", base_chain_store_dir, random_u32());

    fs::create_dir_all(&chain_store_dir)?;

    let chain_store_dir = fs::canonicalize(chain_store_dir)?;

    let relayer: RelayerImpl = match env::var("RELAYER") {
        Ok(name) => name.parse()?,
        Err(_) => RelayerImpl::default(),
    };

    let relayer_image = match env::var("RELAYER_IMAGE") {
        Ok(image) => {
            let image: DockerImage = image.parse()?;
            // the UID:GID of the default image still applies when only the
            // repository and version are given
            DockerImage {
                uid_gid: relayer.default_image().uid_gid,
                ..image
            }
        }
        Err(_) => relayer.default_image(),
    };

    let upgrade_version = env::var("UPGRADE_VERSION")
        .ok()
        .filter(|version| !version.is_empty());

    let block_wait_timeout = Duration::from_secs(
        env_number("BLOCK_WAIT_TIMEOUT_SECS")?.unwrap_or(DEFAULT_BLOCK_WAIT_TIMEOUT_SECS),
    );

    let poll_interval = Duration::from_millis(
        env_number("POLL_INTERVAL_MILLIS")?.unwrap_or(DEFAULT_POLL_INTERVAL_MILLIS),
    );

    let build_timeout = env_number("BUILD_TIMEOUT_SECS")?.map(Duration::from_secs);

    let config = TestConfig {
        chain_store_dir,
        relayer,
        relayer_image,
        hang_on_fail: env_flag("HANG_ON_FAIL"),
        keep_containers: env_flag("KEEP_CONTAINERS"),
        upgrade_version,
        block_wait_timeout,
        poll_interval,
        build_timeout,
    };

    if config.keep_containers {
        // read by testcontainers, which then leaves containers in place
        // when their handles are dropped
        env::set_var("TESTCONTAINERS_COMMAND", "keep");
    }

    if config.hang_on_fail && config.keep_containers {
        warn!("both HANG_ON_FAIL and KEEP_CONTAINERS are set, containers are never removed");
    }

    Ok(config)
}

fn env_flag(name: &str) -> bool {
    env::var(name).ok().map(|val| val == "1").unwrap_or(false)
}

fn env_number(name: &str) -> Result<Option<u64>, Error> {
    match env::var(name) {
        Ok(val) => {
            let number = val
                .parse()
                .map_err(|e| eyre!("invalid value {} for ${}: {}", val, name, e))?;
            Ok(Some(number))
        }
        Err(_) => Ok(None),
    }
}

/**
   Install the [`tracing_subscriber`] logger handlers so that logs will
   be displayed during test.
*/
pub fn install_logger(with_color: bool) {
    // Use log level INFO by default if RUST_LOG is not set.
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let layer = ts::fmt::layer().with_ansi(with_color);

    ts::registry().with(env_filter).with(layer).init();
}
