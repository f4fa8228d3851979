#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![doc = include_str!("../README.md")]

//!
//! ## Overview
//!
//! The framework brings up short lived networks made of the onomy provider
//! chain and its onex consumer chains, each node running in its own Docker
//! container, and links them with a relayer running in a container of its
//! own. Every test gets a private Docker network and data directory, so
//! tests can run in parallel.
//!
//! ## Example Test
//!
//! ```rust,no_run
//! use ics_test_framework::prelude::*;
//!
//! pub struct ExampleTest;
//!
//! pub fn example_test() -> Result<(), Error> {
//!     run_interchain_test(&ExampleTest)
//! }
//!
//! impl TestOverrides for ExampleTest {}
//!
//! impl InterchainTest for ExampleTest {
//!     fn run(&self, _config: &TestConfig, _network: &mut InterchainNetwork) -> Result<(), Error> {
//!         suspend()
//!     }
//! }
//! ```
//!
//! The runner builds the chains returned by the [`TestOverrides`](framework::overrides::TestOverrides)
//! of the test, bootstraps the provider and then every consumer, and creates
//! the CCV channel of each provider-consumer link before calling `run`. The
//! relayer loop is only started when the test asks for it with
//! [`Relayer::start_relayer`](relayer::Relayer::start_relayer).
//!
//! ## Running Tests
//!
//! The end to end tests live in the `ics-integration-test` crate and need
//! Docker and the chain images:
//!
//! ```bash
//! RUST_LOG=info RUST_BACKTRACE=1 \
//!     cargo test -p ics-integration-test --features docker -- --nocapture
//! ```
//!
//! Take a look at [`TestConfig`](types::config::TestConfig) for the
//! environment variables controlling a test run. With `HANG_ON_FAIL=1`, a
//! failing test is suspended instead of torn down, and the environment
//! written to `<test-dir>/interchain.env` can be sourced to interact with
//! the chains:
//!
//! ```bash
//! $ source data/test-1094235493/interchain.env
//! $ docker exec $ONOMY_1_VAL_0_CONTAINER onomyd query bank balances $ONOMY_1_WALLETS_FAUCET_ADDRESS
//! ```

pub mod bootstrap;
pub mod chain;
pub mod docker;
pub mod error;
pub mod framework;
pub mod prelude;
pub mod relayer;
pub mod types;
pub mod util;
