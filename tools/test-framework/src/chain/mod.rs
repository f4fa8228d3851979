/*!
   Constructs for spawning and managing the containerized nodes of a
   Cosmos SDK chain.

   Chains are described by a [`ChainConfig`](descriptor::ChainConfig),
   usually taken from [`presets`], and driven through the command line of
   the chain binary running inside each node container.
*/

pub mod cli;
pub mod config;
pub mod cosmos;
pub mod descriptor;
pub mod driver;
pub mod encoding;
pub mod ext;
pub mod genesis;
pub mod handle;
pub mod presets;

#[cfg(test)]
pub mod mock;
