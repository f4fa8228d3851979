/*!
   Implementation of [`ChainDriver`].
*/

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::chain::config::{GRPC_PORT, P2P_PORT, RPC_PORT};
use crate::chain::descriptor::{ChainConfig, DockerImage};
use crate::docker::container::{
    run_oneshot, write_file_oneshot, Container, ContainerSpec, ExecOutput,
};
use crate::docker::Docker;
use crate::error::Error;
use crate::types::env::{EnvWriter, ExportEnv};
use crate::util::cancel::CancelToken;

/**
    A driver for interacting with a chain node running inside a Docker
    container through the chain's command line.

    Before the node is started, commands run in one-shot containers that
    mount the node home. Once started, commands are executed inside the
    running node container.
*/
#[derive(Debug)]
pub struct ChainDriver {
    /// Name of the chain variant, e.g. `onomy`.
    pub chain_name: String,

    pub chain_id: String,

    /// Name of the node within its chain, e.g. `val-0`.
    pub node_name: String,

    /// Name of the chain binary inside the image. Defaults to `onomyd`.
    pub command_path: String,

    /// Host directory bind mounted as the node home.
    pub home_path: PathBuf,

    /// Path of the node home inside the container.
    pub container_home: String,

    /// Name of the node container, also its host name on the network.
    pub container_name: String,

    pub account_prefix: String,

    pub denom: String,

    pub gas_prices: String,

    pub gas_adjustment: f64,

    pub docker: Docker,

    pub cancel: CancelToken,

    pub image: DockerImage,

    container: Option<Container>,
}

impl ExportEnv for ChainDriver {
    fn export_env(&self, writer: &mut impl EnvWriter) {
        writer.write_env("CMD", &self.command_path);
        writer.write_env("HOME", &self.home_path.display().to_string());
        writer.write_env("CONTAINER", &self.container_name);
        writer.write_env("CONTAINER_HOME", &self.container_home);
        writer.write_env("RPC_ADDR", &self.rpc_address());
        writer.write_env("GRPC_ADDR", &self.grpc_address());
    }
}

impl ChainDriver {
    pub fn create(
        config: &ChainConfig,
        node_name: &str,
        test_name: &str,
        chain_store_dir: &Path,
        docker: &Docker,
        cancel: &CancelToken,
    ) -> Result<Self, Error> {
        let home_path = chain_store_dir.join(&config.chain_id).join(node_name);

        Ok(Self {
            chain_name: config.name.clone(),
            chain_id: config.chain_id.clone(),
            node_name: node_name.to_string(),
            command_path: config.bin.clone(),
            home_path,
            container_home: config.container_home(),
            container_name: format!("{}-{}-{}", config.chain_id, node_name, test_name),
            account_prefix: config.bech32_prefix.clone(),
            denom: config.denom.clone(),
            gas_prices: config.gas_prices.clone(),
            gas_adjustment: config.gas_adjustment,
            docker: docker.clone(),
            cancel: cancel.clone(),
            image: config.image()?.clone(),
            container: None,
        })
    }

    /**
       Returns the RPC address as seen from inside the node container,
       used by the chain CLI.
    */
    pub fn rpc_listen_address(&self) -> String {
        format!("tcp://localhost:{}", RPC_PORT)
    }

    /// Returns the full URL for the RPC address on the test network.
    pub fn rpc_address(&self) -> String {
        format!("http://{}:{}", self.container_name, RPC_PORT)
    }

    /// Returns the full URL for the WebSocket address on the test network.
    pub fn websocket_address(&self) -> String {
        format!("ws://{}:{}/websocket", self.container_name, RPC_PORT)
    }

    /// Returns the full URL for the GRPC address on the test network.
    pub fn grpc_address(&self) -> String {
        format!("http://{}:{}", self.container_name, GRPC_PORT)
    }

    /// Returns the `<node-id>@<host>:<port>` address used for peering.
    pub fn p2p_address(&self, node_id: &str) -> String {
        format!("{}@{}:{}", node_id, self.container_name, P2P_PORT)
    }

    /**
       Run the chain binary with the given arguments, either inside the
       running node container or in a one-shot container.
    */
    pub fn exec_bin(&self, desc: &str, args: &[&str]) -> Result<ExecOutput, Error> {
        self.exec_program(desc, &self.command_path, args)
    }

    /// Run an arbitrary program of the node image against the node home.
    pub fn exec_program(
        &self,
        desc: &str,
        program: &str,
        args: &[&str],
    ) -> Result<ExecOutput, Error> {
        let desc = format!("{} on {}", desc, self.container_name);

        let mut full_args = vec![program];
        full_args.extend_from_slice(args);

        match &self.container {
            Some(container) => container.exec(&desc, &full_args, &self.cancel),
            None => run_oneshot(
                &self.docker,
                &desc,
                &self.home_spec(),
                &full_args,
                &self.cancel,
            ),
        }
    }

    /**
       Write a file at `container_path` below the node home. The file is
       written from a one-shot container, which sees the same home as the
       node container through the bind mount.
    */
    pub fn write_home_file(&self, container_path: &str, content: &str) -> Result<(), Error> {
        write_file_oneshot(
            &self.docker,
            &self.home_spec(),
            container_path,
            content,
            &self.cancel,
        )
    }

    /**
       Create the host directory of the node home and hand it over to the
       user the image runs as.
    */
    pub fn prepare_home(&self) -> Result<(), Error> {
        fs::create_dir_all(&self.home_path)?;

        run_oneshot(
            &self.docker,
            "prepare node home",
            &self.home_spec().user("0:0"),
            &["chown", "-R", self.image.uid_gid.as_str(), self.container_home.as_str()],
            &self.cancel,
        )?;

        Ok(())
    }

    fn home_spec(&self) -> ContainerSpec {
        ContainerSpec::new(&self.image).mount(&self.home_path, &self.container_home)
    }

    /**
       Start the node container, running `<bin> start` in the foreground of
       the container.
    */
    pub fn start(&mut self, network: &str) -> Result<(), Error> {
        if self.container.is_some() {
            return Ok(());
        }

        let spec = self
            .home_spec()
            .name(&self.container_name)
            .network(network)
            .entrypoint(&self.command_path)
            .command(&["start", "--home", self.container_home.as_str()]);

        let container = Container::run_detached(&self.docker, &spec, &self.cancel)?;

        info!(
            "started node {} of chain {} from image {}",
            self.node_name, self.chain_id, self.image
        );

        self.container = Some(container);

        Ok(())
    }

    /**
       Stop and remove the node container. The node home is kept, so the
       node can be started again from the same state.
    */
    pub fn stop(&mut self) -> Result<(), Error> {
        if let Some(mut container) = self.container.take() {
            container.stop(&self.cancel)?;

            if let Ok(logs) = container.logs() {
                let log_path = self.log_path();
                if let Err(e) = fs::write(&log_path, logs) {
                    debug!("failed to save logs to {}: {}", log_path.display(), e);
                }
            }

            container.remove()?;
        }

        Ok(())
    }

    /// Swap the image version used the next time the node is started.
    pub fn set_image_version(&mut self, version: &str) {
        self.image = self.image.with_version(version);
    }

    /// Host file that receives the node logs when the node is stopped.
    pub fn log_path(&self) -> PathBuf {
        self.home_path.with_extension("log")
    }
}
