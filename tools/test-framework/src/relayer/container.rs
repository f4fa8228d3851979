/*!
   The container that hosts the relayer CLI and the relayer loop.
*/

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::chain::descriptor::DockerImage;
use crate::docker::container::{
    run_oneshot, write_file_oneshot, Container, ContainerSpec, ExecOutput,
};
use crate::docker::Docker;
use crate::error::Error;
use crate::relayer::{RelayerImpl, RELAYER_LOG_FILE};
use crate::util::cancel::CancelToken;
use crate::util::random::sanitize_name;

/// Path inside the container where the relayer home is mounted.
pub const RELAYER_CONTAINER_HOME: &str = "/var/relayer";

/**
   A relayer container idling on the test network. Commands are run in it
   with `docker exec`, and the relayer home is bind mounted from the test
   directory so that it survives the container.
*/
#[derive(Debug)]
pub struct RelayerContainer {
    pub implementation: RelayerImpl,

    /// Host directory mounted as the relayer home.
    pub home_path: PathBuf,

    pub cancel: CancelToken,

    docker: Docker,

    image: DockerImage,

    container: Container,

    loop_running: bool,
}

impl RelayerContainer {
    pub fn start(
        implementation: RelayerImpl,
        image: &DockerImage,
        test_name: &str,
        home_path: &Path,
        docker: &Docker,
        network: &str,
        cancel: &CancelToken,
    ) -> Result<Self, Error> {
        fs::create_dir_all(home_path)?;

        let home_spec = ContainerSpec::new(image).mount(home_path, RELAYER_CONTAINER_HOME);

        run_oneshot(
            docker,
            "prepare relayer home",
            &home_spec.clone().user("0:0"),
            &["chown", "-R", image.uid_gid.as_str(), RELAYER_CONTAINER_HOME],
            cancel,
        )?;

        let spec = home_spec
            .name(&format!(
                "{}-relayer-{}",
                implementation,
                sanitize_name(test_name)
            ))
            .network(network)
            .env("HOME", RELAYER_CONTAINER_HOME)
            .idle();

        let container = Container::run_detached(docker, &spec, cancel)?;

        info!("started {} relayer container {}", implementation, container.name);

        Ok(Self {
            implementation,
            home_path: home_path.to_path_buf(),
            cancel: cancel.clone(),
            docker: docker.clone(),
            image: image.clone(),
            container,
            loop_running: false,
        })
    }

    pub fn container_name(&self) -> &str {
        &self.container.name
    }

    /// Run the relayer binary with the given arguments.
    pub fn exec(&self, desc: &str, args: &[&str]) -> Result<ExecOutput, Error> {
        let mut full_args = vec![self.implementation.as_str()];
        full_args.extend_from_slice(args);

        let output = self.container.exec(desc, &full_args, &self.cancel)?;

        debug!("{} output: {}", desc, output.stdout.trim());

        Ok(output)
    }

    /// Write a file at a path relative to the relayer home.
    pub fn write_file(&self, file_path: &str, content: &str) -> Result<String, Error> {
        let full_path = format!("{}/{}", RELAYER_CONTAINER_HOME, file_path);

        let spec = ContainerSpec::new(&self.image).mount(&self.home_path, RELAYER_CONTAINER_HOME);

        write_file_oneshot(&self.docker, &spec, &full_path, content, &self.cancel)?;

        Ok(full_path)
    }

    /**
       Run the relayer loop in the background of the container, with its
       output written to the relayer home. A relayer loop that is already
       running is stopped first.
    */
    pub fn spawn(&mut self, args: &[&str]) -> Result<(), Error> {
        self.kill()?;

        let log_file = format!("{}/{}", RELAYER_CONTAINER_HOME, RELAYER_LOG_FILE);

        let mut full_args = vec![
            "sh",
            "-c",
            r#"log="$0"; shift; nohup "$@" > "$log" 2>&1 &"#,
            log_file.as_str(),
            "-",
            self.implementation.as_str(),
        ];
        full_args.extend_from_slice(args);

        self.container
            .exec("start relayer loop", &full_args, &self.cancel)?;

        info!(
            "started {} relayer loop with output at {}",
            self.implementation,
            self.home_path.join(RELAYER_LOG_FILE).display()
        );

        self.loop_running = true;

        Ok(())
    }

    pub fn kill(&mut self) -> Result<(), Error> {
        if self.loop_running {
            self.container.exec(
                "stop relayer loop",
                &["sh", "-c", r#"pkill -f "^$0 " || true"#, self.implementation.as_str()],
                &self.cancel,
            )?;

            self.loop_running = false;

            info!("stopped {} relayer loop", self.implementation);
        }

        Ok(())
    }
}
