use core::fmt::{self, Debug};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use bollard::container::LogOutput;
use bollard::exec::{CreateExecOptions, StartExecResults};
use testcontainers::core::Mount as BindMount;
use testcontainers::runners::SyncRunner;
use testcontainers::{Container as RunningContainer, GenericImage, ImageExt};

use crate::chain::descriptor::DockerImage;
use crate::docker::{Docker, TEST_LABEL};
use crate::error::Error;
use crate::util::cancel::CancelToken;

/// Where [`ContainerSpec::file`] contents are placed in a container.
const INPUT_DIR: &str = "/tmp/ics-input";

pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A host directory bind mounted into a container.
#[derive(Debug, Clone)]
pub struct Mount {
    pub host_path: PathBuf,
    pub container_path: String,
}

/**
   Everything needed to start a container.
*/
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub image: DockerImage,
    pub name: Option<String>,
    pub network: Option<String>,
    /// Overrides the `UID:GID` of the image.
    pub user: Option<String>,
    pub mounts: Vec<Mount>,
    pub entrypoint: Option<String>,
    pub command: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Files copied into the container before it starts.
    pub files: Vec<(String, Vec<u8>)>,
}

impl ContainerSpec {
    pub fn new(image: &DockerImage) -> Self {
        Self {
            image: image.clone(),
            name: None,
            network: None,
            user: None,
            mounts: Vec::new(),
            entrypoint: None,
            command: Vec::new(),
            env: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn network(mut self, network: &str) -> Self {
        self.network = Some(network.to_string());
        self
    }

    pub fn user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn mount(mut self, host_path: &Path, container_path: &str) -> Self {
        self.mounts.push(Mount {
            host_path: host_path.to_path_buf(),
            container_path: container_path.to_string(),
        });
        self
    }

    pub fn entrypoint(mut self, entrypoint: &str) -> Self {
        self.entrypoint = Some(entrypoint.to_string());
        self
    }

    pub fn command<S: AsRef<str>>(mut self, command: &[S]) -> Self {
        self.command = command.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /**
       Copy `content` into the container under `file_name` before it
       starts, and return the path of the file inside the container.
    */
    pub fn file(&mut self, file_name: &str, content: &[u8]) -> String {
        let path = format!("{}/{}", INPUT_DIR, file_name);
        self.files.push((path.clone(), content.to_vec()));
        path
    }

    /// Keep the container idle, so that commands can be exec'ed in it.
    pub fn idle(self) -> Self {
        self.entrypoint("tail").command(&["-f", "/dev/null"])
    }

    /// The user the container processes run as.
    pub fn effective_user(&self) -> &str {
        self.user.as_deref().unwrap_or(&self.image.uid_gid)
    }

    fn start(&self, docker: &Docker) -> Result<RunningContainer<GenericImage>, Error> {
        let mut image =
            GenericImage::new(self.image.repository.clone(), self.image.version.clone());

        if let Some(entrypoint) = &self.entrypoint {
            image = image.with_entrypoint(entrypoint);
        }

        let mut request = image
            .with_cmd(self.command.clone())
            .with_user(self.effective_user())
            .with_labels([(TEST_LABEL, docker.run_id.as_str())]);

        if let Some(name) = &self.name {
            request = request.with_container_name(name.clone());
        }

        if let Some(network) = &self.network {
            request = request.with_network(network.clone());
        }

        for mount in &self.mounts {
            request = request.with_mount(BindMount::bind_mount(
                mount.host_path.display().to_string(),
                mount.container_path.clone(),
            ));
        }

        for (key, value) in &self.env {
            request = request.with_env_var(key.clone(), value.clone());
        }

        for (path, content) in &self.files {
            request = request.with_copy_to(path.clone(), content.clone());
        }

        Ok(request.start()?)
    }
}

/**
   Run `args` to completion in a short lived container started from
   `spec` and return their output. The container is removed afterwards.
*/
pub fn run_oneshot(
    docker: &Docker,
    desc: &str,
    spec: &ContainerSpec,
    args: &[&str],
    cancel: &CancelToken,
) -> Result<ExecOutput, Error> {
    let mut container = Container::run_detached(docker, &spec.clone().idle(), cancel)?;

    let output = container.exec(desc, args, cancel);

    container.remove()?;

    output
}

/**
   Write `content` to `path` in a short lived container started from
   `spec`, typically on a mounted home directory. Missing parent
   directories are created.
*/
pub fn write_file_oneshot(
    docker: &Docker,
    spec: &ContainerSpec,
    path: &str,
    content: &str,
    cancel: &CancelToken,
) -> Result<(), Error> {
    let mut spec = spec.clone();
    let input = spec.file("content", content.as_bytes());

    run_oneshot(
        docker,
        "write file",
        &spec,
        &[
            "sh",
            "-c",
            r#"mkdir -p "$(dirname "$1")" && cp "$0" "$1""#,
            input.as_str(),
            path,
        ],
        cancel,
    )?;

    Ok(())
}

/**
   A running container. The container is removed when the value is
   dropped, unless the [`Docker`] handle keeps containers.
*/
pub struct Container {
    pub name: String,
    docker: Docker,
    inner: Option<RunningContainer<GenericImage>>,
    keep: bool,
}

impl Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("running", &self.inner.is_some())
            .field("keep", &self.keep)
            .finish()
    }
}

impl Container {
    pub fn run_detached(
        docker: &Docker,
        spec: &ContainerSpec,
        cancel: &CancelToken,
    ) -> Result<Self, Error> {
        cancel.check("start container")?;

        let inner = spec.start(docker)?;

        let name = spec.name.clone().unwrap_or_else(|| inner.id().to_string());

        debug!("started container {} from {}", name, spec.image);

        Ok(Self {
            name,
            docker: docker.clone(),
            inner: Some(inner),
            keep: docker.keep_containers,
        })
    }

    fn inner(&self) -> Result<&RunningContainer<GenericImage>, Error> {
        self.inner
            .as_ref()
            .ok_or_else(|| eyre::eyre!("container {} was removed", self.name).into())
    }

    /**
       Run `args` in the container and wait for them to exit. If `cancel`
       fires while the command runs, the wait is abandoned and
       [`Error::cancelled`] is returned.
    */
    pub fn exec(
        &self,
        desc: &str,
        args: &[&str],
        cancel: &CancelToken,
    ) -> Result<ExecOutput, Error> {
        cancel.check(desc)?;

        let command = itertools::join(args, " ");

        debug!("Executing command for {} in {}: {}", desc, self.name, command);

        let id = self.inner()?.id().to_string();

        let (stdout, stderr, exit_code) = self.docker.block_on(async {
            tokio::select! {
                output = exec_attached(&self.docker, &id, args) => output,
                () = cancel.cancelled() => Err(Error::cancelled(desc.to_string())),
            }
        })?;

        match exit_code {
            Some(0) => {
                trace!(
                    "command executed successfully with stdout: {}, stderr: {}",
                    stdout,
                    stderr
                );

                Ok(ExecOutput { stdout, stderr })
            }
            code => Err(Error::command(
                command,
                code.and_then(|code| i32::try_from(code).ok()),
                stderr,
            )),
        }
    }

    pub fn stop(&self, cancel: &CancelToken) -> Result<(), Error> {
        cancel.check("stop container")?;

        self.inner()?.stop()?;

        Ok(())
    }

    /// Combined stdout and stderr of the container so far.
    pub fn logs(&self) -> Result<String, Error> {
        let inner = self.inner()?;

        let stdout = inner.stdout_to_vec()?;
        let stderr = inner.stderr_to_vec()?;

        Ok(format!(
            "{}{}",
            String::from_utf8_lossy(&stdout),
            String::from_utf8_lossy(&stderr)
        ))
    }

    /// Remove the container now, even if containers are kept.
    pub fn remove(&mut self) -> Result<(), Error> {
        if let Some(inner) = self.inner.take() {
            inner.rm()?;
        }

        Ok(())
    }
}

/// Run `args` in container `id`, collecting their output and exit code.
async fn exec_attached(
    docker: &Docker,
    id: &str,
    args: &[&str],
) -> Result<(String, String, Option<i64>), Error> {
    let options = CreateExecOptions {
        cmd: Some(args.iter().map(|arg| arg.to_string()).collect::<Vec<String>>()),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        ..Default::default()
    };

    let exec = docker.api().create_exec(id, options).await?;

    let mut stdout = String::new();
    let mut stderr = String::new();

    if let StartExecResults::Attached { mut output, .. } =
        docker.api().start_exec(&exec.id, None).await?
    {
        while let Some(chunk) = output.next().await {
            match chunk? {
                LogOutput::StdOut { message } => {
                    stdout.push_str(&String::from_utf8_lossy(&message))
                }
                LogOutput::StdErr { message } => {
                    stderr.push_str(&String::from_utf8_lossy(&message))
                }
                _ => {}
            }
        }
    }

    let exit_code = docker.api().inspect_exec(&exec.id).await?.exit_code;

    Ok((stdout, stderr, exit_code))
}

impl Drop for Container {
    fn drop(&mut self) {
        // with `TESTCONTAINERS_COMMAND=keep`, dropping the handle leaves
        // the container in place
        if self.keep {
            return;
        }

        if let Err(e) = self.remove() {
            warn!("failed to remove container {}: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_spec_keeps_mounts_and_user() {
        let image = DockerImage::new("onomy", "v1.1.4", "1025:1025");

        let spec = ContainerSpec::new(&image)
            .mount(Path::new("/tmp/home"), "/var/cosmos-chain/onomy")
            .entrypoint("onomyd")
            .command(&["start"])
            .idle();

        assert_eq!(spec.entrypoint.as_deref(), Some("tail"));
        assert_eq!(spec.command, vec!["-f", "/dev/null"]);
        assert_eq!(spec.effective_user(), "1025:1025");
        assert_eq!(spec.mounts[0].container_path, "/var/cosmos-chain/onomy");
    }

    #[test]
    fn copied_files_land_in_the_input_directory() {
        let image = DockerImage::new("onex", "local", "1025:1025");

        let mut spec = ContainerSpec::new(&image).user("0:0");
        let path = spec.file("genesis.json", b"{}");

        assert_eq!(path, "/tmp/ics-input/genesis.json");
        assert_eq!(spec.files, vec![(path, b"{}".to_vec())]);
        assert_eq!(spec.effective_user(), "0:0");
    }
}
