/*!
   Management of the Docker resources of a test: the isolated network and
   the chain and relayer containers attached to it.

   Containers are started with `testcontainers`. Commands in them, the
   network, image pulls and the cleanup of containers left behind by an
   aborted build go through the Docker API with `bollard`.

   Every operation checks the [`CancelToken`] of the build before it is
   sent to Docker. Commands running in a container are also abandoned as
   soon as the token is cancelled.
*/

pub mod container;
pub mod network;

use core::fmt::{self, Debug};
use core::future::Future;
use futures_util::TryStreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use bollard::container::{ListContainersOptions, RemoveContainerOptions};
use bollard::image::CreateImageOptions;

use crate::chain::descriptor::DockerImage;
use crate::error::Error;
use crate::util::cancel::CancelToken;

/// Label attached to every network and container created by a test run.
pub const TEST_LABEL: &str = "ics-test";

/**
   Handle to the Docker daemon, shared by every component of a test run.
   Cloning the handle is cheap.
*/
#[derive(Clone)]
pub struct Docker {
    api: bollard::Docker,

    runtime: Arc<Runtime>,

    /// Value of the [`TEST_LABEL`] of everything created by this run.
    pub run_id: String,

    /// Leave containers and networks in place when they are dropped.
    pub keep_containers: bool,
}

impl Debug for Docker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Docker")
            .field("run_id", &self.run_id)
            .field("keep_containers", &self.keep_containers)
            .finish_non_exhaustive()
    }
}

impl Docker {
    /**
       Connect to the local Docker daemon. No request is made until the
       first operation, so this succeeds without a running daemon.
    */
    pub fn connect(run_id: &str, keep_containers: bool) -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let api = {
            let _guard = runtime.enter();
            bollard::Docker::connect_with_local_defaults()?
        };

        Ok(Self {
            api,
            runtime: Arc::new(runtime),
            run_id: run_id.to_string(),
            keep_containers,
        })
    }

    pub(crate) fn api(&self) -> &bollard::Docker {
        &self.api
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// The `key=value` label selecting the resources of this run.
    pub fn run_label(&self) -> String {
        format!("{}={}", TEST_LABEL, self.run_id)
    }

    /**
       Make sure the image is available locally, pulling it only when it
       cannot be found. Images built locally, such as `onex:local`, are
       therefore never pulled.
    */
    pub fn ensure_image(&self, image: &DockerImage, cancel: &CancelToken) -> Result<(), Error> {
        cancel.check("inspect image")?;

        let reference = image.reference();

        if self.block_on(self.api.inspect_image(&reference)).is_ok() {
            debug!("docker image {} is available locally", reference);
            return Ok(());
        }

        cancel.check("pull image")?;

        info!("pulling docker image {}", reference);

        let options = CreateImageOptions {
            from_image: image.repository.clone(),
            tag: image.version.clone(),
            ..Default::default()
        };

        self.block_on(
            self.api
                .create_image(Some(options), None, None)
                .try_collect::<Vec<_>>(),
        )?;

        Ok(())
    }

    /// IDs of every container, running or not, labelled for this run.
    pub fn run_containers(&self) -> Result<Vec<String>, Error> {
        let options = ListContainersOptions {
            all: true,
            filters: run_filters(&self.run_label()),
            ..Default::default()
        };

        let containers = self.block_on(self.api.list_containers(Some(options)))?;

        Ok(containers
            .into_iter()
            .filter_map(|container| container.id)
            .collect())
    }

    /**
       Force remove every container labelled for this run. These are the
       containers that no [`Container`](container::Container) value owns
       anymore, such as one whose start was interrupted by a cancellation.
    */
    pub fn remove_run_containers(&self) -> Result<usize, Error> {
        let containers = self.run_containers()?;

        for id in &containers {
            let options = RemoveContainerOptions {
                force: true,
                v: true,
                ..Default::default()
            };

            self.block_on(self.api.remove_container(id, Some(options)))?;

            debug!("removed leftover container {}", id);
        }

        Ok(containers.len())
    }
}

fn run_filters(label: &str) -> HashMap<String, Vec<String>> {
    HashMap::from([("label".to_string(), vec![label.to_string()])])
}
