use std::collections::HashMap;
use tracing::{debug, warn};

use bollard::network::CreateNetworkOptions;

use crate::docker::{Docker, TEST_LABEL};
use crate::error::Error;
use crate::util::cancel::CancelToken;

/**
   A user defined bridge network shared by the nodes and the relayer of a
   single test. Containers on the network reach each other by container
   name.

   The network is removed when the value is dropped, which must happen
   after every container attached to it has been removed. Containers of
   the test run that are still around at that point are force removed
   first.
*/
#[derive(Debug)]
pub struct DockerNetwork {
    pub name: String,
    docker: Docker,
    owned: bool,
    removed: bool,
}

impl DockerNetwork {
    pub fn create(docker: &Docker, name: &str, cancel: &CancelToken) -> Result<Self, Error> {
        cancel.check("create network")?;

        let options = CreateNetworkOptions {
            name: name.to_string(),
            driver: "bridge".to_string(),
            labels: HashMap::from([(TEST_LABEL.to_string(), docker.run_id.clone())]),
            ..Default::default()
        };

        docker.block_on(docker.api().create_network(options))?;

        debug!("created docker network {}", name);

        Ok(Self {
            name: name.to_string(),
            docker: docker.clone(),
            owned: true,
            removed: false,
        })
    }

    /**
       Refer to a network that is managed outside of the test. It is left
       in place when the value is dropped.
    */
    pub fn existing(docker: &Docker, name: &str) -> Self {
        Self {
            name: name.to_string(),
            docker: docker.clone(),
            owned: false,
            removed: false,
        }
    }

    /// Whether the network is left in place for debugging when dropped.
    pub fn is_kept(&self) -> bool {
        self.docker.keep_containers || !self.owned
    }

    pub fn remove(&mut self) -> Result<(), Error> {
        if self.removed {
            return Ok(());
        }

        let leftover = self.docker.remove_run_containers()?;
        if leftover > 0 {
            warn!(
                "removed {} container(s) of network {} that were left behind",
                leftover, self.name
            );
        }

        self.docker
            .block_on(self.docker.api().remove_network(&self.name))?;

        self.removed = true;

        debug!("removed docker network {}", self.name);

        Ok(())
    }
}

impl Drop for DockerNetwork {
    fn drop(&mut self) {
        if self.is_kept() {
            return;
        }

        if let Err(e) = self.remove() {
            warn!("failed to remove docker network {}: {}", self.name, e);
        }
    }
}
