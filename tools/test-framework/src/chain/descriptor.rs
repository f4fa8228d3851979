/*!
   Static descriptors of a chain variant: identity, binary, denomination,
   gas parameters, genesis overrides and the container images to run.

   Values of these types are plain data. They are built by the functions in
   [`presets`](crate::chain::presets) and only validated for presence when
   the [`ChainFactory`](crate::bootstrap::chains::ChainFactory) uses them.
*/

use core::fmt::{self, Display};
use core::str::FromStr;
use eyre::eyre;

use crate::chain::encoding::EncodingConfig;
use crate::chain::genesis::GenesisOverride;
use crate::error::Error;
use crate::types::token::Token;

/**
   Reference to a container image together with the user the chain binary
   runs as inside the container.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerImage {
    pub repository: String,
    pub version: String,
    /// `UID:GID` the container processes run as.
    pub uid_gid: String,
}

impl DockerImage {
    pub fn new(repository: &str, version: &str, uid_gid: &str) -> Self {
        Self {
            repository: repository.to_string(),
            version: version.to_string(),
            uid_gid: uid_gid.to_string(),
        }
    }

    /// The `repository:version` reference passed to Docker.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.version)
    }

    pub fn with_version(&self, version: &str) -> Self {
        Self {
            version: version.to_string(),
            ..self.clone()
        }
    }
}

impl Display for DockerImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference())
    }
}

/**
   Parses `repository[:version][@uid:gid]`. The version defaults to
   `latest` and the user to `1000:1000`. A colon that belongs to a registry
   port, such as in `localhost:5000/onomy`, is not taken as the version
   separator.
*/
impl FromStr for DockerImage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (image, uid_gid) = match s.split_once('@') {
            Some((image, uid_gid)) => (image, uid_gid),
            None => (s, "1000:1000"),
        };

        let last_slash = image.rfind('/').map(|i| i + 1).unwrap_or(0);

        let (repository, version) = match image[last_slash..].rfind(':') {
            Some(i) => (&image[..last_slash + i], &image[last_slash + i + 1..]),
            None => (image, "latest"),
        };

        if repository.is_empty() || version.is_empty() {
            return Err(eyre!("invalid docker image reference `{}`", s).into());
        }

        Ok(Self::new(repository, version, uid_gid))
    }
}

/**
   Amounts credited to every validator at genesis, and the part of it that
   is self-delegated by the validator's gentx.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisAmounts {
    pub genesis_amount: Token,
    pub self_delegation: Token,
}

/**
   A single key substitution in one of the TOML files under the node's
   `config/` directory, e.g. `config.toml` or `app.toml`.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFileOverride {
    pub file: String,
    /// Dotted key path, such as `consensus.timeout_commit`.
    pub key: String,
    pub value: toml::Value,
}

impl ConfigFileOverride {
    pub fn new(file: &str, key: &str, value: impl Into<toml::Value>) -> Self {
        Self {
            file: file.to_string(),
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/**
   Builds the encoding configuration of a chain variant. Stored as a plain
   function so that every chain factory run builds its own registry.
*/
pub type EncodingBuilder = fn() -> Result<EncodingConfig, Error>;

#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Name of the chain variant, e.g. `onomy`.
    pub name: String,

    pub chain_id: String,

    /// Container images; the first one is used to run the nodes.
    pub images: Vec<DockerImage>,

    /// Name of the chain binary inside the image, e.g. `onomyd`.
    pub bin: String,

    pub bech32_prefix: String,

    pub denom: String,

    pub coin_type: u32,

    /// Minimum gas prices, e.g. `0anom`.
    pub gas_prices: String,

    pub gas_adjustment: f64,

    /// Trusting period of light clients tracking this chain, e.g. `504h`.
    pub trusting_period: String,

    pub config_file_overrides: Vec<ConfigFileOverride>,

    pub genesis_overrides: Vec<GenesisOverride>,

    pub genesis_amounts: GenesisAmounts,

    pub encoding: EncodingBuilder,
}

impl ChainConfig {
    /// Path inside the node containers where the node home is mounted.
    pub fn container_home(&self) -> String {
        format!("/var/cosmos-chain/{}", self.name)
    }

    pub fn image(&self) -> Result<&DockerImage, Error> {
        self.images.first().ok_or_else(|| {
            Error::invalid_chain_config(self.name.clone(), "no container image configured".into())
        })
    }

    /// HD derivation path of keys created on this chain.
    pub fn hd_path(&self) -> String {
        format!("m/44'/{}'/0'/0/0", self.coin_type)
    }

    /**
       Check that every value the chain factory depends on is present.
    */
    pub fn validate(&self) -> Result<(), Error> {
        let missing = |field: &str| {
            Error::invalid_chain_config(self.name.clone(), format!("`{field}` must not be empty"))
        };

        if self.name.is_empty() {
            return Err(missing("name"));
        }
        if self.chain_id.is_empty() {
            return Err(missing("chain_id"));
        }
        if self.bin.is_empty() {
            return Err(missing("bin"));
        }
        if self.denom.is_empty() {
            return Err(missing("denom"));
        }
        if self.bech32_prefix.is_empty() {
            return Err(missing("bech32_prefix"));
        }

        let image = self.image()?;
        if image.repository.is_empty() || image.version.is_empty() {
            return Err(missing("images"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_image_references() -> Result<(), Error> {
        let image: DockerImage = "onomy:v1.1.4@1025:1025".parse()?;
        assert_eq!(image, DockerImage::new("onomy", "v1.1.4", "1025:1025"));

        let image: DockerImage = "ghcr.io/cosmos/relayer:v2.4.2".parse()?;
        assert_eq!(image.repository, "ghcr.io/cosmos/relayer");
        assert_eq!(image.version, "v2.4.2");

        let image: DockerImage = "localhost:5000/onex".parse()?;
        assert_eq!(image.repository, "localhost:5000/onex");
        assert_eq!(image.version, "latest");

        assert!(":v1".parse::<DockerImage>().is_err());

        Ok(())
    }

    #[test]
    fn image_version_swap_keeps_repository() {
        let image = DockerImage::new("onomy", "v1.1.4", "1025:1025");
        let upgraded = image.with_version("v1.2.0");

        assert_eq!(upgraded.reference(), "onomy:v1.2.0");
        assert_eq!(upgraded.uid_gid, "1025:1025");
    }
}
