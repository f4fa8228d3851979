/*!
   Interface registries describing which `Any` type URLs a chain variant
   understands.

   The registry is used to check the content of transactions and
   governance proposals before they are broadcast, and to interpret the
   `@type` field of JSON encoded `Any` values returned by queries.
*/

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Error;

pub const MSG_INTERFACE: &str = "cosmos.base.v1beta1.Msg";
pub const CONTENT_INTERFACE: &str = "cosmos.gov.v1beta1.Content";
pub const PUB_KEY_INTERFACE: &str = "cosmos.crypto.PubKey";

pub const SOFTWARE_UPGRADE_PROPOSAL_URL: &str = "/cosmos.upgrade.v1beta1.SoftwareUpgradeProposal";
pub const CONSUMER_ADDITION_PROPOSAL_URL: &str =
    "/interchain_security.ccv.provider.v1.ConsumerAdditionProposal";

const DEFAULT_MSGS: &[&str] = &[
    "/cosmos.bank.v1beta1.MsgSend",
    "/cosmos.bank.v1beta1.MsgMultiSend",
    "/cosmos.gov.v1beta1.MsgSubmitProposal",
    "/cosmos.gov.v1beta1.MsgDeposit",
    "/cosmos.gov.v1beta1.MsgVote",
    "/cosmos.staking.v1beta1.MsgCreateValidator",
    "/cosmos.staking.v1beta1.MsgDelegate",
    "/cosmos.staking.v1beta1.MsgUndelegate",
    "/ibc.applications.transfer.v1.MsgTransfer",
    "/ibc.core.client.v1.MsgCreateClient",
    "/ibc.core.client.v1.MsgUpdateClient",
    "/ibc.core.connection.v1.MsgConnectionOpenInit",
    "/ibc.core.connection.v1.MsgConnectionOpenTry",
    "/ibc.core.connection.v1.MsgConnectionOpenAck",
    "/ibc.core.connection.v1.MsgConnectionOpenConfirm",
    "/ibc.core.channel.v1.MsgChannelOpenInit",
    "/ibc.core.channel.v1.MsgChannelOpenTry",
    "/ibc.core.channel.v1.MsgChannelOpenAck",
    "/ibc.core.channel.v1.MsgChannelOpenConfirm",
    "/ibc.core.channel.v1.MsgRecvPacket",
    "/ibc.core.channel.v1.MsgAcknowledgement",
    "/ibc.core.channel.v1.MsgTimeout",
];

const DEFAULT_CONTENTS: &[&str] = &[
    "/cosmos.gov.v1beta1.TextProposal",
    "/cosmos.params.v1beta1.ParameterChangeProposal",
    SOFTWARE_UPGRADE_PROPOSAL_URL,
    "/cosmos.upgrade.v1beta1.CancelSoftwareUpgradeProposal",
    "/ibc.core.client.v1.ClientUpdateProposal",
    CONSUMER_ADDITION_PROPOSAL_URL,
    "/interchain_security.ccv.provider.v1.ConsumerRemovalProposal",
];

const DEFAULT_PUB_KEYS: &[&str] = &[
    "/cosmos.crypto.secp256k1.PubKey",
    "/cosmos.crypto.ed25519.PubKey",
    "/cosmos.crypto.multisig.LegacyAminoPubKey",
];

/**
   Maps interface names to the set of type URLs implementing them.
   Registering the same implementation twice is a no-op.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceRegistry {
    interfaces: BTreeMap<String, BTreeSet<String>>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_implementations(
        &mut self,
        interface: &str,
        type_urls: &[&str],
    ) -> Result<(), Error> {
        for type_url in type_urls {
            validate_type_url(type_url)?;
        }

        let implementations = self.interfaces.entry(interface.to_string()).or_default();

        for type_url in type_urls {
            implementations.insert(type_url.to_string());
        }

        Ok(())
    }

    /// Name of the interface implemented by the given type URL.
    pub fn resolve(&self, type_url: &str) -> Option<&str> {
        self.interfaces
            .iter()
            .find(|(_, implementations)| implementations.contains(type_url))
            .map(|(interface, _)| interface.as_str())
    }

    pub fn implementations(&self, interface: &str) -> impl Iterator<Item = &str> {
        self.interfaces
            .get(interface)
            .into_iter()
            .flat_map(|implementations| implementations.iter().map(String::as_str))
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }
}

fn validate_type_url(type_url: &str) -> Result<(), Error> {
    let well_formed = type_url.len() > 1
        && type_url.starts_with('/')
        && !type_url.chars().any(char::is_whitespace);

    if well_formed {
        Ok(())
    } else {
        Err(Error::invalid_type_url(type_url.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingConfig {
    pub interface_registry: InterfaceRegistry,
}

impl EncodingConfig {
    /**
       Check that the given type URL is known to the chain, returning the
       interface it implements.
    */
    pub fn require(&self, type_url: &str) -> Result<&str, Error> {
        self.interface_registry
            .resolve(type_url)
            .ok_or_else(|| Error::invalid_type_url(type_url.to_string()))
    }

    /**
       Interpret the `@type` field of a JSON encoded `Any`, as printed by
       the chain CLI with `--output json`.
    */
    pub fn unpack_any<'a>(&self, any: &'a Value) -> Result<&'a str, Error> {
        let type_url = any
            .get("@type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_type_url(any.to_string()))?;

        self.require(type_url)?;

        Ok(type_url)
    }
}

/**
   The encoding baseline shared by every Cosmos SDK chain with IBC and
   interchain security modules.
*/
pub fn default_encoding() -> Result<EncodingConfig, Error> {
    let mut interface_registry = InterfaceRegistry::new();

    interface_registry.register_implementations(MSG_INTERFACE, DEFAULT_MSGS)?;
    interface_registry.register_implementations(CONTENT_INTERFACE, DEFAULT_CONTENTS)?;
    interface_registry.register_implementations(PUB_KEY_INTERFACE, DEFAULT_PUB_KEYS)?;

    Ok(EncodingConfig { interface_registry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_registration_is_noop() -> Result<(), Error> {
        let mut first = default_encoding()?;
        let second = default_encoding()?;

        first
            .interface_registry
            .register_implementations(CONTENT_INTERFACE, &[SOFTWARE_UPGRADE_PROPOSAL_URL])?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn rejects_malformed_type_urls() {
        let mut registry = InterfaceRegistry::new();

        for type_url in ["", "/", "cosmos.bank.v1beta1.MsgSend", "/cosmos bank"] {
            assert!(registry
                .register_implementations(MSG_INTERFACE, &[type_url])
                .is_err());
        }

        assert_eq!(registry.implementations(MSG_INTERFACE).count(), 0);
    }

    #[test]
    fn unpacks_registered_any() -> Result<(), Error> {
        let encoding = default_encoding()?;

        let content = json!({
            "@type": SOFTWARE_UPGRADE_PROPOSAL_URL,
            "title": "Software Upgrade",
        });

        assert_eq!(encoding.unpack_any(&content)?, SOFTWARE_UPGRADE_PROPOSAL_URL);
        assert_eq!(encoding.require(SOFTWARE_UPGRADE_PROPOSAL_URL)?, CONTENT_INTERFACE);

        assert!(encoding
            .unpack_any(&json!({ "@type": "/unknown.v1.Proposal" }))
            .is_err());
        assert!(encoding.unpack_any(&json!({ "title": "no type" })).is_err());

        Ok(())
    }
}
