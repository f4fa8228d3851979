/*!
   Chain descriptors of the onomy provider chain and the onex consumer
   chain.

   Every function returns a fresh value, so a test is free to modify the
   configuration it received without affecting other tests.
*/

use crate::chain::descriptor::{ChainConfig, DockerImage, GenesisAmounts};
use crate::chain::encoding::{default_encoding, EncodingConfig, CONTENT_INTERFACE, MSG_INTERFACE};
use crate::chain::genesis::GenesisOverride;
use crate::error::Error;
use crate::types::token::Token;

pub const PROVIDER_NAME: &str = "onomy";
pub const PROVIDER_VERSION: &str = "v1.1.4";
pub const PROVIDER_DENOM: &str = "anom";
pub const PROVIDER_CHAIN_ID: &str = "onomy-1";

pub const CONSUMER_NAME: &str = "onex";
pub const CONSUMER_VERSION: &str = "local";
pub const CONSUMER_DENOM: &str = PROVIDER_DENOM;
pub const CONSUMER_CHAIN_ID: &str = "onex-1";

pub const BECH32_PREFIX: &str = "onomy";
pub const IMAGE_UID_GID: &str = "1025:1025";

pub const VOTING_PERIOD: &str = "15s";
pub const MAX_DEPOSIT_PERIOD: &str = "10s";
pub const MIN_DEPOSIT_AMOUNT: &str = "1000000";

/// Path name of the first provider-consumer link of a test.
pub const IBC_PATH: &str = "ics-path";

const GENESIS_AMOUNT: u128 = 9_000_000_000_000_000_000;
const GENESIS_SELF_DELEGATION: u128 = 5_000_000_000_000_000_000;

const DAO_PROPOSALS: &[&str] = &[
    "/onomyprotocol.dao.v1.FundTreasuryProposal",
    "/onomyprotocol.dao.v1.ExchangeWithTreasuryProposal",
    "/onomyprotocol.dao.v1.FundAccountProposal",
];

const DAO_MSGS: &[&str] = &["/onomyprotocol.dao.v1.MsgAbstain"];

/// Onomy and onex require significantly more than the usual default
/// amounts for validators.
pub fn genesis_amounts(denom: &str) -> GenesisAmounts {
    GenesisAmounts {
        genesis_amount: Token::new(denom, GENESIS_AMOUNT),
        self_delegation: Token::new(denom, GENESIS_SELF_DELEGATION),
    }
}

/// Short governance periods so that proposals pass within a test.
pub fn gov_genesis_overrides(denom: &str) -> Vec<GenesisOverride> {
    vec![
        GenesisOverride::new("app_state.gov.voting_params.voting_period", VOTING_PERIOD),
        GenesisOverride::new(
            "app_state.gov.deposit_params.max_deposit_period",
            MAX_DEPOSIT_PERIOD,
        ),
        GenesisOverride::new("app_state.gov.deposit_params.min_deposit.0.denom", denom),
        GenesisOverride::new(
            "app_state.gov.deposit_params.min_deposit.0.amount",
            MIN_DEPOSIT_AMOUNT,
        ),
    ]
}

/// The default encoding extended with the interfaces of the DAO module.
pub fn onomy_encoding() -> Result<EncodingConfig, Error> {
    let mut encoding = default_encoding()?;

    encoding
        .interface_registry
        .register_implementations(CONTENT_INTERFACE, DAO_PROPOSALS)?;
    encoding
        .interface_registry
        .register_implementations(MSG_INTERFACE, DAO_MSGS)?;

    Ok(encoding)
}

pub fn onex_encoding() -> Result<EncodingConfig, Error> {
    default_encoding()
}

pub fn onomy_config() -> ChainConfig {
    ChainConfig {
        name: PROVIDER_NAME.to_string(),
        chain_id: PROVIDER_CHAIN_ID.to_string(),
        images: vec![DockerImage::new(
            PROVIDER_NAME,
            PROVIDER_VERSION,
            IMAGE_UID_GID,
        )],
        bin: format!("{PROVIDER_NAME}d"),
        bech32_prefix: BECH32_PREFIX.to_string(),
        denom: PROVIDER_DENOM.to_string(),
        coin_type: 118,
        gas_prices: format!("0{PROVIDER_DENOM}"),
        gas_adjustment: 1.0,
        trusting_period: "504h".to_string(),
        config_file_overrides: Vec::new(),
        genesis_overrides: gov_genesis_overrides(PROVIDER_DENOM),
        genesis_amounts: genesis_amounts(PROVIDER_DENOM),
        encoding: onomy_encoding,
    }
}

pub fn onex_config() -> ChainConfig {
    ChainConfig {
        name: CONSUMER_NAME.to_string(),
        chain_id: CONSUMER_CHAIN_ID.to_string(),
        images: vec![DockerImage::new(
            CONSUMER_NAME,
            CONSUMER_VERSION,
            IMAGE_UID_GID,
        )],
        bin: format!("{CONSUMER_NAME}d"),
        bech32_prefix: BECH32_PREFIX.to_string(),
        denom: CONSUMER_DENOM.to_string(),
        coin_type: 118,
        gas_prices: format!("0{CONSUMER_DENOM}"),
        gas_adjustment: 1.0,
        trusting_period: "48h".to_string(),
        config_file_overrides: Vec::new(),
        genesis_overrides: gov_genesis_overrides(CONSUMER_DENOM),
        genesis_amounts: genesis_amounts(CONSUMER_DENOM),
        encoding: onex_encoding,
    }
}

/**
   A second consumer for multi consumer tests, with its own chain id
   derived from the onex preset.
*/
pub fn onex_config_with_chain_id(chain_id: &str) -> ChainConfig {
    ChainConfig {
        chain_id: chain_id.to_string(),
        ..onex_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() -> Result<(), Error> {
        let onomy = onomy_config();
        let onex = onex_config();

        onomy.validate()?;
        onex.validate()?;

        assert_eq!(onomy.bin, "onomyd");
        assert_eq!(onex.bin, "onexd");
        assert_eq!(onomy.gas_prices, "0anom");
        assert_eq!(onomy.image()?.reference(), "onomy:v1.1.4");
        assert_eq!(onex.image()?.reference(), "onex:local");
        assert_ne!(onomy.chain_id, onex.chain_id);

        Ok(())
    }

    #[test]
    fn only_onomy_registers_dao_types() -> Result<(), Error> {
        let onomy = (onomy_config().encoding)()?;
        let onex = (onex_config().encoding)()?;

        assert!(onomy.require(DAO_PROPOSALS[0]).is_ok());
        assert!(onex.require(DAO_PROPOSALS[0]).is_err());

        // building twice yields equivalent registries
        assert_eq!(onomy, onomy_encoding()?);

        Ok(())
    }
}
