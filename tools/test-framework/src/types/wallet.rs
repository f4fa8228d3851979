/*!
   Types for information about a chain wallet.
*/

use core::fmt::{self, Display};

use crate::types::env::{prefix_writer, EnvWriter, ExportEnv};

/**
   Newtype wrapper for a wallet ID as identified by the chain's keyring.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletId(pub String);

/**
   Newtype wrapper for the bech32 address of a wallet.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAddress(pub String);

/**
   A wallet created in the keyring of a chain node.
*/
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The ID of the wallet for accessing it from the key store.
    pub id: WalletId,

    /// The address for receiving tokens for this wallet.
    pub address: WalletAddress,

    /**
       The mnemonic used to derive the private key, so that the same key
       can be restored into the relayer's keyring.
    */
    pub mnemonic: String,
}

/**
   The wallets created while bootstrapping a chain.
*/
#[derive(Debug, Clone)]
pub struct ChainWallets {
    /// One `validator` wallet per validator node.
    pub validators: Vec<Wallet>,

    /// Wallet holding the genesis allocation used to fund test users.
    pub faucet: Wallet,

    /// Wallet used by the relayer to pay for its transactions.
    pub relayer: Wallet,
}

impl Wallet {
    pub fn new(id: String, address: String, mnemonic: String) -> Self {
        Self {
            id: WalletId(id),
            address: WalletAddress(address),
            mnemonic,
        }
    }

    pub fn key_name(&self) -> &str {
        &self.id.0
    }

    pub fn formatted_address(&self) -> &str {
        &self.address.0
    }
}

impl Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ExportEnv for Wallet {
    fn export_env(&self, writer: &mut impl EnvWriter) {
        writer.write_env("KEY_ID", &self.id.0);
        writer.write_env("ADDRESS", &self.address.0);
    }
}

impl ExportEnv for ChainWallets {
    fn export_env(&self, writer: &mut impl EnvWriter) {
        self.faucet.export_env(&mut prefix_writer("FAUCET", writer));
        self.relayer.export_env(&mut prefix_writer("RELAYER", writer));

        for (i, validator) in self.validators.iter().enumerate() {
            validator.export_env(&mut prefix_writer(&format!("VALIDATOR_{i}"), writer));
        }
    }
}
