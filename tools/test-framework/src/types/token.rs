/*!
   Amounts of a single denomination, as used for genesis allocations,
   fees and balance queries.
*/

use core::fmt::{self, Display};
use core::str::FromStr;
use eyre::eyre;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub denom: String,
    pub amount: u128,
}

/**
   The coin representation returned by the chain CLI, where the amount is
   encoded as a decimal string.
*/
#[derive(Clone, Debug, Deserialize)]
pub struct RawCoin {
    pub denom: String,
    pub amount: String,
}

impl Token {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| eyre!("token `{}` has no denomination", s))?;

        let (amount, denom) = s.split_at(split);

        if amount.is_empty() {
            return Err(eyre!("token `{}` has no amount", s).into());
        }

        let amount = amount
            .parse()
            .map_err(|e| eyre!("invalid amount in token `{}`: {}", s, e))?;

        Ok(Self::new(denom, amount))
    }
}

impl TryFrom<RawCoin> for Token {
    type Error = Error;

    fn try_from(coin: RawCoin) -> Result<Self, Error> {
        let amount = coin
            .amount
            .parse()
            .map_err(|e| eyre!("invalid amount `{}` for {}: {}", coin.amount, coin.denom, e))?;

        Ok(Self::new(coin.denom, amount))
    }
}

/**
   Find the balance for `denom` in a balance set, returning zero if the
   denomination is absent.
*/
pub fn balance_of(balances: &[Token], denom: &str) -> u128 {
    balances
        .iter()
        .find(|token| token.denom == denom)
        .map(|token| token.amount)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_token() -> Result<(), Error> {
        let token: Token = "500000000anom".parse()?;
        assert_eq!(token, Token::new("anom", 500_000_000));
        assert_eq!(token.to_string(), "500000000anom");
        Ok(())
    }

    #[test]
    fn parse_ibc_denom() -> Result<(), Error> {
        let token: Token = "10ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2"
            .parse()?;
        assert_eq!(token.amount, 10);
        assert!(token.denom.starts_with("ibc/"));
        Ok(())
    }

    #[test]
    fn reject_malformed_tokens() {
        assert!("anom".parse::<Token>().is_err());
        assert!("1000".parse::<Token>().is_err());
    }

    #[test]
    fn genesis_sized_amounts_fit() -> Result<(), Error> {
        let token: Token = "9000000000000000000anom".parse()?;
        assert_eq!(token.amount, 9_000_000_000_000_000_000);
        Ok(())
    }

    #[test]
    fn balance_lookup() {
        let balances = vec![Token::new("anom", 10), Token::new("stake", 3)];
        assert_eq!(balance_of(&balances, "stake"), 3);
        assert_eq!(balance_of(&balances, "uatom"), 0);
    }
}
