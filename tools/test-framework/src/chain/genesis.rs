/*!
   Key path substitutions applied to a generated genesis document before
   the chain starts.
*/

use serde_json::{Map, Value};

use crate::error::Error;

/**
   A dotted key path such as `app_state.gov.voting_params.voting_period`
   and the JSON value to store at that path. Numeric segments index into
   arrays, as in `app_state.gov.deposit_params.min_deposit.0.denom`.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct GenesisOverride {
    pub key: String,
    pub value: Value,
}

impl GenesisOverride {
    pub fn new(key: &str, value: impl Into<Value>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

pub fn apply_genesis_overrides(
    genesis: &mut Value,
    overrides: &[GenesisOverride],
) -> Result<(), Error> {
    for genesis_override in overrides {
        set_genesis_value(genesis, &genesis_override.key, genesis_override.value.clone())?;
    }

    Ok(())
}

/**
   Store `value` at the dotted `key` path. Missing object keys are created
   along the way, while array indices must already exist.
*/
pub fn set_genesis_value(genesis: &mut Value, key: &str, value: Value) -> Result<(), Error> {
    let segments: Vec<&str> = key.split('.').collect();

    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(Error::invalid_genesis_key(
            key.to_string(),
            "empty path segment".into(),
        ));
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| Error::invalid_genesis_key(key.to_string(), "empty path".into()))?;

    let mut current = genesis;

    for segment in parents {
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let index = parse_index(key, segment)?;
                let len = items.len();
                items.get_mut(index).ok_or_else(|| {
                    Error::invalid_genesis_key(
                        key.to_string(),
                        format!("index {index} out of bounds for array of length {len}"),
                    )
                })?
            }
            _ => {
                return Err(Error::invalid_genesis_key(
                    key.to_string(),
                    format!("`{segment}` is not inside an object or array"),
                ))
            }
        };
    }

    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
        }
        Value::Array(items) => {
            let index = parse_index(key, last)?;
            let len = items.len();
            let slot = items.get_mut(index).ok_or_else(|| {
                Error::invalid_genesis_key(
                    key.to_string(),
                    format!("index {index} out of bounds for array of length {len}"),
                )
            })?;
            *slot = value;
        }
        _ => {
            return Err(Error::invalid_genesis_key(
                key.to_string(),
                format!("cannot set `{last}` on a scalar value"),
            ))
        }
    }

    Ok(())
}

fn parse_index(key: &str, segment: &str) -> Result<usize, Error> {
    segment.parse().map_err(|_| {
        Error::invalid_genesis_key(
            key.to_string(),
            format!("`{segment}` is not a valid array index"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn genesis() -> Value {
        json!({
            "app_state": {
                "gov": {
                    "deposit_params": {
                        "min_deposit": [ { "denom": "stake", "amount": "10000000" } ],
                        "max_deposit_period": "172800s"
                    },
                    "voting_params": { "voting_period": "172800s" }
                }
            }
        })
    }

    #[test]
    fn overrides_nested_and_indexed_keys() -> Result<(), Error> {
        let mut genesis = genesis();

        apply_genesis_overrides(
            &mut genesis,
            &[
                GenesisOverride::new("app_state.gov.voting_params.voting_period", "15s"),
                GenesisOverride::new("app_state.gov.deposit_params.max_deposit_period", "10s"),
                GenesisOverride::new("app_state.gov.deposit_params.min_deposit.0.denom", "anom"),
                GenesisOverride::new(
                    "app_state.gov.deposit_params.min_deposit.0.amount",
                    "1000000",
                ),
            ],
        )?;

        let gov = &genesis["app_state"]["gov"];
        assert_eq!(gov["voting_params"]["voting_period"], "15s");
        assert_eq!(gov["deposit_params"]["max_deposit_period"], "10s");
        assert_eq!(gov["deposit_params"]["min_deposit"][0]["denom"], "anom");
        assert_eq!(gov["deposit_params"]["min_deposit"][0]["amount"], "1000000");

        Ok(())
    }

    #[test]
    fn creates_missing_objects() -> Result<(), Error> {
        let mut genesis = genesis();

        set_genesis_value(&mut genesis, "app_state.ccvconsumer.params.enabled", json!(true))?;

        assert_eq!(genesis["app_state"]["ccvconsumer"]["params"]["enabled"], true);

        Ok(())
    }

    #[test]
    fn rejects_invalid_paths() {
        let mut genesis = genesis();

        assert!(set_genesis_value(&mut genesis, "app_state..gov", json!(1)).is_err());
        assert!(set_genesis_value(
            &mut genesis,
            "app_state.gov.deposit_params.min_deposit.3.denom",
            json!("anom")
        )
        .is_err());
        assert!(set_genesis_value(
            &mut genesis,
            "app_state.gov.deposit_params.min_deposit.first",
            json!("anom")
        )
        .is_err());
        assert!(set_genesis_value(
            &mut genesis,
            "app_state.gov.voting_params.voting_period.seconds",
            json!(15)
        )
        .is_err());
    }
}
