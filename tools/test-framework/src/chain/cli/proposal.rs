/*!
   Methods for submitting and voting on governance proposals.
*/

use eyre::eyre;
use serde_json as json;
use subtle_encoding::base64;

use crate::chain::cli::query::query_tx_hash;
use crate::chain::cli::tx_args;
use crate::chain::driver::ChainDriver;
use crate::error::{handle_generic_error, Error};
use crate::types::proposal::{ProposalId, SoftwareUpgradeProposal, VoteOption};

/**
   Submit a legacy `software-upgrade` proposal signed by `from`, returning
   the ID assigned to the proposal.
*/
pub fn submit_software_upgrade(
    driver: &ChainDriver,
    from: &str,
    proposal: &SoftwareUpgradeProposal,
) -> Result<ProposalId, Error> {
    let height = proposal.height.to_string();

    let mut args = vec![
        "tx",
        "gov",
        "submit-proposal",
        "software-upgrade",
        proposal.name.as_str(),
        "--upgrade-height",
        height.as_str(),
        "--upgrade-info",
        proposal.info.as_str(),
        "--title",
        proposal.title.as_str(),
        "--description",
        proposal.description.as_str(),
        "--deposit",
        proposal.deposit.as_str(),
    ];

    let tx_args = tx_args(driver, from);
    args.extend(tx_args.iter().map(String::as_str));

    let output = driver.exec_bin("submit upgrade proposal", &args)?;

    let tx = query_tx_hash(driver, &output.stdout)?;

    proposal_id_from_tx(&tx)
}

pub fn vote_proposal(
    driver: &ChainDriver,
    from: &str,
    proposal_id: &ProposalId,
    option: VoteOption,
) -> Result<(), Error> {
    let mut args = vec!["tx", "gov", "vote", proposal_id.as_str(), option.as_str()];

    let tx_args = tx_args(driver, from);
    args.extend(tx_args.iter().map(String::as_str));

    let output = driver.exec_bin("vote proposal", &args)?;

    query_tx_hash(driver, &output.stdout)?;

    Ok(())
}

/**
   Extract the `proposal_id` attribute of the `submit_proposal` event of a
   delivered transaction. Event attributes are base64 encoded by some
   CometBFT versions, so both plain and encoded attributes are accepted.
*/
pub fn proposal_id_from_tx(tx: &json::Value) -> Result<ProposalId, Error> {
    let mut events: Vec<&json::Value> = Vec::new();

    if let Some(logs) = tx.get("logs").and_then(|logs| logs.as_array()) {
        for log in logs {
            if let Some(log_events) = log.get("events").and_then(|e| e.as_array()) {
                events.extend(log_events);
            }
        }
    }

    if let Some(tx_events) = tx.get("events").and_then(|e| e.as_array()) {
        events.extend(tx_events);
    }

    for event in events {
        if event.get("type").and_then(|t| t.as_str()) != Some("submit_proposal") {
            continue;
        }

        let attributes = event
            .get("attributes")
            .and_then(|a| a.as_array())
            .ok_or_else(|| eyre!("expected attributes in submit_proposal event"))?;

        for attribute in attributes {
            let key = attribute_field(attribute, "key")?;

            if key == "proposal_id" {
                return Ok(ProposalId(attribute_field(attribute, "value")?));
            }
        }
    }

    Err(eyre!("no proposal_id attribute found in transaction events").into())
}

fn attribute_field(attribute: &json::Value, field: &str) -> Result<String, Error> {
    let raw = attribute
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| eyre!("expected `{}` in event attribute", field))?;

    if raw == "proposal_id" || raw.chars().all(|c| c.is_ascii_digit()) {
        return Ok(raw.to_string());
    }

    match base64::decode(raw) {
        Ok(bytes) => String::from_utf8(bytes).map_err(handle_generic_error),
        Err(_) => Ok(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn proposal_id_from_logs() -> Result<(), Error> {
        let tx = json!({
            "code": 0,
            "logs": [{
                "events": [
                    { "type": "message", "attributes": [ { "key": "action", "value": "submit_proposal" } ] },
                    { "type": "submit_proposal", "attributes": [
                        { "key": "proposal_id", "value": "3" },
                        { "key": "proposal_type", "value": "SoftwareUpgrade" }
                    ] }
                ]
            }]
        });

        assert_eq!(proposal_id_from_tx(&tx)?, ProposalId("3".to_string()));

        Ok(())
    }

    #[test]
    fn proposal_id_from_encoded_events() -> Result<(), Error> {
        // "proposal_id" and "12" in base64
        let tx = json!({
            "code": 0,
            "logs": [],
            "events": [
                { "type": "submit_proposal", "attributes": [
                    { "key": "cHJvcG9zYWxfaWQ=", "value": "MTI=" }
                ] }
            ]
        });

        assert_eq!(proposal_id_from_tx(&tx)?, ProposalId("12".to_string()));

        Ok(())
    }

    #[test]
    fn missing_proposal_id() {
        let tx = json!({ "code": 0, "logs": [] });
        assert!(proposal_id_from_tx(&tx).is_err());
    }
}
