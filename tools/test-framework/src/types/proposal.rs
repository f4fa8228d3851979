/*!
   Governance proposal types, and the state machine used while polling a
   proposal until it reaches a terminal status.
*/

use core::fmt::{self, Display};
use core::str::FromStr;
use eyre::eyre;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProposalId(pub String);

impl Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ProposalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/**
   Status of a proposal as reported by the `gov` module.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    Unspecified,
    DepositPeriod,
    VotingPeriod,
    Passed,
    Rejected,
    Failed,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "PROPOSAL_STATUS_UNSPECIFIED",
            Self::DepositPeriod => "PROPOSAL_STATUS_DEPOSIT_PERIOD",
            Self::VotingPeriod => "PROPOSAL_STATUS_VOTING_PERIOD",
            Self::Passed => "PROPOSAL_STATUS_PASSED",
            Self::Rejected => "PROPOSAL_STATUS_REJECTED",
            Self::Failed => "PROPOSAL_STATUS_FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Rejected | Self::Failed)
    }
}

impl Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older SDK versions print the enum ordinal instead of its name
        match s {
            "PROPOSAL_STATUS_UNSPECIFIED" | "0" => Ok(Self::Unspecified),
            "PROPOSAL_STATUS_DEPOSIT_PERIOD" | "1" => Ok(Self::DepositPeriod),
            "PROPOSAL_STATUS_VOTING_PERIOD" | "2" => Ok(Self::VotingPeriod),
            "PROPOSAL_STATUS_PASSED" | "3" => Ok(Self::Passed),
            "PROPOSAL_STATUS_REJECTED" | "4" => Ok(Self::Rejected),
            "PROPOSAL_STATUS_FAILED" | "5" => Ok(Self::Failed),
            _ => Err(eyre!("unknown proposal status `{}`", s).into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOption {
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

impl VoteOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::Abstain => "abstain",
            Self::No => "no",
            Self::NoWithVeto => "no_with_veto",
        }
    }
}

/**
   A legacy `software-upgrade` governance proposal.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareUpgradeProposal {
    /// Deposit in the form `<amount><denom>`.
    pub deposit: String,
    pub title: String,
    /// Name of the upgrade plan.
    pub name: String,
    pub description: String,
    /// The halt height of the upgrade plan.
    pub height: u64,
    /// Metadata reference, typically an `ipfs://` URI.
    pub info: String,
}

/**
   Lifecycle of a proposal as observed by a test:
   `Submitted -> VotingOpen -> {Passed | Rejected | Failed | Expired}`.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalPhase {
    Submitted,
    VotingOpen,
    Passed,
    Rejected,
    Failed,
    Expired,
}

impl ProposalPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted | Self::VotingOpen)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Submitted => 0,
            Self::VotingOpen => 1,
            _ => 2,
        }
    }
}

impl From<ProposalStatus> for ProposalPhase {
    fn from(status: ProposalStatus) -> Self {
        match status {
            ProposalStatus::Unspecified | ProposalStatus::DepositPeriod => Self::Submitted,
            ProposalStatus::VotingPeriod => Self::VotingOpen,
            ProposalStatus::Passed => Self::Passed,
            ProposalStatus::Rejected => Self::Rejected,
            ProposalStatus::Failed => Self::Failed,
        }
    }
}

/**
   Transient record of a submitted proposal. Every status observed while
   polling is fed to [`ProposalRecord::observe`], which refuses any
   transition that moves the proposal backwards, including leaving a
   terminal phase.
*/
#[derive(Debug, Clone)]
pub struct ProposalRecord {
    pub id: ProposalId,
    pub halt_height: Option<u64>,
    phase: ProposalPhase,
    last_status: Option<ProposalStatus>,
}

impl ProposalRecord {
    pub fn new(id: ProposalId, halt_height: Option<u64>) -> Self {
        Self {
            id,
            halt_height,
            phase: ProposalPhase::Submitted,
            last_status: None,
        }
    }

    pub fn phase(&self) -> ProposalPhase {
        self.phase
    }

    pub fn last_status(&self) -> Option<ProposalStatus> {
        self.last_status
    }

    pub fn observe(&mut self, status: ProposalStatus) -> Result<ProposalPhase, Error> {
        let next = ProposalPhase::from(status);

        let regressed = if self.phase.is_terminal() {
            next != self.phase
        } else {
            next.rank() < self.phase.rank()
        };

        if regressed {
            return Err(Error::proposal_regression(
                self.id.to_string(),
                format!("{:?}", self.phase),
                format!("{:?}", next),
            ));
        }

        self.phase = next;
        self.last_status = Some(status);

        Ok(next)
    }

    /**
       Mark the proposal as expired because the polling deadline was
       exceeded. Has no effect once a terminal phase was observed.
    */
    pub fn expire(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = ProposalPhase::Expired;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ProposalRecord {
        ProposalRecord::new(ProposalId("1".to_string()), Some(20))
    }

    #[test]
    fn parse_status_names_and_ordinals() -> Result<(), Error> {
        assert_eq!(
            "PROPOSAL_STATUS_PASSED".parse::<ProposalStatus>()?,
            ProposalStatus::Passed
        );
        assert_eq!("2".parse::<ProposalStatus>()?, ProposalStatus::VotingPeriod);
        assert!("PASSED".parse::<ProposalStatus>().is_err());
        Ok(())
    }

    #[test]
    fn follows_happy_path() -> Result<(), Error> {
        let mut record = record();

        assert_eq!(
            record.observe(ProposalStatus::DepositPeriod)?,
            ProposalPhase::Submitted
        );
        assert_eq!(
            record.observe(ProposalStatus::VotingPeriod)?,
            ProposalPhase::VotingOpen
        );
        assert_eq!(
            record.observe(ProposalStatus::VotingPeriod)?,
            ProposalPhase::VotingOpen
        );
        assert_eq!(record.observe(ProposalStatus::Passed)?, ProposalPhase::Passed);
        assert_eq!(record.last_status(), Some(ProposalStatus::Passed));

        Ok(())
    }

    #[test]
    fn never_leaves_terminal_phase() -> Result<(), Error> {
        let mut record = record();

        record.observe(ProposalStatus::VotingPeriod)?;
        record.observe(ProposalStatus::Rejected)?;

        assert!(record.observe(ProposalStatus::VotingPeriod).is_err());
        assert!(record.observe(ProposalStatus::Passed).is_err());
        assert_eq!(record.phase(), ProposalPhase::Rejected);

        // observing the same terminal status again is not a regression
        assert!(record.observe(ProposalStatus::Rejected).is_ok());

        Ok(())
    }

    #[test]
    fn voting_does_not_go_back_to_deposit() -> Result<(), Error> {
        let mut record = record();

        record.observe(ProposalStatus::VotingPeriod)?;
        assert!(record.observe(ProposalStatus::DepositPeriod).is_err());

        Ok(())
    }

    #[test]
    fn expiry_only_applies_to_open_proposals() -> Result<(), Error> {
        let mut open = record();
        open.observe(ProposalStatus::VotingPeriod)?;
        open.expire();
        assert_eq!(open.phase(), ProposalPhase::Expired);

        let mut passed = record();
        passed.observe(ProposalStatus::Passed)?;
        passed.expire();
        assert_eq!(passed.phase(), ProposalPhase::Passed);

        Ok(())
    }
}
