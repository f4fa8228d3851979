//! Error type used for the tests.

use core::convert::{From, Into};
use eyre::Report;
use flex_error::{define_error, TraceError};
use std::io::Error as IoError;

define_error! {
    Error {
        Generic
            [ TraceError<Report> ]
            | _ | { "generic error" },

        Assertion
            { message: String }
            | e | { format_args!("assertion failure: {}", e.message) },

        Io
            [ TraceError<IoError> ]
            | _ | { "io error"},

        Docker
            [ TraceError<testcontainers::TestcontainersError> ]
            | _ | { "error while managing a docker container" },

        DockerApi
            [ TraceError<bollard::errors::Error> ]
            | _ | { "error returned by the docker api" },

        Command
            {
                command: String,
                status: Option<i32>,
                stderr: String
            }
            | e | {
                format_args!("command `{}` exited with error status {:?} and message: {}",
                    e.command, e.status, e.stderr)
            },

        Cancelled
            { task: String }
            | e | { format_args!("task was cancelled before completion: {}", e.task) },

        HeightTimeout
            {
                chain_id: String,
                expected: u64,
                last_observed: String
            }
            | e | {
                format_args!("timed out waiting for chain {} to reach height {}, {}",
                    e.chain_id, e.expected, e.last_observed)
            },

        ProposalTimeout
            {
                proposal_id: String,
                deadline: u64,
                status: String
            }
            | e | {
                format_args!("proposal {} did not reach a terminal status before height {}, last observed status was {}",
                    e.proposal_id, e.deadline, e.status)
            },

        UnexpectedProposalStatus
            {
                proposal_id: String,
                expected: String,
                observed: String
            }
            | e | {
                format_args!("proposal {} ended with status {} while {} was expected",
                    e.proposal_id, e.observed, e.expected)
            },

        ProposalRegression
            {
                proposal_id: String,
                from: String,
                to: String
            }
            | e | {
                format_args!("proposal {} regressed from status {} to {}",
                    e.proposal_id, e.from, e.to)
            },

        DuplicatePathName
            { path: String }
            | e | { format_args!("relayer path name `{}` is used by more than one link", e.path) },

        DuplicateChainId
            { chain_id: String }
            | e | { format_args!("chain id `{}` is configured more than once", e.chain_id) },

        ChainCountMismatch
            { expected: usize, actual: usize }
            | e | {
                format_args!("expected {} chains to be produced, got {}",
                    e.expected, e.actual)
            },

        ChainOrderMismatch
            {
                position: usize,
                expected: String,
                actual: String
            }
            | e | {
                format_args!("expected chain `{}` at position {}, found `{}`",
                    e.expected, e.position, e.actual)
            },

        InvalidChainConfig
            {
                chain: String,
                reason: String
            }
            | e | { format_args!("invalid configuration for chain `{}`: {}", e.chain, e.reason) },

        InvalidNetwork
            { reason: String }
            | e | { format_args!("invalid interchain network: {}", e.reason) },

        UnknownChain
            { name: String }
            | e | { format_args!("no chain named `{}` is registered", e.name) },

        InvalidTypeUrl
            { type_url: String }
            | e | { format_args!("invalid or unregistered type url `{}`", e.type_url) },

        InvalidGenesisKey
            {
                key: String,
                reason: String
            }
            | e | { format_args!("cannot set genesis key `{}`: {}", e.key, e.reason) },

        UnknownRelayer
            { name: String }
            | e | { format_args!("unknown relayer implementation `{}`", e.name) },

        RelayerNotConfigured
            | _ | { "no relayer has been added to the interchain network" },

        RetryFailed
            {
                task_name: String,
                attempts: u16
            }
            | e | {
                format_args!("Expected task to eventually succeeed, but failed after {} attempts: {}",
                    e.attempts, e.task_name)
            },
    }
}

pub fn handle_generic_error(e: impl Into<Report>) -> Error {
    Error::generic(e.into())
}

impl From<testcontainers::TestcontainersError> for Error {
    fn from(e: testcontainers::TestcontainersError) -> Self {
        Error::docker(e)
    }
}

impl From<bollard::errors::Error> for Error {
    fn from(e: bollard::errors::Error) -> Self {
        Error::docker_api(e)
    }
}

impl From<Report> for Error {
    fn from(e: Report) -> Self {
        Error::generic(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::io(e)
    }
}
