#![deny(warnings)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![doc = include_str!("../README.md")]

#[cfg(any(test, doc))]
pub mod tests;

pub use ics_test_framework::util::suspend::suspend;
