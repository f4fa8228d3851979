/*!
   Definitions for commonly used data types in the test framework.
*/

pub mod config;
pub mod env;
pub mod link;
pub mod proposal;
pub mod token;
pub mod wallet;
