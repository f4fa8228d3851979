/*!
   Extension traits and helper functions driving a running chain.
*/

pub mod bootstrap;
pub mod fund;
pub mod proposal;
pub mod upgrade;
pub mod wait;
