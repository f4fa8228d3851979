/*!
   All test cases are placed within this module.

   We expose the modules as public so that cargo doc
   will pick up the definition by default.
*/

pub mod cancelled_build;
pub mod multi_consumer;
pub mod relayed_funding;
pub mod single_chain;
