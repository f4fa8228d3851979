/*!
   Framework code for making it easier to write test cases.

   A test case implements [`TestOverrides`](overrides::TestOverrides) and
   one of the test traits, [`InterchainTest`](interchain::InterchainTest)
   or [`SingleChainTest`](single::SingleChainTest), and is run with the
   matching runner. The runner loads the test configuration, bootstraps
   the chains and hands them to the test. Everything it started is torn
   down when the test returns, whatever the outcome.
*/

pub mod base;
pub mod interchain;
pub mod overrides;
pub mod single;
