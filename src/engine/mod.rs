pub mod autotrade;
pub mod ledger;
pub mod simulator;
pub mod ticker;
