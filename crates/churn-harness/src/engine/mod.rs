pub mod capability;
pub mod classifier;
pub mod driver;
pub mod signal;
pub mod worker;
