pub mod fetch;
pub mod outcome;
pub mod proxy;
pub mod rendezvous;
pub mod sleepy;

mod shutdown;
