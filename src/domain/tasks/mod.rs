pub mod chain;

pub use chain::{run_sequentially, TaskChain};
