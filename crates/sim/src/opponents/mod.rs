pub mod tactics;
pub mod greedy;
pub mod gravity;

pub use greedy::GreedyPolicy;
pub use gravity::PotentialFieldPolicy;
