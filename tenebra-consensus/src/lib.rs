pub mod blocks;
pub mod scheduler;
pub mod staking;
pub mod work;

pub use blocks::BlockEngine;
pub use staking::StakingEngine;
