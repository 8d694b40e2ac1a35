pub mod addresses;
pub mod blocks;
pub mod lookup;
pub mod misc;
pub mod names;
pub mod staking;
pub mod transactions;
pub mod work;
