pub mod energy;
pub mod minimize;
