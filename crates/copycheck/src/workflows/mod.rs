pub mod analysis;
pub mod delivery;
