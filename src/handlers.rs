pub mod expenses;
pub mod health;
pub mod owners;
pub mod payments;
pub mod periods;
pub mod water_factors;
