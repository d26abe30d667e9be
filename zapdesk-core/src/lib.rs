pub mod address;
pub mod amount;
pub mod error;
pub mod fixture;
pub mod primitives;
