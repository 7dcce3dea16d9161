pub mod events;
pub mod models;
pub mod ops;
pub mod wire;
