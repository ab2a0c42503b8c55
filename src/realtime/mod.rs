pub mod broadcaster;
pub mod registry;
