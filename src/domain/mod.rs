pub mod contribution;
pub mod group;
pub mod membership;
pub mod ports;
