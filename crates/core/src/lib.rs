pub mod detection;
pub mod fusion;
pub mod pipeline;
pub mod shared;
pub mod video;
