pub mod constants;
pub mod data_dir;
pub mod frame;
pub mod region;
pub mod timestamp;
