pub mod area;
pub mod asset;
pub mod change_log;
pub mod custody;
pub mod director;
