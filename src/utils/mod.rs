pub mod generate;
pub mod log;
