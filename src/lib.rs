pub mod browse;
pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod imaging;
pub mod interrupt;
pub mod memo;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod weights;
