pub mod audio;
pub mod badge;
pub mod completion;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod model;
pub mod queue;
pub mod render;
pub mod source;

#[cfg(test)]
mod sim_test;
