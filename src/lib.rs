pub mod config;
pub mod db;
pub mod event;
pub mod pipeline;
pub mod response;
pub mod sql;
pub mod storage;
pub mod table;

#[cfg(test)]
mod tests;

pub use pipeline::Pipeline;
pub use response::Response;
