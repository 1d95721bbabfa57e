//! Port trait definitions for delivery.

pub mod connection;
pub mod history;

pub use connection::LiveConnection;
pub use history::ChatHistoryRepository;
