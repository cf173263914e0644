pub mod client;
pub mod parser;

pub use client::FeedClient;
pub use parser::{FeedEntry, parse_atom_feed};
