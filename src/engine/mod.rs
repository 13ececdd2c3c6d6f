pub mod error;
pub mod graph;
pub mod load_state;
pub mod path;
pub mod resolver;
pub mod session;
pub mod transport;
