pub mod bridge;
pub mod error;
pub mod events;
pub mod feature;
pub mod host;
pub mod layout;
pub mod manager;
pub mod memory;
pub mod options;
pub mod state;

pub use error::*;
pub use events::*;
pub use manager::*;
pub use options::*;
