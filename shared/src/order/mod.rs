//! Cart types shared with the POS front end

pub mod types;

pub use types::CartItem;
