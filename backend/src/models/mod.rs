pub mod game;
pub mod season;

pub use game::*;
pub use season::*;
