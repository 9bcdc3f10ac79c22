//! Send live feed entries to connected viewers
mod ws;

pub use ws::Ws;
