pub mod percentage;
pub mod price;

pub use percentage::Percentage;
pub use price::{Price, price_to_tick, tick_to_price};
