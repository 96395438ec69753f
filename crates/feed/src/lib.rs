pub mod book;
pub mod simulator;

pub use book::PriceBook;
pub use simulator::PriceFeedSimulator;
