pub mod book;
pub mod classify;
pub mod generator;

pub use book::SignalBook;
pub use classify::{classify, Verdict};
pub use generator::SignalGenerator;
