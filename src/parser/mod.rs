pub mod offer_parser;

pub use offer_parser::{OfferParser, Parser};
