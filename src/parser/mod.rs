pub mod date;
pub mod title;

pub use date::{parse_consumed_at, parse_consumed_date};
pub use title::{ParsedTitle, TitleParser};
