pub mod html;

pub use html::{contains_keyword, decode_page, extract_links};
