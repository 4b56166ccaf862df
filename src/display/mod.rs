pub mod pagination;
pub mod table;

pub use pagination::pagination_footer;
pub use table::{TableDisplay, format_cell};
