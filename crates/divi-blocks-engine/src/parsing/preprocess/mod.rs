//! Text passes run over a document before it is parsed.

pub mod dynamic_data;
pub mod global_layout;
pub mod loops;

pub use dynamic_data::{DynamicToken, DynamicVariable, find_tokens, parse_variable, substitute};
pub use global_layout::inline_global_layouts;
pub use loops::expand_loop_blocks;
