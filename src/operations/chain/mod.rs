//! Turning unordered elements into contiguous chains.

mod contiguous;
mod grid;
mod short_elems;
mod sort;

pub use contiguous::is_contiguous;
pub use grid::{ElemSort, SortedChain, ELEM_SEARCH_SIZE};
pub use short_elems::remove_short_elems;
pub use sort::sort_first_fit;
