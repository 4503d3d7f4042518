//! Spatial queries over ordered element chains.

mod intersect;
mod rect_list;

pub use intersect::{intersect_chains, ChainHit};
pub use rect_list::{ChainProjection, ElemRectList, SubRect};
