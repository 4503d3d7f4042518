mod cont_area;
mod cont_clsd;
mod cont_nest;
mod contour;
mod elem_list;
mod inertia;

pub use cont_area::ContArea;
pub use cont_clsd::ContClsd;
pub use cont_nest::ContNest;
pub use contour::Contour;
pub use elem_list::{ElemKey, ElemList, Iter};
pub use inertia::ContInert;
