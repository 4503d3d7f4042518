pub mod elem;

pub use elem::{ArcSeg, Color, Elem, ElemGeom, ElemHit, ElemInfo, ElemProjection, ElemTags, LineSeg, LineStyle};
