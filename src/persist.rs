//! Field-level persistence contract.
//!
//! Types declare their fields once through a [`FieldRegistry`] and then
//! write and read them as an ordered stream of named values. The concrete
//! storage format belongs to whoever implements [`PersistentWriter`] and
//! [`PersistentReader`].

use crate::config::{ElemDefaults, RectListParams};
use crate::error::PersistError;
use crate::geometry::{ArcSeg, Color, Elem, ElemGeom, LineSeg, LineStyle};
use crate::math::{Point2, Point3, RectAx};
use crate::topology::{Contour, ElemList};

/// Value type of a persistent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Real,
    Point,
}

impl FieldKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Real => "real",
            Self::Point => "point",
        }
    }
}

/// One persisted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Point(Point3),
}

impl FieldValue {
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::Int(_) => FieldKind::Int,
            Self::Real(_) => FieldKind::Real,
            Self::Point(_) => FieldKind::Point,
        }
    }
}

/// Collects field declarations.
pub trait FieldRegistry {
    fn define(&mut self, name: &'static str, kind: FieldKind);
}

/// Sink for an ordered stream of named fields.
pub trait PersistentWriter {
    /// # Errors
    ///
    /// Implementation defined.
    fn write_field(&mut self, name: &'static str, value: FieldValue) -> Result<(), PersistError>;

    /// # Errors
    ///
    /// Implementation defined.
    fn write_bool(&mut self, name: &'static str, v: bool) -> Result<(), PersistError> {
        self.write_field(name, FieldValue::Bool(v))
    }

    /// # Errors
    ///
    /// Implementation defined.
    fn write_int(&mut self, name: &'static str, v: i64) -> Result<(), PersistError> {
        self.write_field(name, FieldValue::Int(v))
    }

    /// # Errors
    ///
    /// Implementation defined.
    fn write_real(&mut self, name: &'static str, v: f64) -> Result<(), PersistError> {
        self.write_field(name, FieldValue::Real(v))
    }

    /// # Errors
    ///
    /// Implementation defined.
    fn write_point(&mut self, name: &'static str, v: &Point3) -> Result<(), PersistError> {
        self.write_field(name, FieldValue::Point(*v))
    }
}

/// Source of fields in the order they were written.
pub trait PersistentReader {
    /// Reads the next field, which must be called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::MissingField`] if the next field is absent or
    /// has another name.
    fn read_field(&mut self, name: &'static str) -> Result<FieldValue, PersistError>;

    /// # Errors
    ///
    /// Returns [`PersistError::TypeMismatch`] if the field is not a bool.
    fn read_bool(&mut self, name: &'static str) -> Result<bool, PersistError> {
        match self.read_field(name)? {
            FieldValue::Bool(v) => Ok(v),
            _ => Err(mismatch(name, FieldKind::Bool)),
        }
    }

    /// # Errors
    ///
    /// Returns [`PersistError::TypeMismatch`] if the field is not an int.
    fn read_int(&mut self, name: &'static str) -> Result<i64, PersistError> {
        match self.read_field(name)? {
            FieldValue::Int(v) => Ok(v),
            _ => Err(mismatch(name, FieldKind::Int)),
        }
    }

    /// Ints are accepted and widened.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::TypeMismatch`] if the field is not numeric.
    #[allow(clippy::cast_precision_loss)]
    fn read_real(&mut self, name: &'static str) -> Result<f64, PersistError> {
        match self.read_field(name)? {
            FieldValue::Real(v) => Ok(v),
            FieldValue::Int(v) => Ok(v as f64),
            _ => Err(mismatch(name, FieldKind::Real)),
        }
    }

    /// # Errors
    ///
    /// Returns [`PersistError::TypeMismatch`] if the field is not a point.
    fn read_point(&mut self, name: &'static str) -> Result<Point3, PersistError> {
        match self.read_field(name)? {
            FieldValue::Point(v) => Ok(v),
            _ => Err(mismatch(name, FieldKind::Point)),
        }
    }
}

fn mismatch(field: &'static str, expected: FieldKind) -> PersistError {
    PersistError::TypeMismatch {
        field,
        expected: expected.name(),
    }
}

fn read_i32(r: &mut dyn PersistentReader, name: &'static str) -> Result<i32, PersistError> {
    i32::try_from(r.read_int(name)?).map_err(|_| PersistError::TypeMismatch {
        field: name,
        expected: "i32",
    })
}

fn read_u32(r: &mut dyn PersistentReader, name: &'static str) -> Result<u32, PersistError> {
    u32::try_from(r.read_int(name)?).map_err(|_| PersistError::TypeMismatch {
        field: name,
        expected: "u32",
    })
}

fn read_style(r: &mut dyn PersistentReader, name: &'static str) -> Result<LineStyle, PersistError> {
    LineStyle::from_code(read_u32(r, name)?).ok_or(PersistError::TypeMismatch {
        field: name,
        expected: "line style code",
    })
}

/// A type that can declare, write and read its fields.
pub trait Persistent: Sized {
    fn define_persistent_fields(registry: &mut dyn FieldRegistry);

    /// # Errors
    ///
    /// Propagates writer failures.
    fn write_persistent_object(&self, w: &mut dyn PersistentWriter) -> Result<(), PersistError>;

    /// # Errors
    ///
    /// Returns a [`PersistError`] for missing, mistyped or invalid fields.
    fn read_persistent_object(r: &mut dyn PersistentReader) -> Result<Self, PersistError>;

    /// Hook run after the whole object has been read.
    fn post_process(&mut self) {}
}

/// Reads a `T` and runs its post-processing.
///
/// # Errors
///
/// Returns the first [`PersistError`] met while reading.
pub fn load<T: Persistent>(r: &mut dyn PersistentReader) -> Result<T, PersistError> {
    let mut obj = T::read_persistent_object(r)?;
    obj.post_process();
    Ok(obj)
}

impl Persistent for RectAx {
    fn define_persistent_fields(registry: &mut dyn FieldRegistry) {
        registry.define("valid", FieldKind::Bool);
        registry.define("ll", FieldKind::Point);
        registry.define("ur", FieldKind::Point);
    }

    fn write_persistent_object(&self, w: &mut dyn PersistentWriter) -> Result<(), PersistError> {
        // An empty box has no corners; origin placeholders keep the field order.
        let (ll, ur) = if self.is_valid() {
            (*self.ll(), *self.ur())
        } else {
            (Point3::origin(), Point3::origin())
        };
        w.write_bool("valid", self.is_valid())?;
        w.write_point("ll", &ll)?;
        w.write_point("ur", &ur)
    }

    fn read_persistent_object(r: &mut dyn PersistentReader) -> Result<Self, PersistError> {
        let valid = r.read_bool("valid")?;
        let ll = r.read_point("ll")?;
        let ur = r.read_point("ur")?;
        Ok(if valid { RectAx::new(ll, ur) } else { RectAx::empty() })
    }
}

const KIND_LINE: i64 = 0;
const KIND_ARC: i64 = 1;

/// Payloads are not persisted.
impl Persistent for Elem {
    fn define_persistent_fields(registry: &mut dyn FieldRegistry) {
        registry.define("kind", FieldKind::Int);
        registry.define("p1", FieldKind::Point);
        registry.define("p2", FieldKind::Point);
        registry.define("reversed", FieldKind::Bool);
        registry.define("style", FieldKind::Int);
        registry.define("center", FieldKind::Point);
        registry.define("radius", FieldKind::Real);
        registry.define("a1", FieldKind::Real);
        registry.define("a2", FieldKind::Real);
        registry.define("bpar", FieldKind::Real);
        registry.define("el_id", FieldKind::Int);
        registry.define("cnt_id", FieldKind::Int);
        registry.define("p_cnt_id", FieldKind::Int);
        registry.define("cam_inf", FieldKind::Int);
        registry.define("color", FieldKind::Int);
        registry.define("ins_arc", FieldKind::Bool);
    }

    fn write_persistent_object(&self, w: &mut dyn PersistentWriter) -> Result<(), PersistError> {
        match self.geom() {
            ElemGeom::Line(l) => {
                w.write_int("kind", KIND_LINE)?;
                w.write_point("p1", l.p1())?;
                w.write_point("p2", l.p2())?;
                w.write_bool("reversed", l.is_reversed())?;
                w.write_int("style", i64::from(l.style().code()))?;
            }
            ElemGeom::Arc(a) => {
                w.write_int("kind", KIND_ARC)?;
                w.write_point("p1", a.p1())?;
                w.write_point("p2", a.p2())?;
                w.write_point("center", &Point3::new(a.center().x, a.center().y, 0.0))?;
                w.write_real("radius", a.radius())?;
                w.write_real("a1", a.start_angle())?;
                w.write_real("a2", a.end_angle())?;
            }
        }
        w.write_real("bpar", self.bpar())?;
        let t = self.tags();
        w.write_int("el_id", i64::from(t.el_id))?;
        w.write_int("cnt_id", i64::from(t.cnt_id))?;
        w.write_int("p_cnt_id", i64::from(t.p_cnt_id))?;
        w.write_int("cam_inf", i64::from(t.cam_inf))?;
        w.write_int("color", i64::from(t.color.0))?;
        w.write_bool("ins_arc", t.ins_arc)
    }

    fn read_persistent_object(r: &mut dyn PersistentReader) -> Result<Self, PersistError> {
        let kind = r.read_int("kind")?;
        let p1 = r.read_point("p1")?;
        let p2 = r.read_point("p2")?;
        let geom = match kind {
            KIND_LINE => {
                let reversed = r.read_bool("reversed")?;
                let style = read_style(r, "style")?;
                let mut line = LineSeg::new(p1, p2).with_style(style);
                line.set_reversed(reversed);
                ElemGeom::Line(line)
            }
            KIND_ARC => {
                let c = r.read_point("center")?;
                let radius = r.read_real("radius")?;
                let a1 = r.read_real("a1")?;
                let a2 = r.read_real("a2")?;
                ElemGeom::Arc(ArcSeg::from_parts(p1, p2, Point2::new(c.x, c.y), radius, a1, a2))
            }
            other => return Err(PersistError::UnknownKind(u32::try_from(other).unwrap_or(u32::MAX))),
        };
        let mut elem = Elem::new(geom);
        elem.set_bpar(r.read_real("bpar")?);
        let t = elem.tags_mut();
        t.el_id = read_i32(r, "el_id")?;
        t.cnt_id = read_i32(r, "cnt_id")?;
        t.p_cnt_id = read_i32(r, "p_cnt_id")?;
        t.cam_inf = read_i32(r, "cam_inf")?;
        t.color = Color(read_u32(r, "color")?);
        t.ins_arc = r.read_bool("ins_arc")?;
        Ok(elem)
    }
}

/// A contour writes its flags, defaults and index budgets, the element
/// count, then each element's fields in chain order.
impl Persistent for Contour {
    fn define_persistent_fields(registry: &mut dyn FieldRegistry) {
        registry.define("closed", FieldKind::Bool);
        registry.define("default_color", FieldKind::Int);
        registry.define("default_style", FieldKind::Int);
        registry.define("max_elems", FieldKind::Int);
        registry.define("max_area", FieldKind::Real);
        registry.define("count", FieldKind::Int);
        Elem::define_persistent_fields(registry);
    }

    fn write_persistent_object(&self, w: &mut dyn PersistentWriter) -> Result<(), PersistError> {
        w.write_bool("closed", self.is_closed())?;
        w.write_int("default_color", i64::from(self.defaults().color.0))?;
        w.write_int("default_style", i64::from(self.defaults().line_style.code()))?;
        let params = self.rect_list_params();
        let max_elems = i64::try_from(params.max_elems).map_err(|_| PersistError::TypeMismatch {
            field: "max_elems",
            expected: "i64",
        })?;
        w.write_int("max_elems", max_elems)?;
        w.write_real("max_area", params.max_area)?;
        let count = i64::try_from(self.len()).map_err(|_| PersistError::TypeMismatch {
            field: "count",
            expected: "i64",
        })?;
        w.write_int("count", count)?;
        for e in self.elems().elems() {
            e.write_persistent_object(w)?;
        }
        Ok(())
    }

    fn read_persistent_object(r: &mut dyn PersistentReader) -> Result<Self, PersistError> {
        let closed = r.read_bool("closed")?;
        let defaults = ElemDefaults {
            color: Color(read_u32(r, "default_color")?),
            line_style: read_style(r, "default_style")?,
        };
        let params = RectListParams {
            max_elems: usize::try_from(r.read_int("max_elems")?)
                .ok()
                .filter(|&n| n > 0)
                .ok_or(PersistError::TypeMismatch {
                    field: "max_elems",
                    expected: "positive count",
                })?,
            max_area: r.read_real("max_area")?,
        };
        let count = usize::try_from(r.read_int("count")?).map_err(|_| PersistError::TypeMismatch {
            field: "count",
            expected: "non-negative count",
        })?;
        let mut elems = ElemList::new();
        for _ in 0..count {
            elems.push_back(load::<Elem>(r)?);
        }
        let mut contour = Contour::from_list(elems, closed);
        contour.set_defaults(defaults);
        contour.set_rect_list_params(params);
        Ok(contour)
    }
}
