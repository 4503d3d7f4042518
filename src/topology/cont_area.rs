use tracing::{debug, instrument};

use crate::error::TopologyError;
use crate::geometry::Elem;
use crate::math::{Point3, RectAx};

use super::{ContClsd, ContNest, Contour};

/// A planar region at one Z height made of disjoint nests.
#[derive(Debug, Clone, Default)]
pub struct ContArea {
    z: f64,
    nests: Vec<ContNest>,
}

impl ContArea {
    #[must_use]
    pub fn new(z: f64) -> Self {
        Self { z, nests: Vec::new() }
    }

    /// Sorts closed contours into nests by how deeply each one is enclosed.
    ///
    /// A contour inside an even number of others starts a new nest; one
    /// inside an odd number becomes a hole of the smallest contour that
    /// encloses it. Islands inside holes therefore form nests of their own.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidNesting`] if a hole cannot be placed
    /// inside its parent.
    #[instrument(skip(contours), fields(count = contours.len()))]
    pub fn from_closed(contours: Vec<ContClsd>, z: f64) -> Result<Self, TopologyError> {
        let n = contours.len();
        let mut depth = vec![0_usize; n];
        let mut parent: Vec<Option<usize>> = vec![None; n];
        for (i, inner) in contours.iter().enumerate() {
            for (j, outer) in contours.iter().enumerate() {
                if i == j || outer.area() <= inner.area() || !outer.encloses(inner) {
                    continue;
                }
                depth[i] += 1;
                if parent[i].is_none_or(|pj| outer.area() < contours[pj].area()) {
                    parent[i] = Some(j);
                }
            }
        }

        let mut area = Self::new(z);
        let mut nest_of: Vec<Option<usize>> = vec![None; n];
        let mut holes = Vec::new();
        for (i, c) in contours.into_iter().enumerate() {
            if depth[i] % 2 == 0 {
                nest_of[i] = Some(area.nests.len());
                area.nests.push(ContNest::new(c));
            } else {
                holes.push((i, c));
            }
        }
        for (i, hole) in holes {
            let nest = parent[i]
                .and_then(|pj| nest_of[pj])
                .and_then(|ni| area.nests.get_mut(ni))
                .ok_or_else(|| TopologyError::InvalidNesting(format!("hole {i} has no enclosing outer boundary")))?;
            nest.add_hole(hole)?;
        }
        debug!(nests = area.nests.len(), "nested closed contours");
        Ok(area)
    }

    /// Chains `elems` and nests the closed results.
    ///
    /// Open chains do not take part and are returned alongside the area.
    ///
    /// # Errors
    ///
    /// Propagates nesting failures from [`from_closed`](Self::from_closed).
    pub fn from_elems(
        elems: impl IntoIterator<Item = Elem>,
        tol: f64,
        z: f64,
    ) -> Result<(Self, Vec<Contour>), TopologyError> {
        let mut closed = Vec::new();
        let mut open = Vec::new();
        for c in Contour::build_all(elems, tol) {
            if c.is_closed() {
                closed.push(ContClsd::new(c, tol)?);
            } else {
                open.push(c);
            }
        }
        if !open.is_empty() {
            debug!(open = open.len(), "open chains left out of area");
        }
        Ok((Self::from_closed(closed, z)?, open))
    }

    #[must_use]
    pub fn z(&self) -> f64 {
        self.z
    }

    #[must_use]
    pub fn nests(&self) -> &[ContNest] {
        &self.nests
    }

    pub fn push(&mut self, nest: ContNest) {
        self.nests.push(nest);
    }

    /// Net area of all nests.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.nests.iter().map(ContNest::area).sum()
    }

    #[must_use]
    pub fn contains_point_xy(&self, p: &Point3) -> bool {
        self.nests.iter().any(|n| n.contains_point_xy(p))
    }

    #[must_use]
    pub fn rect(&self) -> RectAx {
        self.nests.iter().fold(RectAx::empty(), |r, n| r.united(&n.rect()))
    }
}
