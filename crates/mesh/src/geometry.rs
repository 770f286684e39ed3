use ordered_float::OrderedFloat;

pub type Vector2 = cgmath::Vector2<f32>;
pub type Vector3 = cgmath::Vector3<f32>;

/// Vectors with hashable, exact float equality.
///
/// Floats are not hash nor eq, so we use the ordered-float crate. Two keys are
/// equal only when every component compares equal; there is no tolerance.
pub type OrderedVec2 = cgmath::Vector2<OrderedFloat<f32>>;
pub type OrderedVec3 = cgmath::Vector3<OrderedFloat<f32>>;

// OrderedFloat is repr(transparent), so keys cost no more than the vectors.
static_assertions::assert_eq_size!(Vector3, [f32; 3]);
static_assertions::assert_eq_size!(OrderedVec3, Vector3);
static_assertions::assert_eq_size!(OrderedVec2, Vector2);

pub fn ordered2(v: Vector2) -> OrderedVec2 {
    v.map(OrderedFloat)
}

pub fn ordered3(v: Vector3) -> OrderedVec3 {
    v.map(OrderedFloat)
}

/// A directed edge between two exact vertex positions.
pub type Edge = (OrderedVec3, OrderedVec3);

#[derive(Debug, PartialEq, Copy, Clone)]
#[repr(C)]
pub struct Triangle {
    pub p0: Vector3,
    pub p1: Vector3,
    pub p2: Vector3,
}

impl Triangle {
    /// Edges following the winding of the triangle: p0->p1, p1->p2, p2->p0.
    pub fn edges(&self) -> [Edge; 3] {
        let (a, b, c) = (ordered3(self.p0), ordered3(self.p1), ordered3(self.p2));
        [(a, b), (b, c), (c, a)]
    }

    /// Edges against the winding: p1->p0, p2->p1, p0->p2.
    ///
    /// This is how a shared edge appears from the neighbouring face when both
    /// faces are wound consistently.
    pub fn reverse_edges(&self) -> [Edge; 3] {
        let (a, b, c) = (ordered3(self.p0), ordered3(self.p1), ordered3(self.p2));
        [(b, a), (c, b), (a, c)]
    }
}
