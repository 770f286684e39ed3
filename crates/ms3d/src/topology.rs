//! Regrouping meshes that were split apart by material.
//!
//! Exporters write one group per material, so a single connected surface may
//! come back as several meshes. Two meshes are treated as one surface when
//! they share an edge: a consistently wound neighbour traverses the shared
//! edge in the opposite direction, so a candidate's reversed edges are looked
//! up among the forward edges already collected for each output.
//!
//! Matching compares exact coordinates. Meshes that were rounded or
//! quantized between export and import stay separate.

use std::collections::HashSet;

use milkshake_mesh::{Edge, TriangleMesh};

#[derive(Debug, Default)]
pub struct TopologyMatcher {
    outputs: Vec<HashSet<Edge>>,
}

impl TopologyMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the output the candidate belongs to.
    ///
    /// Outputs are scanned in creation order and the first one sharing an
    /// edge wins. Without a match a new output is started. Either way the
    /// candidate's edges join the chosen output.
    pub fn assign<M: TriangleMesh>(&mut self, candidate: &M) -> usize {
        let reversed: Vec<Edge> = candidate
            .triangles()
            .flat_map(|t| t.reverse_edges())
            .collect();
        let index = match self
            .outputs
            .iter()
            .position(|edges| reversed.iter().any(|e| edges.contains(e)))
        {
            Some(index) => index,
            None => {
                self.outputs.push(HashSet::new());
                self.outputs.len() - 1
            }
        };
        self.outputs[index].extend(candidate.triangles().flat_map(|t| t.edges()));
        index
    }

    /// Number of outputs created so far.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Groups meshes into connected surfaces.
///
/// Returns, per surface, the indices of its meshes in input order.
pub fn group_by_topology<M: TriangleMesh>(meshes: &[M]) -> Vec<Vec<usize>> {
    let mut matcher = TopologyMatcher::new();
    let mut surfaces: Vec<Vec<usize>> = Vec::new();
    for (i, mesh) in meshes.iter().enumerate() {
        let surface = matcher.assign(mesh);
        if surface == surfaces.len() {
            surfaces.push(Vec::new());
        }
        surfaces[surface].push(i);
    }
    surfaces
}
