//! Directed multigraph with per-arc weight and resource consumption.
//!
//! Vertices carry two identities: the caller-visible user id and a dense
//! internal index assigned in `add_nodes` insertion order. Every internal
//! structure (buckets, bounds, bit sets) is indexed by the dense id; user
//! ids only appear at the API boundary and in REF callbacks.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::options::Direction;

/// Dense internal vertex index.
pub(crate) type VertexId = usize;
/// Index into the arc table.
pub(crate) type ArcId = usize;

/// A directed arc with its weight and resource consumption vector.
#[derive(Debug, Clone)]
pub(crate) struct Arc {
    pub tail: VertexId,
    pub head: VertexId,
    pub weight: f64,
    pub resources: Vec<f64>,
}

impl Arc {
    /// Endpoint reached when traversing the arc in the given direction:
    /// the head going forward, the tail going backward.
    #[inline]
    pub fn adjacent(&self, direction: Direction) -> VertexId {
        match direction {
            Direction::Backward => self.tail,
            _ => self.head,
        }
    }
}

#[derive(Debug)]
pub(crate) struct DiGraph {
    /// Dense index -> user id.
    user_ids: Vec<usize>,
    /// User id -> dense index.
    index: HashMap<usize, VertexId>,
    arcs: Vec<Arc>,
    out: Vec<Vec<ArcId>>,
    inc: Vec<Vec<ArcId>>,
    source_id: usize,
    sink_id: usize,
    n_res: usize,
}

impl DiGraph {
    pub fn new(
        number_vertices: usize,
        number_edges: usize,
        source_id: usize,
        sink_id: usize,
        n_res: usize,
    ) -> Result<Self> {
        if source_id == sink_id {
            return Err(Error::SourceIsSink);
        }
        Ok(Self {
            user_ids: Vec::with_capacity(number_vertices),
            index: HashMap::with_capacity(number_vertices),
            arcs: Vec::with_capacity(number_edges),
            out: Vec::with_capacity(number_vertices),
            inc: Vec::with_capacity(number_vertices),
            source_id,
            sink_id,
            n_res,
        })
    }

    /// Declare vertices; their order here fixes the dense internal index.
    /// Repeated ids are ignored.
    pub fn add_nodes(&mut self, ids: &[usize]) {
        for &id in ids {
            if !self.index.contains_key(&id) {
                self.index.insert(id, self.user_ids.len());
                self.user_ids.push(id);
                self.out.push(Vec::new());
                self.inc.push(Vec::new());
            }
        }
    }

    /// Append an arc. Parallel arcs between the same pair are allowed.
    pub fn add_edge(
        &mut self,
        tail_id: usize,
        head_id: usize,
        weight: f64,
        resources: &[f64],
    ) -> Result<()> {
        if resources.len() != self.n_res {
            return Err(Error::ResourceArityMismatch {
                expected: self.n_res,
                got: resources.len(),
            });
        }
        let tail = self.vertex(tail_id)?;
        let head = self.vertex(head_id)?;
        let arc_id = self.arcs.len();
        self.arcs.push(Arc {
            tail,
            head,
            weight,
            resources: resources.to_vec(),
        });
        self.out[tail].push(arc_id);
        self.inc[head].push(arc_id);
        Ok(())
    }

    pub fn vertex(&self, user_id: usize) -> Result<VertexId> {
        self.index
            .get(&user_id)
            .copied()
            .ok_or(Error::UnknownVertex(user_id))
    }

    #[inline]
    pub fn user_id(&self, v: VertexId) -> usize {
        self.user_ids[v]
    }

    pub fn num_vertices(&self) -> usize {
        self.user_ids.len()
    }

    pub fn source(&self) -> Result<VertexId> {
        self.vertex(self.source_id)
    }

    pub fn sink(&self) -> Result<VertexId> {
        self.vertex(self.sink_id)
    }

    #[inline]
    pub fn arc(&self, id: ArcId) -> &Arc {
        &self.arcs[id]
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn out_arcs(&self, v: VertexId) -> &[ArcId] {
        &self.out[v]
    }

    /// Arc ids incident to `v` in the given direction: outgoing arcs going
    /// forward, incoming arcs going backward.
    pub fn incident_arcs(&self, v: VertexId, direction: Direction) -> &[ArcId] {
        match direction {
            Direction::Backward => &self.inc[v],
            _ => &self.out[v],
        }
    }

    /// True when no arc consumes a negative amount of any resource.
    pub fn all_resources_positive(&self) -> bool {
        self.arcs
            .iter()
            .all(|a| a.resources.iter().all(|&r| r >= 0.0))
    }
}
