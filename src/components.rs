//! Connected-component mapping of the network.
//!
//! Every node (wire) gets the id of the connected component it belongs to.
//! Ids start at 0 and follow the order in which components are discovered
//! when scanning nodes by ascending index, so the component holding node 0
//! is always component 0.
//!
//! The dominant component is the one with the most nodes. Ties go to the
//! lowest id.

use crate::device::Topology;
use crate::error::{NnsError, Result};
use crate::matrix::Matrix;
use crate::state::NetworkState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentMap {
    ids: Vec<usize>,
    sizes: Vec<usize>,
}

impl ComponentMap {
    /// Label the components of an undirected adjacency matrix. The diagonal is ignored.
    pub fn from_adjacency(adjacency: &Matrix<bool>) -> Self {
        let n = adjacency.size();
        Self::label(n, |node, visit| {
            for (j, &adjacent) in adjacency.row(node).iter().enumerate() {
                if adjacent {
                    visit(j);
                }
            }
        })
    }

    /// Label the components of the junction graph.
    pub fn from_topology(topology: &Topology) -> Self {
        let n = topology.wires_count();
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for j in &topology.junctions {
            let (a, b) = (j.first_wire as usize, j.second_wire as usize);
            if a < n && b < n {
                neighbors[a].push(b);
                neighbors[b].push(a);
            }
        }
        Self::label(n, |node, visit| {
            for &j in &neighbors[node] {
                visit(j);
            }
        })
    }

    /// Wrap ids computed by the engine.
    ///
    /// Every id must be below the node count. Ids are renumbered densely in
    /// order of first appearance, so the grouping is kept but gaps vanish.
    pub fn from_ids(raw: &[i32]) -> Result<Self> {
        let n = raw.len();
        let mut renumbered: Vec<Option<usize>> = vec![None; n];
        let mut ids = Vec::with_capacity(n);
        let mut sizes = Vec::new();
        for (node, &id) in raw.iter().enumerate() {
            let slot = usize::try_from(id).ok().filter(|&id| id < n).ok_or_else(|| {
                NnsError::InvalidTopology(format!(
                    "node {node} has component id {id}, expected 0..{n}"
                ))
            })?;
            let dense = *renumbered[slot].get_or_insert_with(|| {
                sizes.push(0);
                sizes.len() - 1
            });
            sizes[dense] += 1;
            ids.push(dense);
        }
        Ok(Self { ids, sizes })
    }

    /// Iterative flood fill. `neighbors(node, visit)` must call `visit` for
    /// every node adjacent to `node`.
    fn label(n: usize, mut neighbors: impl FnMut(usize, &mut dyn FnMut(usize))) -> Self {
        const UNSET: usize = usize::MAX;
        let mut ids = vec![UNSET; n];
        let mut sizes = Vec::new();
        let mut stack = Vec::new();

        for origin in 0..n {
            if ids[origin] != UNSET {
                continue;
            }
            let id = sizes.len();
            let mut size = 0;
            ids[origin] = id;
            stack.push(origin);
            while let Some(node) = stack.pop() {
                size += 1;
                neighbors(node, &mut |j| {
                    if ids[j] == UNSET {
                        ids[j] = id;
                        stack.push(j);
                    }
                });
            }
            sizes.push(size);
        }

        Self { ids, sizes }
    }

    /// Number of nodes mapped.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn id(&self, node: usize) -> Option<usize> {
        self.ids.get(node).copied()
    }

    pub fn component_count(&self) -> usize {
        self.sizes.len()
    }

    /// Member count per component id.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Nodes of component `id`, ascending.
    pub fn members(&self, id: usize) -> Vec<usize> {
        self.ids
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == id)
            .map(|(node, _)| node)
            .collect()
    }

    /// Id of the largest component, lowest id on ties. `None` when empty.
    pub fn dominant(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (id, &size) in self.sizes.iter().enumerate() {
            if size > 0 && best.map_or(true, |(_, s)| size > s) {
                best = Some((id, size));
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn dominant_size(&self) -> usize {
        self.dominant().map_or(0, |id| self.sizes[id])
    }

    /// Nodes of the dominant component, ascending.
    pub fn dominant_members(&self) -> Vec<usize> {
        self.dominant().map(|id| self.members(id)).unwrap_or_default()
    }

    /// Split a state into one sub-state per component.
    ///
    /// Sub-state `k` holds the nodes of component `k` in ascending order, with
    /// adjacency, admittance and voltages restricted to them.
    pub fn split_state(&self, state: &NetworkState) -> Result<Vec<NetworkState>> {
        self.check_len(state)?;
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); self.sizes.len()];
        for (node, &id) in self.ids.iter().enumerate() {
            members[id].push(node);
        }
        Ok(members.iter().map(|nodes| state.select(nodes)).collect())
    }

    /// Sub-state of the dominant component.
    pub fn largest_state(&self, state: &NetworkState) -> Result<NetworkState> {
        self.check_len(state)?;
        Ok(state.select(&self.dominant_members()))
    }

    fn check_len(&self, state: &NetworkState) -> Result<()> {
        if state.size() != self.ids.len() {
            return Err(NnsError::ShapeMismatch(format!(
                "state has {} nodes, component map covers {}",
                state.size(),
                self.ids.len()
            )));
        }
        Ok(())
    }
}

/// One connected component as the engine exports it to `cc_{id}.nns`.
///
/// The engine sorts components by decreasing size, so record 0 is the
/// largest. Junctions are linearized over the component's own node indices:
/// `index = i * wires_count + j`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRecord {
    pub wires_count: usize,
    /// Offset of the component's first wire in the engine's packed arrays.
    pub wires_skip: usize,
    /// Offset of the component's first junction in the engine's packed arrays.
    pub junctions_skip: usize,
    pub junctions: Vec<usize>,
}

impl ComponentRecord {
    /// Build a record, checking every junction index lies inside the component.
    pub fn new(wires_count: usize, wires_skip: usize, junctions_skip: usize, junctions: Vec<usize>) -> Result<Self> {
        let cells = wires_count.saturating_mul(wires_count);
        if let Some(&bad) = junctions.iter().find(|&&index| index >= cells) {
            return Err(NnsError::InvalidTopology(format!(
                "component junction index {bad} outside a {wires_count}-wire component"
            )));
        }
        Ok(Self {
            wires_count,
            wires_skip,
            junctions_skip,
            junctions,
        })
    }

    pub fn junctions_count(&self) -> usize {
        self.junctions.len()
    }

    /// Junctions as `(i, j)` node pairs local to the component.
    pub fn junction_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.wires_count;
        self.junctions.iter().map(move |&index| (index / n, index % n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Junction, Point, Wire};

    fn adjacency(rows: &[&[u8]]) -> Matrix<bool> {
        Matrix::from_rows(rows.iter().map(|r| r.iter().map(|&b| b != 0).collect()).collect()).unwrap()
    }

    /// Six nodes: {0, 1, 3}, {2}, {4, 5}.
    fn disjoint_state() -> NetworkState {
        let a = adjacency(&[
            &[0, 1, 0, 1, 0, 0],
            &[1, 0, 0, 0, 0, 0],
            &[0, 0, 0, 0, 0, 0],
            &[1, 0, 0, 0, 0, 0],
            &[0, 0, 0, 0, 0, 1],
            &[0, 0, 0, 0, 1, 0],
        ]);
        let y = Matrix::from_rows(vec![
            vec![21.0, 22.0, 23.0, 24.0, 25.0, 26.0],
            vec![22.0, 27.0, 28.0, 29.0, 30.0, 31.0],
            vec![23.0, 28.0, 32.0, 33.0, 34.0, 35.0],
            vec![24.0, 29.0, 33.0, 36.0, 37.0, 38.0],
            vec![25.0, 30.0, 34.0, 37.0, 39.0, 40.0],
            vec![26.0, 31.0, 35.0, 38.0, 40.0, 41.0],
        ])
        .unwrap();
        let v = vec![42.0, 43.0, 44.0, 45.0, 46.0, 47.0];
        NetworkState::new(a, y, v).unwrap()
    }

    #[test]
    fn test_two_connected_wires_single_component() {
        let map = ComponentMap::from_adjacency(&adjacency(&[&[0, 1], &[1, 0]]));
        assert_eq!(map.ids(), &[0, 0]);
        assert_eq!(map.component_count(), 1);
        assert_eq!(map.dominant(), Some(0));
    }

    #[test]
    fn test_isolated_wire_gets_own_component() {
        let map = ComponentMap::from_adjacency(&adjacency(&[&[0, 1, 0], &[1, 0, 0], &[0, 0, 0]]));
        assert_eq!(map.id(0), map.id(1));
        assert_ne!(map.id(2), map.id(0));
        assert_eq!(map.dominant(), map.id(0));
        assert_eq!(map.dominant_members(), vec![0, 1]);
    }

    #[test]
    fn test_ids_follow_discovery_order() {
        let map = ComponentMap::from_adjacency(disjoint_state().adjacency());
        assert_eq!(map.ids(), &[0, 0, 1, 0, 2, 2]);
        assert_eq!(map.sizes(), &[3, 1, 2]);
    }

    #[test]
    fn test_labeling_is_deterministic() {
        let state = disjoint_state();
        let first = ComponentMap::from_adjacency(state.adjacency());
        for _ in 0..5 {
            let again = ComponentMap::from_adjacency(state.adjacency());
            assert_eq!(again, first);
            assert_eq!(again.dominant(), first.dominant());
        }
    }

    #[test]
    fn test_tie_goes_to_lowest_id() {
        let map = ComponentMap::from_adjacency(&adjacency(&[
            &[0, 0, 0, 1],
            &[0, 0, 1, 0],
            &[0, 1, 0, 0],
            &[1, 0, 0, 0],
        ]));
        assert_eq!(map.ids(), &[0, 1, 1, 0]);
        assert_eq!(map.sizes(), &[2, 2]);
        assert_eq!(map.dominant(), Some(0));

        let singletons = ComponentMap::from_adjacency(&Matrix::new(3));
        assert_eq!(singletons.dominant(), Some(0));
    }

    #[test]
    fn test_diagonal_ignored_for_grouping() {
        let map = ComponentMap::from_adjacency(&adjacency(&[&[1, 0], &[0, 1]]));
        assert_eq!(map.component_count(), 2);
    }

    #[test]
    fn test_empty_map() {
        let map = ComponentMap::from_adjacency(&Matrix::new(0));
        assert!(map.is_empty());
        assert_eq!(map.dominant(), None);
        assert!(map.dominant_members().is_empty());
    }

    #[test]
    fn test_from_ids_renumbers_densely() {
        let map = ComponentMap::from_ids(&[2, 0, 2, 2]).unwrap();
        assert_eq!(map.ids(), &[0, 1, 0, 0]);
        assert_eq!(map.sizes(), &[3, 1]);
        assert_eq!(map.dominant(), Some(0));
        assert_eq!(map.members(0), vec![0, 2, 3]);
    }

    #[test]
    fn test_from_ids_rejects_out_of_range() {
        let err = ComponentMap::from_ids(&[0, -1]).unwrap_err();
        assert!(matches!(err, NnsError::InvalidTopology(_)));

        // two wires cannot form component 400 million
        let err = ComponentMap::from_ids(&[0, 400_000_000]).unwrap_err();
        assert!(matches!(err, NnsError::InvalidTopology(_)));
        assert!(ComponentMap::from_ids(&[0, 2]).is_err());
        assert_eq!(ComponentMap::from_ids(&[1, 1]).unwrap().component_count(), 1);
    }

    #[test]
    fn test_from_topology_matches_adjacency() {
        let wire = Wire {
            centroid: Point::default(),
            start: Point::default(),
            end: Point::default(),
            length: 1.0,
        };
        let junction = |a, b| Junction {
            first_wire: a,
            second_wire: b,
            position: Point::default(),
        };
        let topology =
            Topology::new(vec![wire; 5], vec![junction(0, 3), junction(3, 4), junction(1, 2)]).unwrap();
        let from_graph = ComponentMap::from_topology(&topology);
        assert_eq!(from_graph.ids(), &[0, 1, 1, 0, 0]);
        assert_eq!(from_graph, ComponentMap::from_adjacency(&topology.adjacency()));
    }

    #[test]
    fn test_split_state_disjoint_network() {
        let state = disjoint_state();
        let map = ComponentMap::from_adjacency(state.adjacency());
        let parts = map.split_state(&state).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.iter().map(NetworkState::size).collect::<Vec<_>>(), vec![3, 1, 2]);

        // first component holds original nodes 0, 1, 3
        let first = &parts[0];
        assert!(!first.adjacency()[(0, 0)]);
        assert_eq!(first.admittance()[(0, 0)], 21.0);
        assert!(first.adjacency()[(0, 2)]);
        assert_eq!(first.admittance()[(0, 2)], 24.0);
        assert_eq!(first.voltages(), &[42.0, 43.0, 45.0]);

        assert_eq!(parts[1].voltages(), &[44.0]);
        assert_eq!(parts[2].admittance()[(0, 1)], 40.0);

        let largest = map.largest_state(&state).unwrap();
        assert_eq!(&largest, first);
    }

    #[test]
    fn test_split_state_size_mismatch() {
        let map = ComponentMap::from_adjacency(&Matrix::new(2));
        let err = map.split_state(&disjoint_state()).unwrap_err();
        assert!(matches!(err, NnsError::ShapeMismatch(_)));
    }

    #[test]
    fn test_component_record_pairs() {
        let record = ComponentRecord::new(3, 0, 0, vec![1, 5, 6]).unwrap();
        assert_eq!(record.junctions_count(), 3);
        assert_eq!(record.junction_pairs().collect::<Vec<_>>(), vec![(0, 1), (1, 2), (2, 0)]);

        let err = ComponentRecord::new(2, 0, 0, vec![4]).unwrap_err();
        assert!(matches!(err, NnsError::InvalidTopology(_)));
    }
}
