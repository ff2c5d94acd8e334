use std::collections::{HashMap, VecDeque};

use super::{edge_key, Mesh};

/// Explicit face adjacency: two faces are neighbours iff they share an undirected edge.
#[derive(Debug, Clone, Default)]
pub struct FaceAdjacency {
    neighbors: Vec<Vec<usize>>,
}

impl FaceAdjacency {
    #[must_use]
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut by_edge: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        for (fi, face) in mesh.faces.iter().enumerate() {
            for (a, b) in face.edges() {
                by_edge.entry(edge_key(a, b)).or_default().push(fi);
            }
        }
        let mut neighbors = vec![Vec::new(); mesh.faces.len()];
        for faces in by_edge.values() {
            for &f in faces {
                for &g in faces {
                    if f != g {
                        neighbors[f].push(g);
                    }
                }
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        Self { neighbors }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    #[must_use]
    pub fn neighbors(&self, face: usize) -> &[usize] {
        &self.neighbors[face]
    }

    /// Breadth-first components, each started from the lowest unvisited face.
    ///
    /// Islands are returned in order of their lowest face, with face indices
    /// sorted ascending inside each island.
    #[must_use]
    pub fn islands(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.neighbors.len()];
        let mut islands = Vec::new();
        let mut queue = VecDeque::new();
        for start in 0..self.neighbors.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            queue.push_back(start);
            let mut island = Vec::new();
            while let Some(f) = queue.pop_front() {
                island.push(f);
                for &g in &self.neighbors[f] {
                    if !visited[g] {
                        visited[g] = true;
                        queue.push_back(g);
                    }
                }
            }
            island.sort_unstable();
            islands.push(island);
        }
        islands
    }
}
