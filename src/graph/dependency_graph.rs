use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::TypeKey;

/// Service dependency graph: consumer → providers
///
/// Nodes keep insertion order so every traversal is deterministic.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Adjacency list: consumer -> providers, in the order edges were added
    edges: FxHashMap<TypeKey, Vec<TypeKey>>,
    nodes: IndexSet<TypeKey>,
}

/// Working state of Tarjan's algorithm
struct Tarjan<'g> {
    graph: &'g DependencyGraph,
    next_index: usize,
    index: FxHashMap<&'g TypeKey, usize>,
    low_link: FxHashMap<&'g TypeKey, usize>,
    stack: Vec<&'g TypeKey>,
    on_stack: FxHashSet<&'g TypeKey>,
    components: Vec<Vec<TypeKey>>,
}

impl<'g> Tarjan<'g> {
    fn visit(&mut self, node: &'g TypeKey) {
        self.index.insert(node, self.next_index);
        self.low_link.insert(node, self.next_index);
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        for dep in self.graph.dependencies_of(node) {
            if !self.index.contains_key(dep) {
                self.visit(dep);
                let low = self.low_link[node].min(self.low_link[dep]);
                self.low_link.insert(node, low);
            } else if self.on_stack.contains(dep) {
                let low = self.low_link[node].min(self.index[dep]);
                self.low_link.insert(node, low);
            }
        }

        if self.low_link[node] == self.index[node] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.remove(member);
                component.push(member.clone());
                if member == node {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: TypeKey) {
        self.nodes.insert(node);
    }

    /// Add `consumer → provider`. Duplicate edges are ignored.
    pub fn add_edge(&mut self, consumer: TypeKey, provider: TypeKey) {
        self.nodes.insert(consumer.clone());
        self.nodes.insert(provider.clone());
        let deps = self.edges.entry(consumer).or_default();
        if !deps.contains(&provider) {
            deps.push(provider);
        }
    }

    pub fn dependencies_of(&self, node: &TypeKey) -> &[TypeKey] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_edge(&self, consumer: &TypeKey, provider: &TypeKey) -> bool {
        self.dependencies_of(consumer).contains(provider)
    }

    pub fn contains(&self, node: &TypeKey) -> bool {
        self.nodes.contains(node)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Strongly connected components, dependencies before their consumers
    pub fn strongly_connected_components(&self) -> Vec<Vec<TypeKey>> {
        let mut tarjan = Tarjan {
            graph: self,
            next_index: 0,
            index: FxHashMap::default(),
            low_link: FxHashMap::default(),
            stack: Vec::new(),
            on_stack: FxHashSet::default(),
            components: Vec::new(),
        };
        for node in &self.nodes {
            if !tarjan.index.contains_key(node) {
                tarjan.visit(node);
            }
        }
        tarjan.components
    }

    /// Every cycle once, members in cycle order starting from the earliest-added node
    pub fn cycles(&self) -> Vec<Vec<TypeKey>> {
        self.strongly_connected_components()
            .into_iter()
            .filter(|component| {
                component.len() > 1 || self.has_edge(&component[0], &component[0])
            })
            .map(|component| self.cycle_order(&component))
            .collect()
    }

    /// Nodes in dependency order (dependencies first); cycle members stay adjacent
    pub fn dependency_order(&self) -> Vec<TypeKey> {
        self.strongly_connected_components()
            .into_iter()
            .flat_map(|component| {
                if component.len() > 1 {
                    self.cycle_order(&component)
                } else {
                    component
                }
            })
            .collect()
    }

    /// Walk the component along its edges from its earliest-added member
    fn cycle_order(&self, component: &[TypeKey]) -> Vec<TypeKey> {
        let members: FxHashSet<&TypeKey> = component.iter().collect();
        let start = self
            .nodes
            .iter()
            .find(|n| members.contains(n))
            .unwrap_or(&component[0]);

        let mut ordered = Vec::with_capacity(component.len());
        let mut visited = FxHashSet::default();
        self.walk(start, &members, &mut visited, &mut ordered);
        ordered
    }

    fn walk<'a>(
        &'a self,
        node: &'a TypeKey,
        members: &FxHashSet<&TypeKey>,
        visited: &mut FxHashSet<&'a TypeKey>,
        ordered: &mut Vec<TypeKey>,
    ) {
        if !visited.insert(node) {
            return;
        }
        ordered.push(node.clone());
        for dep in self.dependencies_of(node) {
            if members.contains(dep) {
                self.walk(dep, members, visited, ordered);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_id(name: &str) -> TypeKey {
        TypeKey::new("App", name, 0)
    }

    fn position(order: &[TypeKey], name: &str) -> usize {
        order.iter().position(|k| k.name == name).unwrap()
    }

    #[test]
    fn test_simple_dependency_order() {
        let mut graph = DependencyGraph::new();

        // a depends on b, b depends on c
        graph.add_edge(make_id("a"), make_id("b"));
        graph.add_edge(make_id("b"), make_id("c"));

        let order = graph.dependency_order();

        assert!(position(&order, "c") < position(&order, "b"));
        assert!(position(&order, "b") < position(&order, "a"));
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_diamond_dependency() {
        let mut graph = DependencyGraph::new();

        // a depends on b and c, both b and c depend on d
        graph.add_edge(make_id("a"), make_id("b"));
        graph.add_edge(make_id("a"), make_id("c"));
        graph.add_edge(make_id("b"), make_id("d"));
        graph.add_edge(make_id("c"), make_id("d"));

        let order = graph.dependency_order();

        assert_eq!(order.len(), 4);
        assert!(position(&order, "d") < position(&order, "b"));
        assert!(position(&order, "d") < position(&order, "c"));
        assert!(position(&order, "b") < position(&order, "a"));
        assert!(position(&order, "c") < position(&order, "a"));
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_three_cycle_reported_once_in_order() {
        let mut graph = DependencyGraph::new();

        // a depends on b, b depends on c, c depends on a (cycle)
        graph.add_edge(make_id("a"), make_id("b"));
        graph.add_edge(make_id("b"), make_id("c"));
        graph.add_edge(make_id("c"), make_id("a"));

        let cycles = graph.cycles();

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], vec![make_id("a"), make_id("b"), make_id("c")]);
    }

    #[test]
    fn test_self_dependency() {
        let mut graph = DependencyGraph::new();

        graph.add_edge(make_id("a"), make_id("a"));
        graph.add_node(make_id("b"));

        let cycles = graph.cycles();

        assert_eq!(cycles, vec![vec![make_id("a")]]);
    }

    #[test]
    fn test_cycle_members_stay_adjacent_after_their_dependencies() {
        let mut graph = DependencyGraph::new();

        // a <-> b, both depend on c; d depends on a
        graph.add_edge(make_id("d"), make_id("a"));
        graph.add_edge(make_id("a"), make_id("b"));
        graph.add_edge(make_id("b"), make_id("a"));
        graph.add_edge(make_id("b"), make_id("c"));

        let order = graph.dependency_order();

        assert_eq!(order.len(), 4);
        assert_eq!(position(&order, "c"), 0);
        assert_eq!(position(&order, "d"), 3);
        assert_eq!(
            (position(&order, "a") as isize - position(&order, "b") as isize).abs(),
            1
        );
    }

    #[test]
    fn test_no_dependencies() {
        let mut graph = DependencyGraph::new();

        graph.add_node(make_id("a"));
        graph.add_node(make_id("b"));
        graph.add_node(make_id("c"));

        let order = graph.dependency_order();

        assert_eq!(order, vec![make_id("a"), make_id("b"), make_id("c")]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let mut graph = DependencyGraph::new();

        graph.add_edge(make_id("a"), make_id("b"));
        graph.add_edge(make_id("a"), make_id("b"));

        assert_eq!(graph.dependencies_of(&make_id("a")).len(), 1);
    }
}
