use crate::block::BlockId;
use crate::function::FunctionBody;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    pub order: Vec<BlockId>,
    pub edges: HashMap<BlockId, Vec<BlockId>>,
    pub reverse_edges: HashMap<BlockId, Vec<BlockId>>,
    pub entry: BlockId,
}

impl ControlFlowGraph {
    pub fn from_function(body: &FunctionBody) -> Self {
        let mut edges = HashMap::new();
        let mut reverse_edges = HashMap::new();

        for (block_id, block) in &body.blocks {
            let successors = block.terminator.successors();
            edges.insert(*block_id, successors.clone());

            for succ in successors {
                reverse_edges
                    .entry(succ)
                    .or_insert_with(Vec::new)
                    .push(*block_id);
            }
        }

        Self {
            order: body.block_order(),
            edges,
            reverse_edges,
            entry: body.entry_block,
        }
    }

    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.reverse_edges
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, block: BlockId) -> &[BlockId] {
        self.edges.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has_edge(&self, from: BlockId, to: BlockId) -> bool {
        self.successors(from).contains(&to)
    }

    /// All edges, sources in layout order.
    pub fn edge_list(&self) -> Vec<(BlockId, BlockId)> {
        self.order
            .iter()
            .flat_map(|&from| self.successors(from).iter().map(move |&to| (from, to)))
            .collect()
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.reachable_blocks().contains(&block)
    }

    pub fn reachable_blocks(&self) -> HashSet<BlockId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(self.entry);

        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                for &succ in self.successors(current) {
                    queue.push_back(succ);
                }
            }
        }

        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::FuncCursor;
    use crate::types::Type;
    use crate::values::Constant;

    #[test]
    fn test_diamond() {
        let mut body = FunctionBody::new();
        let entry = body.entry_block();
        let left = body.create_block();
        let right = body.create_block();
        let join = body.create_block();
        let dead = body.create_block();

        let mut cursor = FuncCursor::new(&mut body).at_bottom(entry);
        let c = cursor.ins().constant(Constant::Bool(true), Type::i1()).unwrap();
        cursor.ins().branch(c, left, vec![], right, vec![]).unwrap();
        cursor.goto_bottom(left);
        cursor.ins().jump(join, vec![]).unwrap();
        cursor.goto_bottom(right);
        cursor.ins().jump(join, vec![]).unwrap();
        cursor.goto_bottom(join);
        cursor.ins().return_values(vec![]).unwrap();
        cursor.goto_bottom(dead);
        cursor.ins().jump(join, vec![]).unwrap();

        let cfg = ControlFlowGraph::from_function(&body);

        assert_eq!(cfg.successors(entry), &[left, right]);
        assert_eq!(cfg.predecessors(join), &[left, right, dead]);
        assert!(cfg.has_edge(right, join));
        assert!(!cfg.is_reachable(dead));
        assert_eq!(cfg.reachable_blocks().len(), 4);
        assert_eq!(
            cfg.edge_list(),
            vec![(entry, left), (entry, right), (left, join), (right, join), (dead, join)]
        );
    }
}
