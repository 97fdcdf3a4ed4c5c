//! Generalization lattice
//!
//! Every transformation is identified by a mixed-radix number over the heights of the hierarchies,
//! with the first quasi-identifier as the most significant digit.
//! Records of visited nodes are kept in an arena keyed by that id, and only written by the search thread.

use kanon_validator::errors::*;

use indexmap::IndexMap;

use kanon_validator::base::Transformation;

use crate::metrics::InformationLoss;

pub type NodeId = u64;

#[derive(Clone, Debug, PartialEq)]
pub struct SolutionSpace {
    heights: Vec<u32>,
    multipliers: Vec<u64>,
    size: u64,
}

impl SolutionSpace {
    pub fn new(heights: Vec<u32>) -> Result<SolutionSpace> {
        if heights.iter().any(|height| *height == 0) {
            return Err("every hierarchy needs at least one level".into());
        }
        let mut multipliers = vec![1u64; heights.len()];
        let mut size = 1u64;
        for (dimension, height) in heights.iter().enumerate().rev() {
            multipliers[dimension] = size;
            size = size.checked_mul(*height as u64)
                .ok_or_else(|| Error::from("solution space is too large"))?;
        }
        Ok(SolutionSpace { heights, multipliers, size })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn heights(&self) -> &[u32] {
        &self.heights
    }

    pub fn dimensions(&self) -> usize {
        self.heights.len()
    }

    pub fn bottom(&self) -> Transformation {
        Transformation::new(vec![0; self.heights.len()])
    }

    pub fn top(&self) -> Transformation {
        Transformation::new(self.heights.iter().map(|height| height - 1).collect())
    }

    /// Level of the top node.
    pub fn max_level(&self) -> u32 {
        self.heights.iter().map(|height| height - 1).sum()
    }

    pub fn contains(&self, transformation: &Transformation) -> bool {
        transformation.dimensions() == self.heights.len() &&
            transformation.levels().iter().zip(self.heights.iter()).all(|(level, height)| level < height)
    }

    pub fn id(&self, transformation: &Transformation) -> NodeId {
        transformation.levels().iter().zip(self.multipliers.iter())
            .map(|(level, multiplier)| *level as u64 * multiplier)
            .sum()
    }

    pub fn transformation(&self, id: NodeId) -> Transformation {
        Transformation::new(self.heights.iter().zip(self.multipliers.iter())
            .map(|(height, multiplier)| ((id / multiplier) % *height as u64) as u32)
            .collect())
    }

    /// Direct generalizations: one coordinate raised by one level.
    pub fn successors(&self, transformation: &Transformation) -> Vec<Transformation> {
        (0..self.dimensions())
            .filter(|dimension| transformation.levels()[*dimension] + 1 < self.heights[*dimension])
            .map(|dimension| {
                let mut levels = transformation.levels().to_vec();
                levels[dimension] += 1;
                Transformation::new(levels)
            })
            .collect()
    }

    /// Direct specializations: one coordinate lowered by one level.
    pub fn predecessors(&self, transformation: &Transformation) -> Vec<Transformation> {
        (0..self.dimensions())
            .filter(|dimension| transformation.levels()[*dimension] > 0)
            .map(|dimension| {
                let mut levels = transformation.levels().to_vec();
                levels[dimension] -= 1;
                Transformation::new(levels)
            })
            .collect()
    }

    /// Nodes of one level in lexicographic order, generated one at a time.
    pub fn level(&self, level: u32) -> LevelNodes<'_> {
        let mut first = vec![0; self.heights.len()];
        let next = if fill(&mut first, &self.heights, level) == 0 { Some(first) } else { None };
        LevelNodes { heights: &self.heights, next }
    }
}

/// Spread `remaining` over `levels` as far to the right as the heights allow, and return what is left.
fn fill(levels: &mut [u32], heights: &[u32], mut remaining: u32) -> u32 {
    for (level, height) in levels.iter_mut().zip(heights.iter()).rev() {
        *level = remaining.min(height - 1);
        remaining -= *level;
    }
    remaining
}

/// Iterator over the nodes of one level.
#[derive(Clone, Debug)]
pub struct LevelNodes<'a> {
    heights: &'a [u32],
    next: Option<Vec<u32>>,
}

impl<'a> Iterator for LevelNodes<'a> {
    type Item = Transformation;

    fn next(&mut self) -> Option<Transformation> {
        let current = self.next.take()?;

        // raise the rightmost coordinate that can take one level from its suffix
        let mut successor = current.clone();
        let mut suffix = 0;
        for dimension in (0..successor.len()).rev() {
            if suffix > 0 && successor[dimension] + 1 < self.heights[dimension] {
                successor[dimension] += 1;
                fill(&mut successor[dimension + 1..], &self.heights[dimension + 1..], suffix - 1);
                self.next = Some(successor);
                break;
            }
            suffix += successor[dimension];
        }
        Some(Transformation::new(current))
    }
}


/// What is known about a node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeRecord {
    pub checked: bool,
    /// `Some` once checked or inferred from a neighbor.
    pub anonymous: Option<bool>,
    /// No generalization of the node can be a better solution.
    pub successors_pruned: bool,
    /// The lower bound of an ancestor rules the node out.
    pub pruned_by_bound: bool,
    loss: Option<InformationLoss>,
    bound: Option<InformationLoss>,
}

impl NodeRecord {
    pub fn loss(&self) -> Option<&InformationLoss> {
        self.loss.as_ref()
    }

    pub fn bound(&self) -> Option<&InformationLoss> {
        self.bound.as_ref()
    }

    /// Losses are computed once, later writes are ignored.
    pub fn set_loss(&mut self, loss: InformationLoss) {
        if self.loss.is_none() {
            self.loss = Some(loss);
        }
    }

    pub fn set_bound(&mut self, bound: InformationLoss) {
        if self.bound.is_none() {
            self.bound = Some(bound);
        }
    }

    pub fn is_pruned(&self) -> bool {
        self.successors_pruned || self.pruned_by_bound
    }
}

/// Records of the visited part of a solution space.
#[derive(Clone, Debug)]
pub struct Lattice {
    pub space: SolutionSpace,
    records: IndexMap<NodeId, NodeRecord>,
}

impl Lattice {
    pub fn new(space: SolutionSpace) -> Self {
        Lattice { space, records: IndexMap::new() }
    }

    pub fn record(&self, transformation: &Transformation) -> Option<&NodeRecord> {
        self.records.get(&self.space.id(transformation))
    }

    pub fn record_mut(&mut self, transformation: &Transformation) -> &mut NodeRecord {
        let id = self.space.id(transformation);
        self.records.entry(id).or_insert_with(NodeRecord::default)
    }

    pub fn is_checked(&self, transformation: &Transformation) -> bool {
        self.record(transformation).map(|record| record.checked).unwrap_or(false)
    }

    pub fn is_pruned(&self, transformation: &Transformation) -> bool {
        self.record(transformation).map(NodeRecord::is_pruned).unwrap_or(false)
    }

    pub fn anonymous(&self, transformation: &Transformation) -> Option<bool> {
        self.record(transformation).and_then(|record| record.anonymous)
    }

    /// Anonymity implied by the direct neighbors under monotonic criteria:
    /// generalizations of anonymous nodes are anonymous, specializations of non-anonymous nodes are not.
    pub fn infer_anonymity(&self, transformation: &Transformation) -> Option<bool> {
        if self.space.predecessors(transformation).iter().any(|node| self.anonymous(node) == Some(true)) {
            return Some(true);
        }
        if self.space.successors(transformation).iter().any(|node| self.anonymous(node) == Some(false)) {
            return Some(false);
        }
        None
    }

    /// Number of nodes whose anonymity is known.
    pub fn num_known(&self) -> usize {
        self.records.values().filter(|record| record.anonymous.is_some()).count()
    }

    pub fn num_checked(&self) -> usize {
        self.records.values().filter(|record| record.checked).count()
    }

    /// Componentwise minimum and maximum of the losses of the checked nodes.
    pub fn loss_range(&self) -> Result<Option<(InformationLoss, InformationLoss)>> {
        let mut losses = self.records.values().filter_map(NodeRecord::loss);
        let first = match losses.next() {
            Some(first) => first,
            None => return Ok(None)
        };
        let (mut min, mut max) = (first.clone(), first.clone());
        for loss in losses {
            min = min.min(loss)?;
            max = max.max(loss)?;
        }
        Ok(Some((min, max)))
    }
}


#[cfg(test)]
mod test_lattice {
    use itertools::Itertools;

    use kanon_validator::base::Transformation;

    use crate::lattice::{Lattice, SolutionSpace};
    use crate::metrics::InformationLoss;

    #[test]
    fn test_mixed_radix_ids() {
        let space = SolutionSpace::new(vec![3, 4, 2]).unwrap();
        assert_eq!(space.size(), 24);
        assert_eq!(space.id(&space.bottom()), 0);
        assert_eq!(space.id(&space.top()), 23);
        // first dimension most significant
        assert_eq!(space.id(&Transformation::new(vec![1, 0, 0])), 8);
        for id in 0..space.size() {
            assert_eq!(space.id(&space.transformation(id)), id);
        }
        assert!(SolutionSpace::new(vec![3, 0]).is_err());
    }

    #[test]
    fn test_neighbors() {
        let space = SolutionSpace::new(vec![3, 2]).unwrap();
        let node = Transformation::new(vec![1, 0]);
        assert_eq!(space.successors(&node), vec![Transformation::new(vec![2, 0]), Transformation::new(vec![1, 1])]);
        assert_eq!(space.predecessors(&node), vec![Transformation::new(vec![0, 0])]);
        assert!(space.successors(&space.top()).is_empty());
        assert!(space.predecessors(&space.bottom()).is_empty());
    }

    #[test]
    fn test_enumeration_order() {
        let space = SolutionSpace::new(vec![3, 2]).unwrap();
        assert_eq!(space.level(1).collect::<Vec<_>>(), vec![Transformation::new(vec![0, 1]), Transformation::new(vec![1, 0])]);
        assert_eq!(space.level(0).collect::<Vec<_>>(), vec![space.bottom()]);
        assert_eq!(space.level(3).collect::<Vec<_>>(), vec![space.top()]);
        assert_eq!(space.level(4).count(), 0);

        let space = SolutionSpace::new(vec![3, 4, 2]).unwrap();
        let all = space.heights().iter()
            .map(|height| 0..*height)
            .multi_cartesian_product()
            .collect::<Vec<Vec<u32>>>();
        for level in 0..=space.max_level() {
            let expected = all.iter()
                .filter(|levels| levels.iter().sum::<u32>() == level)
                .cloned()
                .map(Transformation::new)
                .collect::<Vec<_>>();
            assert_eq!(space.level(level).collect::<Vec<_>>(), expected);
        }
        assert_eq!((0..=space.max_level()).map(|level| space.level(level).count() as u64).sum::<u64>(), space.size());
    }

    #[test]
    fn test_large_space_levels() {
        // 10^18 nodes, of which only the requested ones are built
        let space = SolutionSpace::new(vec![10; 18]).unwrap();
        assert_eq!(space.level(1).count(), 18);
        let mut top_levels = space.level(space.max_level() - 1);
        let mut first = vec![8];
        first.extend(vec![9; 17]);
        assert_eq!(top_levels.next(), Some(Transformation::new(first)));
        assert_eq!(space.level(81).take(5).count(), 5);
    }

    #[test]
    fn test_records() {
        let mut lattice = Lattice::new(SolutionSpace::new(vec![2, 2]).unwrap());
        let bottom = Transformation::new(vec![0, 0]);
        let top = Transformation::new(vec![1, 1]);

        lattice.record_mut(&bottom).set_loss(InformationLoss::scalar("height", 0.));
        lattice.record_mut(&bottom).set_loss(InformationLoss::scalar("height", 5.));
        assert_eq!(lattice.record(&bottom).unwrap().loss(), Some(&InformationLoss::scalar("height", 0.)));

        lattice.record_mut(&Transformation::new(vec![0, 1])).anonymous = Some(true);
        assert_eq!(lattice.infer_anonymity(&top), Some(true));
        lattice.record_mut(&Transformation::new(vec![1, 0])).anonymous = Some(false);
        assert_eq!(lattice.infer_anonymity(&bottom), Some(false));
        assert_eq!(lattice.num_known(), 2);
        assert_eq!(lattice.num_checked(), 0);

        lattice.record_mut(&top).set_loss(InformationLoss::scalar("height", 2.));
        let (min, max) = lattice.loss_range().unwrap().unwrap();
        assert_eq!((min.value(), max.value()), (0., 2.));
    }
}
