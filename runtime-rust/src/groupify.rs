//! Equivalence classes of a transformation.
//!
//! Rows are grouped by their generalized quasi-identifier tuple in an open-addressing hash table.
//! Keys of all classes live in one flat buffer, and classes are kept in the order of their
//! representative, the smallest row index of the class. Deriving the classes of a node from a
//! snapshot of a more specific node therefore yields exactly the classes of a build from scratch.

use ndarray::ArrayView2;

use kanon_validator::base::{Transformation, NO_CODE};
use kanon_validator::{Code, RowIndex};

use crate::base::{DataManager, Distribution};

const EMPTY: usize = usize::MAX;
const INITIAL_CAPACITY: usize = 16;

/// One equivalence class.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupifyEntry {
    hashcode: u64,
    key_offset: usize,
    /// Rows of the research subset in the class.
    pub count: usize,
    /// All rows in the class.
    pub pcount: usize,
    /// Set by the privacy criteria. Rows of outlier classes are suppressed.
    pub is_not_outlier: bool,
    /// Smallest row index in the class.
    pub representative: RowIndex,
    /// Distribution of each sensitive attribute over the research subset rows of the class.
    pub distributions: Vec<Distribution>,
}

#[derive(Clone, Debug)]
pub struct HashGroupify {
    dimensions: usize,
    keys: Vec<Code>,
    entries: Vec<GroupifyEntry>,
    buckets: Vec<usize>,
}

#[inline]
fn hash(key: &[Code]) -> u64 {
    let hash = key.iter().fold(0xcbf2_9ce4_8422_2325u64, |hash, code|
        (hash ^ *code as u64).wrapping_mul(0x0000_0100_0000_01b3));
    // finalizer of splitmix64
    let hash = (hash ^ (hash >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    let hash = (hash ^ (hash >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    hash ^ (hash >> 31)
}

impl HashGroupify {
    pub fn with_capacity(dimensions: usize, capacity: usize) -> Self {
        let buckets = (capacity * 4 / 3 + 1).next_power_of_two().max(INITIAL_CAPACITY);
        HashGroupify {
            dimensions,
            keys: Vec::with_capacity(capacity * dimensions),
            entries: Vec::with_capacity(capacity),
            buckets: vec![EMPTY; buckets],
        }
    }

    /// Group the rows of the manager by their generalization under a transformation.
    pub fn build(transformation: &Transformation, manager: &DataManager) -> Self {
        let levels = transformation.levels();
        let mut groupify = HashGroupify::with_capacity(levels.len(), INITIAL_CAPACITY);
        let mut key = vec![0; levels.len()];
        let mut sensitive = Vec::with_capacity(manager.sensitive_columns.len());

        for row in 0..manager.num_rows() {
            for (dimension, level) in levels.iter().enumerate() {
                key[dimension] = manager.hierarchies[dimension].generalize(manager.data[[row, dimension]], *level);
            }
            sensitive.clear();
            sensitive.extend(manager.sensitive.row(row).iter());
            groupify.add(&key, row, manager.is_in_subset(row), &sensitive);
        }
        groupify
    }

    /// Group rows by arbitrary keys, one row of `keys` per row of the manager.
    ///
    /// Used for outputs whose rows are generalized by different transformations.
    pub fn from_keys(keys: ArrayView2<Code>, manager: &DataManager) -> Self {
        let mut groupify = HashGroupify::with_capacity(keys.ncols(), INITIAL_CAPACITY);
        let mut key = Vec::with_capacity(keys.ncols());
        let mut sensitive = Vec::with_capacity(manager.sensitive_columns.len());

        for row in 0..manager.num_rows() {
            key.clear();
            key.extend(keys.row(row).iter());
            sensitive.clear();
            sensitive.extend(manager.sensitive.row(row).iter());
            groupify.add(&key, row, manager.is_in_subset(row), &sensitive);
        }
        groupify
    }

    /// Classes of a generalization of the node a snapshot was built for, obtained by merging its classes.
    ///
    /// Every row of a class shares the generalized values of its representative,
    /// so the representative's input codes determine the merged key.
    pub fn derive(snapshot: &HashGroupify, transformation: &Transformation, manager: &DataManager) -> Self {
        let levels = transformation.levels();
        let mut groupify = HashGroupify::with_capacity(levels.len(), snapshot.len());
        let mut key = vec![0; levels.len()];

        for entry in snapshot.entries.iter() {
            for (dimension, level) in levels.iter().enumerate() {
                key[dimension] = manager.hierarchies[dimension]
                    .generalize(manager.data[[entry.representative, dimension]], *level);
            }
            groupify.merge(&key, entry);
        }
        groupify
    }

    fn find_or_insert(&mut self, key: &[Code], representative: RowIndex, attributes: usize) -> usize {
        if (self.entries.len() + 1) * 4 > self.buckets.len() * 3 {
            self.rehash(self.buckets.len() * 2);
        }

        let hashcode = hash(key);
        let mask = self.buckets.len() - 1;
        let mut bucket = hashcode as usize & mask;
        loop {
            match self.buckets[bucket] {
                EMPTY => break,
                index => {
                    let entry = &self.entries[index];
                    if entry.hashcode == hashcode && self.key_at(entry.key_offset) == key {
                        return index;
                    }
                }
            }
            bucket = (bucket + 1) & mask;
        }

        let index = self.entries.len();
        self.entries.push(GroupifyEntry {
            hashcode,
            key_offset: self.keys.len(),
            count: 0,
            pcount: 0,
            is_not_outlier: true,
            representative,
            distributions: vec![Distribution::new(); attributes],
        });
        self.keys.extend_from_slice(key);
        self.buckets[bucket] = index;
        index
    }

    fn rehash(&mut self, size: usize) {
        let mask = size - 1;
        let mut buckets = vec![EMPTY; size];
        for (index, entry) in self.entries.iter().enumerate() {
            let mut bucket = entry.hashcode as usize & mask;
            while buckets[bucket] != EMPTY {
                bucket = (bucket + 1) & mask;
            }
            buckets[bucket] = index;
        }
        self.buckets = buckets;
    }

    fn add(&mut self, key: &[Code], row: RowIndex, in_subset: bool, sensitive: &[Code]) {
        let index = self.find_or_insert(key, row, sensitive.len());
        let entry = &mut self.entries[index];
        entry.pcount += 1;
        if in_subset {
            entry.count += 1;
            entry.distributions.iter_mut().zip(sensitive.iter())
                .for_each(|(distribution, code)| *distribution.entry(*code).or_insert(0) += 1);
        }
    }

    fn merge(&mut self, key: &[Code], other: &GroupifyEntry) {
        let index = self.find_or_insert(key, other.representative, other.distributions.len());
        let entry = &mut self.entries[index];
        entry.count += other.count;
        entry.pcount += other.pcount;
        entry.representative = entry.representative.min(other.representative);
        entry.distributions.iter_mut().zip(other.distributions.iter())
            .for_each(|(distribution, additional)| additional.iter()
                .for_each(|(code, frequency)| *distribution.entry(*code).or_insert(0) += frequency));
    }

    #[inline]
    fn key_at(&self, offset: usize) -> &[Code] {
        &self.keys[offset..offset + self.dimensions]
    }

    /// Generalized quasi-identifier tuple of a class.
    pub fn key(&self, entry: &GroupifyEntry) -> &[Code] {
        self.key_at(entry.key_offset)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Classes, ordered by representative.
    pub fn entries(&self) -> &[GroupifyEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [GroupifyEntry] {
        &mut self.entries
    }

    /// Index of the class of a key.
    pub fn find(&self, key: &[Code]) -> Option<usize> {
        let hashcode = hash(key);
        let mask = self.buckets.len() - 1;
        let mut bucket = hashcode as usize & mask;
        loop {
            match self.buckets[bucket] {
                EMPTY => return None,
                index => {
                    let entry = &self.entries[index];
                    if entry.hashcode == hashcode && self.key_at(entry.key_offset) == key {
                        return Some(index);
                    }
                }
            }
            bucket = (bucket + 1) & mask;
        }
    }

    /// Number of classes, including classes without rows of the research subset.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of classes containing rows of the research subset.
    pub fn num_classes(&self) -> usize {
        self.entries.iter().filter(|entry| entry.count > 0).count()
    }

    /// Rows of the research subset in outlier classes.
    pub fn num_suppressed(&self) -> usize {
        self.entries.iter()
            .filter(|entry| !entry.is_not_outlier)
            .map(|entry| entry.count)
            .sum()
    }

    /// Rows of the research subset.
    pub fn total_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Mark every class as released, before the privacy criteria decide again.
    pub fn reset_outliers(&mut self) {
        self.entries.iter_mut().for_each(|entry| entry.is_not_outlier = true);
    }

    /// Mark the class of the all-[`NO_CODE`] key, holding rows that are suppressed regardless of their class.
    pub fn suppress_unkeyed(&mut self) {
        let unkeyed = vec![NO_CODE; self.dimensions];
        if let Some(index) = self.find(&unkeyed) {
            self.entries[index].is_not_outlier = false;
        }
    }
}


#[cfg(test)]
mod test_groupify {
    use ndarray::Array2;

    use kanon_validator::base::{Transformation, NO_CODE};

    use crate::base::DataManager;
    use crate::base::test_data::{letters, patients};
    use crate::groupify::HashGroupify;

    #[test]
    fn test_build_counts() {
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["B", "2"]]);
        let manager = DataManager::new(&dataset, None).unwrap();

        let bottom = HashGroupify::build(&Transformation::new(vec![0, 0]), &manager);
        assert_eq!(bottom.len(), 2);
        assert_eq!(bottom.entries()[0].count, 2);
        assert_eq!(bottom.entries()[1].count, 1);
        assert_eq!(bottom.entries()[1].representative, 2);

        let top = HashGroupify::build(&Transformation::new(vec![1, 1]), &manager);
        assert_eq!(top.len(), 1);
        assert_eq!(top.entries()[0].count, 3);
        assert_eq!(top.total_count(), 3);
    }

    #[test]
    fn test_derive_equals_build() {
        let dataset = patients();
        let manager = DataManager::new(&dataset, Some(&[0, 1, 3, 4, 5, 8])).unwrap();

        let specific = Transformation::new(vec![0, 1]);
        let snapshot = HashGroupify::build(&specific, &manager);
        for levels in vec![vec![0, 2], vec![1, 1], vec![1, 3], vec![2, 2]] {
            let general = Transformation::new(levels);
            let derived = HashGroupify::derive(&snapshot, &general, &manager);
            let built = HashGroupify::build(&general, &manager);
            assert_eq!(derived.entries(), built.entries());
            for (left, right) in derived.entries().iter().zip(built.entries().iter()) {
                assert_eq!(derived.key(left), built.key(right));
            }
        }
    }

    #[test]
    fn test_growth_and_lookup() {
        let dataset = patients();
        let manager = DataManager::new(&dataset, None).unwrap();
        let groupify = HashGroupify::build(&Transformation::new(vec![0, 0]), &manager);
        assert_eq!(groupify.len(), 10);
        assert_eq!(groupify.num_classes(), 10);

        let key = groupify.key(&groupify.entries()[7]).to_vec();
        assert_eq!(groupify.find(&key), Some(7));
        assert_eq!(groupify.find(&[NO_CODE, NO_CODE]), None);
        // 4 flu, 3 cancer, 3 gastritis
        let flu = groupify.entries().iter()
            .filter(|entry| entry.distributions[0].contains_key(&0))
            .count();
        assert_eq!(flu, 4);
    }

    #[test]
    fn test_from_keys() {
        let dataset = letters(&[&["A", "1"], &["B", "2"], &["C", "3"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let mut keys = Array2::zeros((3, 2));
        keys.row_mut(0).assign(&ndarray::arr1(&[7, 7]));
        keys.row_mut(1).assign(&ndarray::arr1(&[NO_CODE, NO_CODE]));
        keys.row_mut(2).assign(&ndarray::arr1(&[7, 7]));

        let mut groupify = HashGroupify::from_keys(keys.view(), &manager);
        assert_eq!(groupify.len(), 2);
        assert_eq!(groupify.entries()[0].count, 2);
        groupify.suppress_unkeyed();
        assert_eq!(groupify.num_suppressed(), 1);
        groupify.reset_outliers();
        assert_eq!(groupify.num_suppressed(), 0);
    }
}
