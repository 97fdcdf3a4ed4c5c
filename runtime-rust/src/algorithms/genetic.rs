use kanon_validator::errors::*;

use std::cmp::Ordering;

use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use kanon_validator::base::Transformation;
use kanon_validator::config::{GeneticConfig, SearchStrategy};

use crate::algorithms::{Search, SearchOutcome};
use crate::lattice::SolutionSpace;

/// Evolve a population of transformations.
///
/// Each generation keeps the elite, breeds children by uniform crossover of tournament winners,
/// admits random immigrants, and fills up with mutated copies. Anonymous individuals rank
/// before non-anonymous ones, then by loss.
pub fn search(mut search: Search, config: &GeneticConfig, seed: u64) -> Result<SearchOutcome> {
    let space = search.lattice.space.clone();
    let mut rng = StdRng::seed_from_u64(seed);
    let size = config.population_size.max(2);

    let fraction = |share: f64| (share * size as f64).round() as usize;
    let elites = fraction(config.elite_fraction).max(1).min(size);
    let children = fraction(config.crossover_fraction).min(size - elites);
    let immigrants = fraction(config.immigration_fraction).min(size - elites - children);

    // the top is anonymous whenever anything is under monotonic criteria, and the bottom loses the least
    let mut population = vec![space.top(), space.bottom()];
    while population.len() < size {
        population.push(random_node(&space, &mut rng));
    }

    for generation in 0..config.iterations {
        if search.budget.is_exhausted() {
            break;
        }
        evaluate(&mut search, &population)?;
        rank(&search, &mut population);
        tracing::debug!(generation, best = %population[0], "generation");

        let mut next = population[..elites].to_vec();
        for _ in 0..children {
            let first = tournament(&population, &mut rng);
            let second = tournament(&population, &mut rng);
            next.push(crossover(first, second, &mut rng));
        }
        for _ in 0..immigrants {
            next.push(random_node(&space, &mut rng));
        }
        while next.len() < size {
            let parent = tournament(&population, &mut rng);
            next.push(mutate(&space, parent, config.mutation_probability, &mut rng));
        }
        population = next;
    }
    evaluate(&mut search, &population)?;

    Ok(search.finish(SearchStrategy::Genetic, false))
}

fn random_node(space: &SolutionSpace, rng: &mut StdRng) -> Transformation {
    Transformation::new(space.heights().iter().map(|height| rng.gen_range(0, *height)).collect())
}

/// Check the individuals not checked before.
fn evaluate(search: &mut Search, population: &[Transformation]) -> Result<()> {
    let unchecked = population.iter()
        .unique()
        .filter(|node| !search.lattice.is_checked(node))
        .cloned()
        .collect::<Vec<Transformation>>();
    search.check_batch(unchecked)?;
    Ok(())
}

/// Best individuals first: anonymous, then lower loss, then the preferred node. Unchecked individuals go last.
fn rank(search: &Search, population: &mut Vec<Transformation>) {
    let lattice = &search.lattice;
    population.sort_by(|left, right| {
        let (left_record, right_record) = (lattice.record(left), lattice.record(right));
        let anonymous = |record: Option<&crate::lattice::NodeRecord>| record
            .and_then(|record| record.anonymous).unwrap_or(false);
        anonymous(right_record).cmp(&anonymous(left_record))
            .then_with(|| match (left_record.and_then(|r| r.loss()), right_record.and_then(|r| r.loss())) {
                (Some(left), Some(right)) => left.compare_to(right).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| left.cmp_preference(right))
    });
}

/// The better of two random individuals of a ranked population.
fn tournament<'a>(population: &'a [Transformation], rng: &mut StdRng) -> &'a Transformation {
    let first = rng.gen_range(0, population.len());
    let second = rng.gen_range(0, population.len());
    &population[first.min(second)]
}

fn crossover(first: &Transformation, second: &Transformation, rng: &mut StdRng) -> Transformation {
    Transformation::new(first.levels().iter().zip(second.levels().iter())
        .map(|(left, right)| if rng.gen_bool(0.5) { *left } else { *right })
        .collect())
}

/// Move each level one step up or down with the mutation probability.
fn mutate(space: &SolutionSpace, parent: &Transformation, probability: f64, rng: &mut StdRng) -> Transformation {
    let probability = num::clamp(probability, 0., 1.);
    Transformation::new(parent.levels().iter().zip(space.heights().iter())
        .map(|(level, height)| {
            if !rng.gen_bool(probability) {
                return *level;
            }
            match (*level, rng.gen_bool(0.5)) {
                (0, _) => (height - 1).min(1),
                (level, true) if level + 1 < *height => level + 1,
                (level, _) => level - 1,
            }
        })
        .collect())
}


#[cfg(test)]
mod test_genetic {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use kanon_validator::base::Transformation;
    use kanon_validator::config::{AnonymizationConfig, GeneticConfig, SearchConfig, SearchStrategy};
    use kanon_validator::components::{KAnonymity, PrivacyModel};

    use crate::algorithms::genetic::mutate;
    use crate::algorithms::test_search::run;
    use crate::base::test_data::patients;
    use crate::lattice::SolutionSpace;

    #[test]
    fn test_mutation_stays_in_space() {
        let space = SolutionSpace::new(vec![3, 1, 4]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut node = Transformation::new(vec![0, 0, 3]);
        for _ in 0..200 {
            node = mutate(&space, &node, 1., &mut rng);
            assert!(space.contains(&node), "{}", node);
        }
    }

    #[test]
    fn test_small_population() {
        let dataset = patients();
        let mut config = AnonymizationConfig::new(vec![PrivacyModel::KAnonymity(KAnonymity::new(2))])
            .with_strategy(SearchStrategy::Genetic);
        config.search = SearchConfig {
            genetic: GeneticConfig { population_size: 4, iterations: 5, ..GeneticConfig::default() },
            ..config.search
        };
        let outcome = run(&dataset, &config);
        assert!(outcome.optimum.unwrap().anonymous);
    }
}
