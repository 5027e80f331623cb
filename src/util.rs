use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;

/// Arithmetic mean of occurrence counts, compared exactly.
///
/// Two means are ordered by cross multiplication so that equal averages over
/// different sample sizes tie instead of drifting apart in floating point.
/// The mean of no values is zero.
#[derive(Debug, Clone, Copy)]
pub struct Mean {
    sum: usize,
    count: usize,
}

impl Mean {
    pub fn of(values: impl IntoIterator<Item = usize>) -> Mean {
        let (sum, count) = values
            .into_iter()
            .fold((0, 0), |(sum, count), value| (sum + value, count + 1));
        Mean { sum, count }
    }

    pub fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    fn cross(&self, other: &Mean) -> (u128, u128) {
        let lhs = self.sum as u128 * other.count.max(1) as u128;
        let rhs = other.sum as u128 * self.count.max(1) as u128;
        (lhs, rhs)
    }
}

impl PartialEq for Mean {
    fn eq(&self, other: &Self) -> bool {
        let (lhs, rhs) = self.cross(other);
        lhs == rhs
    }
}

impl Eq for Mean {}

impl PartialOrd for Mean {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mean {
    fn cmp(&self, other: &Self) -> Ordering {
        let (lhs, rhs) = self.cross(other);
        lhs.cmp(&rhs)
    }
}

/// Uniform pick among tied candidates.
pub fn choose<R, T>(rng: &mut R, candidates: &[T]) -> Option<T>
where
    R: Rng + ?Sized,
    T: Clone,
{
    candidates.choose(rng).cloned()
}

/// Collects `items` in a uniformly random order.
pub fn shuffled<R, T>(rng: &mut R, items: impl IntoIterator<Item = T>) -> Vec<T>
where
    R: Rng + ?Sized,
{
    let mut items: Vec<T> = items.into_iter().collect();
    items.shuffle(rng);
    items
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn mean_orders_exactly() {
        assert_eq!(Mean::of([1, 2]), Mean::of([3, 0, 0, 3, 1, 2]));
        assert!(Mean::of([0, 1]) < Mean::of([1]));
        assert!(Mean::of([2, 2, 3]) > Mean::of([2]));
        assert_eq!(Mean::of([]), Mean::of([0, 0]));
        assert_eq!(Mean::of([1, 2]).value(), 1.5);
        assert_eq!(Mean::of([]).value(), 0.0);
    }

    #[test]
    fn choose_and_shuffle() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(choose::<_, u8>(&mut rng, &[]), None);
        assert_eq!(choose(&mut rng, &["only"]), Some("only"));
        let mut items = shuffled(&mut rng, 0..20);
        items.sort();
        assert_eq!(items, (0..20).collect::<Vec<_>>());
    }
}
