use rand::Rng;

/// Random permutation of `0..n`, walking from the last slot backward and
/// swapping each with a slot at or before it.
pub fn shuffle<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=i);
        order.swap(i, j);
    }
    order
}

/// Reorders the whole pool. Nothing is dropped or duplicated.
pub fn sample<T: Clone, R: Rng + ?Sized>(pool: &[T], rng: &mut R) -> Vec<T> {
    shuffle(pool.len(), rng)
        .into_iter()
        .map(|i| pool[i].clone())
        .collect()
}
