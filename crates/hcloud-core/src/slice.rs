//! Small helpers for working with sequences of API objects.

/// Split `items` into consecutive batches of `size` elements.
///
/// The last batch may be shorter. Every batch is an independent `Vec`, so growing one
/// never touches its neighbours or the source.
///
/// # Panics
///
/// Panics if `size` is zero.
#[must_use]
pub fn batch<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size).map(<[T]>::to_vec).collect()
}

/// Map every element through `f`, preserving order.
#[must_use]
pub fn transform<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    F: FnMut(&T) -> U,
{
    items.iter().map(f).collect()
}
