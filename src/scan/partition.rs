/// Split a worklist into contiguous chunks, one per worker.
///
/// Produces `min(workers, items.len())` chunks. Every chunk holds
/// `items.len() / workers` entries (truncating division) except the last,
/// which absorbs the remainder. An empty input yields no chunks.
pub fn partition<T>(items: &[T], workers: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }

    let workers = workers.max(1).min(items.len());
    let average = items.len() / workers;

    let mut chunks = Vec::with_capacity(workers);
    for n in 0..workers {
        let start = n * average;
        if n == workers - 1 {
            chunks.push(&items[start..]);
        } else {
            chunks.push(&items[start..start + average]);
        }
    }

    chunks
}
