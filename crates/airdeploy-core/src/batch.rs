// ── Bounded fan-out ──

use std::future::Future;

use futures_util::future::join_all;

/// Run `f` over `items` in sequential chunks of `batch_size`. Calls within
/// a chunk run concurrently; the next chunk starts only once every call
/// in the current one has finished. Output order matches input order.
pub(crate) async fn in_batches<'a, T, F, Fut, R>(items: &'a [T], batch_size: usize, f: F) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut out = Vec::with_capacity(items.len());
    for chunk in items.chunks(batch_size.max(1)) {
        out.extend(join_all(chunk.iter().map(&f)).await);
    }
    out
}
