//! Parallel map with ordered collection.

use std::future::Future;

use tokio::task::JoinSet;

/// Run `f` over every item on its own task and return the outputs in input
/// order, regardless of completion order.
///
/// A slot is `None` only when its task panicked; the other slots are
/// unaffected.
pub async fn map_ordered<I, T, F, Fut>(items: Vec<I>, f: F) -> Vec<Option<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let fut = f(item);
        tasks.spawn(async move { (index, fut.await) });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, output)) => slots[index] = Some(output),
            Err(e) => tracing::error!(error = %e, "fan-out branch did not complete"),
        }
    }

    slots
}
