//! Bounded concurrent batches.
//!
//! All futures of a batch are polled by the calling task, so the batch is
//! concurrent but never parallel: state owned by the caller is only touched
//! between batches.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Run `task` over `items` with at most `limit` futures in flight.
///
/// Results are positional: `output[i]` belongs to `items[i]` whatever the
/// completion order. The first error is returned immediately and the rest of
/// the batch is dropped.
pub async fn run_bounded<T, R, E, F, Fut>(items: Vec<T>, limit: usize, task: F) -> Result<Vec<R>, E>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let len = items.len();
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(len).collect();

    let mut pending = stream::iter(items.into_iter().enumerate().map(|(index, item)| {
        let future = task(item);
        async move { (index, future.await) }
    }))
    .buffer_unordered(limit.max(1));

    while let Some((index, result)) = pending.next().await {
        slots[index] = Some(result?);
    }

    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn results_follow_input_order() {
        let out: Result<Vec<u64>, ()> = run_bounded(vec![30u64, 10, 20, 0], 4, |ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(ms)
        })
        .await;
        assert_eq!(out.unwrap(), [30, 10, 20, 0]);
    }

    #[tokio::test]
    async fn never_exceeds_the_limit() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let out: Result<Vec<usize>, ()> = run_bounded((0..20usize).collect::<Vec<_>>(), 3, |i| {
            let in_flight = &in_flight;
            let peak = &peak;
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            }
        })
        .await;

        assert_eq!(out.unwrap().len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn first_error_fails_the_batch() {
        let out = run_bounded(vec![1, 2, 3], 2, |i| async move {
            if i == 2 { Err(format!("bad {i}")) } else { Ok(i) }
        })
        .await;
        assert_eq!(out.unwrap_err(), "bad 2");
    }

    #[tokio::test]
    async fn empty_batches_and_zero_limits_are_fine() {
        let out: Result<Vec<u8>, ()> = run_bounded(Vec::<u8>::new(), 0, |i| async move { Ok(i) }).await;
        assert!(out.unwrap().is_empty());

        let out: Result<Vec<u8>, ()> = run_bounded(vec![1, 2], 0, |i| async move { Ok(i) }).await;
        assert_eq!(out.unwrap(), [1, 2]);
    }
}
