//! Bounded fan-out over a list of symbols.
//!
//! Cooperative workers pull the next unclaimed index from a shared counter
//! until the list is drained, so at most `limit` tasks are in flight at any
//! instant. The output keeps input order; a failing item is logged and
//! becomes `None` without disturbing its siblings.

use std::cmp::min;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use tracing::warn;

/// Fan-out width used for chart-driven pages.
pub const CHART_FANOUT_LIMIT: usize = 4;

/// Run `task` over `items` with at most `limit` tasks in flight, returning
/// per-item outcomes in input order. A `limit` of zero is treated as one.
pub async fn map_bounded<'a, I, T, E, F, Fut>(
    items: &'a [I],
    limit: usize,
    task: F,
) -> Vec<Option<T>>
where
    F: Fn(&'a I, usize) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    if items.is_empty() {
        return Vec::new();
    }

    let next = AtomicUsize::new(0);
    let worker_count = min(limit.max(1), items.len());

    let workers = (0..worker_count).map(|_| {
        let next = &next;
        let task = &task;
        async move {
            let mut claimed = Vec::new();
            loop {
                let idx = next.fetch_add(1, Ordering::Relaxed);
                if idx >= items.len() {
                    break;
                }
                match task(&items[idx], idx).await {
                    Ok(value) => claimed.push((idx, Some(value))),
                    Err(err) => {
                        warn!(index = idx, %err, "bounded task failed, keeping neutral result");
                        claimed.push((idx, None));
                    }
                }
            }
            claimed
        }
    });

    let mut results: Vec<Option<T>> = Vec::with_capacity(items.len());
    results.resize_with(items.len(), || None);
    for chunk in join_all(workers).await {
        for (idx, value) in chunk {
            results[idx] = value;
        }
    }
    results
}
