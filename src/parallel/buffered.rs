use anyhow::Result;

use super::core::{ExecutionConfig, ExecutionStrategy};
use super::pool::WorkerPool;

/// Number of elements handed to a single cursor.
pub const BUFFER_SIZE: usize = 256;

/// Forward-only, single-pass view over one buffer of the source
pub type Cursor<'a, T> = std::slice::Iter<'a, T>;

/// Process a potentially very large source (a document batch, say) buffer by buffer
///
/// With a parallelism of one, or when the whole source fits in one buffer,
/// `action` is called exactly once on the calling thread with a cursor over
/// everything.
///
/// Otherwise the number of buffers is derived as
/// `steps = source.len() / max_parallelism`, and buffer `i` (for `i` in
/// `0..steps`) starts at `i * BUFFER_SIZE` and spans up to `BUFFER_SIZE`
/// elements. Buffers starting past the end are delivered as empty cursors.
/// When `steps * BUFFER_SIZE < source.len()`, which only happens once the
/// parallelism exceeds `BUFFER_SIZE`, the tail of the source is never visited.
/// The buffers are processed by up to `max_parallelism` workers; the first
/// failing buffer aborts the rest.
pub fn execute_all_buffered<T, F>(config: &ExecutionConfig, source: &[T], action: F) -> Result<()>
where
    T: Sync,
    F: Fn(Cursor<'_, T>) -> Result<()> + Sync,
{
    let workers = match ExecutionStrategy::for_config(config) {
        ExecutionStrategy::Parallel { workers } if source.len() > BUFFER_SIZE => workers,
        _ => return action(source.iter()),
    };

    let steps = source.len() / workers;
    tracing::debug!(
        items = source.len(),
        steps,
        workers,
        database = config.database(),
        "buffered fan-out"
    );

    WorkerPool::new(workers).execute(0..steps, |step| {
        tracing::trace!(step, "processing buffer");
        action(buffer(source, step * BUFFER_SIZE)).map(|()| None::<()>)
    })?;

    Ok(())
}

fn buffer<T>(source: &[T], start: usize) -> Cursor<'_, T> {
    let start = start.min(source.len());
    let end = start.saturating_add(BUFFER_SIZE).min(source.len());
    source[start..end].iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_small_source_single_cursor() {
        let config = ExecutionConfig::new(8).unwrap();
        let source: Vec<u32> = (0..BUFFER_SIZE as u32).collect();
        let calls = AtomicUsize::new(0);

        execute_all_buffered(&config, &source, |cursor| {
            calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(cursor.len(), BUFFER_SIZE);
            Ok(())
        })
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sequential_mode_single_cursor_in_order() {
        let config = ExecutionConfig::sequential();
        let source: Vec<u32> = (0..5_000).collect();
        let seen = Mutex::new(Vec::new());

        execute_all_buffered(&config, &source, |cursor| {
            seen.lock().extend(cursor.copied());
            Ok(())
        })
        .unwrap();

        assert_eq!(seen.into_inner(), source);
    }

    #[test]
    fn test_steps_drive_buffer_count() {
        let config = ExecutionConfig::new(4).unwrap();
        let source: Vec<usize> = (0..1000).collect();
        let cursors = AtomicUsize::new(0);
        let seen = Mutex::new(Vec::new());

        execute_all_buffered(&config, &source, |cursor| {
            cursors.fetch_add(1, Ordering::SeqCst);
            assert!(cursor.len() <= BUFFER_SIZE);
            seen.lock().extend(cursor.copied());
            Ok(())
        })
        .unwrap();

        // steps = 1000 / 4 = 250 buffers, most of them starting past the end
        assert_eq!(cursors.load(Ordering::SeqCst), 250);
        let mut seen = seen.into_inner();
        seen.sort_unstable();
        assert_eq!(seen, source);
    }

    #[test]
    fn test_high_parallelism_truncates_tail() {
        let config = ExecutionConfig::new(300).unwrap();
        let source: Vec<usize> = (0..1000).collect();
        let seen = Mutex::new(Vec::new());

        execute_all_buffered(&config, &source, |cursor| {
            seen.lock().extend(cursor.copied());
            Ok(())
        })
        .unwrap();

        // steps = 1000 / 300 = 3, so only the first 3 * 256 items are visited
        let mut seen = seen.into_inner();
        seen.sort_unstable();
        assert_eq!(seen, (0..768).collect::<Vec<_>>());
    }

    #[test]
    fn test_buffer_failure_propagates() {
        let config = ExecutionConfig::new(2).unwrap();
        let source: Vec<usize> = (0..2048).collect();

        let result = execute_all_buffered(&config, &source, |mut cursor| {
            if cursor.any(|&item| item == 600) {
                anyhow::bail!("bad document");
            }
            Ok(())
        });

        assert_eq!(result.unwrap_err().to_string(), "bad document");
    }

    #[test]
    fn test_buffer_clamps_to_source() {
        let source = [1, 2, 3];
        assert_eq!(buffer(&source, 1).len(), 2);
        assert_eq!(buffer(&source, 10).len(), 0);
    }
}
