use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lrukpool::error::{Error, Result};

use super::{blk, new_bpm};

#[test]
fn test_pin_timeout_waits_for_unpin() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let bpm = Arc::new(new_bpm(1).with_max_wait(Duration::from_secs(5)));
    let frame = bpm.pin(&blk(0))?.ok_or(Error::BufferAbort)?;

    let waiter = {
        let bpm = Arc::clone(&bpm);
        thread::spawn(move || bpm.pin_timeout(&blk(1)))
    };
    thread::sleep(Duration::from_millis(50));
    bpm.unpin(&frame)?;

    let pinned = waiter.join().map_err(|_| Error::Internal("waiter panicked".into()))??;
    assert!(Arc::ptr_eq(&frame, &pinned));
    assert_eq!(Some(&blk(1)), pinned.read()?.block());
    Ok(())
}

#[test]
fn test_concurrent_pin_unpin() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let threads = 4;
    let per_thread = 2;
    let rounds = 200;
    // every block fits in the pool, no eviction ever happens.
    let bpm = Arc::new(new_bpm(threads * per_thread));

    let handles = (0..threads)
        .map(|t| {
            let bpm = Arc::clone(&bpm);
            thread::spawn(move || -> Result<()> {
                for r in 0..rounds {
                    let n = (t * per_thread + r % per_thread) as u64;
                    let frame = bpm.pin_timeout(&blk(n))?;
                    assert_eq!(Some(&blk(n)), frame.read()?.block());
                    bpm.unpin(&frame)?;
                }
                Ok(())
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().map_err(|_| Error::Internal("worker panicked".into()))??;
    }

    assert_eq!(0, bpm.available()?);
    for n in 0..(threads * per_thread) as u64 {
        let frame = bpm.pin(&blk(n))?.ok_or(Error::BufferAbort)?;
        assert_eq!(1, frame.read()?.pin_count());
        let len = bpm.history_len(&blk(n))?.unwrap_or(0);
        assert!((1..=3).contains(&len));
    }
    Ok(())
}
