//! 进程内的批次级互斥
//!
//! 同一批次的成员调整串行执行；跨进程的并发由存储层的 `version` 乐观锁兜底。

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

static BATCH_LOCKS: Lazy<DashMap<i64, Arc<Mutex<()>>>> = Lazy::new(DashMap::new);

/// 批次锁的持有者
///
/// drop 时先释放互斥锁，没有其他请求等待时顺带回收表项。
pub struct BatchLockGuard {
    batch_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for BatchLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // 表中的一份加上等待者各自持有的克隆
        BATCH_LOCKS.remove_if(&self.batch_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// 获取批次锁，持有返回的 guard 期间其他调整同一批次的请求会等待
pub async fn lock_batch(batch_id: i64) -> BatchLockGuard {
    let lock = BATCH_LOCKS
        .entry(batch_id)
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    BatchLockGuard {
        batch_id,
        guard: Some(lock.lock_owned().await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_batch_is_serialized() {
        let guard = lock_batch(-1).await;

        let waiter = tokio::spawn(async {
            let _guard = lock_batch(-1).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should acquire the lock")
            .expect("task should not panic");
        assert!(!BATCH_LOCKS.contains_key(&-1));
    }

    #[tokio::test]
    async fn test_different_batches_do_not_block() {
        let _a = lock_batch(-2).await;
        let b = tokio::time::timeout(Duration::from_millis(100), lock_batch(-3)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_entry_removed_after_last_holder() {
        let guard = lock_batch(-4).await;
        assert!(BATCH_LOCKS.contains_key(&-4));
        drop(guard);
        assert!(!BATCH_LOCKS.contains_key(&-4));
    }

    #[tokio::test]
    async fn test_entry_kept_while_someone_waits() {
        let guard = lock_batch(-5).await;
        let waiter = tokio::spawn(async {
            let _guard = lock_batch(-5).await;
            tokio::time::sleep(Duration::from_millis(20)).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert!(BATCH_LOCKS.contains_key(&-5));

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .expect("task should not panic");
        assert!(!BATCH_LOCKS.contains_key(&-5));
    }
}
