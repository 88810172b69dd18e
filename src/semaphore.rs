//! # カウンティングセマフォ
//!
//! コーディネーターとワーカーのランデブーに使う合図である。
//! `post()`と、それを消費する`wait()`の間には happens-before 関係が成立する。
//! つまり、`post()`より前に行った書き込みは、`wait()`から戻った後に必ず観測できる。

use std::sync::atomic::{AtomicU32, Ordering};

use atomic_wait::{wait, wake_one};

pub struct Semaphore {
    /// 消費可能な`post()`の数
    count: AtomicU32,
}

impl Semaphore {
    pub const fn new(initial: u32) -> Self {
        Self {
            count: AtomicU32::new(initial),
        }
    }

    pub fn post(&self) {
        // Release: これより前の書き込みを、このカウントを消費するスレッドに公開する。
        self.count.fetch_add(1, Ordering::Release);
        wake_one(&self.count);
    }

    /// カウントが正になるまで待機し、1つ消費する。タイムアウトはない。
    pub fn wait(&self) {
        let mut spin_count = 0;
        loop {
            if self.try_wait() {
                return;
            }
            // 相手がすぐに`post()`する場合が多いため、少しだけスピンしてから眠る。
            if spin_count < 100 {
                spin_count += 1;
                std::hint::spin_loop();
                continue;
            }
            // カウントが0のままであれば、`post()`による`wake_one`まで眠る。
            // 0でなくなっていれば、Futexは待機せずにすぐに戻る。
            wait(&self.count, 0);
        }
    }

    /// ブロックせずに1つ消費を試みる。
    pub fn try_wait(&self) -> bool {
        let mut current = self.count.load(Ordering::Relaxed);
        while current > 0 {
            // Acquire: 対応する`post()`より前の書き込みを観測できるようにする。
            match self.count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(0)
    }
}
