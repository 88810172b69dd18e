//! # CPUアフィニティ
//!
//! 呼び出し元スレッドを1つのCPUに固定する。2つのワーカーを同じCPUに載せると、
//! コア間の可視性の問題とコア内の命令の並び替えを切り分けられる。
//!
//! 固定はあくまでヒントであり、失敗しても実験は続行する。Linux以外では未対応である。

use crate::error::AffinityError;

/// `core`はCPU番号であり、使用可能なCPUの個数ではない。
/// cpusetで`2-3`のように制限されている場合もあるため、範囲の上限は`CPU_SETSIZE`だけで判定し、
/// 実際に使えるかどうかは`sched_setaffinity`に任せる（使えなければEINVAL）。
#[cfg(target_os = "linux")]
pub fn pin_current_thread(core: usize) -> Result<(), AffinityError> {
    let max = libc::CPU_SETSIZE as usize;
    if core >= max {
        return Err(AffinityError::InvalidCore { core, max });
    }

    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(core, &mut set);
        // pid 0 は呼び出し元スレッドを意味する。
        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) != 0 {
            return Err(AffinityError::Os(std::io::Error::last_os_error()));
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_core: usize) -> Result<(), AffinityError> {
    Err(AffinityError::Unsupported)
}

/// 呼び出し元スレッドが実行可能なCPU番号の一覧。取得できなければ空。
#[cfg(target_os = "linux")]
pub fn allowed_cores() -> Vec<usize> {
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) != 0 {
            return Vec::new();
        }
        (0..libc::CPU_SETSIZE as usize)
            .filter(|&core| libc::CPU_ISSET(core, &set))
            .collect()
    }
}

#[cfg(not(target_os = "linux"))]
pub fn allowed_cores() -> Vec<usize> {
    Vec::new()
}
