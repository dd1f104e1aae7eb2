//! Thread pool setup for the identity matrix build

/// Worker count for a `--threads` value, where 0 means every core.
pub fn resolve_threads(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get()
    } else {
        requested
    }
}

/// Size the global rayon pool. Returns the thread count used.
pub fn configure_thread_pool(threads: usize) -> Result<usize, rayon::ThreadPoolBuildError> {
    let threads = resolve_threads(threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("kerf-worker-{}", i))
        .build_global()?;
    Ok(threads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_threads() {
        assert_eq!(resolve_threads(0), num_cpus::get());
        assert_eq!(resolve_threads(3), 3);
    }
}
