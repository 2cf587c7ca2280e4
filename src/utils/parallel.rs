use std::sync::atomic::AtomicUsize;

use log::{debug, warn};

pub trait ParallelProcessor {
    fn init_parallel_processing() {
        // Configure thread pool if not already configured
        if rayon::current_num_threads() == 1 && num_cpus::get() > 1 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(num_cpus::get())
                .build_global()
            {
                warn!("Keeping existing thread pool: {}", e);
            }
        }
        debug!("Using {} CPU threads for processing", rayon::current_num_threads());
    }

    fn get_progress_counter() -> AtomicUsize {
        AtomicUsize::new(0)
    }
}
