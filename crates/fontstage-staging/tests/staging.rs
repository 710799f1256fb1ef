// this_file: crates/fontstage-staging/tests/staging.rs

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

use fontstage_staging::{map_read_only, temp_file_name, Stager, StagingIdentity};
use proptest::prelude::*;

#[test]
fn test_concurrent_stagers_with_distinct_identities_never_collide() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root: Arc<PathBuf> = Arc::new(dir.path().to_path_buf());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8u64)
        .map(|tid| {
            let root = Arc::clone(&root);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let stager = Stager::default().with_identity(StagingIdentity { pid: 1, tid });
                barrier.wait();
                // Hold every file so names stay taken until the join
                (0..10)
                    .map(|_| stager.acquire_temp_file(root.as_path()).expect("acquire"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let staged: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("join"))
        .collect();
    let names: HashSet<_> = staged.iter().map(|f| f.path().to_path_buf()).collect();

    assert_eq!(staged.len(), 80);
    assert_eq!(names.len(), 80);
}

#[test]
fn test_written_bytes_map_back_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let stager = Stager::default();
    let staged = stager.acquire_temp_file(dir.path()).expect("acquire");

    // Spans several copy chunks and ends mid-chunk
    let payload: Vec<u8> = (0..4099u32).map(|i| (i * 31 % 251) as u8).collect();
    stager
        .copy_buffer_to_file(staged.path(), &payload)
        .expect("write");

    let mapped = map_read_only(staged.path()).expect("map");
    assert_eq!(&mapped[..], payload.as_slice());
}

proptest! {
    #[test]
    fn prop_distinct_identities_produce_distinct_names(
        pid_a in any::<u32>(), tid_a in any::<u64>(), attempt_a in 0u32..100,
        pid_b in any::<u32>(), tid_b in any::<u64>(), attempt_b in 0u32..100,
    ) {
        let a = StagingIdentity { pid: pid_a, tid: tid_a };
        let b = StagingIdentity { pid: pid_b, tid: tid_b };
        prop_assume!(a != b);
        prop_assert_ne!(
            temp_file_name(".font", a, attempt_a),
            temp_file_name(".font", b, attempt_b)
        );
    }
}
