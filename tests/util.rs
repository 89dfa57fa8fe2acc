#![allow(dead_code)]
use grid_decomp::prelude::*;
use std::thread;

/// Run `f` on every rank of a fresh in-process group; results are indexed by rank.
pub fn on_ranks<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(LocalComm) -> T + Sync,
{
    let comms = LocalComm::group(n);
    let f = &f;
    thread::scope(|s| {
        let handles: Vec<_> = comms.into_iter().map(|c| s.spawn(move || f(c))).collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    })
}

/// Flat decompositions of every rank of a `procs` grid.
pub fn flat_group(
    procs: Dims3,
    threads: Dims3,
    extents: [usize; 3],
) -> Vec<Decomposition<LocalComm>> {
    on_ranks(procs.volume(), |c| {
        Decomposition::flat(&c, procs, threads, extents, false).expect("flat decomposition")
    })
}

/// Hierarchical decompositions of every rank spanned by `levels`.
pub fn hierarchical_group(
    order: AxisOrder,
    levels: &[Level],
    threads: Dims3,
    extents: [usize; 3],
) -> Vec<Decomposition<LocalComm>> {
    let n = levels.iter().map(|l| l.split.volume()).product();
    on_ranks(n, |c| {
        Decomposition::hierarchical(&c, order, threads, levels.to_vec(), extents, false)
            .expect("hierarchical decomposition")
    })
}

/// Check that walking `dir` and back returns to the start, and that the
/// neighbour descriptor matches what its owner reports.
pub fn assert_symmetric(decs: &[Decomposition<LocalComm>], dir: Direction) {
    for (rank, d) in decs.iter().enumerate() {
        assert_eq!(d.rank(), rank);
        for t in 0..d.threads_per_rank() {
            let n = d.neighbor_in(t, dir);
            let owner = &decs[n.rank];
            assert_eq!(owner.domain(n.thread_id), n, "rank {rank} thread {t} dir {dir:?}");
            let back = owner.neighbor_in(n.thread_id, dir.reversed());
            assert_eq!(
                (back.rank, back.thread_id),
                (rank, t),
                "round trip from rank {rank} thread {t} along {dir:?}"
            );
        }
    }
}
