// cargo run --example print_topology
//
// Decomposes a 64^3 grid over eight in-process ranks laid out as two nodes
// of two sockets of two cores, two threads per rank, and prints the rank map
// plus the sub-domains of rank 0.
use std::thread;

use grid_decomp::prelude::*;

fn main() -> Result<(), DecompError> {
    let levels = vec![
        Level::new(LevelKind::Core, [2, 1, 1]),
        Level::new(LevelKind::Socket, [1, 2, 1]),
        Level::new(LevelKind::Node, [1, 1, 2]),
    ];
    let threads = Dims3::new(2, 1, 1);

    let comms = LocalComm::group(8);
    let results: Vec<Result<(), DecompError>> = thread::scope(|s| {
        let handles: Vec<_> = comms
            .iter()
            .map(|c| {
                let levels = levels.clone();
                s.spawn(move || {
                    let d = Decomposition::hierarchical(
                        c,
                        AxisOrder::XYZ,
                        threads,
                        levels,
                        [64, 64, 64],
                        false,
                    )?;
                    d.print();
                    if d.rank() == 0 {
                        for dom in d.domains() {
                            println!(
                                "thread {} id {} offset {:?} extent {:?}",
                                dom.thread_id, dom.id, dom.offset, dom.extent
                            );
                            let east = d.neighbor(dom.thread_id, 1, 0, 0);
                            println!(
                                "  east neighbour: rank {} thread {}",
                                east.rank, east.thread_id
                            );
                        }
                    }
                    d.finalize()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(DecompError::Substrate("rank panicked".into())))
            })
            .collect()
    });
    results.into_iter().collect()
}
