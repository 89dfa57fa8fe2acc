mod util;
use util::*;

use grid_decomp::prelude::*;

fn socket_node() -> Vec<Level> {
    vec![
        Level::new(LevelKind::Socket, [2, 1, 1]),
        Level::new(LevelKind::Node, [1, 2, 1]),
    ]
}

#[test]
fn ranks_are_placed_level_by_level() {
    let decs = hierarchical_group(
        AxisOrder::XYZ,
        &socket_node(),
        Dims3::new(1, 1, 2),
        [8, 8, 8],
    );
    let coords: Vec<_> = decs.iter().map(|d| d.my_coord()).collect();
    assert_eq!(
        coords,
        vec![
            ProcCoord::new(0, 0, 0),
            ProcCoord::new(1, 0, 0),
            ProcCoord::new(0, 1, 0),
            ProcCoord::new(1, 1, 0),
        ]
    );
    for d in &decs {
        assert_eq!(d.process_grid(), Dims3::new(2, 2, 1));
        assert_eq!(d.threads_per_rank(), 2);
    }

    let top = decs[3].domain(1);
    assert_eq!(top.coord, GlobalCoord::new(1, 1, 1));
    assert_eq!(top.offset, [4, 4, 4]);
    assert_eq!(top.extent, [4, 4, 4]);
    assert_eq!(top.id, 1 + 2 * (1 + 2 * 1));
}

#[test]
fn neighbours_cross_levels() {
    let decs = hierarchical_group(
        AxisOrder::XYZ,
        &socket_node(),
        Dims3::new(1, 1, 2),
        [8, 8, 8],
    );

    let west = decs[0].neighbor(0, -1, 0, 0);
    assert_eq!((west.rank, west.thread_id), (1, 0));

    let south = decs[0].neighbor(0, 0, -1, 0);
    assert_eq!((south.rank, south.thread_id), (2, 0));

    // z is only split across threads, so this stays on rank 0
    let below = decs[0].neighbor(0, 0, 0, -1);
    assert_eq!((below.rank, below.thread_id), (0, 1));

    let corner = decs[0].neighbor(1, 1, 1, 1);
    assert_eq!((corner.rank, corner.thread_id), (3, 0));
    assert_eq!(corner.coord, GlobalCoord::new(1, 1, 0));

    for dir in Direction::stencil26() {
        assert_symmetric(&decs, dir);
    }
}

#[test]
fn axis_order_moves_ranks() {
    let levels = vec![Level::new(LevelKind::Core, [2, 2, 1])];
    let xyz = hierarchical_group(AxisOrder::XYZ, &levels, Dims3::unit(), [4, 4, 4]);
    let yxz = hierarchical_group(AxisOrder::YXZ, &levels, Dims3::unit(), [4, 4, 4]);
    assert_eq!(xyz[1].my_coord(), ProcCoord::new(1, 0, 0));
    assert_eq!(yxz[1].my_coord(), ProcCoord::new(0, 1, 0));
    assert_eq!(xyz[1].domain(0).offset, [2, 0, 0]);
    assert_eq!(yxz[1].domain(0).offset, [0, 2, 0]);
    for dir in Direction::stencil26() {
        assert_symmetric(&yxz, dir);
    }
}

#[test]
fn three_levels_with_threads() {
    let levels = vec![
        Level::new(LevelKind::Core, [2, 1, 1]),
        Level::new(LevelKind::Numa, [1, 1, 2]),
        Level::new(LevelKind::Node, [1, 2, 1]),
    ];
    let decs = hierarchical_group(
        AxisOrder::ZYX,
        &levels,
        Dims3::new(2, 1, 1),
        [13, 7, 5],
    );
    assert_eq!(decs.len(), 8);
    let mut ids: Vec<usize> = decs
        .iter()
        .flat_map(|d| d.domains().into_iter().map(|dom| dom.id))
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..16).collect::<Vec<_>>());
    for dir in Direction::stencil26() {
        assert_symmetric(&decs, dir);
    }
}

#[test]
fn disagreeing_levels_fail_everywhere() {
    let results = on_ranks(4, |c| {
        let levels = if c.rank() == 1 {
            vec![
                Level::new(LevelKind::Socket, [1, 2, 1]),
                Level::new(LevelKind::Node, [2, 1, 1]),
            ]
        } else {
            socket_node()
        };
        let err = Decomposition::hierarchical(
            &c,
            AxisOrder::XYZ,
            Dims3::unit(),
            levels,
            [4, 4, 4],
            false,
        )
        .unwrap_err();
        (err, c.local_group().live_handles(c.rank()))
    });
    for (err, live) in results {
        assert_eq!(err, DecompError::TopologyMismatch { rank: 1 });
        assert_eq!(live, 0);
    }
}

#[test]
fn disagreeing_order_fails_everywhere() {
    let results = on_ranks(4, |c| {
        let order = if c.rank() == 0 {
            AxisOrder::YXZ
        } else {
            AxisOrder::XYZ
        };
        Decomposition::hierarchical(&c, order, Dims3::unit(), socket_node(), [4, 4, 4], false)
            .unwrap_err()
    });
    assert!(results.iter().all(|e| *e == DecompError::TopologyMismatch { rank: 1 }));
}

#[test]
fn only_rank_zero_renders_and_ranks_agree() {
    let texts = on_ranks(4, |c| {
        let d = Decomposition::hierarchical(
            &c,
            AxisOrder::XYZ,
            Dims3::unit(),
            socket_node(),
            [4, 4, 4],
            false,
        )
        .unwrap();
        d.print();
        d.render_topology().unwrap()
    });
    assert!(texts.windows(2).all(|w| w[0] == w[1]));
    let lines: Vec<&str> = texts[0].lines().collect();
    assert_eq!(lines[0], "hierarchical topology 2x2x1 (order xyz)");
    assert_eq!(lines[1], "  level 0: socket   2x1x1");
    assert_eq!(lines[2], "  level 1: node     1x2x1");
    assert_eq!(lines[4], "  2 3");
    assert_eq!(lines[5], "  0 1");
}
