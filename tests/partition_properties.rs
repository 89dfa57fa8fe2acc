mod util;
use util::*;

use grid_decomp::prelude::*;
use grid_decomp::topology::hierarchical::{coord_to_rank, rank_to_coord};
use grid_decomp::topology::mapping;
use proptest::prelude::*;

fn dims3(max: usize) -> impl Strategy<Value = Dims3> {
    (1..=max, 1..=max, 1..=max).prop_map(|(x, y, z)| Dims3::new(x, y, z))
}

fn order() -> impl Strategy<Value = AxisOrder> {
    prop::sample::select(vec![
        AxisOrder::XYZ,
        AxisOrder::XZY,
        AxisOrder::YXZ,
        AxisOrder::YZX,
        AxisOrder::ZXY,
        AxisOrder::ZYX,
    ])
}

proptest! {
    #[test]
    fn prop_axis_partition_is_balanced(lines in 1usize..64, extra in 0usize..500) {
        let extent = lines + extra;
        let p = AxisPartition::new(0, extent, lines).unwrap();
        prop_assert_eq!(p.extents().len(), lines);
        prop_assert_eq!(p.extents().iter().sum::<usize>(), extent);
        prop_assert_eq!(p.offsets()[0], 0);
        prop_assert_eq!(p.offsets()[lines], extent);
        for i in 0..lines {
            prop_assert!(p.extent(i) >= 1);
            prop_assert_eq!(p.offset(i + 1), p.offset(i) + p.extent(i));
        }
        let max = *p.extents().iter().max().unwrap();
        let min = *p.extents().iter().min().unwrap();
        prop_assert!(max - min <= 1);
        // longer lines come first
        prop_assert!(p.extents().windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn prop_too_few_cells_is_rejected(lines in 2usize..64, short in 1usize..64) {
        let extent = lines.saturating_sub(short);
        let err = AxisPartition::new(1, extent, lines).unwrap_err();
        prop_assert_eq!(err, DecompError::ExtentTooSmall { axis: 1, extent, lines });
    }

    #[test]
    fn prop_global_id_round_trips(procs in dims3(4), threads in dims3(4), seed in any::<usize>()) {
        let id = seed % procs.scaled(threads).volume();
        let c = mapping::global_coord(id, procs, threads);
        prop_assert!(c.within(procs.scaled(threads)));
        prop_assert_eq!(mapping::global_id(c, procs, threads), id);
        let (p, t) = mapping::split(c, threads);
        prop_assert!(p.within(procs));
        prop_assert!(t.within(threads));
        prop_assert_eq!(mapping::combine(p, t, threads), c);
    }

    #[test]
    fn prop_wrap_stays_on_torus(
        lines in dims3(6),
        seed in any::<[usize; 3]>(),
        d in (-1isize..=1, -1isize..=1, -1isize..=1),
    ) {
        let last = GlobalCoord::new(lines[0] - 1, lines[1] - 1, lines[2] - 1);
        let start = GlobalCoord::new(seed[0] % lines[0], seed[1] % lines[1], seed[2] % lines[2]);
        let dir = Direction::new(d.0, d.1, d.2);
        let there = mapping::wrap(start, dir, last);
        prop_assert!(there.within(lines));
        prop_assert_eq!(mapping::wrap(there, dir.reversed(), last), start);
    }

    #[test]
    fn prop_hierarchy_numbering_is_a_bijection(
        splits in prop::collection::vec(dims3(3), 1..4),
        order in order(),
    ) {
        let levels: Vec<Level> = splits
            .into_iter()
            .map(|s| Level::new(LevelKind::Core, s))
            .collect();
        let dims = levels.iter().fold(Dims3::unit(), |d, l| d.scaled(l.split));
        let mut seen = vec![false; dims.volume()];
        for rank in 0..dims.volume() {
            let c = rank_to_coord(rank, &levels, order);
            prop_assert!(c.within(dims));
            let flat = c[0] + dims[0] * (c[1] + dims[1] * c[2]);
            prop_assert!(!seen[flat]);
            seen[flat] = true;
            prop_assert_eq!(coord_to_rank(c, &levels, order), rank);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_flat_groups_cover_every_cell(
        procs in dims3(2),
        threads in dims3(2),
        pad in (0usize..4, 0usize..4, 0usize..4),
    ) {
        let lines = procs.scaled(threads);
        let extents = [lines[0] + pad.0, lines[1] + pad.1, lines[2] + pad.2];
        let decs = flat_group(procs, threads, extents);

        let mut ids = Vec::new();
        let mut cells = 0;
        for d in &decs {
            for dom in d.domains() {
                ids.push(dom.id);
                cells += dom.extent.iter().product::<usize>();
            }
        }
        ids.sort_unstable();
        prop_assert_eq!(ids, (0..lines.volume()).collect::<Vec<_>>());
        prop_assert_eq!(cells, extents.iter().product::<usize>());

        for dir in [Direction::new(1, 0, 0), Direction::new(0, -1, 1), Direction::new(-1, 1, -1)] {
            assert_symmetric(&decs, dir);
        }
    }
}
