//! Coordinate arithmetic on the combined torus.
//!
//! All linear numberings here are axis-major with axis 0 fastest:
//! `id = c0 + n0 * (c1 + n1 * c2)`. Global ids of sub-domains are defined by
//! this ordering, so it must never change.

use super::coords::{Dims3, Direction, GlobalCoord, ProcCoord, ThreadCoord};

/// Decompose a local worker id into its thread-grid coordinate.
///
/// `local_id` must lie in `[0, threads.volume())`.
#[inline]
pub fn thread_coord(local_id: usize, threads: Dims3) -> ThreadCoord {
    debug_assert!(
        local_id < threads.volume(),
        "thread id {local_id} outside a {threads} thread grid"
    );
    let mut id = local_id;
    let x = id % threads[0];
    id /= threads[0];
    let y = id % threads[1];
    id /= threads[1];
    ThreadCoord::new(x, y, id)
}

/// Inverse of [`thread_coord`].
#[inline]
pub fn thread_id(coord: ThreadCoord, threads: Dims3) -> usize {
    coord[0] + threads[0] * (coord[1] + threads[1] * coord[2])
}

/// Linear id of a cell of the combined torus.
#[inline]
pub fn global_id(coord: GlobalCoord, procs: Dims3, threads: Dims3) -> usize {
    let nx = procs[0] * threads[0];
    let ny = procs[1] * threads[1];
    coord[0] + nx * (coord[1] + ny * coord[2])
}

/// Inverse of [`global_id`].
pub fn global_coord(id: usize, procs: Dims3, threads: Dims3) -> GlobalCoord {
    let lines = procs.scaled(threads);
    let x = id % lines[0];
    let rest = id / lines[0];
    GlobalCoord::new(x, rest % lines[1], rest / lines[1])
}

/// Global coordinate of a worker given its rank's process coordinate.
#[inline]
pub fn combine(proc: ProcCoord, thread: ThreadCoord, threads: Dims3) -> GlobalCoord {
    GlobalCoord(std::array::from_fn(|a| proc[a] * threads[a] + thread[a]))
}

/// Split a global coordinate into the owning process and the worker inside it.
#[inline]
pub fn split(coord: GlobalCoord, threads: Dims3) -> (ProcCoord, ThreadCoord) {
    let proc = ProcCoord(std::array::from_fn(|a| coord[a] / threads[a]));
    let thread = ThreadCoord(std::array::from_fn(|a| coord[a] - proc[a] * threads[a]));
    (proc, thread)
}

/// Displace `coord` by `dir` and fold the result back onto the torus whose
/// last valid coordinate is `last`.
///
/// A single period is added or subtracted per axis, so `|dir|` may not
/// exceed one period on any axis.
pub fn wrap(coord: GlobalCoord, dir: Direction, last: GlobalCoord) -> GlobalCoord {
    GlobalCoord(std::array::from_fn(|a| {
        let period = last[a] as isize + 1;
        debug_assert!(
            dir.0[a].abs() <= period,
            "displacement {} exceeds period {period} on axis {a}",
            dir.0[a]
        );
        let mut c = coord[a] as isize + dir.0[a];
        if c > last[a] as isize {
            c -= period;
        }
        if c < 0 {
            c += period;
        }
        c as usize
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_coord_is_x_fastest() {
        let t = Dims3::new(2, 3, 2);
        assert_eq!(thread_coord(0, t), ThreadCoord::new(0, 0, 0));
        assert_eq!(thread_coord(1, t), ThreadCoord::new(1, 0, 0));
        assert_eq!(thread_coord(2, t), ThreadCoord::new(0, 1, 0));
        assert_eq!(thread_coord(6, t), ThreadCoord::new(0, 0, 1));
        assert_eq!(thread_coord(11, t), ThreadCoord::new(1, 2, 1));
        for id in 0..t.volume() {
            assert_eq!(thread_id(thread_coord(id, t), t), id);
        }
    }

    #[test]
    fn global_id_layout() {
        let p = Dims3::new(2, 1, 3);
        let t = Dims3::new(1, 2, 1);
        // combined torus is 2 x 2 x 3
        assert_eq!(global_id(GlobalCoord::new(1, 0, 0), p, t), 1);
        assert_eq!(global_id(GlobalCoord::new(0, 1, 0), p, t), 2);
        assert_eq!(global_id(GlobalCoord::new(0, 0, 1), p, t), 4);
        assert_eq!(global_id(GlobalCoord::new(1, 1, 2), p, t), 11);
        for id in 0..12 {
            assert_eq!(global_id(global_coord(id, p, t), p, t), id);
        }
    }

    #[test]
    fn split_inverts_combine() {
        let t = Dims3::new(3, 2, 2);
        let p = ProcCoord::new(4, 0, 1);
        let th = ThreadCoord::new(2, 1, 0);
        let g = combine(p, th, t);
        assert_eq!(g, GlobalCoord::new(14, 1, 2));
        assert_eq!(split(g, t), (p, th));
    }

    #[test]
    fn wrap_folds_both_ends() {
        let last = GlobalCoord::new(3, 0, 4);
        assert_eq!(
            wrap(GlobalCoord::new(0, 0, 4), Direction::new(-1, 0, 1), last),
            GlobalCoord::new(3, 0, 0)
        );
        assert_eq!(
            wrap(GlobalCoord::new(3, 0, 2), Direction::new(1, 1, -1), last),
            GlobalCoord::new(0, 0, 1)
        );
        assert_eq!(
            wrap(GlobalCoord::new(2, 0, 2), Direction::new(0, -1, 0), last),
            GlobalCoord::new(2, 0, 2)
        );
    }

    #[test]
    fn wrap_full_period_is_identity() {
        let last = GlobalCoord::new(1, 2, 0);
        let c = GlobalCoord::new(1, 2, 0);
        assert_eq!(wrap(c, Direction::new(2, -3, 1), last), c);
    }
}
