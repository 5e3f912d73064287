/// Self-avoiding random walk: the path a round asks the caret to follow.
///
/// Starting from the caret, each step is a unit move in a direction drawn
/// from a `DirectionSource`. Candidates that leave buffer space or land on
/// an occupied cell are rejected and redrawn from the same previous cell;
/// rejections never count toward the round length.

use std::collections::HashSet;

use rand::Rng;

use super::geometry::{Direction, Position};

/// Supplier of candidate directions.
pub trait DirectionSource {
    fn next_direction(&mut self) -> Direction;
}

/// Uniform choice among the four directions.
pub struct RandomDirections<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomDirections<R> {
    pub fn new(rng: R) -> Self {
        RandomDirections { rng }
    }
}

impl<R: Rng> DirectionSource for RandomDirections<R> {
    fn next_direction(&mut self) -> Direction {
        Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())]
    }
}

/// One accepted cell of the walk, tagged with the move that reached it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WalkStep {
    pub position: Position,
    pub direction: Direction,
}

fn viable(candidate: Position, occupied: &HashSet<Position>) -> bool {
    candidate.in_buffer_space() && !occupied.contains(&candidate)
}

/// Generate up to `count` steps starting next to `start`.
///
/// Accepted positions are added to `occupied`. The walk only comes up short
/// when it boxes itself in (every neighbour of the last cell rejected); the
/// caller sees that as a shorter vector.
pub fn generate(
    start: Position,
    count: usize,
    occupied: &mut HashSet<Position>,
    source: &mut impl DirectionSource,
) -> Vec<WalkStep> {
    let mut steps = Vec::with_capacity(count);
    let mut last = start;

    while steps.len() < count {
        if !Direction::ALL.iter().any(|&d| viable(last.translate(d), occupied)) {
            tracing::warn!(at = %last, generated = steps.len(), "walk boxed in, ending round early");
            break;
        }

        let d = source.next_direction();
        let candidate = last.translate(d);
        if !viable(candidate, occupied) {
            continue;
        }

        occupied.insert(candidate);
        steps.push(WalkStep { position: candidate, direction: d });
        last = candidate;
    }

    steps
}

/// Replays a fixed list of directions, cycling when exhausted.
///
/// `generate` only stops early when every neighbour is blocked, so a script
/// must always be able to make progress from where it leads: `[Up]` from
/// line 3 spins forever at line 0 while left and right are still free.
#[cfg(test)]
pub struct Scripted {
    dirs: Vec<Direction>,
    next: usize,
}

#[cfg(test)]
impl Scripted {
    pub fn new(dirs: &[Direction]) -> Self {
        Scripted { dirs: dirs.to_vec(), next: 0 }
    }
}

#[cfg(test)]
impl DirectionSource for Scripted {
    fn next_direction(&mut self) -> Direction {
        let d = self.dirs[self.next % self.dirs.len()];
        self.next += 1;
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use Direction::*;

    #[test]
    fn scripted_walk_from_five_five() {
        let mut occupied = HashSet::new();
        let mut src = Scripted::new(&[Right, Right, Down]);
        let steps = generate(Position::new(5, 5), 3, &mut occupied, &mut src);

        let positions: Vec<_> = steps.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![Position::new(5, 6), Position::new(5, 7), Position::new(6, 7)]);

        let mut keys: Vec<_> = occupied.iter().map(|p| p.key()).collect();
        keys.sort();
        assert_eq!(keys, vec!["5-6", "5-7", "6-7"]);
    }

    #[test]
    fn rejected_candidates_do_not_count() {
        // Up from line 0 leaves buffer space; the later Up is a revisit of (0,1).
        let mut occupied = HashSet::new();
        let mut src = Scripted::new(&[Up, Right, Down, Up, Right]);
        let steps = generate(Position::new(0, 0), 3, &mut occupied, &mut src);

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], WalkStep { position: Position::new(0, 1), direction: Right });
        assert_eq!(steps[1], WalkStep { position: Position::new(1, 1), direction: Down });
        assert_eq!(steps[2], WalkStep { position: Position::new(1, 2), direction: Right });
    }

    #[test]
    fn start_cell_is_not_claimed() {
        let mut occupied = HashSet::new();
        let mut src = Scripted::new(&[Right, Left]);
        let steps = generate(Position::new(2, 2), 2, &mut occupied, &mut src);
        assert_eq!(steps[1].position, Position::new(2, 2));
    }

    #[test]
    fn negative_column_is_rejected() {
        let mut occupied = HashSet::new();
        let mut src = Scripted::new(&[Left, Down]);
        let steps = generate(Position::new(3, 0), 1, &mut occupied, &mut src);
        assert_eq!(steps[0].position, Position::new(4, 0));
    }

    #[test]
    fn boxed_in_walk_ends_early() {
        // (0,0) with (0,1) and (1,0) already claimed has nowhere to go.
        let mut occupied: HashSet<_> = [Position::new(0, 1), Position::new(1, 0)].into_iter().collect();
        let mut src = Scripted::new(&[Right]);
        let steps = generate(Position::new(0, 0), 10, &mut occupied, &mut src);
        assert!(steps.is_empty());
        assert_eq!(occupied.len(), 2);
    }

    #[test]
    fn random_walks_hold_their_invariants() {
        let mut rng = StdRng::seed_from_u64(0xbea7);
        for seed_round in 0..500 {
            let start = Position::new(seed_round % 4, (seed_round * 7) % 5);
            let mut occupied = HashSet::new();
            let mut src = RandomDirections::new(&mut rng);
            let steps = generate(start, 10, &mut occupied, &mut src);

            let unique: HashSet<_> = steps.iter().map(|s| s.position).collect();
            assert_eq!(unique.len(), steps.len(), "duplicate position in round");
            assert_eq!(occupied, unique);

            let mut prev = start;
            for s in &steps {
                assert!(s.position.line >= 0);
                assert!(s.position.column >= 0);
                assert_eq!(s.position, prev.translate(s.direction));
                prev = s.position;
            }
        }
    }
}
