use super::constants::{MAX_SPAWN_ATTEMPTS, SPAWN_CLEARANCE, SPAWN_MARGIN, STARTING_LENGTH};
use super::grid::{Direction, Grid, Position};
use super::snake::Snake;
use rand::Rng;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Wall,
    SelfCollision,
    SnakeCollision,
    HeadOn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Move { new_head: Position },
    Grow { new_head: Position, food_index: usize },
    Die { cause: DeathCause },
}

#[derive(Debug, Clone)]
pub struct SnakeView {
    pub body: Vec<Position>,
    pub direction: Direction,
}

// Resolves one tick's worth of moves against a start-of-tick snapshot, so the
// result does not depend on the order snakes are visited in. Check order is
// fixed: wall, self, other snakes (head-on ties kill everyone involved), food,
// then a plain move.
pub fn resolve_tick(grid: Grid, foods: &[Position], snakes: &[SnakeView]) -> Vec<MoveOutcome> {
    let candidates: Vec<Position> = snakes
        .iter()
        .map(|snake| snake.body[0].step(snake.direction))
        .collect();

    let mut contested: HashMap<Position, usize> = HashMap::new();
    for candidate in &candidates {
        *contested.entry(*candidate).or_insert(0) += 1;
    }

    snakes
        .iter()
        .enumerate()
        .map(|(index, snake)| {
            let candidate = candidates[index];
            if !grid.contains(candidate) {
                return MoveOutcome::Die {
                    cause: DeathCause::Wall,
                };
            }
            if snake.body.contains(&candidate) {
                return MoveOutcome::Die {
                    cause: DeathCause::SelfCollision,
                };
            }
            let hits_other_body = snakes
                .iter()
                .enumerate()
                .any(|(other_index, other)| other_index != index && other.body.contains(&candidate));
            if hits_other_body {
                return MoveOutcome::Die {
                    cause: DeathCause::SnakeCollision,
                };
            }
            if contested.get(&candidate).copied().unwrap_or(0) > 1 {
                return MoveOutcome::Die {
                    cause: DeathCause::HeadOn,
                };
            }
            if let Some(food_index) = foods.iter().position(|food| *food == candidate) {
                return MoveOutcome::Grow {
                    new_head: candidate,
                    food_index,
                };
            }
            MoveOutcome::Move {
                new_head: candidate,
            }
        })
        .collect()
}

// Random placement with bounded retries; a nearly-full grid falls back to a
// scan of the free cells so progress is guaranteed.
pub fn spawn_food<R: Rng>(grid: Grid, blocked: &HashSet<Position>, rng: &mut R) -> Option<Position> {
    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let candidate = Position {
            x: rng.gen_range(0..grid.width),
            y: rng.gen_range(0..grid.height),
        };
        if !blocked.contains(&candidate) {
            return Some(candidate);
        }
    }
    let free: Vec<Position> = grid.cells().filter(|cell| !blocked.contains(cell)).collect();
    if free.is_empty() {
        return None;
    }
    Some(free[rng.gen_range(0..free.len())])
}

pub fn spawn_snake<R: Rng>(grid: Grid, occupied: &HashSet<Position>, rng: &mut R) -> Option<Snake> {
    if grid.width > 2 * SPAWN_MARGIN && grid.height > 2 * SPAWN_MARGIN {
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let head = Position {
                x: rng.gen_range(SPAWN_MARGIN..grid.width - SPAWN_MARGIN),
                y: rng.gen_range(SPAWN_MARGIN..grid.height - SPAWN_MARGIN),
            };
            let snake = Snake::new(head, Direction::Right, STARTING_LENGTH);
            if has_clearance(&snake, occupied) {
                return Some(snake);
            }
        }
    }
    // Crowded or tiny grid: accept any spot where the body fits without
    // touching an occupied cell.
    let heads: Vec<Position> = grid
        .cells()
        .filter(|head| body_fits(grid, *head, occupied))
        .collect();
    if heads.is_empty() {
        return None;
    }
    let head = heads[rng.gen_range(0..heads.len())];
    Some(Snake::new(head, Direction::Right, STARTING_LENGTH))
}

fn has_clearance(snake: &Snake, occupied: &HashSet<Position>) -> bool {
    snake.body.iter().all(|segment| {
        occupied
            .iter()
            .all(|cell| segment.chebyshev_distance(*cell) >= SPAWN_CLEARANCE)
    })
}

fn body_fits(grid: Grid, head: Position, occupied: &HashSet<Position>) -> bool {
    let probe = Snake::new(head, Direction::Right, STARTING_LENGTH);
    probe
        .body
        .iter()
        .all(|segment| grid.contains(*segment) && !occupied.contains(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid5() -> Grid {
        Grid {
            width: 5,
            height: 5,
        }
    }

    fn view(body: &[(i32, i32)], direction: Direction) -> SnakeView {
        SnakeView {
            body: body.iter().map(|&(x, y)| Position { x, y }).collect(),
            direction,
        }
    }

    #[test]
    fn single_snake_moves_into_empty_cell() {
        let outcomes = resolve_tick(grid5(), &[], &[view(&[(2, 2)], Direction::Right)]);
        assert_eq!(
            outcomes,
            vec![MoveOutcome::Move {
                new_head: Position { x: 3, y: 2 }
            }]
        );
    }

    #[test]
    fn single_snake_grows_onto_food() {
        let foods = vec![Position { x: 3, y: 2 }];
        let outcomes = resolve_tick(grid5(), &foods, &[view(&[(2, 2)], Direction::Right)]);
        assert_eq!(
            outcomes,
            vec![MoveOutcome::Grow {
                new_head: Position { x: 3, y: 2 },
                food_index: 0,
            }]
        );
    }

    #[test]
    fn rightmost_column_move_right_hits_the_wall() {
        let outcomes = resolve_tick(grid5(), &[], &[view(&[(4, 2)], Direction::Right)]);
        assert_eq!(
            outcomes,
            vec![MoveOutcome::Die {
                cause: DeathCause::Wall
            }]
        );
    }

    #[test]
    fn head_into_own_body_is_self_collision() {
        // U-shaped body; moving Up lands on the last segment.
        let snake = view(&[(2, 2), (1, 2), (1, 1), (2, 1)], Direction::Up);
        let outcomes = resolve_tick(grid5(), &[], &[snake]);
        assert_eq!(
            outcomes,
            vec![MoveOutcome::Die {
                cause: DeathCause::SelfCollision
            }]
        );
    }

    #[test]
    fn head_into_other_body_is_snake_collision() {
        let mover = view(&[(2, 2)], Direction::Right);
        let blocker = view(&[(3, 2), (3, 1)], Direction::Down);
        let outcomes = resolve_tick(grid5(), &[], &[mover, blocker]);
        assert_eq!(
            outcomes[0],
            MoveOutcome::Die {
                cause: DeathCause::SnakeCollision
            }
        );
        assert_eq!(
            outcomes[1],
            MoveOutcome::Move {
                new_head: Position { x: 3, y: 3 }
            }
        );
    }

    #[test]
    fn head_on_collision_kills_both() {
        let left = view(&[(1, 2)], Direction::Right);
        let right = view(&[(3, 2)], Direction::Left);
        let outcomes = resolve_tick(grid5(), &[], &[left, right]);
        assert_eq!(
            outcomes,
            vec![
                MoveOutcome::Die {
                    cause: DeathCause::HeadOn
                },
                MoveOutcome::Die {
                    cause: DeathCause::HeadOn
                },
            ]
        );
    }

    #[test]
    fn head_on_over_food_still_kills_both() {
        let foods = vec![Position { x: 2, y: 2 }];
        let left = view(&[(1, 2)], Direction::Right);
        let right = view(&[(3, 2)], Direction::Left);
        let outcomes = resolve_tick(grid5(), &foods, &[left, right]);
        assert!(outcomes
            .iter()
            .all(|outcome| matches!(outcome, MoveOutcome::Die { .. })));
    }

    #[test]
    fn vacated_tail_cell_still_counts_this_tick() {
        // The blocker's tail will move away, but resolution uses start-of-tick
        // positions, so entering it is still fatal.
        let mover = view(&[(2, 2)], Direction::Right);
        let blocker = view(&[(4, 2), (3, 2)], Direction::Right);
        let outcomes = resolve_tick(grid5(), &[], &[mover, blocker]);
        assert_eq!(
            outcomes[0],
            MoveOutcome::Die {
                cause: DeathCause::SnakeCollision
            }
        );
    }

    #[test]
    fn spawn_food_avoids_blocked_cells() {
        let grid = grid5();
        let mut rng = StdRng::seed_from_u64(42);
        let mut blocked: HashSet<Position> = grid.cells().collect();
        let free = Position { x: 1, y: 3 };
        blocked.remove(&free);
        assert_eq!(spawn_food(grid, &blocked, &mut rng), Some(free));
    }

    #[test]
    fn spawn_food_returns_none_on_full_grid() {
        let grid = grid5();
        let mut rng = StdRng::seed_from_u64(42);
        let blocked: HashSet<Position> = grid.cells().collect();
        assert_eq!(spawn_food(grid, &blocked, &mut rng), None);
    }

    #[test]
    fn spawn_snake_respects_margin_and_clearance() {
        let grid = Grid {
            width: 20,
            height: 20,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let occupied: HashSet<Position> = vec![Position { x: 10, y: 10 }].into_iter().collect();
        let snake = spawn_snake(grid, &occupied, &mut rng).expect("spawn");
        assert_eq!(snake.body.len(), STARTING_LENGTH);
        for segment in &snake.body {
            assert!(grid.contains(*segment));
            assert!(segment.x >= SPAWN_MARGIN - (STARTING_LENGTH as i32 - 1));
            assert!(
                segment.chebyshev_distance(Position { x: 10, y: 10 }) >= SPAWN_CLEARANCE,
                "segment {segment:?} too close to the occupied cell"
            );
        }
    }

    #[test]
    fn spawn_snake_falls_back_on_small_grids() {
        let grid = grid5();
        let mut rng = StdRng::seed_from_u64(3);
        let snake = spawn_snake(grid, &HashSet::new(), &mut rng).expect("spawn");
        assert!(snake.body.iter().all(|segment| grid.contains(*segment)));
    }

    #[test]
    fn spawn_snake_returns_none_when_nothing_fits() {
        let grid = grid5();
        let mut rng = StdRng::seed_from_u64(3);
        let occupied: HashSet<Position> = grid.cells().collect();
        assert!(spawn_snake(grid, &occupied, &mut rng).is_none());
    }
}
