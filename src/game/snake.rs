use super::grid::{Direction, Position};

#[derive(Debug, Clone)]
pub struct Snake {
    pub body: Vec<Position>,
    pub direction: Direction,
    pub alive: bool,
}

impl Snake {
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let tail_direction = direction.opposite();
        let mut body = Vec::with_capacity(length.max(1));
        let mut segment = head;
        for _ in 0..length.max(1) {
            body.push(segment);
            segment = segment.step(tail_direction);
        }
        Snake {
            body,
            direction,
            alive: true,
        }
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn candidate_head(&self) -> Position {
        self.head().step(self.direction)
    }

    // A reversal would fold the snake onto its own neck, so it is ignored.
    pub fn turn(&mut self, direction: Direction) {
        if direction.reverses(self.direction) {
            return;
        }
        self.direction = direction;
    }

    pub fn advance(&mut self, new_head: Position, grow: bool) {
        self.body.insert(0, new_head);
        if !grow {
            self.body.pop();
        }
    }
}
