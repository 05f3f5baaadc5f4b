use ndarray::{s, ArrayView1};
use rand::Rng;

use crate::matrix::Matrix;

/// One stored transition, borrowed from the replay memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<'a> {
    pub state: ArrayView1<'a, f64>,
    pub action: ArrayView1<'a, f64>,
    pub reward: f64,
    pub next_state: ArrayView1<'a, f64>,
    pub terminal: bool,
}

/// Fixed-capacity ring buffer of transitions stored as rows of one matrix.
///
/// Row layout: `[state | action | reward | next_state | terminal]`, with the
/// terminal flag stored as `1.0` or `0.0`. Once full, each write replaces the
/// oldest row.
#[derive(Clone, Debug)]
pub struct ReplayMemory {
    memory: Matrix,
    state_size: usize,
    action_size: usize,
    memory_idx: usize,
    memory_used: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize, state_size: usize, action_size: usize) -> Self {
        ReplayMemory {
            memory: Matrix::new(capacity, 2 * state_size + action_size + 2),
            state_size,
            action_size,
            memory_idx: 0,
            memory_used: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.memory.rows()
    }

    /// Number of stored transitions, at most [`capacity`](ReplayMemory::capacity).
    pub fn len(&self) -> usize {
        self.memory_used
    }

    pub fn is_empty(&self) -> bool {
        self.memory_used == 0
    }

    /// Row that the next [`push`](ReplayMemory::push) writes to.
    pub fn write_index(&self) -> usize {
        self.memory_idx
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    pub fn matrix(&self) -> &Matrix {
        &self.memory
    }

    pub fn action_offset(&self) -> usize {
        self.state_size
    }

    pub fn reward_offset(&self) -> usize {
        self.state_size + self.action_size
    }

    pub fn next_state_offset(&self) -> usize {
        self.state_size + self.action_size + 1
    }

    pub fn terminal_offset(&self) -> usize {
        2 * self.state_size + self.action_size + 1
    }

    /// Store a transition at the write index and advance it.
    pub fn push(
        &mut self,
        state: &[f64],
        action: &[f64],
        reward: f64,
        next_state: &[f64],
        terminal: bool,
    ) {
        debug_assert_eq!(state.len(), self.state_size);
        debug_assert_eq!(action.len(), self.action_size);
        debug_assert_eq!(next_state.len(), self.state_size);

        let row = self.memory_idx;
        let (action_offset, reward_offset) = (self.action_offset(), self.reward_offset());
        let (next_offset, terminal_offset) = (self.next_state_offset(), self.terminal_offset());

        self.memory.set_row_segment(row, 0, state);
        self.memory.set_row_segment(row, action_offset, action);
        self.memory.set(row, reward_offset, reward);
        self.memory.set_row_segment(row, next_offset, next_state);
        self.memory.set(row, terminal_offset, if terminal { 1.0 } else { 0.0 });

        self.memory_idx = (self.memory_idx + 1) % self.capacity();
        if self.memory_used < self.capacity() {
            self.memory_used += 1;
        }
    }

    /// Fill `indices` with rows drawn uniformly, with replacement, from the
    /// stored range. The memory must not be empty.
    pub fn sample_indices<R: Rng + ?Sized>(&self, rng: &mut R, indices: &mut [usize]) {
        debug_assert!(self.memory_used > 0);
        let last = self.memory_used - 1;
        for index in indices.iter_mut() {
            *index = rng.gen_range(0..=last);
        }
    }

    pub fn state(&self, row: usize) -> ArrayView1<'_, f64> {
        self.memory.row(row).slice_move(s![..self.state_size])
    }

    pub fn action(&self, row: usize) -> ArrayView1<'_, f64> {
        let start = self.action_offset();
        self.memory.row(row).slice_move(s![start..start + self.action_size])
    }

    pub fn reward(&self, row: usize) -> f64 {
        self.memory.get(row, self.reward_offset())
    }

    pub fn next_state(&self, row: usize) -> ArrayView1<'_, f64> {
        let start = self.next_state_offset();
        self.memory.row(row).slice_move(s![start..start + self.state_size])
    }

    pub fn terminal(&self, row: usize) -> bool {
        self.memory.get(row, self.terminal_offset()) > 0.0
    }

    pub fn transition(&self, row: usize) -> Transition<'_> {
        Transition {
            state: self.state(row),
            action: self.action(row),
            reward: self.reward(row),
            next_state: self.next_state(row),
            terminal: self.terminal(row),
        }
    }

    /// Stored transitions, oldest first.
    pub fn iter_chronological(&self) -> impl Iterator<Item = Transition<'_>> + '_ {
        let start = if self.memory_used < self.capacity() {
            0
        } else {
            self.memory_idx
        };
        let capacity = self.capacity();
        (0..self.memory_used).map(move |k| self.transition((start + k) % capacity))
    }

    /// Forget every stored transition. Storage is kept.
    pub fn clear(&mut self) {
        self.memory.clear();
        self.memory_idx = 0;
        self.memory_used = 0;
    }
}
