//! A thread-safe FIFO of waiting players.

use crate::player::Player;

use std::collections::VecDeque;
use std::sync::Mutex;

pub struct Queue {
    inner: Mutex<VecDeque<Player>>,
}

impl Queue {
    pub fn new() -> Queue {
        Queue {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Append to the tail.
    pub fn push(&self, player: Player) {
        self.inner.lock().unwrap().push_back(player);
    }

    /// Remove and return the head, oldest first.
    pub fn pop(&self) -> Option<Player> {
        self.inner.lock().unwrap().pop_front()
    }

    /// Unlink the first entry equal to `player`, if any.
    pub fn remove(&self, player: &Player) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(position) = inner.iter().position(|p| p == player) {
            let _ = inner.remove(position);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Queue {
    fn default() -> Queue {
        Queue::new()
    }
}
