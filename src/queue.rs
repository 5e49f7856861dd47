use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

/// Ordered bookkeeping of the containers currently registered for display on
/// the shared surface. Registration order is arrival order; rendering itself
/// is the surface's concern.
#[derive(Debug, Default)]
pub struct Queue {
    entries: Mutex<Vec<Uuid>>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a container to the tail of the queue.
    pub fn register(&self, id: Uuid) {
        self.entries().push(id);
    }

    /// Drop a container from the queue. Called from the handle's dismissal
    /// path once the exit transition has completed; unknown ids are ignored.
    pub fn release(&self, id: Uuid) {
        let mut entries = self.entries();
        if let Some(pos) = entries.iter().position(|entry| *entry == id) {
            entries.remove(pos);
        }
    }

    pub fn is_shown(&self, id: Uuid) -> bool {
        self.entries().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<Uuid>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::Queue;
    use uuid::Uuid;

    #[test]
    fn register_keeps_arrival_order() {
        let queue = Queue::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        queue.register(first);
        queue.register(second);
        assert_eq!(queue.len(), 2);
        assert!(queue.is_shown(first));
        assert!(queue.is_shown(second));
    }

    #[test]
    fn release_is_tolerant_of_unknown_ids() {
        let queue = Queue::new();
        let id = Uuid::new_v4();
        queue.register(id);
        queue.release(Uuid::new_v4());
        assert_eq!(queue.len(), 1);
        queue.release(id);
        assert!(queue.is_empty());
        assert!(!queue.is_shown(id));
    }
}
