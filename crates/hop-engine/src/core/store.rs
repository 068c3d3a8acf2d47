use crate::api::types::ObjectId;
use crate::components::object::GameObject;

/// Flat object storage with deferred add/remove queues.
/// Designed for small-to-medium object counts (hundreds, not millions).
///
/// Adds and removals requested mid-frame are queued and only applied by
/// `drain_pending`, so iteration over the live list is never invalidated.
pub struct ObjectStore {
    objects: Vec<GameObject>,
    pending_add: Vec<GameObject>,
    pending_remove: Vec<ObjectId>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
        }
    }

    /// Queue an object; it becomes live on the next drain.
    pub fn enqueue_add(&mut self, object: GameObject) {
        self.pending_add.push(object);
    }

    /// Queue a removal by id; applied on the next drain.
    pub fn enqueue_remove(&mut self, id: ObjectId) {
        if !self.pending_remove.contains(&id) {
            self.pending_remove.push(id);
        }
    }

    /// Apply queued removals, then queued adds. Returns (added, removed).
    /// Live order is preserved so paint order within a layer stays stable.
    pub fn drain_pending(&mut self) -> (usize, usize) {
        let mut removed = 0;
        if !self.pending_remove.is_empty() {
            let before = self.objects.len();
            let doomed = std::mem::take(&mut self.pending_remove);
            self.objects.retain(|o| !doomed.contains(&o.id));
            // Removing something still queued cancels the add.
            self.pending_add.retain(|o| !doomed.contains(&o.id));
            removed = before - self.objects.len();
        }
        let added = self.pending_add.len();
        self.objects.append(&mut self.pending_add);
        (added, removed)
    }

    /// Drop every object flagged destroyed, returning them.
    pub fn sweep_destroyed(&mut self) -> Vec<GameObject> {
        if !self.objects.iter().any(|o| o.destroyed) {
            return Vec::new();
        }
        let (dead, live): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.objects).into_iter().partition(|o| o.destroyed);
        self.objects = live;
        dead
    }

    /// Keep only objects matching `keep`, including queued ones.
    pub fn retain(&mut self, mut keep: impl FnMut(&GameObject) -> bool) {
        self.objects.retain(&mut keep);
        self.pending_add.retain(&mut keep);
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Look up an object that is live or still queued for addition.
    pub fn get_any_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        let in_live = self.objects.iter().any(|o| o.id == id);
        if in_live {
            self.get_mut(id)
        } else {
            self.pending_add.iter_mut().find(|o| o.id == id)
        }
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.iter_mut()
    }

    pub fn as_slice(&self) -> &[GameObject] {
        &self.objects
    }

    pub fn as_mut_slice(&mut self) -> &mut [GameObject] {
        &mut self.objects
    }

    pub fn pending(&self) -> impl Iterator<Item = &GameObject> {
        self.pending_add.iter()
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.has_tag(tag))
    }

    pub fn find_all_by_tag(&self, tag: &str) -> Vec<&GameObject> {
        self.objects.iter().filter(|o| o.has_tag(tag)).collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending_add.len()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.pending_add.clear();
        self.pending_remove.clear();
    }
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Two distinct mutable elements of a slice. `i` and `j` must differ.
pub fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> Option<(&mut T, &mut T)> {
    if i == j || i >= items.len() || j >= items.len() {
        return None;
    }
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        Some((&mut head[i], &mut tail[0]))
    } else {
        let (head, tail) = items.split_at_mut(i);
        Some((&mut tail[0], &mut head[j]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn obj(id: u32) -> GameObject {
        let mut o = GameObject::new(format!("obj{id}"));
        o.id = ObjectId(id);
        o
    }

    #[test]
    fn adds_are_deferred_until_drain() {
        let mut store = ObjectStore::new();
        store.enqueue_add(obj(1).with_pos(Vec2::new(10.0, 20.0)));
        assert!(store.get(ObjectId(1)).is_none());
        assert_eq!(store.pending_len(), 1);

        assert_eq!(store.drain_pending(), (1, 0));
        assert_eq!(store.get(ObjectId(1)).map(|o| o.body.position), Some(Vec2::new(10.0, 20.0)));
    }

    #[test]
    fn removals_keep_order() {
        let mut store = ObjectStore::new();
        for id in 1..=4 {
            store.enqueue_add(obj(id));
        }
        store.drain_pending();
        store.enqueue_remove(ObjectId(2));
        store.enqueue_remove(ObjectId(2));
        assert_eq!(store.drain_pending(), (0, 1));
        let ids: Vec<u32> = store.iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn sweep_returns_destroyed() {
        let mut store = ObjectStore::new();
        store.enqueue_add(obj(1));
        store.enqueue_add(obj(2).with_tag("enemy"));
        store.drain_pending();
        store.get_mut(ObjectId(2)).map(|o| o.destroy());
        let dead = store.sweep_destroyed();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, ObjectId(2));
        assert!(store.find_by_tag("enemy").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn pair_mut_handles_both_orders() {
        let mut v = vec![1, 2, 3];
        if let Some((a, b)) = pair_mut(&mut v, 2, 0) {
            std::mem::swap(a, b);
        }
        assert_eq!(v, vec![3, 2, 1]);
        assert!(pair_mut(&mut v, 1, 1).is_none());
        assert!(pair_mut(&mut v, 1, 9).is_none());
    }
}
