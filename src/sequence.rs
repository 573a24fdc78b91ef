/// An ordered set of display items the control value interpolates across.
///
/// The sequence owns its items exclusively; replacing or resetting it drops
/// the superseded items exactly once, which is what releases their GPU
/// textures (raylib unloads a `Texture2D` on drop).
pub struct MediaSequence<T> {
    items: Vec<T>,
    custom: bool,
}

impl<T> MediaSequence<T> {
    /// Build the initial (default) sequence.
    pub fn new(items: Vec<T>) -> Self {
        Self { items, custom: false }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// True once the user has supplied their own sequence.
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Replace the whole sequence with user-supplied items. Fewer than 2
    /// items leave the current sequence untouched and return false.
    pub fn replace(&mut self, items: Vec<T>) -> bool {
        if items.len() < 2 {
            return false;
        }
        self.items = items;
        self.custom = true;
        true
    }

    /// Restore the default sequence, releasing a custom one.
    pub fn reset(&mut self, defaults: Vec<T>) {
        self.items = defaults;
        self.custom = false;
    }
}
