//! Linear edit history of committed stores.

use crate::param::store::ParameterStore;

/// Every committed store plus a cursor at the current one.
///
/// Recording after stepping back drops the redo tail. The history is not
/// bounded.
#[derive(Debug, Clone)]
pub(crate) struct EditHistory {
    entries: Vec<ParameterStore>,
    cursor: usize,
}

impl EditHistory {
    pub(crate) fn new(initial: ParameterStore) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    /// Appends `store` after the cursor and moves onto it.
    pub(crate) fn record(&mut self, store: ParameterStore) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(store);
        self.cursor += 1;
    }

    pub(crate) fn peek_back(&self) -> Option<&ParameterStore> {
        self.cursor.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub(crate) fn peek_forward(&self) -> Option<&ParameterStore> {
        self.entries.get(self.cursor + 1)
    }

    /// Moves the cursor one step back. Call only after a successful replay.
    pub(crate) fn step_back(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor one step forward. Call only after a successful replay.
    pub(crate) fn step_forward(&mut self) {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
    }

    pub(crate) fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub(crate) fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
