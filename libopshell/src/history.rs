//! Location history for the back/forward signal
//!
//! A bounded list of visited locations with a cursor on the current one.
//! Moving back or forward only moves the cursor; the controller then
//! re-derives its transition target from [`History::current`].

/// Visited locations, oldest first
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
    limit: usize,
}

impl History {
    /// Create an empty history keeping at most `limit` entries
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record a newly visited location
    ///
    /// Drops any forward entries. Visiting the current location again is
    /// not recorded twice.
    pub fn push(&mut self, location: impl Into<String>) {
        let location = location.into();
        if self.current() == Some(location.as_str()) {
            return;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(location);
        if self.entries.len() > self.limit {
            let overflow = self.entries.len() - self.limit;
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back; `None` when already at the oldest entry
    pub fn back(&mut self) -> Option<&str> {
        if self.entries.is_empty() || self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    /// Step forward; `None` when already at the newest entry
    pub fn forward(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Overwrite the current entry
    ///
    /// If a neighbouring entry already holds `location`, the current entry is
    /// dropped instead and the cursor lands on that neighbour, so no two
    /// adjacent entries are ever the same.
    pub fn replace_current(&mut self, location: impl Into<String>) {
        let location = location.into();
        if self.entries.is_empty() {
            self.push(location);
            return;
        }

        let before = self.cursor.checked_sub(1).and_then(|i| self.entries.get(i));
        if before == Some(&location) {
            self.entries.remove(self.cursor);
            self.cursor -= 1;
            if self.entries.get(self.cursor + 1) == Some(&location) {
                self.entries.remove(self.cursor + 1);
            }
        } else if self.entries.get(self.cursor + 1) == Some(&location) {
            self.entries.remove(self.cursor);
        } else if let Some(entry) = self.entries.get_mut(self.cursor) {
            *entry = location;
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}
