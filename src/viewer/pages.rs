/// Pages kept mounted around `current`: `[current - half, current + half]`
/// clipped to `[1, total]`.
pub fn page_window(current: u32, half: u32, total: u32) -> Vec<u32> {
    if total == 0 {
        return Vec::new();
    }
    let start = current.saturating_sub(half).max(1);
    let end = current.saturating_add(half).min(total);
    if start > end {
        return Vec::new();
    }
    (start..=end).collect()
}

/// Current page within the loaded document. Navigation never leaves `1..=total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    current: u32,
    total: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            current: 1,
            total: 0,
        }
    }
}

impl PageCursor {
    /// Starts at page 1 of a freshly loaded document.
    pub fn reset(total: u32) -> Self {
        Self { current: 1, total }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn can_next(&self) -> bool {
        self.current < self.total
    }

    pub fn can_previous(&self) -> bool {
        self.current > 1
    }

    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if !self.can_previous() {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn window(&self, half: u32) -> Vec<u32> {
        page_window(self.current, half, self.total)
    }

    pub fn label(&self) -> String {
        format!("{} / {}", self.current, self.total)
    }
}
