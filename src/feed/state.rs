use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub item: FeedItem,
    pub index: usize,
    pub len: usize,
    pub visible: bool,
}

/// Items loaded once from the feed plus the rotation cursor.
#[derive(Debug, Clone)]
pub struct FeedState {
    items: Vec<FeedItem>,
    current_index: usize,
    visible: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_index: 0,
            visible: true,
        }
    }
}

impl FeedState {
    /// Build a state from fetched items. Image-less items never get in.
    pub fn with_items(items: Vec<FeedItem>) -> Self {
        Self {
            items: items
                .into_iter()
                .filter(|item| !item.image_url.is_empty())
                .collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Move to the next item (wrapping) and show it.
    pub fn advance(&mut self) {
        if !self.items.is_empty() {
            self.current_index = (self.current_index + 1) % self.items.len();
        }
        self.visible = true;
    }

    pub fn snapshot(&self) -> Option<FeedSnapshot> {
        self.items.get(self.current_index).map(|item| FeedSnapshot {
            item: item.clone(),
            index: self.current_index,
            len: self.items.len(),
            visible: self.visible,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize, image: &str) -> FeedItem {
        FeedItem {
            title: format!("story {n}"),
            link: format!("https://example.com/{n}"),
            image_url: image.to_string(),
        }
    }

    #[test]
    fn with_items_drops_imageless_items() {
        let state = FeedState::with_items(vec![item(1, "a.jpg"), item(2, ""), item(3, "c.jpg")]);
        let titles: Vec<_> = state.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["story 1", "story 3"]);
    }

    #[test]
    fn advance_wraps() {
        let mut state = FeedState::with_items(vec![item(1, "a.jpg"), item(2, "b.jpg")]);
        state.hide();
        assert!(!state.is_visible());
        state.advance();
        assert_eq!(state.current_index(), 1);
        assert!(state.is_visible());
        state.advance();
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn empty_state_has_no_snapshot() {
        let mut state = FeedState::default();
        state.advance();
        assert_eq!(state.current_index(), 0);
        assert!(state.snapshot().is_none());
    }
}
