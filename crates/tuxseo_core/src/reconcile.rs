//! List reconciler: sorts, filters and moves rendered items in place.
//!
//! Items are handles carrying declarative string attributes (the equivalent of
//! `data-*` attributes). Filtering hides, never removes, so a cleared filter
//! recovers the original set in its original order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::GroupId;

pub type ItemKey = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    key: ItemKey,
    attributes: BTreeMap<String, String>,
    hidden: bool,
}

impl ListItem {
    pub fn new(key: ItemKey) -> Self {
        Self {
            key,
            attributes: BTreeMap::new(),
            hidden: false,
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn key(&self) -> ItemKey {
        self.key
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Case-insensitive lexicographic.
    Text,
    /// Integer or decimal, thousands separators allowed.
    Numeric,
    /// RFC 3339 timestamp, `YYYY-MM-DD HH:MM:SS` or a bare date.
    Chronological,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub attribute: String,
    pub kind: KeyKind,
}

impl SortKey {
    pub fn new(attribute: &str, kind: KeyKind) -> Self {
        Self {
            attribute: attribute.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Text(String),
    Number(f64),
    Instant(i64),
}

impl SortValue {
    fn extract(item: &ListItem, key: &SortKey) -> Option<Self> {
        let raw = item.attr(&key.attribute)?.trim();
        if raw.is_empty() {
            return None;
        }
        match key.kind {
            KeyKind::Text => Some(SortValue::Text(raw.to_lowercase())),
            KeyKind::Numeric => raw.replace(',', "").parse::<f64>().ok().map(SortValue::Number),
            KeyKind::Chronological => parse_instant(raw).map(SortValue::Instant),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Instant(a), SortValue::Instant(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

fn parse_instant(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemList {
    items: Vec<ListItem>,
}

impl ItemList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<ListItem>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: ListItem) {
        self.items.push(item);
    }

    pub fn remove(&mut self, key: ItemKey) -> Option<ListItem> {
        let index = self.items.iter().position(|item| item.key == key)?;
        Some(self.items.remove(index))
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.items.iter().any(|item| item.key == key)
    }

    pub fn get_mut(&mut self, key: ItemKey) -> Option<&mut ListItem> {
        self.items.iter_mut().find(|item| item.key == key)
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn keys(&self) -> Vec<ItemKey> {
        self.items.iter().map(ListItem::key).collect()
    }

    pub fn visible(&self) -> impl Iterator<Item = &ListItem> {
        self.items.iter().filter(|item| !item.hidden)
    }

    pub fn visible_keys(&self) -> Vec<ItemKey> {
        self.visible().map(ListItem::key).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stable sort; items missing the attribute go last in either direction.
    pub fn sort(&mut self, key: &SortKey, direction: Direction) {
        let mut keyed: Vec<(Option<SortValue>, ListItem)> = self
            .items
            .drain(..)
            .map(|item| (SortValue::extract(&item, key), item))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => match direction {
                Direction::Ascending => a.compare(b),
                Direction::Descending => b.compare(a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        self.items = keyed.into_iter().map(|(_, item)| item).collect();
    }

    /// Hides every item the predicate rejects. Returns the visible count.
    pub fn filter<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&ListItem) -> bool,
    {
        let mut visible = 0;
        for item in &mut self.items {
            item.hidden = !predicate(item);
            if !item.hidden {
                visible += 1;
            }
        }
        visible
    }

    /// Case-insensitive substring filter on one attribute; blank query shows all.
    ///
    /// Items without the attribute stay visible.
    pub fn filter_text(&mut self, attribute: &str, query: &str) -> usize {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            self.clear_filter();
            return self.items.len();
        }
        self.filter(|item| match item.attr(attribute) {
            Some(value) => value.trim().to_lowercase().contains(&needle),
            None => true,
        })
    }

    pub fn clear_filter(&mut self) {
        for item in &mut self.items {
            item.hidden = false;
        }
    }
}

/// Broadcast asking an item to relocate to the group named `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEvent {
    pub item: ListItem,
    pub destination: GroupId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGroup {
    id: GroupId,
    list: ItemList,
}

impl ItemGroup {
    pub fn new(id: GroupId) -> Self {
        Self {
            id,
            list: ItemList::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn list(&self) -> &ItemList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ItemList {
        &mut self.list
    }

    /// Takes the item only when the event is addressed to this group.
    pub fn accept(&mut self, event: &MoveEvent) -> bool {
        if event.destination != self.id || self.list.contains(event.item.key) {
            return false;
        }
        let mut item = event.item.clone();
        item.hidden = false;
        self.list.push(item);
        true
    }
}

/// Set of group owners subscribed to move broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBoard {
    groups: Vec<ItemGroup>,
}

impl Default for GroupBoard {
    fn default() -> Self {
        Self::new(&GroupId::ALL)
    }
}

impl GroupBoard {
    pub fn new(ids: &[GroupId]) -> Self {
        Self {
            groups: ids.iter().copied().map(ItemGroup::new).collect(),
        }
    }

    pub fn group(&self, id: GroupId) -> Option<&ItemGroup> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut ItemGroup> {
        self.groups.iter_mut().find(|group| group.id == id)
    }

    pub fn groups(&self) -> &[ItemGroup] {
        &self.groups
    }

    pub fn locate(&self, key: ItemKey) -> Option<GroupId> {
        self.groups
            .iter()
            .find(|group| group.list.contains(key))
            .map(|group| group.id)
    }

    pub fn get_mut(&mut self, key: ItemKey) -> Option<&mut ListItem> {
        self.groups
            .iter_mut()
            .find_map(|group| group.list.get_mut(key))
    }

    /// Delivers the event to every group. The addressed group appends the item,
    /// every other group drops its copy. Returns how many groups accepted.
    pub fn broadcast(&mut self, event: &MoveEvent) -> usize {
        let mut accepted = 0;
        for group in &mut self.groups {
            if group.accept(event) {
                accepted += 1;
            } else if group.id != event.destination {
                group.list.remove(event.item.key);
            }
        }
        accepted
    }

    /// Moves a known item to `destination`. Returns false if the item is unknown.
    pub fn move_item(&mut self, key: ItemKey, destination: GroupId) -> bool {
        let Some(item) = self
            .groups
            .iter()
            .find_map(|group| group.list.items().iter().find(|item| item.key == key))
            .cloned()
        else {
            return false;
        };
        self.broadcast(&MoveEvent { item, destination });
        true
    }
}
