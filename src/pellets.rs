use std::collections::BTreeMap;

use crate::maze::GridPos;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PelletKind {
    Power,
    Score,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Consumable {
    pub pos: GridPos,
    pub value: u32,
    pub kind: PelletKind,
}

/// The pellets of one kind still on the board, keyed by tile.
///
/// A tile holds at most one pellet, and a pellet once taken is gone for good.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pellets {
    kind: PelletKind,
    items: BTreeMap<GridPos, Consumable>,
}

impl Pellets {
    #[must_use]
    pub const fn new(kind: PelletKind) -> Self {
        Self {
            kind,
            items: BTreeMap::new(),
        }
    }

    /// Places a pellet on `pos`, replacing whatever was there.
    pub fn place(&mut self, pos: GridPos, value: u32) {
        let kind = self.kind;
        self.items.insert(pos, Consumable { pos, value, kind });
    }

    pub fn take(&mut self, pos: GridPos) -> Option<Consumable> {
        self.items.remove(&pos)
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.items.contains_key(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Consumable> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_value(&self) -> u32 {
        self.items.values().map(|pellet| pellet.value).sum()
    }
}
