use ai_core::{EntranceId, InteractableId, ItemId, Vec3};

/// What a held item can do, used to pick the state hook that handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemCapability {
    Weapon,
    Light,
    Key,
    Scrap,
    Utility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeldItem {
    pub id: ItemId,
    pub name: String,
    pub capability: ItemCapability,
}

impl HeldItem {
    pub fn new(id: u64, name: impl Into<String>, capability: ItemCapability) -> Self {
        Self {
            id: ItemId(id),
            name: name.into(),
            capability,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemUse {
    Ignored,
    Used,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractableKind {
    Item(ItemId),
    Door(EntranceId),
    Terminal,
    Switch,
}

/// Something in the level a state is walking up to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interactable {
    pub id: InteractableId,
    pub kind: InteractableKind,
    pub position: Vec3,
}
