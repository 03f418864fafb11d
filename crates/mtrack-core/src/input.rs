//! Interaction classes that own a grid per resolution.

use crate::grid::Grid;
use crate::profile::{Group, Key, Node};
use crate::resolution::Resolution;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Mouse buttons tracked for clicks, in the order legacy records stored them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ClickKind {
    Single,
    Double,
}

/// `{Single: {Left, Middle, Right}, Double: {...}}` with a zero grid per button.
pub fn zeroed_click_set(resolution: Resolution) -> Node {
    click_set(|_, _| Node::Grid(Grid::zeros(resolution)))
}

/// `{Left: {}, Middle: {}, Right: {}}`
pub fn empty_button_groups() -> Node {
    Node::Group(
        MouseButton::iter()
            .map(|button| (Key::name(button.to_string()), Node::empty_group()))
            .collect(),
    )
}

/// Builds the six-leaf click hierarchy from a per-leaf constructor.
pub fn click_set(mut leaf: impl FnMut(ClickKind, MouseButton) -> Node) -> Node {
    let mut kinds = Group::new();
    for kind in ClickKind::iter() {
        let buttons: Group = MouseButton::iter()
            .map(|button| (Key::name(button.to_string()), leaf(kind, button)))
            .collect();
        kinds.insert(Key::name(kind.to_string()), Node::Group(buttons));
    }
    Node::Group(kinds)
}
