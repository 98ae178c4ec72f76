//! Nesting-depth styling
//!
//! Editors tint each nesting level so sibling groups stay readable. The
//! palette cycles; level zero is unstyled.

/// CSS classes per nesting level
pub const GROUP_STYLES: [&str; 5] = [
    "",
    "list-group-item-info",
    "list-group-item-success",
    "list-group-item-warning",
    "list-group-item-danger",
];

/// Style class for a nesting level
pub fn color_for(level: usize) -> &'static str {
    GROUP_STYLES[level % GROUP_STYLES.len()]
}

/// Level at which a node drawn at `depth` is tinted; groups sit one deeper
pub fn chooser_level(depth: usize, is_group: bool) -> usize {
    if is_group { depth + 1 } else { depth }
}

/// Level of the action row inside a group drawn at `depth`
pub fn group_actions_level(depth: usize) -> usize {
    depth + 1
}
