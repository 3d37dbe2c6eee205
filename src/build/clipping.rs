use std::ops::Range;

/// A base layer and the run of clipping layers directly after it.
///
/// Indices point into the sibling list the group was cut from; the group only lives for
/// one pass over that list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClippingGroup {
    pub base: usize,
    /// Contiguous, starting right after `base`. Empty when nothing clips to the base.
    pub clipped: Range<usize>,
}

impl ClippingGroup {
    pub fn has_clipped(&self) -> bool {
        !self.clipped.is_empty()
    }
}

/// Cut a sibling list into clipping groups, scanning left to right.
///
/// Each non-clipping item starts a group and collects the maximal run of clipping items
/// right after it. A clipping item with no base before it (start of the list, or after
/// another orphan) becomes a group of its own. The groups partition the list in order.
pub fn segment_clipping_groups<T>(
    items: &[T],
    is_clipping: impl Fn(&T) -> bool,
) -> Vec<ClippingGroup> {
    let mut groups = Vec::new();
    let mut i = 0;
    while i < items.len() {
        if is_clipping(&items[i]) {
            groups.push(ClippingGroup {
                base: i,
                clipped: i + 1..i + 1,
            });
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < items.len() && is_clipping(&items[end]) {
            end += 1;
        }
        groups.push(ClippingGroup {
            base: i,
            clipped: i + 1..end,
        });
        i = end;
    }
    groups
}

#[cfg(test)]
#[path = "../../tests/unit/build/clipping.rs"]
mod tests;
