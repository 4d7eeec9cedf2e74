use std::rc::Rc;

use serde::Serialize;

use jigsnap_core::PiecePath;

use crate::groups::{GroupId, TileId};

/// One tile as the renderer sees it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileView {
    pub id: TileId,
    pub home_row: u32,
    pub home_col: u32,
    pub x: f32,
    pub y: f32,
    pub angle: u16,
    pub locked: bool,
    pub group_id: GroupId,
    pub selected: bool,
    /// False for interior floating tiles while edges-only is on.
    pub visible: bool,
    #[serde(serialize_with = "serialize_outline")]
    pub outline: Rc<PiecePath>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub tiles: Vec<TileView>,
    /// Paint order, back to front.
    pub z_order: Vec<TileId>,
    pub solved: bool,
    pub progress: (usize, usize),
}

impl EngineSnapshot {
    pub fn tile(&self, id: TileId) -> Option<&TileView> {
        self.tiles.get(id)
    }

    pub fn visible_tiles(&self) -> impl Iterator<Item = &TileView> {
        self.z_order
            .iter()
            .filter_map(|id| self.tiles.get(*id))
            .filter(|tile| tile.visible)
    }
}

fn serialize_outline<S>(outline: &Rc<PiecePath>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&outline.to_svg_path())
}

/// Moves `members` to the top of the paint order, keeping their relative order.
pub(crate) fn bring_members_to_front(order: &mut Vec<TileId>, members: &[TileId]) {
    if order.is_empty() || members.is_empty() {
        return;
    }
    let mut keep = Vec::with_capacity(order.len());
    for id in order.iter().copied() {
        if !members.contains(&id) {
            keep.push(id);
        }
    }
    keep.extend_from_slice(members);
    *order = keep;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_move_to_the_back_of_the_list() {
        let mut order = vec![0, 1, 2, 3, 4];
        bring_members_to_front(&mut order, &[3, 1]);
        assert_eq!(order, vec![0, 2, 4, 3, 1]);
    }

    #[test]
    fn empty_inputs_leave_order_alone() {
        let mut order = vec![2, 0, 1];
        bring_members_to_front(&mut order, &[]);
        assert_eq!(order, vec![2, 0, 1]);
    }
}
