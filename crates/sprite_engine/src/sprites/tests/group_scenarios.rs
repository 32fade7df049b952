//! Drawing and cloning sprite groups built in code

use std::rc::Rc;

use crate::foundation::math::{Rect, Vec3};
use crate::render::{BatchCommand, RecordingRenderer, Texture};
use crate::scene::{NodeCloneContext, Scene};
use crate::sprites::{
    share, AnimationProperty, AnimationValue, CellSprite, CellType, Drawable, SharedDrawable, Sprite, SpriteGroup,
    SpriteGroups, TileSheet, TileSheets,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// One strip of three 16x16 frames on a 48x16 texture
    fn strip_sheet(sheets: &TileSheets) -> Rc<TileSheet> {
        let sheet = sheets.create("tiles", Texture::new("tiles.png", 48, 16, false), 0, None);
        let strip = sheet.add_strip("walk", 3);
        for frame in 0..3 {
            sheet.set_strip_frame(strip, frame, Rect::new(frame as f32 * 16.0, 0.0, 16.0, 16.0));
        }
        sheet
    }

    fn cell_child(group: &SpriteGroup, x: u32, y: u32) -> SharedDrawable {
        match group.get_sprite(x, y) {
            Some(CellSprite::Child(child)) => child,
            other => panic!("cell ({x}, {y}) is not a child: {other:?}"),
        }
    }

    #[test]
    fn test_two_by_two_group_draw() {
        let sheets = TileSheets::new();
        let sheet = strip_sheet(&sheets);

        let mut group = SpriteGroup::create("board", 2, 2, &sheet);
        group.sprite_mut().set_size(16.0, 16.0);
        group.sprite_mut().set_default_tile(Rect::new(32.0, 0.0, 16.0, 16.0));
        group.set_gap(0.0, 0.0);

        let child = share(Sprite::create("piece", &sheet));
        child.borrow_mut().set_animation_property_value(
            AnimationProperty::FrameIndex,
            &AnimationValue::from_floats(&[0.0, 1.0]),
            1.0,
        );
        assert!(group.set_sprite(0, 0, Some(&(child as SharedDrawable))));
        assert!(group.set_sprite(1, 1, None));

        let mut renderer = RecordingRenderer::new();
        let drawn = group.draw(&Scene::new(), &mut renderer, false);

        assert_eq!(drawn, 3);
        assert_eq!(renderer.draw_count(), 3);
        assert!(renderer.commands().iter().all(|c| matches!(c, BatchCommand::Draw(..))));

        let quads: Vec<_> = renderer.draws().map(|(_, quad)| *quad).collect();
        assert_eq!(quads[0].position, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(quads[0].source, Rect::new(16.0, 0.0, 16.0, 16.0));
        assert_eq!(quads[1].position, Vec3::new(0.0, 16.0, 0.0));
        assert_eq!(quads[1].source, Rect::new(32.0, 0.0, 16.0, 16.0));
        assert_eq!(quads[2].position, Vec3::new(16.0, 0.0, 0.0));
        assert_eq!(quads[2].source, Rect::new(32.0, 0.0, 16.0, 16.0));
    }

    #[test]
    fn test_cell_states_are_exclusive() {
        let sheets = TileSheets::new();
        let sheet = strip_sheet(&sheets);
        let mut group = SpriteGroup::create("board", 3, 4, &sheet);
        let child: SharedDrawable = share(Sprite::create("piece", &sheet));

        for x in 0..3 {
            for y in 0..4 {
                match (x + y) % 3 {
                    0 => assert!(group.set_sprite(x, y, Some(&child))),
                    1 => assert!(group.set_sprite(x, y, None)),
                    _ => assert!(group.set_sprite_type(x, y, CellType::Default)),
                }
            }
        }

        for x in 0..3 {
            for y in 0..4 {
                let expected = match (x + y) % 3 {
                    0 => CellType::Child,
                    1 => CellType::Transparent,
                    _ => CellType::Default,
                };
                assert_eq!(group.sprite_type(x, y), Some(expected), "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_clone_reuses_sprite_on_cloned_node() {
        let sheets = TileSheets::new();
        let sheet = strip_sheet(&sheets);
        let registry = SpriteGroups::new();

        let mut scene = Scene::new();
        let board_node = scene.create_node("board");
        let piece_node = scene.create_node("piece");
        scene.add_child(board_node, piece_node);

        let piece: SharedDrawable = share(Sprite::create("piece", &sheet));
        scene.set_drawable(piece_node, Some(Rc::clone(&piece)));

        let mut group = SpriteGroup::create("board", 2, 1, &sheet);
        group.set_sprite(0, 0, Some(&piece));
        group.set_sprite(1, 0, Some(&piece));
        let board = registry.register(group, None);
        scene.set_drawable(board_node, Some(board.clone()));

        let mut context = NodeCloneContext::new();
        let board_copy = scene.clone_node(board_node, &mut context).unwrap();
        let piece_copy = context.find_cloned_node(piece_node).unwrap();

        let cloned_board = scene.node(board_copy).and_then(|n| n.drawable().cloned()).unwrap();
        let cloned_piece = scene.node(piece_copy).and_then(|n| n.drawable().cloned()).unwrap();
        assert!(!Rc::ptr_eq(&cloned_piece, &piece));
        assert_eq!(cloned_piece.borrow().sprite().node(), Some(piece_copy));

        let cloned_board = cloned_board.borrow();
        let cloned_group = cloned_board.as_group().unwrap();
        assert!(Rc::ptr_eq(&cell_child(cloned_group, 0, 0), &cloned_piece));
        assert!(Rc::ptr_eq(&cell_child(cloned_group, 1, 0), &cloned_piece));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clone_after_node_copy_uses_attached_drawable() {
        let sheets = TileSheets::new();
        let sheet = strip_sheet(&sheets);

        let mut scene = Scene::new();
        let piece_node = scene.create_node("piece");
        let piece: SharedDrawable = share(Sprite::create("piece", &sheet));
        scene.set_drawable(piece_node, Some(Rc::clone(&piece)));

        let mut context = NodeCloneContext::new();
        let piece_copy = scene.clone_node(piece_node, &mut context).unwrap();

        let mut group = SpriteGroup::create("board", 1, 2, &sheet);
        group.set_sprite(0, 1, Some(&piece));
        group.set_sprite_type(0, 0, CellType::Transparent);

        let copy = group.clone_with(&mut context);
        let attached = scene.node(piece_copy).and_then(|n| n.drawable().cloned()).unwrap();
        assert!(Rc::ptr_eq(&cell_child(&copy, 0, 1), &attached));
        assert_eq!(copy.sprite_type(0, 0), Some(CellType::Transparent));
    }

    #[test]
    fn test_clone_without_nodes_duplicates_children_once() {
        let sheets = TileSheets::new();
        let sheet = strip_sheet(&sheets);
        let piece: SharedDrawable = share(Sprite::create("piece", &sheet));

        let mut group = SpriteGroup::create("board", 2, 2, &sheet);
        group.set_gap(3.0, 5.0);
        group.set_frustum_cull(false);
        group.set_sprite(0, 0, Some(&piece));
        group.set_sprite(1, 1, Some(&piece));

        let copy = group.clone_with(&mut NodeCloneContext::new());
        let first = cell_child(&copy, 0, 0);
        assert!(!Rc::ptr_eq(&first, &piece));
        assert!(Rc::ptr_eq(&first, &cell_child(&copy, 1, 1)));
        assert_eq!(copy.gap(), group.gap());
        assert!(!copy.frustum_cull());
        assert_eq!(copy.sprite().node(), None);
    }

    #[test]
    fn test_scene_draw_isolates_each_drawable() {
        let sheets = TileSheets::new();
        let sheet = strip_sheet(&sheets);

        let mut scene = Scene::new();
        let node = scene.create_node("board");
        scene.node_mut(node).unwrap().translation = Vec3::new(10.0, 20.0, 0.0);
        let board = share(SpriteGroup::create("board", 2, 1, &sheet));
        scene.set_drawable(node, Some(board));

        let mut renderer = RecordingRenderer::new();
        assert_eq!(scene.draw(&mut renderer), 2);
        assert_eq!(renderer.commands().first(), Some(&BatchCommand::Start(sheet.batch_id())));
        assert_eq!(renderer.commands().last(), Some(&BatchCommand::Finish(sheet.batch_id())));
        assert_eq!(renderer.draws().next().unwrap().1.position, Vec3::new(10.0, 20.0, 0.0));
    }
}
