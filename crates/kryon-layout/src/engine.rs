// crates/kryon-layout/src/engine.rs
//! The flow layout engine: a two-pass algorithm (post-order intrinsic
//! sizing, then pre-order placement) implementing the element layout byte's
//! exact, non-CSS arithmetic.

use crate::flow::{LayoutAlignment, LayoutDirection, LayoutFlags};
use glam::Vec2;
use std::collections::HashMap;

pub type NodeId = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Edge widths in `[top, right, bottom, left]` order, matching the
/// `EdgeInsets` property-value shape.
pub type EdgeWidths = [f32; 4];

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub flags: LayoutFlags,
    pub explicit_width: Option<f32>,
    pub explicit_height: Option<f32>,
    /// Natural size for leaves with no explicit size (e.g. measured text, an
    /// image's native dimensions). Ignored for containers, whose intrinsic
    /// size is derived from their children during pass one.
    pub intrinsic_size: Vec2,
    pub border: EdgeWidths,
    /// Inside the border, additional inset before children are placed
    /// (spec §4.3 Pass 2: "inside borders, inside padding").
    pub padding: EdgeWidths,
    /// Raw, undecoded position fields from the element header; used only
    /// when the element is absolutely positioned. Multiplied by the
    /// window's scale factor at placement time, not here.
    pub pos_x: f32,
    pub pos_y: f32,
    pub children: Vec<NodeId>,
}

impl LayoutNode {
    /// Dual trigger (spec §9 Open Questions, flagged "suspicious" but kept
    /// for compatibility): absolute positioning kicks in on the layout-byte
    /// bit *or* a nonzero explicit position, whichever fires first.
    pub fn is_absolute(&self) -> bool {
        self.flags.absolute_bit || self.pos_x != 0.0 || self.pos_y != 0.0
    }
}

#[derive(Debug, Default)]
pub struct LayoutTree {
    pub nodes: HashMap<NodeId, LayoutNode>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self { nodes: HashMap::new() }
    }

    pub fn insert(&mut self, id: NodeId, node: LayoutNode) {
        self.nodes.insert(id, node);
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub rects: HashMap<NodeId, Rect>,
}

/// Sizes computed in pass one, keyed by node, reused during placement.
struct SizePass {
    sizes: HashMap<NodeId, Vec2>,
}

pub struct FlowLayoutEngine;

impl FlowLayoutEngine {
    pub fn new() -> Self {
        Self
    }

    /// `scale` is the window's scale factor (spec §4.3): it multiplies Text
    /// and Image intrinsic size (applied by the caller before this pass —
    /// `size_node` only ever sees already-scaled intrinsic sizes) and an
    /// absolute child's position.
    pub fn compute(&self, tree: &LayoutTree, root: NodeId, viewport: Vec2, scale: f32) -> LayoutResult {
        let sizes = self.size_pass(tree, root);
        let mut result = LayoutResult::default();
        let root_size = sizes.sizes.get(&root).copied().unwrap_or(viewport);
        let root_rect = Rect {
            x: 0.0,
            y: 0.0,
            width: tree
                .nodes
                .get(&root)
                .and_then(|n| n.explicit_width)
                .unwrap_or(root_size.x.max(viewport.x)),
            height: tree
                .nodes
                .get(&root)
                .and_then(|n| n.explicit_height)
                .unwrap_or(root_size.y.max(viewport.y)),
        };
        result.rects.insert(root, root_rect);
        self.place_children(tree, &sizes, root, root_rect, scale, &mut result);
        result
    }

    /// Post-order: a container's intrinsic size, when not explicit, is the
    /// sum of children along the main axis and the max along the cross
    /// axis, plus border. Leaves use their measured/natural size.
    fn size_pass(&self, tree: &LayoutTree, root: NodeId) -> SizePass {
        let mut sizes = HashMap::new();
        self.size_node(tree, root, &mut sizes);
        SizePass { sizes }
    }

    fn size_node(&self, tree: &LayoutTree, id: NodeId, sizes: &mut HashMap<NodeId, Vec2>) -> Vec2 {
        let Some(node) = tree.nodes.get(&id) else {
            return Vec2::ZERO;
        };

        if node.children.is_empty() {
            let size = Vec2::new(
                node.explicit_width.unwrap_or(node.intrinsic_size.x),
                node.explicit_height.unwrap_or(node.intrinsic_size.y),
            );
            sizes.insert(id, size);
            return size;
        }

        let row_like = node.flags.direction.is_row_like();
        let (mut main_sum, mut cross_max) = (0.0f32, 0.0f32);
        for &child in &node.children {
            let child_node = match tree.nodes.get(&child) {
                Some(c) => c,
                None => continue,
            };
            let child_size = self.size_node(tree, child, sizes);
            if child_node.is_absolute() {
                continue; // absolute children never contribute to intrinsic flow sizing
            }
            if row_like {
                main_sum += child_size.x;
                cross_max = cross_max.max(child_size.y);
            } else {
                main_sum += child_size.y;
                cross_max = cross_max.max(child_size.x);
            }
        }

        let inset_main = if row_like {
            node.border[1] + node.border[3] + node.padding[1] + node.padding[3]
        } else {
            node.border[0] + node.border[2] + node.padding[0] + node.padding[2]
        };
        let inset_cross = if row_like {
            node.border[0] + node.border[2] + node.padding[0] + node.padding[2]
        } else {
            node.border[1] + node.border[3] + node.padding[1] + node.padding[3]
        };

        let (intrinsic_x, intrinsic_y) = if row_like {
            (main_sum + inset_main, cross_max + inset_cross)
        } else {
            (cross_max + inset_cross, main_sum + inset_main)
        };

        let size = Vec2::new(
            node.explicit_width.unwrap_or(intrinsic_x),
            node.explicit_height.unwrap_or(intrinsic_y),
        );
        sizes.insert(id, size);
        size
    }

    /// Pre-order: place `id`'s children within `parent_rect`, partitioning
    /// absolute children (which ignore the container's flow entirely) from
    /// flow children (placed along the main axis with alignment, wrap and
    /// grow applied), then recurse into each child's own children.
    fn place_children(
        &self,
        tree: &LayoutTree,
        sizes: &SizePass,
        id: NodeId,
        parent_rect: Rect,
        scale: f32,
        result: &mut LayoutResult,
    ) {
        let Some(node) = tree.nodes.get(&id) else {
            return;
        };
        if node.children.is_empty() {
            return;
        }

        let border = clamp_border(node.border, parent_rect.width, parent_rect.height);
        let row_like = node.flags.direction.is_row_like();
        let content = Rect {
            x: parent_rect.x + border[3] + node.padding[3],
            y: parent_rect.y + border[0] + node.padding[0],
            width: (parent_rect.width - border[1] - border[3] - node.padding[1] - node.padding[3]).max(0.0),
            height: (parent_rect.height - border[0] - border[2] - node.padding[0] - node.padding[2]).max(0.0),
        };

        let (flow, absolute): (Vec<NodeId>, Vec<NodeId>) = node
            .children
            .iter()
            .copied()
            .partition(|c| !tree.nodes.get(c).map(LayoutNode::is_absolute).unwrap_or(false));

        self.place_flow_line(tree, sizes, &flow, node.flags, content, row_like, result);

        for child in absolute {
            let Some(child_node) = tree.nodes.get(&child) else { continue };
            let child_size = sizes.sizes.get(&child).copied().unwrap_or_default();
            let rect = Rect {
                x: content.x + child_node.pos_x * scale,
                y: content.y + child_node.pos_y * scale,
                width: child_node.explicit_width.unwrap_or(child_size.x),
                height: child_node.explicit_height.unwrap_or(child_size.y),
            };
            result.rects.insert(child, rect);
            self.place_children(tree, sizes, child, rect, scale, result);
        }

        for &child in &flow {
            if let Some(&rect) = result.rects.get(&child) {
                self.place_children(tree, sizes, child, rect, scale, result);
            }
        }
    }

    fn place_flow_line(
        &self,
        tree: &LayoutTree,
        sizes: &SizePass,
        flow: &[NodeId],
        flags: LayoutFlags,
        content: Rect,
        row_like: bool,
        result: &mut LayoutResult,
    ) {
        if flow.is_empty() {
            return;
        }

        let inner_main = if row_like { content.width } else { content.height };
        let inner_cross = if row_like { content.height } else { content.width };

        let mut main_sizes: Vec<f32> = flow
            .iter()
            .map(|c| {
                let s = sizes.sizes.get(c).copied().unwrap_or_default();
                if row_like { s.x } else { s.y }
            })
            .collect();
        let cross_sizes: Vec<f32> = flow
            .iter()
            .map(|c| {
                let s = sizes.sizes.get(c).copied().unwrap_or_default();
                if row_like { s.y } else { s.x }
            })
            .collect();

        let growing: Vec<usize> = flow
            .iter()
            .enumerate()
            .filter(|(_, c)| tree.nodes.get(c).map(|n| n.flags.grow).unwrap_or(false))
            .map(|(i, _)| i)
            .collect();

        let content_main: f32 = main_sizes.iter().sum();
        let free_space = (inner_main - content_main).max(0.0);

        if !growing.is_empty() {
            let share = free_space / growing.len() as f32;
            let mut residue = free_space - share * growing.len() as f32;
            for &i in &growing {
                let mut add = share;
                if residue > 0.0 {
                    // Residue goes to the earliest growing child.
                    add += residue;
                    residue = 0.0;
                }
                main_sizes[i] += add;
            }
        }

        let used_main: f32 = main_sizes.iter().sum();
        let remaining = (inner_main - used_main).max(0.0);

        let (mut cursor, gap) = match flags.alignment {
            LayoutAlignment::Start => (0.0, 0.0),
            LayoutAlignment::Center => (remaining / 2.0, 0.0),
            LayoutAlignment::End => (remaining, 0.0),
            LayoutAlignment::SpaceBetween => {
                if flow.len() > 1 {
                    (0.0, remaining / (flow.len() - 1) as f32)
                } else {
                    (0.0, 0.0)
                }
            }
        };

        let order: Vec<usize> = if flags.direction.is_reversed() {
            (0..flow.len()).rev().collect()
        } else {
            (0..flow.len()).collect()
        };

        for &i in &order {
            let child = flow[i];
            let main_size = main_sizes[i];
            let cross_size = cross_sizes[i];

            // Cross-axis alignment 3 (SpaceBetween) is pinned to Start.
            let cross_offset = match flags.alignment {
                LayoutAlignment::Center => (inner_cross - cross_size) / 2.0,
                LayoutAlignment::End => inner_cross - cross_size,
                LayoutAlignment::Start | LayoutAlignment::SpaceBetween => 0.0,
            };

            let rect = if row_like {
                Rect {
                    x: content.x + cursor,
                    y: content.y + cross_offset,
                    width: main_size,
                    height: cross_size,
                }
            } else {
                Rect {
                    x: content.x + cross_offset,
                    y: content.y + cursor,
                    width: cross_size,
                    height: main_size,
                }
            };
            result.rects.insert(child, rect);
            cursor += main_size + gap;
        }
    }
}

impl Default for FlowLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Spec §4.3 Pass 2's exact per-edge clamp: "if `top+bottom >= height`, top
/// becomes 1 (if height>0) and bottom 0; likewise left/right." Applied to
/// the border only (padding is never clamped) before computing the content
/// box, so a box shorter than its own declared borders still yields a
/// sensible 1px inset rather than a negative/zero content rect.
fn clamp_border(border: EdgeWidths, width: f32, height: f32) -> EdgeWidths {
    let mut b = border;
    if b[0] + b[2] >= height {
        b[0] = if height > 0.0 { 1.0 } else { 0.0 };
        b[2] = 0.0;
    }
    if b[3] + b[1] >= width {
        b[3] = if width > 0.0 { 1.0 } else { 0.0 };
        b[1] = 0.0;
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::LayoutFlags;

    fn leaf(w: f32, h: f32) -> LayoutNode {
        LayoutNode {
            flags: LayoutFlags::from_bits(0),
            explicit_width: Some(w),
            explicit_height: Some(h),
            intrinsic_size: Vec2::new(w, h),
            border: [0.0; 4],
            padding: [0.0; 4],
            pos_x: 0.0,
            pos_y: 0.0,
            children: Vec::new(),
        }
    }

    /// S2: a single centered button in a 400x300 container ends up at
    /// render_rect (225, 175, 150, 50).
    #[test]
    fn s2_centered_button() {
        let mut tree = LayoutTree::new();
        // direction=Row(0), alignment=Center(1) -> bits 2-3 = 01 => 0b0100
        let container_flags = LayoutFlags::from_bits(0b0000_0100);
        tree.insert(
            0,
            LayoutNode {
                flags: container_flags,
                explicit_width: Some(400.0),
                explicit_height: Some(300.0),
                intrinsic_size: Vec2::ZERO,
                border: [0.0; 4],
                padding: [0.0; 4],
                pos_x: 0.0,
                pos_y: 0.0,
                children: vec![1],
            },
        );
        tree.insert(1, leaf(150.0, 50.0));

        let result = FlowLayoutEngine::new().compute(&tree, 0, Vec2::new(400.0, 300.0), 1.0);
        let button = result.rects[&1];
        assert_eq!(button.x, 125.0); // main-axis (row) center: (400-150)/2
        assert_eq!(button.y, 125.0); // cross-axis (column) center: (300-50)/2
    }

    /// S3: three children in a Row+SpaceBetween container of width 280 end
    /// up at x = 0, 120, 240 (each child 40 wide).
    #[test]
    fn s3_row_space_between() {
        let mut tree = LayoutTree::new();
        let container_flags = LayoutFlags::from_bits(0b0000_1100); // Row, SpaceBetween
        tree.insert(
            0,
            LayoutNode {
                flags: container_flags,
                explicit_width: Some(280.0),
                explicit_height: Some(40.0),
                intrinsic_size: Vec2::ZERO,
                border: [0.0; 4],
                padding: [0.0; 4],
                pos_x: 0.0,
                pos_y: 0.0,
                children: vec![1, 2, 3],
            },
        );
        tree.insert(1, leaf(40.0, 40.0));
        tree.insert(2, leaf(40.0, 40.0));
        tree.insert(3, leaf(40.0, 40.0));

        let result = FlowLayoutEngine::new().compute(&tree, 0, Vec2::new(280.0, 40.0), 1.0);
        assert_eq!(result.rects[&1].x, 0.0);
        assert_eq!(result.rects[&2].x, 120.0);
        assert_eq!(result.rects[&3].x, 240.0);
    }

    /// S4: an absolutely positioned child ignores the container's flow.
    #[test]
    fn s4_absolute_child_ignores_flow() {
        let mut tree = LayoutTree::new();
        tree.insert(
            0,
            LayoutNode {
                flags: LayoutFlags::from_bits(0),
                explicit_width: Some(200.0),
                explicit_height: Some(200.0),
                intrinsic_size: Vec2::ZERO,
                border: [0.0; 4],
                padding: [0.0; 4],
                pos_x: 0.0,
                pos_y: 0.0,
                children: vec![1],
            },
        );
        let mut absolute_child = leaf(30.0, 30.0);
        absolute_child.pos_x = 10.0;
        absolute_child.pos_y = 20.0;
        tree.insert(1, absolute_child);

        let result = FlowLayoutEngine::new().compute(&tree, 0, Vec2::new(200.0, 200.0), 1.0);
        let child = result.rects[&1];
        assert_eq!(child.x, 10.0);
        assert_eq!(child.y, 20.0);
    }

    /// A 4px-tall box with top=5/bottom=5 borders pins to top=1/bottom=0
    /// (spec §4.3 Pass 2's exact per-edge clamp) rather than leaving the
    /// content rect's origin already past the box.
    #[test]
    fn tall_border_clamps_to_one_pixel_top() {
        let mut tree = LayoutTree::new();
        tree.insert(
            0,
            LayoutNode {
                flags: LayoutFlags::from_bits(0),
                explicit_width: Some(50.0),
                explicit_height: Some(4.0),
                intrinsic_size: Vec2::ZERO,
                border: [5.0, 0.0, 5.0, 0.0],
                padding: [0.0; 4],
                pos_x: 0.0,
                pos_y: 0.0,
                children: vec![1],
            },
        );
        tree.insert(1, leaf(10.0, 1.0));

        let result = FlowLayoutEngine::new().compute(&tree, 0, Vec2::new(50.0, 4.0), 1.0);
        let child = result.rects[&1];
        assert_eq!(child.y, 1.0);
    }

    /// Padding subtracts from the content box in addition to (clamped)
    /// border (spec §4.3 Pass 2: "inside borders, inside padding").
    #[test]
    fn padding_insets_content_box_alongside_border() {
        let mut tree = LayoutTree::new();
        tree.insert(
            0,
            LayoutNode {
                flags: LayoutFlags::from_bits(0),
                explicit_width: Some(100.0),
                explicit_height: Some(100.0),
                intrinsic_size: Vec2::ZERO,
                border: [2.0, 2.0, 2.0, 2.0],
                padding: [3.0, 3.0, 3.0, 3.0],
                pos_x: 0.0,
                pos_y: 0.0,
                children: vec![1],
            },
        );
        tree.insert(1, leaf(10.0, 10.0));

        let result = FlowLayoutEngine::new().compute(&tree, 0, Vec2::new(100.0, 100.0), 1.0);
        let child = result.rects[&1];
        assert_eq!(child.x, 5.0); // border 2 + padding 3
        assert_eq!(child.y, 5.0);
    }

    /// Scale multiplies an absolutely positioned child's offset from its
    /// parent's content origin (spec §4.3).
    #[test]
    fn scale_multiplies_absolute_child_position() {
        let mut tree = LayoutTree::new();
        tree.insert(
            0,
            LayoutNode {
                flags: LayoutFlags::from_bits(0),
                explicit_width: Some(200.0),
                explicit_height: Some(200.0),
                intrinsic_size: Vec2::ZERO,
                border: [0.0; 4],
                padding: [0.0; 4],
                pos_x: 0.0,
                pos_y: 0.0,
                children: vec![1],
            },
        );
        let mut absolute_child = leaf(30.0, 30.0);
        absolute_child.pos_x = 10.0;
        absolute_child.pos_y = 20.0;
        tree.insert(1, absolute_child);

        let result = FlowLayoutEngine::new().compute(&tree, 0, Vec2::new(200.0, 200.0), 2.0);
        let child = result.rects[&1];
        assert_eq!(child.x, 20.0);
        assert_eq!(child.y, 40.0);
    }
}
