//! Two-phase collision test between models.
//!
//! 1. Frame boxes (full rendered extent, size factor and rotation applied)
//!    are compared.
//!    Disjoint frame boxes reject the pair without looking at any collision
//!    rectangle.
//! 2. Otherwise every collision rectangle of one model is tested against
//!    every rectangle of the other until an overlapping pair is found.
//!
//! All overlap tests are closed-interval: touching edges collide. A model
//! without collision rectangles takes part in the fine phase with its frame
//! box as its only rectangle. Collision rectangles themselves do not rotate
//! with the model.

use smallvec::SmallVec;

use crate::components::collisionbox::CollisionBox;
use crate::components::model::Model;

/// Outcome of [`check_collision`], including how much fine-phase work ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionCheck {
    /// Rejected by the frame-box test; no rectangle pair was tested.
    FrameMiss,
    /// Frame boxes overlap but none of the rectangle pairs do.
    FineMiss { pairs_tested: u32 },
    /// An overlapping rectangle pair was found.
    Hit { pairs_tested: u32 },
}

impl CollisionCheck {
    pub fn collided(self) -> bool {
        matches!(self, CollisionCheck::Hit { .. })
    }

    /// Rectangle pairs tested in the fine phase.
    pub fn pairs_tested(self) -> u32 {
        match self {
            CollisionCheck::FrameMiss => 0,
            CollisionCheck::FineMiss { pairs_tested } | CollisionCheck::Hit { pairs_tested } => {
                pairs_tested
            }
        }
    }
}

/// Broad phase only.
pub fn frame_boxes_overlap(a: &Model, b: &Model) -> bool {
    a.frame_box().overlaps(&b.frame_box())
}

fn fine_boxes(model: &Model) -> SmallVec<[CollisionBox; 4]> {
    let boxes: SmallVec<[CollisionBox; 4]> = model.collision_boxes().collect();
    if boxes.is_empty() {
        smallvec::smallvec![model.frame_box()]
    } else {
        boxes
    }
}

pub fn check_collision(a: &Model, b: &Model) -> CollisionCheck {
    if !frame_boxes_overlap(a, b) {
        return CollisionCheck::FrameMiss;
    }

    let boxes_b = fine_boxes(b);
    let mut pairs_tested = 0;
    for box_a in fine_boxes(a) {
        for box_b in &boxes_b {
            pairs_tested += 1;
            if box_a.overlaps(box_b) {
                return CollisionCheck::Hit { pairs_tested };
            }
        }
    }
    CollisionCheck::FineMiss { pairs_tested }
}
