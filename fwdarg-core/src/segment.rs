use crate::newtypes::{NodeId, Position};

/// A segment is a half-open
/// interval of [``Position``]s
/// associated with a [``NodeId``].
///
/// During reduction, each input node holds a list of
/// segments recording which output node carries its
/// ancestral material over each interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Left edge of interval
    pub left: Position,
    /// Right edge of interval
    pub right: Position,
    /// The node
    pub node: NodeId,
}

impl Segment {
    /// Create a new instance.
    pub fn new(left: Position, right: Position, node: NodeId) -> Self {
        Segment { left, right, node }
    }

    /// `true` if `self` and `[left, right)` share any positions.
    pub fn overlaps(&self, left: Position, right: Position) -> bool {
        self.right > left && right > self.left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps() {
        let s = Segment::new(Position::from(0.25), Position::from(0.5), NodeId::from(0));
        assert!(s.overlaps(Position::from(0.0), Position::from(0.3)));
        assert!(!s.overlaps(Position::from(0.5), Position::from(1.0)));
        assert!(!s.overlaps(Position::from(0.0), Position::from(0.25)));
    }
}
