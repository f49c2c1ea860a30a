//! Cache key of a transition tile.

use crate::tile::{Direction, Neighbors, TileId};

/// A center tile together with its four neighbors.
///
/// Keys compare by the full five-id tuple. Two keys that differ only in
/// which neighbor equals the center are distinct, even though both blend
/// the same set of edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionKey {
    pub center: TileId,
    pub neighbors: Neighbors,
}

impl TransitionKey {
    pub fn new(center: TileId, neighbors: Neighbors) -> Self {
        Self { center, neighbors }
    }

    /// Neighbors that differ from the center, in North, East, South, West
    /// order.
    pub fn differing(&self) -> impl Iterator<Item = (Direction, TileId)> + '_ {
        self.neighbors.iter().filter(move |&(_, id)| id != self.center)
    }

    /// True when every neighbor is the center tile itself.
    pub fn is_uniform(&self) -> bool {
        self.differing().next().is_none()
    }
}

impl std::fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [n, e, s, w] = self.neighbors.as_array();
        write!(f, "{}[{},{},{},{}]", self.center, n, e, s, w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_differing_in_fixed_order() {
        let key = TransitionKey::new(TileId(1), Neighbors::from([2, 1, 3, 2]));
        let differing: Vec<_> = key.differing().collect();
        assert_eq!(
            differing,
            vec![(Direction::North, TileId(2)), (Direction::South, TileId(3)), (Direction::West, TileId(2))]
        );
        assert!(!key.is_uniform());
    }

    #[test]
    fn test_uniform_key() {
        assert!(TransitionKey::new(TileId(5), Neighbors::uniform(TileId(5))).is_uniform());
    }

    #[test]
    fn test_keys_compare_full_tuple() {
        let a = TransitionKey::new(TileId(1), Neighbors::from([1, 2, 1, 1]));
        let b = TransitionKey::new(TileId(1), Neighbors::from([2, 1, 1, 1]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let key = TransitionKey::new(TileId(1), Neighbors::from([2, 1, 3, 1]));
        assert_eq!(key.to_string(), "1[2,1,3,1]");
    }
}
