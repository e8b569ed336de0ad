use serde::{Deserialize, Serialize};

/// One triangle as three indices.
///
/// The same type indexes both the vertex list and, as a parallel list, the
/// texture-coordinate list of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Face3 {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Face3 {
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    #[must_use]
    pub const fn from_array(arr: [u32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    #[must_use]
    pub const fn to_array(self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }

    /// Same triangle with every index shifted by `n`.
    #[must_use]
    pub const fn offset(self, n: u32) -> Self {
        Self::new(self.a + n, self.b + n, self.c + n)
    }

    /// Opposite winding.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.a, self.c, self.b)
    }

    #[must_use]
    pub const fn max_index(self) -> u32 {
        let ab = if self.a > self.b { self.a } else { self.b };
        if ab > self.c { ab } else { self.c }
    }

    /// True when two corners share an index.
    #[must_use]
    pub const fn is_degenerate(self) -> bool {
        self.a == self.b || self.b == self.c || self.a == self.c
    }

    /// The three directed edges in winding order.
    #[must_use]
    pub const fn edges(self) -> [(u32, u32); 3] {
        [(self.a, self.b), (self.b, self.c), (self.c, self.a)]
    }
}

impl From<[u32; 3]> for Face3 {
    fn from(arr: [u32; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Face3> for [u32; 3] {
    fn from(f: Face3) -> Self {
        f.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_reverse() {
        let f = Face3::new(0, 1, 2);
        assert_eq!(f.offset(10), Face3::new(10, 11, 12));
        assert_eq!(f.reversed(), Face3::new(0, 2, 1));
        assert_eq!(f.reversed().reversed(), f);
        assert_eq!(Face3::new(4, 9, 2).max_index(), 9);
    }

    #[test]
    fn degenerate_detection() {
        assert!(Face3::new(1, 1, 2).is_degenerate());
        assert!(!Face3::new(1, 2, 3).is_degenerate());
    }
}
