//! Triad spelling and compact-triangle selection for chord display.

use crate::hex::Point;

/// Triad quality, from the interval above the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
}

impl ChordQuality {
    /// Semitones from root to third: 4 for major, 3 for minor.
    pub fn third(self) -> usize {
        match self {
            ChordQuality::Major => 4,
            ChordQuality::Minor => 3,
        }
    }
}

/// Pitch-class indices of the triad on `root_index`: root, third, fifth.
pub fn chord_indices(root_index: usize, quality: ChordQuality) -> [usize; 3] {
    [
        root_index % 12,
        (root_index + quality.third()) % 12,
        (root_index + 7) % 12,
    ]
}

/// Perimeter below which a triangle counts as one compact voicing. Larger
/// spreads happen near board edges where only distant recurrences of a
/// pitch class exist, and get no triangle.
pub const TRIANGLE_PERIMETER_LIMIT: f32 = 6.0;

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Minimum-perimeter triangle over `positions`, with its perimeter.
/// `None` with fewer than three points. Exhaustive O(n^3) search, fine at
/// board scale.
pub fn tightest_triangle(positions: &[Point]) -> Option<([Point; 3], f32)> {
    let mut best: Option<([Point; 3], f32)> = None;

    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            for k in (j + 1)..positions.len() {
                let (p1, p2, p3) = (positions[i], positions[j], positions[k]);
                let perimeter = distance(p1, p2) + distance(p2, p3) + distance(p3, p1);
                if best.map_or(true, |(_, b)| perimeter < b) {
                    best = Some(([p1, p2, p3], perimeter));
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_and_minor_spelling() {
        assert_eq!(chord_indices(0, ChordQuality::Major), [0, 4, 7]);
        assert_eq!(chord_indices(0, ChordQuality::Minor), [0, 3, 7]);
    }

    #[test]
    fn test_spelling_wraps_the_octave() {
        // A major: A, C#, E.
        assert_eq!(chord_indices(9, ChordQuality::Major), [9, 1, 4]);
        // B minor: B, D, F#.
        assert_eq!(chord_indices(11, ChordQuality::Minor), [11, 2, 6]);
    }

    #[test]
    fn test_too_few_positions() {
        assert!(tightest_triangle(&[]).is_none());
        assert!(tightest_triangle(&[(0.0, 0.0), (1.0, 0.0)]).is_none());
    }

    #[test]
    fn test_picks_the_tight_cluster() {
        // Three points clustered at the origin, one far away.
        let positions = [
            (0.0, 0.0),
            (1.0, 0.0),
            (0.0, 1.0),
            (50.0, 50.0),
        ];
        let (triangle, perimeter) = tightest_triangle(&positions).unwrap();
        assert!(triangle.iter().all(|p| p.0 < 2.0 && p.1 < 2.0));

        let expected = 1.0 + 1.0 + 2.0_f32.sqrt();
        assert!((perimeter - expected).abs() < 1e-5, "got perimeter {}", perimeter);
        assert!(perimeter < TRIANGLE_PERIMETER_LIMIT);
    }

    #[test]
    fn test_spread_positions_exceed_limit() {
        let positions = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
        let (_, perimeter) = tightest_triangle(&positions).unwrap();
        assert!(perimeter > TRIANGLE_PERIMETER_LIMIT);
    }
}
