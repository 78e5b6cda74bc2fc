//! Colour assignment for batched points and polylines.
//!
//! Every item resolves to one colour under a [`ColorStrategy`]; items sharing a
//! resolved colour are collected into one group so each group can become a
//! single instanced draw.

use serde::{Deserialize, Serialize};

use crate::material::DEFAULT_COLOR;

/// How item `i` of `n` picks from a list of `m` colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorStrategy {
    /// Every item uses the first colour
    FirstColorForAll,
    /// Items past the end of the list reuse the last colour
    #[default]
    LastColorRemainder,
    /// Cycle through the list
    RepeatColors,
    /// Walk the list forward then backward: `0 1 2 2 1 0 0 1 2 ...`
    ReversedColors,
}

impl ColorStrategy {
    /// Index into a colour list of length `m` for item `i`. `m` must be non-zero.
    pub fn color_index(self, i: usize, m: usize) -> usize {
        debug_assert!(m > 0);
        match self {
            ColorStrategy::FirstColorForAll => 0,
            ColorStrategy::LastColorRemainder => i.min(m - 1),
            ColorStrategy::RepeatColors => i % m,
            ColorStrategy::ReversedColors => {
                let k = i % (2 * m);
                if k < m {
                    k
                } else {
                    2 * m - 1 - k
                }
            }
        }
    }
}

/// Items that resolved to the same colour, in original order
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGroup<T> {
    pub color: String,
    pub indices: Vec<usize>,
    pub items: Vec<T>,
}

impl<T> ColorGroup<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Resolved colour per item. An empty colour list resolves to the default colour.
pub fn resolve_colors(count: usize, colors: &[String], strategy: ColorStrategy) -> Vec<String> {
    if colors.is_empty() {
        return vec![DEFAULT_COLOR.to_string(); count];
    }
    (0..count)
        .map(|i| normalize(&colors[strategy.color_index(i, colors.len())]))
        .collect()
}

/// Partition `items` into one group per distinct resolved colour.
///
/// Groups are ordered by the first item that resolved to their colour, so the
/// result is deterministic for identical inputs.
pub fn group_by_color<T: Clone>(items: &[T], colors: &[String], strategy: ColorStrategy) -> Vec<ColorGroup<T>> {
    group_by_resolved(items, resolve_colors(items.len(), colors, strategy))
}

/// Partition `items` by an already resolved colour per item
pub fn group_by_resolved<T: Clone>(items: &[T], resolved: Vec<String>) -> Vec<ColorGroup<T>> {
    let mut groups: Vec<ColorGroup<T>> = Vec::new();

    for (i, (item, color)) in items.iter().zip(resolved).enumerate() {
        let color = normalize(&color);
        match groups.iter_mut().find(|g| g.color == color) {
            Some(group) => {
                group.indices.push(i);
                group.items.push(item.clone());
            }
            None => groups.push(ColorGroup {
                color,
                indices: vec![i],
                items: vec![item.clone()],
            }),
        }
    }
    groups
}

fn normalize(color: &str) -> String {
    color.trim().to_ascii_lowercase()
}

/// Per-point geometry resolution of an instanced batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointDetail {
    High,
    Low,
}

impl PointDetail {
    /// Batches smaller than `threshold` get the finer sphere
    pub fn for_count(count: usize, threshold: usize) -> Self {
        if count < threshold {
            PointDetail::High
        } else {
            PointDetail::Low
        }
    }

    /// `(rings, sectors)` of the instanced sphere
    pub fn sphere_segments(self) -> (u32, u32) {
        match self {
            PointDetail::High => (8, 12),
            PointDetail::Low => (3, 4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    fn indices(strategy: ColorStrategy, n: usize, m: usize) -> Vec<usize> {
        (0..n).map(|i| strategy.color_index(i, m)).collect()
    }

    #[test]
    fn test_first_color_for_all() {
        assert_eq!(indices(ColorStrategy::FirstColorForAll, 4, 3), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_last_color_remainder() {
        assert_eq!(indices(ColorStrategy::LastColorRemainder, 5, 2), vec![0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_repeat_colors() {
        assert_eq!(indices(ColorStrategy::RepeatColors, 7, 3), vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_reversed_colors_ping_pong() {
        assert_eq!(
            indices(ColorStrategy::ReversedColors, 9, 3),
            vec![0, 1, 2, 2, 1, 0, 0, 1, 2]
        );
        assert_eq!(indices(ColorStrategy::ReversedColors, 4, 1), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_default_strategy() {
        assert_eq!(ColorStrategy::default(), ColorStrategy::LastColorRemainder);
    }

    #[test]
    fn test_groups_follow_first_appearance() {
        let items = [10, 20, 30, 40, 50];
        let groups = group_by_color(&items, &colors(&["#00f", "#f00"]), ColorStrategy::RepeatColors);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].color, "#00f");
        assert_eq!(groups[0].items, vec![10, 30, 50]);
        assert_eq!(groups[1].indices, vec![1, 3]);
    }

    #[test]
    fn test_duplicate_colours_merge() {
        let items = [1, 2, 3];
        let groups = group_by_color(
            &items,
            &colors(&["#FF0000", "#ff0000", "#00ff00"]),
            ColorStrategy::LastColorRemainder,
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_empty_colours_use_default() {
        let groups = group_by_color(&[1, 2], &[], ColorStrategy::RepeatColors);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].color, DEFAULT_COLOR);
    }

    const STRATEGIES: [ColorStrategy; 4] = [
        ColorStrategy::FirstColorForAll,
        ColorStrategy::LastColorRemainder,
        ColorStrategy::RepeatColors,
        ColorStrategy::ReversedColors,
    ];

    #[test]
    fn test_single_colour_is_one_group_for_every_strategy() {
        let items: Vec<usize> = (0..7).collect();
        for strategy in STRATEGIES {
            let groups = group_by_color(&items, &colors(&["#abcdef"]), strategy);
            assert_eq!(groups.len(), 1, "{strategy:?}");
            assert_eq!(groups[0].items, items, "{strategy:?}");
        }
    }

    #[test]
    fn test_one_colour_per_item_is_one_group_per_item() {
        let items = [5, 6, 7, 8];
        let palette = colors(&["#000001", "#000002", "#000003", "#000004"]);
        for strategy in [ColorStrategy::RepeatColors, ColorStrategy::LastColorRemainder] {
            let groups = group_by_color(&items, &palette, strategy);
            assert_eq!(groups.len(), items.len(), "{strategy:?}");
            assert!(groups.iter().all(|g| g.len() == 1));
            assert_eq!(groups[2].color, "#000003");
        }
    }

    #[test]
    fn test_grouping_is_repeatable() {
        let items: Vec<[f32; 3]> = (0..11).map(|i| [i as f32, 0.0, -(i as f32)]).collect();
        let palette = colors(&["#f00", "#0f0", "#00F"]);
        for strategy in STRATEGIES {
            let first = group_by_color(&items, &palette, strategy);
            let second = group_by_color(&items, &palette, strategy);
            assert_eq!(first, second, "{strategy:?}");
        }
    }

    #[test]
    fn test_detail_threshold() {
        assert_eq!(PointDetail::for_count(99, 100), PointDetail::High);
        assert_eq!(PointDetail::for_count(100, 100), PointDetail::Low);
        let (hr, hs) = PointDetail::High.sphere_segments();
        let (lr, ls) = PointDetail::Low.sphere_segments();
        assert!(hr * hs > lr * ls);
    }
}
