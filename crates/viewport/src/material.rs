//! Bounded material cache.
//!
//! Materials are keyed by `(colour, opacity, z offset)`. Once the cache holds
//! `capacity` entries, inserting a new key evicts the oldest-inserted one
//! (FIFO, not LRU: a hit does not refresh an entry's position). Evicted
//! material ids are queued so the renderer can free whatever it associated
//! with them.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Stable identity of a material for the lifetime of the cache
pub type MaterialId = u64;

pub const DEFAULT_COLOR: &str = "#ff0000";

/// Cache key. Floats are compared bitwise so `-0.0` and `0.0` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialKey {
    color: String,
    opacity_bits: u32,
    z_offset_bits: u32,
}

impl MaterialKey {
    pub fn new(color: &str, opacity: f32, z_offset: f32) -> Self {
        Self {
            color: color.trim().to_ascii_lowercase(),
            opacity_bits: opacity.to_bits(),
            z_offset_bits: z_offset.to_bits(),
        }
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn opacity(&self) -> f32 {
        f32::from_bits(self.opacity_bits)
    }

    pub fn z_offset(&self) -> f32 {
        f32::from_bits(self.z_offset_bits)
    }
}

/// Surface appearance shared by every node drawn with the same key
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub color: [f32; 3],
    pub opacity: f32,
    /// Depth bias applied when rasterizing, for coplanar overlays
    pub z_offset: f32,
    pub transparent: bool,
}

impl Material {
    /// Standard material for a key. Unparsable colours fall back to red.
    pub fn standard(id: MaterialId, key: &MaterialKey) -> Self {
        let color = parse_hex_color(key.color()).unwrap_or_else(|| {
            tracing::warn!("invalid colour {:?}, using {DEFAULT_COLOR}", key.color());
            [1.0, 0.0, 0.0]
        });
        let opacity = key.opacity().clamp(0.0, 1.0);
        Self {
            id,
            color,
            opacity,
            z_offset: key.z_offset(),
            transparent: opacity < 1.0,
        }
    }

    pub fn rgba(&self) -> [f32; 4] {
        [self.color[0], self.color[1], self.color[2], self.opacity]
    }
}

/// Parse `#rrggbb` or `#rgb` into linear 0..1 components
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |i: usize| {
        u8::from_str_radix(expanded.get(i..i + 2)?, 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };
    Some([channel(0)?, channel(2)?, channel(4)?])
}

pub struct MaterialCache {
    capacity: usize,
    entries: HashMap<MaterialKey, Rc<Material>>,
    /// Insertion order, oldest first
    order: VecDeque<MaterialKey>,
    disposed: Vec<MaterialId>,
    next_id: MaterialId,
}

impl MaterialCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            disposed: Vec::new(),
            next_id: 1,
        }
    }

    /// Return the cached material for the key, or build one with `factory`.
    ///
    /// The factory runs only on a miss and receives the id the new material
    /// must carry. A miss on a full cache evicts the oldest entry first.
    pub fn get_or_create<F>(&mut self, color: &str, opacity: f32, z_offset: f32, factory: F) -> Rc<Material>
    where
        F: FnOnce(MaterialId, &MaterialKey) -> Material,
    {
        let key = MaterialKey::new(color, opacity, z_offset);
        if let Some(material) = self.entries.get(&key) {
            return Rc::clone(material);
        }

        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                tracing::debug!("evicting material {} ({})", evicted.id, oldest.color());
                self.disposed.push(evicted.id);
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        let material = Rc::new(factory(id, &key));
        self.entries.insert(key.clone(), Rc::clone(&material));
        self.order.push_back(key);
        material
    }

    /// `get_or_create` with the standard material factory
    pub fn standard(&mut self, color: &str, opacity: f32, z_offset: f32) -> Rc<Material> {
        self.get_or_create(color, opacity, z_offset, Material::standard)
    }

    pub fn contains(&self, color: &str, opacity: f32, z_offset: f32) -> bool {
        self.entries
            .contains_key(&MaterialKey::new(color, opacity, z_offset))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every cached material
    pub fn dispose(&mut self) {
        for key in self.order.drain(..) {
            if let Some(material) = self.entries.remove(&key) {
                self.disposed.push(material.id);
            }
        }
        self.entries.clear();
    }

    /// Ids of materials evicted or disposed since the last call
    pub fn take_disposed(&mut self) -> Vec<MaterialId> {
        std::mem::take(&mut self.disposed)
    }
}
