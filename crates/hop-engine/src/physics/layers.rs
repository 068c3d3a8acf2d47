//! Collision layers and the layer/mask interaction table.
//!
//! A layer is what an object is; a mask is what it reacts to.
//! A pair is a narrow-phase candidate when either side's mask contains
//! the other's layer.

use bitflags::bitflags;

bitflags! {
    /// Set of collision layers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionLayers: u8 {
        const PLAYER = 1 << 0;
        const ENEMY = 1 << 1;
        const PROJECTILE = 1 << 2;
        const PICKUP = 1 << 3;
        const SOLID = 1 << 4;
        const PLATFORM = 1 << 5;
    }
}

const LAYER_NAMES: [(&str, CollisionLayers); 6] = [
    ("player", CollisionLayers::PLAYER),
    ("enemy", CollisionLayers::ENEMY),
    ("projectile", CollisionLayers::PROJECTILE),
    ("pickup", CollisionLayers::PICKUP),
    ("solid", CollisionLayers::SOLID),
    ("platform", CollisionLayers::PLATFORM),
];

impl CollisionLayers {
    /// Look up a single layer by name. Unknown names are `None`.
    pub fn from_layer_name(name: &str) -> Option<Self> {
        LAYER_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, layer)| *layer)
    }

    /// Build a set from names. Unknown names contribute nothing, so an
    /// unregistered layer can never collide with anything.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        names.into_iter().fold(Self::empty(), |acc, name| {
            match Self::from_layer_name(name) {
                Some(layer) => acc | layer,
                None => {
                    log::debug!("unknown collision layer '{}'", name);
                    acc
                }
            }
        })
    }

    /// Names of the layers in this set.
    pub fn names(self) -> Vec<&'static str> {
        LAYER_NAMES
            .iter()
            .filter(|(_, layer)| self.contains(*layer))
            .map(|(n, _)| *n)
            .collect()
    }
}

/// Fixed adjacency table: for each layer, the layers it reacts to.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMatrix {
    rows: Vec<(CollisionLayers, CollisionLayers)>,
}

impl CollisionMatrix {
    /// The platformer table, configured once.
    pub fn default_platformer() -> Self {
        use CollisionLayers as L;
        Self {
            rows: vec![
                (L::PLAYER, L::SOLID | L::PLATFORM | L::ENEMY | L::PICKUP),
                (L::ENEMY, L::SOLID | L::PLATFORM | L::PLAYER | L::PROJECTILE),
                (L::PROJECTILE, L::SOLID | L::ENEMY),
                (L::PICKUP, L::PLAYER),
                (L::SOLID, L::PLAYER | L::ENEMY | L::PROJECTILE),
                (L::PLATFORM, L::PLAYER | L::ENEMY),
            ],
        }
    }

    /// Mask for an object belonging to `layers`: union of their rows.
    pub fn mask_for(&self, layers: CollisionLayers) -> CollisionLayers {
        self.rows
            .iter()
            .filter(|(layer, _)| layers.intersects(*layer))
            .fold(CollisionLayers::empty(), |acc, (_, mask)| acc | *mask)
    }

    /// Either side requesting the interaction is sufficient.
    pub fn allows(
        layers_a: CollisionLayers,
        mask_a: CollisionLayers,
        layers_b: CollisionLayers,
        mask_b: CollisionLayers,
    ) -> bool {
        mask_a.intersects(layers_b) || mask_b.intersects(layers_a)
    }
}

impl Default for CollisionMatrix {
    fn default() -> Self {
        Self::default_platformer()
    }
}
