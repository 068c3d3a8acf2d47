//! Player ability table.
//!
//! Every advanced move is inert until unlocked. Enabled/level only change
//! through `unlock` and `upgrade`; cooldowns tick every frame and restart
//! on activation. Unknown ability names are no-ops.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    DoubleJump,
    TripleJump,
    Dash,
    WallJump,
    WallSlide,
    Attack,
    Glide,
    Shield,
    SpeedBoost,
    GroundPound,
    Fireball,
}

impl AbilityKind {
    pub const ALL: [AbilityKind; 11] = [
        AbilityKind::DoubleJump,
        AbilityKind::TripleJump,
        AbilityKind::Dash,
        AbilityKind::WallJump,
        AbilityKind::WallSlide,
        AbilityKind::Attack,
        AbilityKind::Glide,
        AbilityKind::Shield,
        AbilityKind::SpeedBoost,
        AbilityKind::GroundPound,
        AbilityKind::Fireball,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AbilityKind::DoubleJump => "double_jump",
            AbilityKind::TripleJump => "triple_jump",
            AbilityKind::Dash => "dash",
            AbilityKind::WallJump => "wall_jump",
            AbilityKind::WallSlide => "wall_slide",
            AbilityKind::Attack => "attack",
            AbilityKind::Glide => "glide",
            AbilityKind::Shield => "shield",
            AbilityKind::SpeedBoost => "speed_boost",
            AbilityKind::GroundPound => "ground_pound",
            AbilityKind::Fireball => "fireball",
        }
    }

    /// Accepts snake_case and camelCase spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted: String = name.chars().filter(|c| *c != '_').collect::<String>().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().replace('_', "") == wanted)
    }

    pub fn max_level(self) -> u32 {
        match self {
            AbilityKind::DoubleJump | AbilityKind::TripleJump | AbilityKind::WallSlide => 1,
            AbilityKind::Glide | AbilityKind::WallJump => 2,
            _ => 3,
        }
    }

    /// Cooldown in seconds at level 1.
    fn base_cooldown(self) -> f32 {
        match self {
            AbilityKind::Dash => 0.8,
            AbilityKind::WallJump => 0.15,
            AbilityKind::Attack => 0.4,
            AbilityKind::Shield => 6.0,
            AbilityKind::SpeedBoost => 10.0,
            AbilityKind::GroundPound => 1.0,
            AbilityKind::Fireball => 1.2,
            AbilityKind::DoubleJump
            | AbilityKind::TripleJump
            | AbilityKind::WallSlide
            | AbilityKind::Glide => 0.0,
        }
    }

    /// Cooldown shrinks 15% per level above the first.
    pub fn cooldown_for(self, level: u32) -> f32 {
        self.base_cooldown() * 0.85f32.powi(level.saturating_sub(1) as i32)
    }

    /// Tuning at a given level.
    pub fn params(self, level: u32) -> AbilityParams {
        let lv = level.max(1) as f32;
        match self {
            AbilityKind::DoubleJump => AbilityParams { jump_count: 1, power: 0.9, ..Default::default() },
            AbilityKind::TripleJump => AbilityParams { jump_count: 2, power: 0.85, ..Default::default() },
            AbilityKind::Dash => AbilityParams {
                power: 450.0 + 75.0 * (lv - 1.0),
                duration: 0.15 + 0.03 * (lv - 1.0),
                ..Default::default()
            },
            AbilityKind::WallJump => AbilityParams { power: 1.1 + 0.1 * (lv - 1.0), duration: 0.15, ..Default::default() },
            AbilityKind::WallSlide => AbilityParams::default(),
            AbilityKind::Attack => AbilityParams {
                power: 10.0 * lv,
                duration: 0.25,
                range: 28.0 + 6.0 * (lv - 1.0),
                ..Default::default()
            },
            AbilityKind::Glide => AbilityParams { power: 1.0 / lv, ..Default::default() },
            AbilityKind::Shield => AbilityParams { duration: 1.5 + 0.75 * (lv - 1.0), ..Default::default() },
            AbilityKind::SpeedBoost => AbilityParams {
                power: 1.4 + 0.15 * (lv - 1.0),
                duration: 3.0 + 1.0 * (lv - 1.0),
                ..Default::default()
            },
            AbilityKind::GroundPound => AbilityParams {
                power: 700.0,
                damage: 15.0 * lv,
                range: 48.0 + 16.0 * (lv - 1.0),
                ..Default::default()
            },
            AbilityKind::Fireball => AbilityParams {
                power: 380.0,
                damage: 12.0 * lv,
                duration: 1.5,
                range: 400.0,
                ..Default::default()
            },
        }
    }
}

/// Ability-specific tuning. Fields not used by an ability stay zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AbilityParams {
    /// Extra air jumps granted.
    pub jump_count: u32,
    /// Speed, multiplier or strength depending on the ability.
    pub power: f32,
    pub duration: f32,
    pub range: f32,
    pub damage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub enabled: bool,
    pub level: u32,
    /// Seconds until usable again.
    pub cooldown: f32,
    pub cooldown_max: f32,
    pub params: AbilityParams,
}

impl Ability {
    fn locked(kind: AbilityKind) -> Self {
        Self {
            enabled: false,
            level: 0,
            cooldown: 0.0,
            cooldown_max: kind.cooldown_for(1),
            params: kind.params(1),
        }
    }

    fn set_level(&mut self, kind: AbilityKind, level: u32) {
        self.level = level.clamp(1, kind.max_level());
        self.cooldown_max = kind.cooldown_for(self.level);
        self.params = kind.params(self.level);
    }
}

/// Name-keyed ability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySet {
    abilities: BTreeMap<AbilityKind, Ability>,
}

impl Default for AbilitySet {
    fn default() -> Self {
        Self {
            abilities: AbilityKind::ALL.iter().map(|&k| (k, Ability::locked(k))).collect(),
        }
    }
}

impl AbilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(name: &str) -> Option<AbilityKind> {
        let kind = AbilityKind::from_name(name);
        if kind.is_none() {
            log::debug!("unknown ability '{}'", name);
        }
        kind
    }

    /// Enable an ability at `level` (at least 1). Returns false for unknown names.
    pub fn unlock(&mut self, name: &str, level: u32) -> bool {
        let Some(kind) = Self::lookup(name) else {
            return false;
        };
        self.unlock_kind(kind, level);
        true
    }

    pub fn unlock_kind(&mut self, kind: AbilityKind, level: u32) {
        let ability = self.abilities.entry(kind).or_insert_with(|| Ability::locked(kind));
        ability.enabled = true;
        ability.set_level(kind, level.max(1));
    }

    /// Raise the level by one, up to the ability's maximum. Returns the new
    /// level, or `None` if the ability is unknown or still locked.
    pub fn upgrade(&mut self, name: &str) -> Option<u32> {
        let kind = Self::lookup(name)?;
        let ability = self.abilities.get_mut(&kind)?;
        if !ability.enabled {
            return None;
        }
        let next = ability.level + 1;
        ability.set_level(kind, next);
        Some(ability.level)
    }

    pub fn has(&self, name: &str) -> bool {
        AbilityKind::from_name(name).map_or(false, |k| self.has_kind(k))
    }

    pub fn has_kind(&self, kind: AbilityKind) -> bool {
        self.abilities.get(&kind).map_or(false, |a| a.enabled)
    }

    /// Current level; 0 when locked or unknown.
    pub fn level(&self, name: &str) -> u32 {
        AbilityKind::from_name(name)
            .and_then(|k| self.abilities.get(&k))
            .filter(|a| a.enabled)
            .map_or(0, |a| a.level)
    }

    /// Seconds until usable; 0 when ready, locked or unknown.
    pub fn cooldown(&self, name: &str) -> f32 {
        AbilityKind::from_name(name)
            .and_then(|k| self.abilities.get(&k))
            .map_or(0.0, |a| a.cooldown)
    }

    pub fn is_ready(&self, name: &str) -> bool {
        AbilityKind::from_name(name).map_or(false, |k| self.is_ready_kind(k))
    }

    pub fn is_ready_kind(&self, kind: AbilityKind) -> bool {
        self.abilities.get(&kind).map_or(false, |a| a.enabled && a.cooldown <= 0.0)
    }

    pub fn get(&self, kind: AbilityKind) -> Option<&Ability> {
        self.abilities.get(&kind).filter(|a| a.enabled)
    }

    /// Parameters of an unlocked ability.
    pub fn params(&self, kind: AbilityKind) -> Option<AbilityParams> {
        self.get(kind).map(|a| a.params)
    }

    /// Restart the cooldown after activation.
    pub fn start_cooldown(&mut self, kind: AbilityKind) {
        if let Some(a) = self.abilities.get_mut(&kind) {
            a.cooldown = a.cooldown_max;
        }
    }

    pub fn tick(&mut self, dt: f32) {
        for a in self.abilities.values_mut() {
            if a.cooldown > 0.0 {
                a.cooldown = (a.cooldown - dt).max(0.0);
            }
        }
    }

    /// Extra air jumps from the best unlocked multi-jump.
    pub fn air_jumps(&self) -> u32 {
        [AbilityKind::TripleJump, AbilityKind::DoubleJump]
            .iter()
            .filter_map(|&k| self.params(k))
            .map(|p| p.jump_count)
            .max()
            .unwrap_or(0)
    }

    /// Unlocked abilities and their levels.
    pub fn unlocked(&self) -> Vec<(AbilityKind, u32)> {
        self.abilities
            .iter()
            .filter(|(_, a)| a.enabled)
            .map(|(k, a)| (*k, a.level))
            .collect()
    }
}
