//! Headless arena
//!
//! A flat square floor with optional pillars, populated by scripted
//! challengers. [`Arena`] is the world the boss controller sees: it answers
//! spatial queries, applies the boss's damage and debuffs, and integrates
//! motion once per step.
//!
//! Units are blocks and steps. Challengers walk at a fixed speed, knockback
//! decays with friction, and anything airborne falls back to the floor.

use bevy::prelude::*;

use super::config::{ChallengerConfig, HeadlessMatchConfig};
use crate::combat::events::{DamageDealtEvent, DebuffAppliedEvent};
use crate::controller::world::{
    horizontal_direction, AttackKind, Candidates, Debuff, DebuffKind, EntityRef, Feedback,
    GuardOutcome, Mitigation, TargetInfo, WorldQuery,
};

// ============================================================================
// Physics
// ============================================================================

/// Downward acceleration per step
pub const GRAVITY: f32 = 0.08;

/// Fraction of horizontal knockback kept each step
pub const KNOCKBACK_FRICTION: f32 = 0.6;

/// Distance at which challengers spawn around the boss by default
pub const SPAWN_RING_RADIUS: f32 = 12.0;

// ============================================================================
// Debuff effects
// ============================================================================

/// Movement lost per slowness level
pub const SLOWNESS_PER_LEVEL: f32 = 0.15;

/// Attack damage lost per weakness level
pub const WEAKNESS_PER_LEVEL: f32 = 0.2;

/// Steps between wither damage at level 1
pub const WITHER_INTERVAL: u32 = 40;

/// A scripted opponent of the boss
#[derive(Debug, Clone)]
pub struct Challenger {
    pub id: EntityRef,
    pub name: String,
    pub position: Vec3,
    /// Velocity chosen by the challenger itself
    pub walk: Vec3,
    /// Impulses from the boss, decaying each step
    pub knockback: Vec3,
    /// Velocity imposed by a grab this step, overriding walking
    pub held: Option<Vec3>,
    pub health: f32,
    pub max_health: f32,
    pub attack_damage: f32,
    pub attack_interval: u32,
    pub attack_range: f32,
    pub move_speed: f32,
    pub keep_distance: f32,
    pub guards: bool,
    pub guard_durability: u32,
    pub attack_timer: u32,
    pub hurt_immunity: u32,
    pub debuffs: Vec<Debuff>,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    /// Telegraph cues received from the boss
    pub cues_received: u32,
}

impl Challenger {
    pub fn from_config(id: EntityRef, config: &ChallengerConfig, position: Vec3) -> Self {
        Self {
            id,
            name: config.name.clone(),
            position,
            walk: Vec3::ZERO,
            knockback: Vec3::ZERO,
            held: None,
            health: config.health,
            max_health: config.health,
            attack_damage: config.attack_damage,
            attack_interval: config.attack_interval,
            attack_range: config.attack_range,
            move_speed: config.move_speed,
            keep_distance: config.keep_distance,
            guards: config.guards,
            guard_durability: config.guard_durability,
            attack_timer: config.attack_interval,
            hurt_immunity: 0,
            debuffs: Vec::new(),
            damage_dealt: 0.0,
            damage_taken: 0.0,
            cues_received: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn debuff(&self, kind: DebuffKind) -> Option<&Debuff> {
        self.debuffs.iter().find(|d| d.kind == kind)
    }

    fn level(&self, kind: DebuffKind) -> f32 {
        self.debuff(kind)
            .map(|d| f32::from(d.amplifier) + 1.0)
            .unwrap_or(0.0)
    }

    /// Walking speed after slowness
    pub fn effective_speed(&self) -> f32 {
        self.move_speed * (1.0 - SLOWNESS_PER_LEVEL * self.level(DebuffKind::Slowness)).max(0.0)
    }

    /// Attack damage after weakness
    pub fn effective_damage(&self) -> f32 {
        self.attack_damage * (1.0 - WEAKNESS_PER_LEVEL * self.level(DebuffKind::Weakness)).max(0.0)
    }

    /// Steps between attacks; nausea doubles it
    pub fn effective_interval(&self) -> u32 {
        if self.debuff(DebuffKind::Nausea).is_some() {
            self.attack_interval * 2
        } else {
            self.attack_interval
        }
    }

    /// Blindness halves reach
    pub fn effective_range(&self) -> f32 {
        if self.debuff(DebuffKind::Blindness).is_some() {
            self.attack_range * 0.5
        } else {
            self.attack_range
        }
    }

    fn info(&self) -> TargetInfo {
        TargetInfo {
            id: self.id,
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            alive: self.is_alive(),
        }
    }
}

/// Cylindrical obstacle that blocks sight and movement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pillar {
    pub center: Vec2,
    pub radius: f32,
}

impl Pillar {
    /// Does the horizontal segment `from`-`to` pass through the pillar?
    pub fn blocks(&self, from: Vec3, to: Vec3) -> bool {
        let a = from.xz();
        let b = to.xz();
        let ab = b - a;
        let length_sq = ab.length_squared();
        let t = if length_sq > 0.0 {
            ((self.center - a).dot(ab) / length_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (a + ab * t).distance(self.center) < self.radius
    }

    fn contains(&self, point: Vec3) -> bool {
        point.xz().distance(self.center) < self.radius
    }

    /// Move a point that ended up inside the pillar back to its surface
    fn push_out(&self, point: Vec3) -> Vec3 {
        let offset = point.xz() - self.center;
        let direction = offset.try_normalize().unwrap_or(Vec2::X);
        let surface = self.center + direction * self.radius;
        Vec3::new(surface.x, point.y, surface.y)
    }
}

/// World state for a headless encounter
#[derive(Resource, Debug, Clone)]
pub struct Arena {
    pub boss_position: Vec3,
    /// Velocity requested by the boss for the coming step
    pub boss_velocity: Vec3,
    pub challengers: Vec<Challenger>,
    pub half_extent: f32,
    pub pillars: Vec<Pillar>,
    /// Damage applied since the last drain
    pub damage_events: Vec<DamageDealtEvent>,
    /// Debuffs applied since the last drain
    pub debuff_events: Vec<DebuffAppliedEvent>,
}

impl Arena {
    /// Empty arena with the boss at the origin
    pub fn new(half_extent: f32) -> Self {
        Self {
            boss_position: Vec3::ZERO,
            boss_velocity: Vec3::ZERO,
            challengers: Vec::new(),
            half_extent,
            pillars: Vec::new(),
            damage_events: Vec::new(),
            debuff_events: Vec::new(),
        }
    }

    /// Arena populated from a match config. Challenger ids start at 1.
    pub fn from_config(config: &HeadlessMatchConfig) -> Self {
        let mut arena = Self::new(config.arena_half_extent);
        arena.pillars = config
            .pillars
            .iter()
            .map(|p| Pillar {
                center: Vec2::new(p[0], p[1]),
                radius: p[2],
            })
            .collect();

        let count = config.challengers.len() as f32;
        for (i, challenger) in config.challengers.iter().enumerate() {
            let position = match challenger.spawn {
                Some([x, y, z]) => Vec3::new(x, y, z),
                None => {
                    let angle = i as f32 / count * std::f32::consts::TAU;
                    Vec3::new(angle.sin(), 0.0, angle.cos()) * SPAWN_RING_RADIUS
                }
            };
            arena.add_challenger(challenger, position);
        }
        arena
    }

    pub fn add_challenger(&mut self, config: &ChallengerConfig, position: Vec3) -> EntityRef {
        let id = EntityRef(self.challengers.len() as u32 + 1);
        self.challengers
            .push(Challenger::from_config(id, config, position));
        id
    }

    pub fn challenger(&self, id: EntityRef) -> Option<&Challenger> {
        self.challengers.iter().find(|c| c.id == id)
    }

    pub fn challenger_mut(&mut self, id: EntityRef) -> Option<&mut Challenger> {
        self.challengers.iter_mut().find(|c| c.id == id)
    }

    pub fn any_alive(&self) -> bool {
        self.challengers.iter().any(Challenger::is_alive)
    }

    fn line_clear(&self, from: Vec3, to: Vec3) -> bool {
        !self.pillars.iter().any(|p| p.blocks(from, to))
    }

    fn in_bounds(&self, point: Vec3) -> bool {
        point.x.abs() <= self.half_extent
            && point.z.abs() <= self.half_extent
            && !self.pillars.iter().any(|p| p.contains(point))
    }

    fn confine(&self, mut point: Vec3) -> Vec3 {
        point.x = point.x.clamp(-self.half_extent, self.half_extent);
        point.z = point.z.clamp(-self.half_extent, self.half_extent);
        for pillar in &self.pillars {
            if pillar.contains(point) {
                point = pillar.push_out(point);
            }
        }
        point
    }

    /// Challenger decisions for one step: approach or keep distance, and
    /// return the hits landed on the boss as `(attacker, amount)`.
    pub fn challenger_turns(&mut self) -> Vec<(EntityRef, f32)> {
        let boss = self.boss_position;
        let mut hits = Vec::new();

        for index in 0..self.challengers.len() {
            if !self.challengers[index].is_alive() {
                continue;
            }
            let position = self.challengers[index].position;
            let visible = self.line_clear(position, boss);
            let challenger = &mut self.challengers[index];
            let distance = position.distance(boss);
            let toward = horizontal_direction(position, boss);

            let speed = challenger.effective_speed();
            let preferred = challenger.keep_distance.max(challenger.effective_range() * 0.8);
            challenger.walk = if distance > preferred {
                toward * speed
            } else if challenger.keep_distance > 0.0 && distance < challenger.keep_distance - 1.0 {
                -toward * speed
            } else {
                Vec3::ZERO
            };

            challenger.attack_timer = challenger.attack_timer.saturating_sub(1);
            if challenger.attack_timer == 0 && visible && distance <= challenger.effective_range() {
                challenger.attack_timer = challenger.effective_interval();
                let amount = challenger.effective_damage();
                if amount > 0.0 {
                    hits.push((challenger.id, amount));
                }
            }
        }
        hits
    }

    /// Count down debuffs and immunity, and apply wither
    pub fn tick_effects(&mut self, tick: u64) {
        for challenger in self.challengers.iter_mut().filter(|c| c.is_alive()) {
            challenger.hurt_immunity = challenger.hurt_immunity.saturating_sub(1);

            if let Some(level) = challenger.debuff(DebuffKind::Wither).map(|d| d.amplifier) {
                let interval = (WITHER_INTERVAL >> level.min(5)).max(1);
                if tick % u64::from(interval) == 0 {
                    let lost = challenger.health.min(1.0);
                    challenger.health -= lost;
                    challenger.damage_taken += lost;
                }
            }

            for debuff in challenger.debuffs.iter_mut() {
                debuff.ticks = debuff.ticks.saturating_sub(1);
            }
            challenger.debuffs.retain(|d| d.ticks > 0);
        }
    }

    /// Move everything by one step
    pub fn integrate(&mut self) {
        let boss_step = Vec3::new(self.boss_velocity.x, 0.0, self.boss_velocity.z);
        self.boss_position = self.confine(self.boss_position + boss_step);

        for index in 0..self.challengers.len() {
            let challenger = &mut self.challengers[index];
            if !challenger.is_alive() {
                challenger.held = None;
                continue;
            }
            let motion = match challenger.held.take() {
                Some(pull) => pull,
                None => challenger.walk + challenger.knockback,
            };
            let mut next = challenger.position + motion;

            challenger.knockback.x *= KNOCKBACK_FRICTION;
            challenger.knockback.z *= KNOCKBACK_FRICTION;
            challenger.knockback.y -= GRAVITY;
            if next.y <= 0.0 {
                next.y = 0.0;
                challenger.knockback.y = challenger.knockback.y.max(0.0);
            }

            let confined = self.confine(next);
            self.challengers[index].position = confined;
        }
    }

    /// Take the damage and debuff records accumulated since the last call
    pub fn drain_events(&mut self) -> (Vec<DamageDealtEvent>, Vec<DebuffAppliedEvent>) {
        (
            std::mem::take(&mut self.damage_events),
            std::mem::take(&mut self.debuff_events),
        )
    }
}

impl WorldQuery for Arena {
    fn agent_position(&self) -> Vec3 {
        self.boss_position
    }

    fn set_agent_velocity(&mut self, velocity: Vec3) {
        self.boss_velocity = velocity;
    }

    fn teleport_agent(&mut self, destination: Vec3) -> bool {
        if !self.in_bounds(destination) {
            return false;
        }
        self.boss_position = Vec3::new(destination.x, 0.0, destination.z);
        true
    }

    fn actor(&self, id: EntityRef) -> Option<TargetInfo> {
        self.challenger(id).map(Challenger::info)
    }

    fn actors_within(&self, center: Vec3, radius: f32) -> Candidates {
        self.challengers
            .iter()
            .filter(|c| c.is_alive() && c.position.distance(center) <= radius)
            .map(Challenger::info)
            .collect()
    }

    fn probe_volume(&self, min: Vec3, max: Vec3) -> Candidates {
        self.challengers
            .iter()
            .filter(|c| {
                c.is_alive()
                    && c.position.cmpge(min).all()
                    && c.position.cmple(max).all()
            })
            .map(Challenger::info)
            .collect()
    }

    fn can_see(&self, from: Vec3, target: EntityRef) -> bool {
        self.challenger(target)
            .is_some_and(|c| self.line_clear(from, c.position))
    }

    fn set_actor_velocity(&mut self, id: EntityRef, velocity: Vec3) {
        if let Some(challenger) = self.challenger_mut(id) {
            challenger.held = Some(velocity);
            challenger.knockback = Vec3::ZERO;
        }
    }

    fn push_actor(&mut self, id: EntityRef, impulse: Vec3) {
        if let Some(challenger) = self.challenger_mut(id) {
            challenger.knockback += impulse;
        }
    }

    fn damage_actor(&mut self, id: EntityRef, amount: f32, kind: AttackKind) {
        let Some(challenger) = self.challenger_mut(id) else {
            return;
        };
        if !challenger.is_alive() || amount <= 0.0 {
            return;
        }
        let applied = if challenger.hurt_immunity > 0 {
            0.0
        } else {
            amount.min(challenger.health)
        };
        challenger.health -= applied;
        challenger.damage_taken += applied;
        let killing_blow = applied > 0.0 && !challenger.is_alive();
        if killing_blow {
            info!("{} was slain by {}", challenger.name, kind.name());
        }
        self.damage_events.push(DamageDealtEvent {
            target: id,
            kind,
            amount,
            applied,
            killing_blow,
        });
    }

    fn apply_debuff(&mut self, id: EntityRef, debuff: Debuff) {
        let Some(challenger) = self.challenger_mut(id) else {
            return;
        };
        if !challenger.is_alive() {
            return;
        }
        match challenger.debuffs.iter_mut().find(|d| d.kind == debuff.kind) {
            Some(existing) => {
                existing.ticks = existing.ticks.max(debuff.ticks);
                existing.amplifier = existing.amplifier.max(debuff.amplifier);
            }
            None => challenger.debuffs.push(debuff),
        }
        self.debuff_events
            .push(DebuffAppliedEvent { target: id, debuff });
    }

    fn grant_hurt_immunity(&mut self, id: EntityRef, ticks: u32) {
        if let Some(challenger) = self.challenger_mut(id) {
            challenger.hurt_immunity = challenger.hurt_immunity.max(ticks);
        }
    }

    fn send_feedback(&mut self, id: EntityRef, feedback: Feedback) {
        if let Some(challenger) = self.challenger_mut(id) {
            challenger.cues_received += 1;
            debug!("{} receives {:?}", challenger.name, feedback);
        }
    }
}

impl Mitigation for Arena {
    fn is_mitigating(&self, target: EntityRef) -> bool {
        self.challenger(target)
            .is_some_and(|c| c.is_alive() && c.guards && c.guard_durability > 0)
    }

    fn consume_durability(&mut self, target: EntityRef, amount: u32) -> GuardOutcome {
        let Some(challenger) = self.challenger_mut(target) else {
            return GuardOutcome::Broken;
        };
        challenger.guard_durability = challenger.guard_durability.saturating_sub(amount);
        if challenger.guard_durability == 0 {
            challenger.guards = false;
            info!("{}'s guard breaks", challenger.name);
            GuardOutcome::Broken
        } else {
            GuardOutcome::Intact
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenger(name: &str) -> ChallengerConfig {
        ChallengerConfig::named(name)
    }

    #[test]
    fn test_pillar_blocks_sight() {
        let mut arena = Arena::new(30.0);
        let id = arena.add_challenger(&challenger("A"), Vec3::new(10.0, 0.0, 0.0));
        assert!(arena.can_see(Vec3::ZERO, id));

        arena.pillars.push(Pillar {
            center: Vec2::new(5.0, 0.0),
            radius: 1.0,
        });
        assert!(!arena.can_see(Vec3::ZERO, id));
        assert!(arena.can_see(Vec3::new(0.0, 0.0, 8.0), id));
    }

    #[test]
    fn test_hurt_immunity_blocks_damage() {
        let mut arena = Arena::new(30.0);
        let id = arena.add_challenger(&challenger("A"), Vec3::X);
        arena.grant_hurt_immunity(id, 5);
        arena.damage_actor(id, 6.0, AttackKind::Beam);
        assert_eq!(arena.challenger(id).unwrap().health, 20.0);

        let (damage, _) = arena.drain_events();
        assert_eq!(damage.len(), 1);
        assert_eq!(damage[0].applied, 0.0);
    }

    #[test]
    fn test_guard_breaks_when_durability_runs_out() {
        let mut arena = Arena::new(30.0);
        let mut config = challenger("A");
        config.guards = true;
        config.guard_durability = 8;
        let id = arena.add_challenger(&config, Vec3::X);

        assert!(arena.is_mitigating(id));
        assert_eq!(arena.consume_durability(id, 5), GuardOutcome::Intact);
        assert_eq!(arena.consume_durability(id, 5), GuardOutcome::Broken);
        assert!(!arena.is_mitigating(id));
    }

    #[test]
    fn test_knockback_decays_and_lands() {
        let mut arena = Arena::new(30.0);
        let id = arena.add_challenger(&challenger("A"), Vec3::ZERO);
        arena.push_actor(id, Vec3::new(2.0, 1.0, 0.0));
        for _ in 0..60 {
            arena.integrate();
        }
        let c = arena.challenger(id).unwrap();
        assert!(c.position.x > 2.0);
        assert_eq!(c.position.y, 0.0);
        assert!(c.knockback.x.abs() < 0.01);
    }

    #[test]
    fn test_teleport_rejects_out_of_bounds() {
        let mut arena = Arena::new(10.0);
        assert!(!arena.teleport_agent(Vec3::new(50.0, 0.0, 0.0)));
        assert!(arena.teleport_agent(Vec3::new(3.0, 0.0, 3.0)));
        assert_eq!(arena.agent_position(), Vec3::new(3.0, 0.0, 3.0));
    }
}
