//! Dashboard text for the display consumer
//!
//! Toggles only change what gets drawn; the pipeline never sees them.

use fca_core::SimulationSnapshot;

/// Which dashboard lines are visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudToggles {
    pub show_speed: bool,
    pub show_ttc: bool,
    pub show_distance: bool,
}

impl Default for HudToggles {
    fn default() -> Self {
        Self { show_speed: true, show_ttc: true, show_distance: true }
    }
}

impl HudToggles {
    /// `s` speed, `t` TTC, `d` distance. Returns whether the key was bound.
    pub fn apply_key(&mut self, key: char) -> bool {
        match key.to_ascii_lowercase() {
            's' => self.show_speed = !self.show_speed,
            't' => self.show_ttc = !self.show_ttc,
            'd' => self.show_distance = !self.show_distance,
            _ => return false,
        }
        true
    }

    /// Hide items named in a comma-separated list (`speed,ttc,distance`).
    pub fn hide(&mut self, names: &str) -> anyhow::Result<()> {
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match name {
                "speed" => self.show_speed = false,
                "ttc" => self.show_ttc = false,
                "distance" => self.show_distance = false,
                other => anyhow::bail!("unknown HUD item: {}", other),
            }
        }
        Ok(())
    }
}

/// One dashboard refresh.
pub fn render(snapshot: &SimulationSnapshot, toggles: &HudToggles) -> String {
    let mut parts = Vec::with_capacity(4);
    let result = &snapshot.result;

    if toggles.show_speed {
        parts.push(format!("Speed: {:.1} m/s", result.ego_speed));
    }
    if toggles.show_ttc {
        parts.push(format!("TTC: {:.2} s", result.ttc));
    }
    if toggles.show_distance {
        parts.push(format!("Obstacle Distance: {:.2} m", result.distance));
    }
    if snapshot.braking() {
        parts.push("BRAKING".to_string());
    }

    parts.join(" | ")
}
