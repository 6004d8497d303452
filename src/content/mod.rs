//! Static site catalog.
//!
//! The informational pages (features, kits, arenas, staff, commands) are
//! fixed editorial content, compiled in and served as-is.

use serde::Serialize;

/// A headline server feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

/// A battle kit and its loadout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Kit {
    pub name: &'static str,
    pub description: &'static str,
    pub loadout: &'static [&'static str],
}

/// A duel arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arena {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Moderator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffMember {
    pub name: &'static str,
    pub role: StaffRole,
}

/// An in-game command shown on the commands page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameCommand {
    pub usage: &'static str,
    pub description: &'static str,
}

/// The whole catalog, built once and shared.
#[derive(Debug, Clone)]
pub struct ContentCatalog {
    features: Vec<Feature>,
    kits: Vec<Kit>,
    arenas: Vec<Arena>,
    staff: Vec<StaffMember>,
    commands: Vec<GameCommand>,
}

impl ContentCatalog {
    pub fn builtin() -> Self {
        Self {
            features: vec![
                Feature {
                    title: "Queue System",
                    description: "Join the queue with /queue and get matched instantly. \
                                  The matchmaker pairs you with opponents at your level.",
                },
                Feature {
                    title: "Duel Mode",
                    description: "Challenge any player with /duel. Set up private matches \
                                  with friends and put your skills to the test.",
                },
                Feature {
                    title: "Custom Arenas",
                    description: "Fight across unique arenas: Desert, North Pole, Nether \
                                  and the End. Every arena plays differently.",
                },
            ],
            kits: vec![
                Kit {
                    name: "Axe Kit",
                    description: "Heavy axe strikes, built for ranged pressure",
                    loadout: &[
                        "Diamond Axe",
                        "Diamond Sword",
                        "Crossbow + 5 Arrows",
                        "Full Diamond Armor",
                        "Shield",
                    ],
                },
                Kit {
                    name: "Sword Kit",
                    description: "Classic sword combos, nothing else",
                    loadout: &["Diamond Sword", "Full Diamond Armor"],
                },
                Kit {
                    name: "Crystal Kit",
                    description: "Tactical warfare with end crystals",
                    loadout: &[
                        "Diamond Sword",
                        "16 End Crystals",
                        "Full Netherite Armor",
                        "Golden Apple x16",
                    ],
                },
                Kit {
                    name: "UHC Kit",
                    description: "Survival kit for Ultra Hardcore mode",
                    loadout: &[
                        "Diamond Sword (Sharpness II)",
                        "Bow + 64 Arrows",
                        "Full Diamond Armor (Protection II)",
                        "Golden Apple x8",
                        "Lava Bucket",
                    ],
                },
                Kit {
                    name: "Speed Kit",
                    description: "Fast-paced aggression on speed potions",
                    loadout: &[
                        "Diamond Sword",
                        "Full Diamond Armor",
                        "Speed II Potion x3",
                        "Strength Potion x2",
                    ],
                },
                Kit {
                    name: "Archer Kit",
                    description: "Long-range marksman kit",
                    loadout: &[
                        "Power V Bow",
                        "64 Arrows",
                        "Diamond Sword",
                        "Full Chainmail Armor",
                    ],
                },
            ],
            arenas: vec![
                Arena {
                    name: "Desert Arena",
                    description: "Strategic combat among the dunes, in the shadow of \
                                  ancient ruins. Wide open ground rewards fast footwork.",
                },
                Arena {
                    name: "North Pole",
                    description: "Keep your cool on the glaciers under the northern \
                                  lights. Slippery footing demands careful play.",
                },
                Arena {
                    name: "Nether Arena",
                    description: "Lava lakes and netherrack platforms. Only the boldest \
                                  survive the fire and brimstone.",
                },
                Arena {
                    name: "End Dimension",
                    description: "Floating islands over the void. Not falling is \
                                  priority one.",
                },
            ],
            staff: vec![
                StaffMember {
                    name: "Curseebabuss",
                    role: StaffRole::Admin,
                },
                StaffMember {
                    name: "dalha3567",
                    role: StaffRole::Admin,
                },
                StaffMember {
                    name: "tolga",
                    role: StaffRole::Moderator,
                },
            ],
            commands: vec![
                GameCommand {
                    usage: "/queue",
                    description: "Join the automatic matchmaking queue",
                },
                GameCommand {
                    usage: "/duel [player]",
                    description: "Send a duel request to a specific player",
                },
            ],
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn kits(&self) -> &[Kit] {
        &self.kits
    }

    pub fn arenas(&self) -> &[Arena] {
        &self.arenas
    }

    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }

    pub fn admins(&self) -> Vec<&StaffMember> {
        self.staff
            .iter()
            .filter(|s| s.role == StaffRole::Admin)
            .collect()
    }

    pub fn moderators(&self) -> Vec<&StaffMember> {
        self.staff
            .iter()
            .filter(|s| s.role == StaffRole::Moderator)
            .collect()
    }

    pub fn commands(&self) -> &[GameCommand] {
        &self.commands
    }
}

impl Default for ContentCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
