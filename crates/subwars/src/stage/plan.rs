//! # Stage Tables
//!
//! A campaign is an ordered list of stages. Each normal stage limits how
//! many submarines of every type appear and gives the ranges their speed,
//! depth and radar radius are drawn from. A store stage spawns the three
//! store icons and waits for the player to leave.
//!
//! ```toml
//! [[stages]]
//! kind = "normal"
//! fish = 4
//! water_current = 0.5
//!
//! [stages.submarines.I]
//! count = 3
//! speed = [40.0, 60.0]
//! depth = [250.0, 400.0]
//! radar = [0.0, 0.0]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use subwars_core::SubmarineType;

use crate::error::{StageError, StageResult};

/// What a stage asks of the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Submarines and fish spawn until every submarine is gone.
    #[default]
    Normal,
    /// The store: buy lives or missiles, then leave.
    Store,
}

/// Spawn limits and value ranges for one submarine type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmarineWave {
    /// How many submarines of this type the stage spawns.
    pub count: u32,
    /// Absolute speed range.
    pub speed: [f32; 2],
    /// Vertical spawn range.
    pub depth: [f32; 2],
    /// Radar radius range. Ignored for types without a weapon.
    pub radar: [f32; 2],
    /// Points awarded for destroying one.
    pub score: u32,
}

impl SubmarineWave {
    fn ranges(&self) -> [(&'static str, [f32; 2]); 3] {
        [("speed", self.speed), ("depth", self.depth), ("radar", self.radar)]
    }
}

/// Per-type submarine waves, keyed the way the table spells them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmarineWaves {
    /// Type I waves.
    #[serde(rename = "I")]
    pub one: SubmarineWave,
    /// Type II waves.
    #[serde(rename = "II")]
    pub two: SubmarineWave,
    /// Type III waves.
    #[serde(rename = "III")]
    pub three: SubmarineWave,
}

impl SubmarineWaves {
    /// The wave for `sub_type`.
    #[must_use]
    pub fn get(&self, sub_type: SubmarineType) -> &SubmarineWave {
        match sub_type {
            SubmarineType::I => &self.one,
            SubmarineType::II => &self.two,
            SubmarineType::III => &self.three,
        }
    }
}

/// One stage of the campaign.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagePlan {
    /// Normal or store.
    pub kind: StageKind,
    /// Submarine waves per type.
    pub submarines: SubmarineWaves,
    /// Fish released over the stage.
    pub fish: u32,
    /// Horizontal drift applied to the boat.
    pub water_current: f32,
}

impl StagePlan {
    /// Submarines the player must get rid of to clear the stage.
    #[must_use]
    pub fn total_submarines(&self) -> u32 {
        SubmarineType::ALL
            .iter()
            .map(|&sub_type| self.submarines.get(sub_type).count)
            .sum()
    }

    /// A store stage.
    #[must_use]
    pub fn store() -> Self {
        Self {
            kind: StageKind::Store,
            ..Self::default()
        }
    }

    fn validate(&self, stage: u32) -> StageResult<()> {
        if !self.water_current.is_finite() {
            return Err(StageError::Invalid {
                stage,
                reason: "water current must be finite".into(),
            });
        }

        for sub_type in SubmarineType::ALL {
            let wave = self.submarines.get(sub_type);
            for (name, [low, high]) in wave.ranges() {
                if !(low.is_finite() && high.is_finite() && low <= high) {
                    return Err(StageError::Invalid {
                        stage,
                        reason: format!("type {sub_type:?} {name} range [{low}, {high}] is empty"),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_depths(&self, stage: u32, minimum_depth: f32) -> StageResult<()> {
        for sub_type in SubmarineType::ALL {
            let wave = self.submarines.get(sub_type);
            if wave.count > 0 && wave.depth[0] < minimum_depth {
                return Err(StageError::Invalid {
                    stage,
                    reason: format!(
                        "type {sub_type:?} depth {} is above the minimum submarine depth {minimum_depth}",
                        wave.depth[0]
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The whole campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageTable {
    /// Stages in play order. Stage numbers are one-based.
    pub stages: Vec<StagePlan>,
}

impl Default for StageTable {
    fn default() -> Self {
        Self::campaign()
    }
}

impl StageTable {
    /// The built-in campaign: three fights with a store after each of the
    /// first two.
    #[must_use]
    pub fn campaign() -> Self {
        let wave = |count, speed: [f32; 2], depth: [f32; 2], radar: [f32; 2], score| SubmarineWave {
            count,
            speed,
            depth,
            radar,
            score,
        };

        let first = StagePlan {
            kind: StageKind::Normal,
            submarines: SubmarineWaves {
                one: wave(5, [40.0, 60.0], [260.0, 620.0], [0.0, 0.0], 10),
                two: SubmarineWave::default(),
                three: SubmarineWave::default(),
            },
            fish: 3,
            water_current: 0.0,
        };
        let second = StagePlan {
            kind: StageKind::Normal,
            submarines: SubmarineWaves {
                one: wave(5, [50.0, 70.0], [260.0, 620.0], [0.0, 0.0], 10),
                two: wave(3, [40.0, 60.0], [300.0, 560.0], [200.0, 320.0], 20),
                three: SubmarineWave::default(),
            },
            fish: 4,
            water_current: 0.5,
        };
        let third = StagePlan {
            kind: StageKind::Normal,
            submarines: SubmarineWaves {
                one: wave(6, [60.0, 80.0], [260.0, 620.0], [0.0, 0.0], 10),
                two: wave(4, [50.0, 70.0], [300.0, 560.0], [240.0, 360.0], 20),
                three: wave(2, [40.0, 50.0], [340.0, 520.0], [280.0, 420.0], 40),
            },
            fish: 5,
            water_current: -0.5,
        };

        Self {
            stages: vec![first, StagePlan::store(), second, StagePlan::store(), third],
        }
    }

    /// Parses a table from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// [`StageError::Parse`] or [`StageError::Invalid`].
    pub fn from_toml_str(text: &str) -> StageResult<Self> {
        let table: Self = toml::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    /// Reads and parses a table file.
    ///
    /// # Errors
    ///
    /// [`StageError::Io`] if the file cannot be read, otherwise see
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> StageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| StageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), stages = table.len(), "stage table loaded");
        Ok(table)
    }

    /// Checks every stage.
    ///
    /// # Errors
    ///
    /// [`StageError::Invalid`] naming the first bad stage.
    pub fn validate(&self) -> StageResult<()> {
        if self.stages.is_empty() {
            return Err(StageError::Invalid {
                stage: 0,
                reason: "the table has no stages".into(),
            });
        }
        for (number, plan) in (1u32..).zip(&self.stages) {
            plan.validate(number)?;
        }
        Ok(())
    }

    /// Checks that every wave that spawns stays at or below
    /// `minimum_depth`, where the factories accept submarines.
    ///
    /// # Errors
    ///
    /// [`StageError::Invalid`] naming the first stage with a shallow wave.
    pub fn check_depths(&self, minimum_depth: f32) -> StageResult<()> {
        for (number, plan) in (1u32..).zip(&self.stages) {
            plan.check_depths(number, minimum_depth)?;
        }
        Ok(())
    }

    /// The plan for one-based stage `number`.
    #[must_use]
    pub fn stage(&self, number: u32) -> Option<&StagePlan> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.stages.get(index)
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the table has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_is_valid() {
        let table = StageTable::campaign();
        table.validate().unwrap();
        assert_eq!(table.stage(2).unwrap().kind, StageKind::Store);
        assert!(table.stage(0).is_none());
        assert!(table.stage(6).is_none());
    }

    #[test]
    fn test_parse_table() {
        let text = r#"
            [[stages]]
            fish = 2
            water_current = 0.25

            [stages.submarines.II]
            count = 4
            speed = [10.0, 20.0]
            depth = [300.0, 400.0]
            radar = [100.0, 150.0]
            score = 20

            [[stages]]
            kind = "store"
        "#;

        let table = StageTable::from_toml_str(text).unwrap();
        assert_eq!(table.len(), 2);

        let first = table.stage(1).unwrap();
        assert_eq!(first.kind, StageKind::Normal);
        assert_eq!(first.total_submarines(), 4);
        assert_eq!(first.submarines.get(SubmarineType::II).score, 20);
        assert_eq!(first.submarines.get(SubmarineType::I).count, 0);
        assert_eq!(table.stage(2).unwrap().kind, StageKind::Store);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let text = r#"
            [[stages]]
            [stages.submarines.I]
            count = 1
            speed = [60.0, 40.0]
        "#;

        let err = StageTable::from_toml_str(text).unwrap_err();
        assert!(matches!(err, StageError::Invalid { stage: 1, .. }), "{err}");
    }

    #[test]
    fn test_rejects_shallow_wave() {
        let text = r#"
            [[stages]]
            [stages.submarines.III]
            count = 2
            speed = [40.0, 40.0]
            depth = [10.0, 300.0]
        "#;

        let table = StageTable::from_toml_str(text).unwrap();
        let err = table.check_depths(20.0).unwrap_err();
        assert!(matches!(err, StageError::Invalid { stage: 1, .. }), "{err}");

        // Waves that never spawn are not placed anywhere.
        StageTable::campaign().check_depths(20.0).unwrap();
    }

    #[test]
    fn test_rejects_empty_table() {
        let err = StageTable::from_toml_str("stages = []").unwrap_err();
        assert!(matches!(err, StageError::Invalid { stage: 0, .. }));
    }
}
