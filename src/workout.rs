//! Workout definitions - program, days and exercises

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default program length in weeks
pub const DEFAULT_MAX_WEEKS: u32 = 26;

/// Tempo prescribed for each 4-week block, cycled
pub const BLOCK_TEMPOS: &[&str] = &["3-1-2", "2-0-2", "4-0-1", "1-0-1", "3-0-3", "2-1-1"];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    #[default]
    Strength,
    Cardio,
}

impl ExerciseKind {
    pub fn emoji(&self) -> &'static str {
        match self {
            ExerciseKind::Strength => "💪",
            ExerciseKind::Cardio => "🔥",
        }
    }
}

/// Rep target: a plain count or a description ("AMRAP", "8-12", "30s")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Reps {
    Count(u32),
    Text(String),
}

impl Reps {
    /// Zero counts and blank text carry no information
    pub fn is_present(&self) -> bool {
        match self {
            Reps::Count(n) => *n > 0,
            Reps::Text(s) => !s.trim().is_empty(),
        }
    }
}

impl fmt::Display for Reps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reps::Count(n) => write!(f, "{}", n),
            Reps::Text(s) => f.write_str(s),
        }
    }
}

/// Planned weight increase across a block
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Progression {
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ExerciseKind,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub muscles: Vec<String>,
    #[serde(default)]
    pub sets: u32,
    #[serde(default)]
    pub reps: Option<Reps>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub rpe: Option<f64>,
    /// Rest after each set, seconds
    #[serde(default)]
    pub rest: Option<u32>,
    #[serde(default)]
    pub tempo: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub superset: Option<bool>,
    #[serde(default)]
    pub set_group: Option<String>,
    #[serde(default)]
    pub progression: Option<Progression>,
}

impl Exercise {
    /// Bare exercise with only an id and a name, the rest absent
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: ExerciseKind::Strength,
            category: None,
            muscles: Vec::new(),
            sets: 0,
            reps: None,
            weight: None,
            rpe: None,
            rest: None,
            tempo: None,
            notes: None,
            superset: None,
            set_group: None,
            progression: None,
        }
    }

    /// Marked as part of a superset by the plan itself
    pub fn is_explicit_superset(&self) -> bool {
        self.superset.unwrap_or(false)
            || self.set_group.as_deref().is_some_and(|g| !g.is_empty())
    }

    /// Rest duration when it is set and non-zero
    pub fn rest_secs(&self) -> Option<u32> {
        self.rest.filter(|r| *r > 0)
    }
}

/// One day of the program; no exercises means a rest day
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDay {
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl WorkoutDay {
    pub fn is_rest_day(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn find_exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }
}

/// Training program: the same days repeat every week
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub name: String,
    #[serde(default = "default_max_weeks")]
    pub max_weeks: u32,
    pub days: Vec<WorkoutDay>,
}

fn default_max_weeks() -> u32 {
    DEFAULT_MAX_WEEKS
}

impl Program {
    /// Load a program from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading program {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing program {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let program: Program = serde_json::from_str(raw)?;
        Ok(program)
    }

    pub fn day(&self, index: usize) -> Option<&WorkoutDay> {
        self.days.get(index)
    }

    /// Built-in hybrid program
    pub fn demo() -> Self {
        Self {
            name: "Hybrid Master 51".to_string(),
            max_weeks: DEFAULT_MAX_WEEKS,
            days: vec![
                WorkoutDay {
                    name: "Monday - Lower".to_string(),
                    exercises: vec![
                        strength("squat", "Goblet Squat", "legs", 4, 10, 27.5, 75)
                            .targeting(&["Quadriceps", "Glutes"])
                            .with_tempo("3-1-2")
                            .with_progression(27.5, 32.5),
                        strength("legpress", "Leg Press", "legs", 4, 10, 120.0, 75)
                            .targeting(&["Quadriceps", "Glutes"]),
                        strength("rdl", "Romanian Deadlift", "hinge", 3, 12, 60.0, 60)
                            .targeting(&["Hamstrings"])
                            .with_notes("Keep the bar close to the legs, neutral spine"),
                        strength("legcurl", "Leg Curl", "hinge", 3, 12, 40.0, 60)
                            .targeting(&["Hamstrings"]),
                        strength("calves", "Standing Calf Raise", "calves", 3, 15, 50.0, 45)
                            .targeting(&["Calves"]),
                    ],
                },
                WorkoutDay {
                    name: "Tuesday - Upper".to_string(),
                    exercises: vec![
                        strength("bench", "Dumbbell Bench Press", "push", 4, 8, 30.0, 90)
                            .targeting(&["Chest", "Triceps"])
                            .with_rpe(8.0),
                        strength("row", "Seated Cable Row", "pull", 4, 10, 55.0, 90)
                            .targeting(&["Back", "Biceps"]),
                        strength("ohp", "Overhead Press", "push", 3, 10, 20.0, 60)
                            .targeting(&["Shoulders"])
                            .in_superset(),
                        strength("facepull", "Face Pull", "pull", 3, 15, 15.0, 60)
                            .targeting(&["Rear delts"])
                            .in_superset(),
                    ],
                },
                WorkoutDay {
                    name: "Wednesday - Rest".to_string(),
                    exercises: Vec::new(),
                },
                WorkoutDay {
                    name: "Thursday - Conditioning".to_string(),
                    exercises: vec![Exercise {
                        kind: ExerciseKind::Cardio,
                        category: Some("conditioning".to_string()),
                        muscles: vec!["Full body".to_string()],
                        sets: 6,
                        reps: Some(Reps::Text("30s on".to_string())),
                        rest: Some(90),
                        notes: Some("Rower or bike, all-out effort".to_string()),
                        ..Exercise::new("intervals", "Interval Sprints")
                    }],
                },
            ],
        }
    }
}

fn strength(
    id: &str,
    name: &str,
    category: &str,
    sets: u32,
    reps: u32,
    weight: f64,
    rest: u32,
) -> Exercise {
    Exercise {
        category: Some(category.to_string()),
        sets,
        reps: Some(Reps::Count(reps)),
        weight: Some(weight),
        rest: Some(rest),
        ..Exercise::new(id, name)
    }
}

impl Exercise {
    fn targeting(mut self, muscles: &[&str]) -> Self {
        self.muscles = muscles.iter().map(|m| m.to_string()).collect();
        self
    }

    fn with_tempo(mut self, tempo: &str) -> Self {
        self.tempo = Some(tempo.to_string());
        self
    }

    fn with_rpe(mut self, rpe: f64) -> Self {
        self.rpe = Some(rpe);
        self
    }

    fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    fn with_progression(mut self, from: f64, to: f64) -> Self {
        self.progression = Some(Progression { from, to });
        self
    }

    fn in_superset(mut self) -> Self {
        self.superset = Some(true);
        self
    }
}

/// 4-week block a week belongs to (1-based)
pub fn block_for_week(week: u32) -> u32 {
    week.max(1).div_ceil(4)
}

pub fn tempo_for_block(block: u32) -> &'static str {
    let idx = (block.max(1) - 1) as usize % BLOCK_TEMPOS.len();
    BLOCK_TEMPOS[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_for_week() {
        assert_eq!(block_for_week(1), 1);
        assert_eq!(block_for_week(4), 1);
        assert_eq!(block_for_week(5), 2);
        assert_eq!(block_for_week(26), 7);
    }

    #[test]
    fn test_tempo_cycles_after_six_blocks() {
        assert_eq!(tempo_for_block(1), "3-1-2");
        assert_eq!(tempo_for_block(6), "2-1-1");
        assert_eq!(tempo_for_block(7), "3-1-2");
    }

    #[test]
    fn test_parse_program_json() {
        let raw = r#"{
            "name": "Test",
            "days": [
                {"name": "A", "exercises": [
                    {"id": "squat", "name": "Squat", "sets": 4, "reps": 10,
                     "weight": 80, "rest": 90},
                    {"id": "run", "name": "Run", "type": "cardio", "reps": "20 min",
                     "setGroup": "B1"}
                ]},
                {"name": "Off"}
            ]
        }"#;
        let program = Program::from_json(raw).unwrap();

        assert_eq!(program.max_weeks, DEFAULT_MAX_WEEKS);
        assert_eq!(program.days.len(), 2);
        let squat = &program.days[0].exercises[0];
        assert_eq!(squat.reps, Some(Reps::Count(10)));
        assert_eq!(squat.weight, Some(80.0));
        assert_eq!(squat.kind, ExerciseKind::Strength);

        let run = &program.days[0].exercises[1];
        assert_eq!(run.kind, ExerciseKind::Cardio);
        assert_eq!(run.reps, Some(Reps::Text("20 min".to_string())));
        assert!(run.is_explicit_superset());

        assert!(program.days[1].is_rest_day());
    }

    #[test]
    fn test_parse_invalid_json_is_error() {
        assert!(Program::from_json("{\"name\": 1}").is_err());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = Program::load(Path::new("/nonexistent/plan.json")).unwrap_err();
        assert!(err.to_string().contains("plan.json"));
    }

    #[test]
    fn test_rest_secs_ignores_zero() {
        let mut ex = Exercise::new("a", "A");
        ex.rest = Some(0);
        assert_eq!(ex.rest_secs(), None);
        ex.rest = Some(60);
        assert_eq!(ex.rest_secs(), Some(60));
    }

    #[test]
    fn test_reps_presence() {
        assert!(!Reps::Count(0).is_present());
        assert!(!Reps::Text("  ".to_string()).is_present());
        assert!(Reps::Text("AMRAP".to_string()).is_present());
        assert_eq!(Reps::Count(8).to_string(), "8");
    }

    #[test]
    fn test_demo_program_has_rest_day() {
        let program = Program::demo();
        assert!(program.days.iter().any(|d| d.is_rest_day()));
        assert!(program.day(0).unwrap().find_exercise("squat").is_some());
    }
}
