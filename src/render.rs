//! Workout renderer - turns a day of exercises into a display tree
//!
//! Pure with respect to its inputs: exercises and completion state are only
//! read, so rendering the same pair twice gives the same view.

use crate::completion::CompletionStore;
use crate::workout::{Exercise, ExerciseKind, Progression, WorkoutDay};

/// Why an exercise is shown as part of a superset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupersetLink {
    None,
    /// `superset` flag or `setGroup` in the plan
    Explicit,
    /// Same category and rest as the next exercise
    LeadsNext,
    /// Previous exercise leads into this one
    FollowsPrevious,
}

impl SupersetLink {
    pub fn is_superset(&self) -> bool {
        !matches!(self, SupersetLink::None)
    }
}

/// One-step lookahead pairing. Only adjacent pairs are compared, so in a
/// chain of three matching exercises the middle one leads rather than follows.
pub fn detect_supersets(exercises: &[Exercise]) -> Vec<SupersetLink> {
    let leads: Vec<bool> = exercises
        .iter()
        .enumerate()
        .map(|(i, ex)| {
            exercises
                .get(i + 1)
                .is_some_and(|next| ex.category == next.category && ex.rest == next.rest)
        })
        .collect();

    exercises
        .iter()
        .enumerate()
        .map(|(i, ex)| {
            if ex.is_explicit_superset() {
                SupersetLink::Explicit
            } else if leads[i] {
                SupersetLink::LeadsNext
            } else if i > 0 && leads[i - 1] {
                SupersetLink::FollowsPrevious
            } else {
                SupersetLink::None
            }
        })
        .collect()
}

/// Rendered day
#[derive(Debug, Clone, PartialEq)]
pub enum WorkoutView {
    RestDay,
    Exercises(Vec<ExerciseCard>),
}

impl WorkoutView {
    pub fn cards(&self) -> &[ExerciseCard] {
        match self {
            WorkoutView::RestDay => &[],
            WorkoutView::Exercises(cards) => cards,
        }
    }

    /// Flattened (exercise id, set number) controls in display order
    pub fn set_controls(&self) -> Vec<&SetControl> {
        self.cards()
            .iter()
            .flat_map(|c| c.sets.iter().map(|row| &row.control))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseCard {
    pub exercise_id: String,
    pub name: String,
    pub kind: ExerciseKind,
    pub icon: &'static str,
    pub category: Option<String>,
    pub muscles: Option<String>,
    pub superset: SupersetLink,
    pub params: Vec<Param>,
    pub sets: Vec<SetRow>,
    pub notes: Option<String>,
    pub progression: Option<ProgressionView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub label: &'static str,
    pub value: String,
}

/// Target of a set toggle, handed back by the display surface
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetControl {
    pub exercise_id: String,
    pub set_number: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetRow {
    pub number: u32,
    pub reps: String,
    pub weight: Option<String>,
    pub rest: Option<String>,
    pub completed: bool,
    pub control: SetControl,
}

impl SetRow {
    pub fn check_icon(&self) -> &'static str {
        if self.completed { "✓" } else { " " }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionView {
    pub from: String,
    pub to: String,
}

impl ProgressionView {
    pub fn label(&self) -> String {
        format!("{} → {}", self.from, self.to)
    }
}

/// Render a day, `None` or an empty day is a rest day
pub fn render_day<C>(day: Option<&WorkoutDay>, completion: &C) -> WorkoutView
where
    C: CompletionStore + ?Sized,
{
    let exercises = match day {
        Some(d) if !d.is_rest_day() => &d.exercises,
        _ => return WorkoutView::RestDay,
    };

    let links = detect_supersets(exercises);
    let cards = exercises
        .iter()
        .zip(links)
        .map(|(ex, link)| render_exercise(ex, link, completion))
        .collect();

    WorkoutView::Exercises(cards)
}

pub fn render_exercise<C>(
    exercise: &Exercise,
    superset: SupersetLink,
    completion: &C,
) -> ExerciseCard
where
    C: CompletionStore + ?Sized,
{
    let muscles = if exercise.muscles.is_empty() {
        None
    } else {
        Some(exercise.muscles.join(", "))
    };

    ExerciseCard {
        exercise_id: exercise.id.clone(),
        name: exercise.name.clone(),
        kind: exercise.kind,
        icon: exercise.kind.emoji(),
        category: exercise.category.clone().filter(|c| !c.is_empty()),
        muscles,
        superset,
        params: render_params(exercise),
        sets: render_sets(exercise, completion),
        notes: exercise.notes.clone().filter(|n| !n.is_empty()),
        progression: exercise.progression.map(render_progression),
    }
}

/// Present parameters in fixed order: sets, reps, weight, RPE, rest, tempo
pub fn render_params(exercise: &Exercise) -> Vec<Param> {
    let mut params = Vec::new();

    if exercise.sets > 0 {
        params.push(Param {
            label: "SETS",
            value: exercise.sets.to_string(),
        });
    }
    if let Some(reps) = exercise.reps.as_ref().filter(|r| r.is_present()) {
        params.push(Param {
            label: "REPS",
            value: reps.to_string(),
        });
    }
    if let Some(weight) = present(exercise.weight) {
        params.push(Param {
            label: "WEIGHT",
            value: kg(weight),
        });
    }
    if let Some(rpe) = present(exercise.rpe) {
        params.push(Param {
            label: "RPE",
            value: rpe.to_string(),
        });
    }
    if let Some(rest) = exercise.rest_secs() {
        params.push(Param {
            label: "REST",
            value: format!("{}s", rest),
        });
    }
    if let Some(tempo) = exercise.tempo.as_ref().filter(|t| !t.is_empty()) {
        params.push(Param {
            label: "TEMPO",
            value: tempo.clone(),
        });
    }

    params
}

pub fn render_sets<C>(exercise: &Exercise, completion: &C) -> Vec<SetRow>
where
    C: CompletionStore + ?Sized,
{
    let reps = exercise
        .reps
        .as_ref()
        .map(|r| format!("{} reps", r))
        .unwrap_or_default();
    let weight = present(exercise.weight).map(kg);
    let rest = exercise.rest_secs().map(|r| format!("{}s rest", r));

    (1..=exercise.sets)
        .map(|number| SetRow {
            number,
            reps: reps.clone(),
            weight: weight.clone(),
            rest: rest.clone(),
            completed: completion.is_completed(&exercise.id, number),
            control: SetControl {
                exercise_id: exercise.id.clone(),
                set_number: number,
            },
        })
        .collect()
}

fn render_progression(progression: Progression) -> ProgressionView {
    ProgressionView {
        from: kg(progression.from),
        to: kg(progression.to),
    }
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

fn kg(value: f64) -> String {
    format!("{}kg", value)
}
