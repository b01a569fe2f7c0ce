use chrono::NaiveDateTime;
use diesel::{AsChangeset, Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::Serialize;
use std::fmt;

use crate::db::schema;

// User models
#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

// Plan models
#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::plans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Plan {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::plans)]
pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = schema::plans)]
pub struct UpdatePlan {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

// Workout models
#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::workouts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Workout {
    pub id: i32,
    pub name: Option<String>,
    pub date: NaiveDateTime,
}

impl Workout {
    /// The workout's name, or `Workout #<id>` when it was logged without one.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Workout #{}", self.id))
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::workouts)]
pub struct NewWorkout {
    pub name: Option<String>,
    pub date: NaiveDateTime,
}

impl NewWorkout {
    pub fn new(name: Option<String>, date: NaiveDateTime) -> Self {
        Self { name, date }
    }
}

// Exercise models
#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::exercises)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Exercise {
    pub id: i32,
    pub name: String,
    pub instructions: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::exercises)]
pub struct NewExercise {
    pub name: String,
    pub instructions: Option<String>,
}

// Set models
#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::sets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Set {
    pub id: i32,
    pub set_number: i32,
    pub weight: f64,
    pub repetitions: i32,
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Set {}: {:.1}kg x {} reps",
            self.set_number, self.weight, self.repetitions
        )
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::sets)]
pub struct NewSet {
    pub set_number: i32,
    pub weight: f64,
    pub repetitions: i32,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = schema::sets)]
pub struct UpdateSet {
    pub set_number: Option<i32>,
    pub weight: Option<f64>,
    pub repetitions: Option<i32>,
}

impl UpdateSet {
    pub fn is_empty(&self) -> bool {
        self.set_number.is_none() && self.weight.is_none() && self.repetitions.is_none()
    }
}

// Muscle models
#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::muscles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Muscle {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::muscles)]
pub struct NewMuscle {
    pub name: String,
}

// Link rows. Each is keyed by both ids and carries nothing else.
#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, Clone, Copy, PartialEq, Eq)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Workout))]
#[diesel(table_name = schema::user_workout)]
#[diesel(primary_key(user_id, workout_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserWorkout {
    pub user_id: i32,
    pub workout_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, Clone, Copy, PartialEq, Eq)]
#[diesel(belongs_to(Workout))]
#[diesel(belongs_to(Set))]
#[diesel(table_name = schema::workout_set)]
#[diesel(primary_key(workout_id, set_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutSet {
    pub workout_id: i32,
    pub set_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, Clone, Copy, PartialEq, Eq)]
#[diesel(belongs_to(Exercise))]
#[diesel(belongs_to(Muscle))]
#[diesel(table_name = schema::exercise_muscle)]
#[diesel(primary_key(exercise_id, muscle_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExerciseMuscle {
    pub exercise_id: i32,
    pub muscle_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, Clone, Copy, PartialEq, Eq)]
#[diesel(belongs_to(Exercise))]
#[diesel(belongs_to(Set))]
#[diesel(table_name = schema::exercise_set)]
#[diesel(primary_key(exercise_id, set_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExerciseSet {
    pub exercise_id: i32,
    pub set_id: i32,
}
