use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;

use crate::db::models::{
    Exercise, ExerciseMuscle, ExerciseSet, Muscle, NewExercise, NewMuscle, NewPlan, NewSet,
    NewUser, NewWorkout, Plan, Set, UpdatePlan, UpdateSet, User, UserWorkout, Workout, WorkoutSet,
};
use crate::db::schema::{
    exercise_muscle, exercise_set, exercises, muscles, plans, sets, user_workout, users,
    workout_set, workouts,
};
use crate::error::{Result, StoreError};

// Users
pub fn create_user(conn: &mut SqliteConnection, new_user: &NewUser) -> Result<User> {
    diesel::insert_into(users::table)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn get_user(conn: &mut SqliteConnection, user_id: i32) -> Result<User> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .map_err(Into::into)
}

pub fn get_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>> {
    users::table
        .select(User::as_select())
        .order(users::id)
        .load(conn)
        .map_err(Into::into)
}

/// Deletes a user along with every workout linked to it, and those workouts' sets.
pub fn delete_user(conn: &mut SqliteConnection, user_id: i32) -> Result<usize> {
    conn.transaction::<_, StoreError, _>(|conn| {
        let workout_ids: Vec<i32> = user_workout::table
            .filter(user_workout::user_id.eq(user_id))
            .select(user_workout::workout_id)
            .load(conn)?;
        let removed = remove_workouts(conn, &workout_ids)?;
        debug!("Deleting user {} removed {} workout(s)", user_id, removed);

        let deleted = diesel::delete(users::table.find(user_id)).execute(conn)?;
        Ok(deleted)
    })
}

// Plans
pub fn create_plan(conn: &mut SqliteConnection, new_plan: &NewPlan) -> Result<Plan> {
    diesel::insert_into(plans::table)
        .values(new_plan)
        .returning(Plan::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn get_plan(conn: &mut SqliteConnection, plan_id: i32) -> Result<Plan> {
    plans::table
        .find(plan_id)
        .select(Plan::as_select())
        .first(conn)
        .map_err(Into::into)
}

pub fn get_all_plans(conn: &mut SqliteConnection) -> Result<Vec<Plan>> {
    plans::table
        .select(Plan::as_select())
        .order(plans::id)
        .load(conn)
        .map_err(Into::into)
}

pub fn update_plan(conn: &mut SqliteConnection, plan_id: i32, update: &UpdatePlan) -> Result<Plan> {
    if update.is_empty() {
        return get_plan(conn, plan_id);
    }
    diesel::update(plans::table.find(plan_id))
        .set(update)
        .returning(Plan::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn delete_plan(conn: &mut SqliteConnection, plan_id: i32) -> Result<usize> {
    diesel::delete(plans::table.find(plan_id))
        .execute(conn)
        .map_err(Into::into)
}

// Workouts
pub fn create_workout(conn: &mut SqliteConnection, new_workout: &NewWorkout) -> Result<Workout> {
    diesel::insert_into(workouts::table)
        .values(new_workout)
        .returning(Workout::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn get_workout(conn: &mut SqliteConnection, workout_id: i32) -> Result<Workout> {
    workouts::table
        .find(workout_id)
        .select(Workout::as_select())
        .first(conn)
        .map_err(Into::into)
}

/// Newest first.
pub fn get_all_workouts(conn: &mut SqliteConnection) -> Result<Vec<Workout>> {
    workouts::table
        .select(Workout::as_select())
        .order((workouts::date.desc(), workouts::id.desc()))
        .load(conn)
        .map_err(Into::into)
}

/// Deletes a workout and every set linked to it.
pub fn delete_workout(conn: &mut SqliteConnection, workout_id: i32) -> Result<usize> {
    conn.transaction::<_, StoreError, _>(|conn| remove_workouts(conn, &[workout_id]))
}

// Exercises
pub fn create_exercise(conn: &mut SqliteConnection, new_exercise: &NewExercise) -> Result<Exercise> {
    diesel::insert_into(exercises::table)
        .values(new_exercise)
        .returning(Exercise::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn get_exercise(conn: &mut SqliteConnection, exercise_id: i32) -> Result<Exercise> {
    exercises::table
        .find(exercise_id)
        .select(Exercise::as_select())
        .first(conn)
        .map_err(Into::into)
}

pub fn get_all_exercises(conn: &mut SqliteConnection) -> Result<Vec<Exercise>> {
    exercises::table
        .select(Exercise::as_select())
        .order((exercises::name, exercises::id))
        .load(conn)
        .map_err(Into::into)
}

pub fn get_or_create_exercise(conn: &mut SqliteConnection, exercise_name: &str) -> Result<Exercise> {
    if let Some(exercise) = exercises::table
        .filter(exercises::name.eq(exercise_name))
        .select(Exercise::as_select())
        .first(conn)
        .optional()?
    {
        return Ok(exercise);
    }

    create_exercise(
        conn,
        &NewExercise {
            name: exercise_name.to_string(),
            instructions: None,
        },
    )
}

/// Deletes an exercise and the sets logged against it. Muscles are left alone.
pub fn delete_exercise(conn: &mut SqliteConnection, exercise_id: i32) -> Result<usize> {
    conn.transaction::<_, StoreError, _>(|conn| {
        let set_ids: Vec<i32> = exercise_set::table
            .filter(exercise_set::exercise_id.eq(exercise_id))
            .select(exercise_set::set_id)
            .load(conn)?;
        let removed = remove_sets(conn, &set_ids)?;
        debug!("Deleting exercise {} removed {} set(s)", exercise_id, removed);

        let deleted = diesel::delete(exercises::table.find(exercise_id)).execute(conn)?;
        Ok(deleted)
    })
}

// Sets
pub fn create_set(conn: &mut SqliteConnection, new_set: &NewSet) -> Result<Set> {
    diesel::insert_into(sets::table)
        .values(new_set)
        .returning(Set::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn get_set(conn: &mut SqliteConnection, set_id: i32) -> Result<Set> {
    sets::table
        .find(set_id)
        .select(Set::as_select())
        .first(conn)
        .map_err(Into::into)
}

/// Only the fields present in `update` change.
pub fn update_set(conn: &mut SqliteConnection, set_id: i32, update: &UpdateSet) -> Result<Set> {
    if update.is_empty() {
        return get_set(conn, set_id);
    }
    diesel::update(sets::table.find(set_id))
        .set(update)
        .returning(Set::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn delete_set(conn: &mut SqliteConnection, set_id: i32) -> Result<usize> {
    diesel::delete(sets::table.find(set_id))
        .execute(conn)
        .map_err(Into::into)
}

/// Logs one set of `exercise_id` in `workout_id`, numbered after the sets
/// already logged for that exercise in that workout.
pub fn add_set_to_workout(
    conn: &mut SqliteConnection,
    workout_id: i32,
    exercise_id: i32,
    weight: f64,
    repetitions: i32,
) -> Result<Set> {
    conn.transaction::<_, StoreError, _>(|conn| {
        let set_number = next_set_number(conn, workout_id, exercise_id)?;
        log_set(conn, workout_id, exercise_id, set_number, weight, repetitions)
    })
}

/// Add multiple sets at once for an exercise in a workout.
/// This is useful when a user logs "5 sets of 5 reps at 100kg".
pub fn add_multiple_sets_to_workout(
    conn: &mut SqliteConnection,
    workout_id: i32,
    exercise_id: i32,
    weight: f64,
    repetitions: i32,
    set_count: i32,
) -> Result<Vec<Set>> {
    if set_count <= 0 {
        return Ok(Vec::new());
    }

    conn.transaction::<_, StoreError, _>(|conn| {
        let starting_set_number = next_set_number(conn, workout_id, exercise_id)?;
        (0..set_count)
            .map(|i| {
                let set_number = starting_set_number
                    .checked_add(i)
                    .ok_or_else(set_number_overflow)?;
                log_set(conn, workout_id, exercise_id, set_number, weight, repetitions)
            })
            .collect()
    })
}

// Muscles
pub fn create_muscle(conn: &mut SqliteConnection, new_muscle: &NewMuscle) -> Result<Muscle> {
    diesel::insert_into(muscles::table)
        .values(new_muscle)
        .returning(Muscle::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn get_muscle(conn: &mut SqliteConnection, muscle_id: i32) -> Result<Muscle> {
    muscles::table
        .find(muscle_id)
        .select(Muscle::as_select())
        .first(conn)
        .map_err(Into::into)
}

pub fn get_all_muscles(conn: &mut SqliteConnection) -> Result<Vec<Muscle>> {
    muscles::table
        .select(Muscle::as_select())
        .order((muscles::name, muscles::id))
        .load(conn)
        .map_err(Into::into)
}

pub fn get_or_create_muscle(conn: &mut SqliteConnection, muscle_name: &str) -> Result<Muscle> {
    if let Some(muscle) = muscles::table
        .filter(muscles::name.eq(muscle_name))
        .select(Muscle::as_select())
        .first(conn)
        .optional()?
    {
        return Ok(muscle);
    }

    create_muscle(
        conn,
        &NewMuscle {
            name: muscle_name.to_string(),
        },
    )
}

pub fn delete_muscle(conn: &mut SqliteConnection, muscle_id: i32) -> Result<usize> {
    diesel::delete(muscles::table.find(muscle_id))
        .execute(conn)
        .map_err(Into::into)
}

// Links. Inserting an existing link is a no-op; a missing endpoint is a
// referential integrity error.
pub fn link_user_workout(
    conn: &mut SqliteConnection,
    user_id: i32,
    workout_id: i32,
) -> Result<UserWorkout> {
    let link = UserWorkout {
        user_id,
        workout_id,
    };
    diesel::insert_or_ignore_into(user_workout::table)
        .values(&link)
        .execute(conn)?;
    Ok(link)
}

pub fn unlink_user_workout(conn: &mut SqliteConnection, user_id: i32, workout_id: i32) -> Result<usize> {
    diesel::delete(user_workout::table.find((user_id, workout_id)))
        .execute(conn)
        .map_err(Into::into)
}

pub fn link_workout_set(
    conn: &mut SqliteConnection,
    workout_id: i32,
    set_id: i32,
) -> Result<WorkoutSet> {
    let link = WorkoutSet { workout_id, set_id };
    diesel::insert_or_ignore_into(workout_set::table)
        .values(&link)
        .execute(conn)?;
    Ok(link)
}

pub fn unlink_workout_set(conn: &mut SqliteConnection, workout_id: i32, set_id: i32) -> Result<usize> {
    diesel::delete(workout_set::table.find((workout_id, set_id)))
        .execute(conn)
        .map_err(Into::into)
}

pub fn link_exercise_muscle(
    conn: &mut SqliteConnection,
    exercise_id: i32,
    muscle_id: i32,
) -> Result<ExerciseMuscle> {
    let link = ExerciseMuscle {
        exercise_id,
        muscle_id,
    };
    diesel::insert_or_ignore_into(exercise_muscle::table)
        .values(&link)
        .execute(conn)?;
    Ok(link)
}

pub fn unlink_exercise_muscle(
    conn: &mut SqliteConnection,
    exercise_id: i32,
    muscle_id: i32,
) -> Result<usize> {
    diesel::delete(exercise_muscle::table.find((exercise_id, muscle_id)))
        .execute(conn)
        .map_err(Into::into)
}

pub fn link_exercise_set(
    conn: &mut SqliteConnection,
    exercise_id: i32,
    set_id: i32,
) -> Result<ExerciseSet> {
    let link = ExerciseSet {
        exercise_id,
        set_id,
    };
    diesel::insert_or_ignore_into(exercise_set::table)
        .values(&link)
        .execute(conn)?;
    Ok(link)
}

pub fn unlink_exercise_set(conn: &mut SqliteConnection, exercise_id: i32, set_id: i32) -> Result<usize> {
    diesel::delete(exercise_set::table.find((exercise_id, set_id)))
        .execute(conn)
        .map_err(Into::into)
}

// Traversal, from either side of each link
pub fn get_workouts_for_user(conn: &mut SqliteConnection, user: &User) -> Result<Vec<Workout>> {
    UserWorkout::belonging_to(user)
        .inner_join(workouts::table)
        .select(Workout::as_select())
        .order((workouts::date.desc(), workouts::id.desc()))
        .load(conn)
        .map_err(Into::into)
}

pub fn get_users_for_workout(conn: &mut SqliteConnection, workout: &Workout) -> Result<Vec<User>> {
    UserWorkout::belonging_to(workout)
        .inner_join(users::table)
        .select(User::as_select())
        .order(users::id)
        .load(conn)
        .map_err(Into::into)
}

pub fn get_sets_for_workout(conn: &mut SqliteConnection, workout: &Workout) -> Result<Vec<Set>> {
    WorkoutSet::belonging_to(workout)
        .inner_join(sets::table)
        .select(Set::as_select())
        .order((sets::set_number, sets::id))
        .load(conn)
        .map_err(Into::into)
}

pub fn get_workouts_for_set(conn: &mut SqliteConnection, set: &Set) -> Result<Vec<Workout>> {
    WorkoutSet::belonging_to(set)
        .inner_join(workouts::table)
        .select(Workout::as_select())
        .order((workouts::date.desc(), workouts::id.desc()))
        .load(conn)
        .map_err(Into::into)
}

pub fn get_muscles_for_exercise(conn: &mut SqliteConnection, exercise: &Exercise) -> Result<Vec<Muscle>> {
    ExerciseMuscle::belonging_to(exercise)
        .inner_join(muscles::table)
        .select(Muscle::as_select())
        .order((muscles::name, muscles::id))
        .load(conn)
        .map_err(Into::into)
}

pub fn get_exercises_for_muscle(conn: &mut SqliteConnection, muscle: &Muscle) -> Result<Vec<Exercise>> {
    ExerciseMuscle::belonging_to(muscle)
        .inner_join(exercises::table)
        .select(Exercise::as_select())
        .order((exercises::name, exercises::id))
        .load(conn)
        .map_err(Into::into)
}

pub fn get_sets_for_exercise(conn: &mut SqliteConnection, exercise: &Exercise) -> Result<Vec<Set>> {
    ExerciseSet::belonging_to(exercise)
        .inner_join(sets::table)
        .select(Set::as_select())
        .order((sets::set_number, sets::id))
        .load(conn)
        .map_err(Into::into)
}

pub fn get_exercises_for_set(conn: &mut SqliteConnection, set: &Set) -> Result<Vec<Exercise>> {
    ExerciseSet::belonging_to(set)
        .inner_join(exercises::table)
        .select(Exercise::as_select())
        .order((exercises::name, exercises::id))
        .load(conn)
        .map_err(Into::into)
}

fn next_set_number(conn: &mut SqliteConnection, workout_id: i32, exercise_id: i32) -> Result<i32> {
    let in_workout = workout_set::table
        .filter(workout_set::workout_id.eq(workout_id))
        .select(workout_set::set_id);
    let for_exercise = exercise_set::table
        .filter(exercise_set::exercise_id.eq(exercise_id))
        .select(exercise_set::set_id);

    let max_set_number: Option<i32> = sets::table
        .filter(sets::id.eq_any(in_workout))
        .filter(sets::id.eq_any(for_exercise))
        .select(diesel::dsl::max(sets::set_number))
        .get_result(conn)?;

    match max_set_number {
        Some(n) => n.checked_add(1).ok_or_else(set_number_overflow),
        None => Ok(1),
    }
}

fn set_number_overflow() -> StoreError {
    StoreError::Constraint("set number exceeds the integer range".into())
}

fn log_set(
    conn: &mut SqliteConnection,
    workout_id: i32,
    exercise_id: i32,
    set_number: i32,
    weight: f64,
    repetitions: i32,
) -> Result<Set> {
    let set = create_set(
        conn,
        &NewSet {
            set_number,
            weight,
            repetitions,
        },
    )?;
    link_workout_set(conn, workout_id, set.id)?;
    link_exercise_set(conn, exercise_id, set.id)?;
    Ok(set)
}

/// Removes workouts and the sets linked to them. Callers own the transaction.
fn remove_workouts(conn: &mut SqliteConnection, workout_ids: &[i32]) -> Result<usize> {
    if workout_ids.is_empty() {
        return Ok(0);
    }

    let set_ids: Vec<i32> = workout_set::table
        .filter(workout_set::workout_id.eq_any(workout_ids))
        .select(workout_set::set_id)
        .distinct()
        .load(conn)?;
    let removed_sets = remove_sets(conn, &set_ids)?;

    let deleted = diesel::delete(workouts::table.filter(workouts::id.eq_any(workout_ids)))
        .execute(conn)?;
    debug!(
        "Removed {} workout(s) and {} set(s)",
        deleted, removed_sets
    );
    Ok(deleted)
}

fn remove_sets(conn: &mut SqliteConnection, set_ids: &[i32]) -> Result<usize> {
    if set_ids.is_empty() {
        return Ok(0);
    }
    diesel::delete(sets::table.filter(sets::id.eq_any(set_ids)))
        .execute(conn)
        .map_err(Into::into)
}
