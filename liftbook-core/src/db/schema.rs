// Rust names are plural; the tables keep their singular names on disk.

diesel::table! {
    #[sql_name = "user"]
    users (id) {
        id -> Integer,
        first_name -> Text,
        last_name -> Text,
    }
}

diesel::table! {
    #[sql_name = "plan"]
    plans (id) {
        id -> Integer,
        name -> Text,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "workout"]
    workouts (id) {
        id -> Integer,
        name -> Nullable<Text>,
        date -> Timestamp,
    }
}

diesel::table! {
    #[sql_name = "exercise"]
    exercises (id) {
        id -> Integer,
        name -> Text,
        instructions -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "set"]
    sets (id) {
        id -> Integer,
        set_number -> Integer,
        weight -> Double,
        repetitions -> Integer,
    }
}

diesel::table! {
    #[sql_name = "muscle"]
    muscles (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    user_workout (user_id, workout_id) {
        user_id -> Integer,
        workout_id -> Integer,
    }
}

diesel::table! {
    workout_set (workout_id, set_id) {
        workout_id -> Integer,
        set_id -> Integer,
    }
}

diesel::table! {
    exercise_muscle (exercise_id, muscle_id) {
        exercise_id -> Integer,
        muscle_id -> Integer,
    }
}

diesel::table! {
    exercise_set (exercise_id, set_id) {
        exercise_id -> Integer,
        set_id -> Integer,
    }
}

diesel::joinable!(user_workout -> users (user_id));
diesel::joinable!(user_workout -> workouts (workout_id));
diesel::joinable!(workout_set -> workouts (workout_id));
diesel::joinable!(workout_set -> sets (set_id));
diesel::joinable!(exercise_muscle -> exercises (exercise_id));
diesel::joinable!(exercise_muscle -> muscles (muscle_id));
diesel::joinable!(exercise_set -> exercises (exercise_id));
diesel::joinable!(exercise_set -> sets (set_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    plans,
    workouts,
    exercises,
    sets,
    muscles,
    user_workout,
    workout_set,
    exercise_muscle,
    exercise_set,
);
