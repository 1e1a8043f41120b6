//! Diesel schema for runner persistence.

diesel::table! {
    /// Registered runners; a partial unique index on `current_task_id`
    /// keeps one runner per task.
    runners (id) {
        /// Runner identifier.
        id -> Uuid,
        /// Served project path.
        project -> Text,
        /// Host-local process identifier.
        pid -> Nullable<Int8>,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Task currently held.
        current_task_id -> Nullable<Uuid>,
        /// Registration timestamp.
        started_at -> Timestamptz,
        /// Last heartbeat timestamp.
        heartbeat_at -> Timestamptz,
    }
}
