//! Diesel schema for task lifecycle persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Normalised project path.
        project -> Text,
        /// Task title.
        title -> Text,
        /// Task lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Optional plan section name.
        #[max_length = 255]
        section_name -> Nullable<Varchar>,
        /// Optional plan section priority.
        section_priority -> Nullable<Int4>,
        /// Reviewer rejections since the last restart.
        rejection_count -> Int4,
        /// Optional plan file the task came from.
        source_file -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit trail, one row per transition.
    task_audit_entries (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Task reference.
        task_id -> Uuid,
        /// Actor JSON payload.
        actor -> Jsonb,
        /// Status before the transition.
        #[max_length = 50]
        from_status -> Varchar,
        /// Status after the transition.
        #[max_length = 50]
        to_status -> Varchar,
        /// Optional notes.
        notes -> Nullable<Text>,
        /// Optional commit SHA.
        #[max_length = 40]
        commit_sha -> Nullable<Varchar>,
        /// Milliseconds spent in the prior status.
        time_in_prior_status_ms -> Int8,
        /// Transition timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Coder/reviewer disputes.
    task_disputes (id) {
        /// Dispute identifier.
        id -> Uuid,
        /// Task reference.
        task_id -> Uuid,
        /// Dispute kind.
        #[max_length = 50]
        kind -> Varchar,
        /// Short reason.
        reason -> Text,
        /// Coder position.
        coder_position -> Nullable<Text>,
        /// Reviewer position.
        reviewer_position -> Nullable<Text>,
        /// Dispute status.
        #[max_length = 20]
        status -> Varchar,
        /// Human guidance recorded on resolution.
        resolution_notes -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Resolution timestamp.
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(task_audit_entries -> tasks (task_id));
diesel::joinable!(task_disputes -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_audit_entries, task_disputes);
