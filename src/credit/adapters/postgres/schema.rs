//! Diesel schema for credit alerts.

diesel::table! {
    /// Credit alerts; a partial unique index keeps one active row per
    /// `(provider, model, role)`.
    credit_alerts (id) {
        /// Alert identifier.
        id -> Uuid,
        /// Provider name.
        #[max_length = 100]
        provider -> Varchar,
        /// Model name.
        #[max_length = 100]
        model -> Varchar,
        /// Role name.
        #[max_length = 20]
        role -> Varchar,
        /// Provider error text.
        message -> Text,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// How the alert was cleared.
        #[max_length = 20]
        resolution -> Nullable<Varchar>,
        /// Raise timestamp.
        created_at -> Timestamptz,
        /// Resolution timestamp.
        resolved_at -> Nullable<Timestamptz>,
    }
}
