//! Diesel schema for chat history.

diesel::table! {
    /// Messages exchanged with users.
    chat_messages (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Owning user, kept as text to decouple from any users table.
        #[max_length = 255]
        user_id -> Varchar,
        /// Correlation id of the originating request.
        #[max_length = 255]
        correlation_id -> Nullable<Varchar>,
        /// `user` or `bot`.
        #[max_length = 16]
        direction -> Varchar,
        /// Display text.
        text -> Nullable<Text>,
        /// Raw payload.
        payload -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
