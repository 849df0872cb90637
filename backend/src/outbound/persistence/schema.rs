//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        username -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Group membership; `group_name` is `common` or `authors`.
    user_groups (user_id, group_name) {
        user_id -> Uuid,
        group_name -> Varchar,
    }
}

diesel::table! {
    /// Author profiles, at most one per user.
    authors (id) {
        id -> Uuid,
        user_id -> Uuid,
        rating -> Int8,
    }
}

diesel::table! {
    categories (id) {
        id -> Int8,
        title -> Varchar,
    }
}

diesel::table! {
    category_subscribers (category_id, user_id) {
        category_id -> Int8,
        user_id -> Uuid,
    }
}

diesel::table! {
    posts (id) {
        id -> Int8,
        author_id -> Uuid,
        kind -> Varchar,
        title -> Varchar,
        content -> Text,
        rating -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    post_categories (post_id, category_id) {
        post_id -> Int8,
        category_id -> Int8,
    }
}

diesel::joinable!(user_groups -> users (user_id));
diesel::joinable!(authors -> users (user_id));
diesel::joinable!(category_subscribers -> categories (category_id));
diesel::joinable!(category_subscribers -> users (user_id));
diesel::joinable!(posts -> authors (author_id));
diesel::joinable!(post_categories -> posts (post_id));
diesel::joinable!(post_categories -> categories (category_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    user_groups,
    authors,
    categories,
    category_subscribers,
    posts,
    post_categories,
);
