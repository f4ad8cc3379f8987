//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match the migrations exactly; regenerate with
//! `diesel print-schema` after changing them.

diesel::table! {
    users (id) {
        id -> Int8,
        email -> Varchar,
        password_hash -> Varchar,
        name -> Varchar,
        is_active -> Bool,
        is_staff -> Bool,
        is_superuser -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    auth_tokens (token_digest) {
        token_digest -> Bytea,
        user_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    recipes (id) {
        id -> Int8,
        user_id -> Int8,
        title -> Varchar,
        description -> Text,
        time_minutes -> Int4,
        price -> Numeric,
        link -> Varchar,
        image_path -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tags (id) {
        id -> Int8,
        user_id -> Int8,
        name -> Varchar,
    }
}

diesel::table! {
    ingredients (id) {
        id -> Int8,
        user_id -> Int8,
        name -> Varchar,
    }
}

diesel::table! {
    recipe_tags (recipe_id, tag_id) {
        recipe_id -> Int8,
        tag_id -> Int8,
    }
}

diesel::table! {
    recipe_ingredients (recipe_id, ingredient_id) {
        recipe_id -> Int8,
        ingredient_id -> Int8,
    }
}

diesel::joinable!(auth_tokens -> users (user_id));
diesel::joinable!(recipes -> users (user_id));
diesel::joinable!(tags -> users (user_id));
diesel::joinable!(ingredients -> users (user_id));
diesel::joinable!(recipe_tags -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> tags (tag_id));
diesel::joinable!(recipe_ingredients -> recipes (recipe_id));
diesel::joinable!(recipe_ingredients -> ingredients (ingredient_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    auth_tokens,
    recipes,
    tags,
    ingredients,
    recipe_tags,
    recipe_ingredients,
);
