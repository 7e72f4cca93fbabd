table! {
    comments (id) {
        id -> Integer,
        post_id -> Integer,
        author_id -> Integer,
        text -> Text,
        creation_date -> Timestamp,
    }
}

table! {
    follows (id) {
        id -> Integer,
        follower_id -> Integer,
        following_id -> Integer,
    }
}

table! {
    groups (id) {
        id -> Integer,
        title -> Varchar,
        slug -> Varchar,
        description -> Text,
    }
}

table! {
    posts (id) {
        id -> Integer,
        text -> Text,
        creation_date -> Timestamp,
        author_id -> Integer,
        group_id -> Nullable<Integer>,
        image -> Nullable<Varchar>,
    }
}

table! {
    users (id) {
        id -> Integer,
        username -> Varchar,
        display_name -> Varchar,
        email -> Nullable<Varchar>,
        hashed_password -> Nullable<Varchar>,
        is_admin -> Bool,
        creation_date -> Timestamp,
    }
}

joinable!(comments -> posts (post_id));
joinable!(comments -> users (author_id));
joinable!(posts -> groups (group_id));
joinable!(posts -> users (author_id));

allow_tables_to_appear_in_same_query!(comments, follows, groups, posts, users,);
