diesel::table! {
    games (id) {
        id -> Integer,
        white_player -> Text,
        black_player -> Text,
        result -> Text,
        pgn -> Text,
        played_at -> Timestamp,
    }
}
