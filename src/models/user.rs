use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String, // ⇔ users.password (encoded PBKDF2 hash)
    pub is_active: bool,
    pub date_joined: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_key: String,
    pub user_id: i64,
    pub expire_date: NaiveDateTime,
}
