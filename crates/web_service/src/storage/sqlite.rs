use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use prep_core::{CreateSessionRequest, QAItem, Question, Session, User};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use super::{NewUser, QuestionOrder, Store, StoreError, StoreResult};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, profile_image_url, created_at, updated_at";
const SESSION_COLUMNS: &str =
    "id, user_id, role, experience, topic_to_focus, description, created_at, updated_at";
const QUESTION_COLUMNS: &str =
    "id, session_id, question, answer, note, is_pinned, created_at, updated_at";

/// SQLite-backed [`Store`]. Every call opens its own connection on the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    async fn with_connection<T, F>(&self, func: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = open_connection(&db_path)?;
            func(&mut connection)
        })
        .await
        .map_err(|error| StoreError::Task(error.to_string()))?
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn init(&self) -> StoreResult<()> {
        self.with_connection(|connection| {
            connection.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    password_hash TEXT NOT NULL,
                    profile_image_url TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email);

                CREATE TABLE IF NOT EXISTS sessions (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    role TEXT NOT NULL,
                    experience TEXT NOT NULL,
                    topic_to_focus TEXT NOT NULL,
                    description TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id, created_at);

                CREATE TABLE IF NOT EXISTS questions (
                    id TEXT PRIMARY KEY,
                    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                    question TEXT NOT NULL,
                    answer TEXT NOT NULL,
                    note TEXT NOT NULL DEFAULT '',
                    is_pinned INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_questions_session ON questions(session_id);
                "#,
            )?;
            Ok(())
        })
        .await
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.with_connection(move |connection| {
            let now = Utc::now();
            let record = User {
                id: Uuid::new_v4(),
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                profile_image_url: user.profile_image_url,
                created_at: now,
                updated_at: now,
            };

            let inserted = connection.execute(
                "INSERT INTO users (id, name, email, password_hash, profile_image_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.to_string(),
                    record.name,
                    record.email,
                    record.password_hash,
                    record.profile_image_url,
                    format_timestamp(now),
                    format_timestamp(now),
                ],
            );
            match inserted {
                Ok(_) => Ok(record),
                Err(rusqlite::Error::SqliteFailure(failure, _))
                    if failure.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::DuplicateEmail)
                }
                Err(error) => Err(error.into()),
            }
        })
        .await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.with_connection(move |connection| {
            connection
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    params![id.to_string()],
                    UserRow::read,
                )
                .optional()?
                .map(UserRow::into_user)
                .transpose()
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_string();
        self.with_connection(move |connection| {
            connection
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                    params![email],
                    UserRow::read,
                )
                .optional()?
                .map(UserRow::into_user)
                .transpose()
        })
        .await
    }

    async fn create_session(
        &self,
        owner: Uuid,
        request: CreateSessionRequest,
    ) -> StoreResult<Session> {
        self.with_connection(move |connection| {
            let now = Utc::now();
            let id = Uuid::new_v4();
            let tx = connection.transaction()?;

            tx.execute(
                "INSERT INTO sessions (id, user_id, role, experience, topic_to_focus, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id.to_string(),
                    owner.to_string(),
                    request.role,
                    request.experience,
                    request.topic_to_focus,
                    request.description,
                    format_timestamp(now),
                    format_timestamp(now),
                ],
            )?;
            let questions = insert_questions(&tx, id, &request.questions, now)?;
            tx.commit()?;

            Ok(Session {
                id,
                user: owner,
                role: request.role,
                experience: request.experience,
                topic_to_focus: request.topic_to_focus,
                description: request.description,
                questions,
                created_at: now,
                updated_at: now,
            })
        })
        .await
    }

    async fn sessions_for_user(&self, owner: Uuid) -> StoreResult<Vec<Session>> {
        self.with_connection(move |connection| {
            let rows = {
                let mut statement = connection.prepare(&format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = ?1
                     ORDER BY created_at DESC, rowid DESC"
                ))?;
                let rows = statement
                    .query_map(params![owner.to_string()], SessionRow::read)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            };

            rows.into_iter()
                .map(|row| row.into_session(connection, QuestionOrder::Inserted))
                .collect()
        })
        .await
    }

    async fn find_session(&self, id: Uuid, order: QuestionOrder) -> StoreResult<Option<Session>> {
        self.with_connection(move |connection| {
            let row = connection
                .query_row(
                    &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                    params![id.to_string()],
                    SessionRow::read,
                )
                .optional()?;
            row.map(|row| row.into_session(connection, order)).transpose()
        })
        .await
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<bool> {
        self.with_connection(move |connection| {
            let tx = connection.transaction()?;
            tx.execute(
                "DELETE FROM questions WHERE session_id = ?1",
                params![id.to_string()],
            )?;
            let removed = tx.execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])?;
            tx.commit()?;
            Ok(removed > 0)
        })
        .await
    }

    async fn add_questions(&self, session: Uuid, items: Vec<QAItem>) -> StoreResult<Vec<Question>> {
        self.with_connection(move |connection| {
            let now = Utc::now();
            let tx = connection.transaction()?;
            let questions = insert_questions(&tx, session, &items, now)?;
            tx.execute(
                "UPDATE sessions SET updated_at = ?2 WHERE id = ?1",
                params![session.to_string(), format_timestamp(now)],
            )?;
            tx.commit()?;
            Ok(questions)
        })
        .await
    }

    async fn find_question(&self, id: Uuid) -> StoreResult<Option<Question>> {
        self.with_connection(move |connection| select_question(connection, id))
            .await
    }

    async fn toggle_pin(&self, id: Uuid) -> StoreResult<Option<Question>> {
        self.with_connection(move |connection| {
            let changed = connection.execute(
                "UPDATE questions SET is_pinned = NOT is_pinned, updated_at = ?2 WHERE id = ?1",
                params![id.to_string(), format_timestamp(Utc::now())],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_question(connection, id)
        })
        .await
    }

    async fn update_note(&self, id: Uuid, note: String) -> StoreResult<Option<Question>> {
        self.with_connection(move |connection| {
            let changed = connection.execute(
                "UPDATE questions SET note = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.to_string(), note, format_timestamp(Utc::now())],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_question(connection, id)
        })
        .await
    }
}

struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    profile_image_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            profile_image_url: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_user(self) -> StoreResult<User> {
        Ok(User {
            id: Uuid::parse_str(&self.id)?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            profile_image_url: self.profile_image_url,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct SessionRow {
    id: String,
    user_id: String,
    role: String,
    experience: String,
    topic_to_focus: String,
    description: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            role: row.get(2)?,
            experience: row.get(3)?,
            topic_to_focus: row.get(4)?,
            description: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_session(self, connection: &Connection, order: QuestionOrder) -> StoreResult<Session> {
        let questions = load_questions(connection, &self.id, order)?;
        Ok(Session {
            id: Uuid::parse_str(&self.id)?,
            user: Uuid::parse_str(&self.user_id)?,
            role: self.role,
            experience: self.experience,
            topic_to_focus: self.topic_to_focus,
            description: self.description,
            questions,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct QuestionRow {
    id: String,
    session_id: String,
    question: String,
    answer: String,
    note: String,
    is_pinned: bool,
    created_at: String,
    updated_at: String,
}

impl QuestionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            question: row.get(2)?,
            answer: row.get(3)?,
            note: row.get(4)?,
            is_pinned: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_question(self) -> StoreResult<Question> {
        Ok(Question {
            id: Uuid::parse_str(&self.id)?,
            session: Uuid::parse_str(&self.session_id)?,
            question: self.question,
            answer: self.answer,
            note: self.note,
            is_pinned: self.is_pinned,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn insert_questions(
    connection: &Connection,
    session: Uuid,
    items: &[QAItem],
    now: DateTime<Utc>,
) -> StoreResult<Vec<Question>> {
    let mut statement = connection.prepare(
        "INSERT INTO questions (id, session_id, question, answer, note, is_pinned, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, '', 0, ?5, ?6)",
    )?;

    let mut questions = Vec::with_capacity(items.len());
    for item in items {
        let id = Uuid::new_v4();
        statement.execute(params![
            id.to_string(),
            session.to_string(),
            item.question,
            item.answer,
            format_timestamp(now),
            format_timestamp(now),
        ])?;
        questions.push(Question {
            id,
            session,
            question: item.question.clone(),
            answer: item.answer.clone(),
            note: String::new(),
            is_pinned: false,
            created_at: now,
            updated_at: now,
        });
    }
    Ok(questions)
}

fn load_questions(
    connection: &Connection,
    session_id: &str,
    order: QuestionOrder,
) -> StoreResult<Vec<Question>> {
    let order_by = match order {
        QuestionOrder::Inserted => "rowid ASC",
        QuestionOrder::PinnedThenNewest => "is_pinned DESC, created_at DESC, rowid DESC",
    };
    let mut statement = connection.prepare(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE session_id = ?1 ORDER BY {order_by}"
    ))?;
    let rows = statement
        .query_map(params![session_id], QuestionRow::read)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(QuestionRow::into_question).collect()
}

fn select_question(connection: &Connection, id: Uuid) -> StoreResult<Option<Question>> {
    connection
        .query_row(
            &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"),
            params![id.to_string()],
            QuestionRow::read,
        )
        .optional()?
        .map(QuestionRow::into_question)
        .transpose()
}

fn open_connection(path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let connection = Connection::open(path)?;
    connection.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        "#,
    )?;
    Ok(connection)
}

// Fixed precision keeps the text form sortable.
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
