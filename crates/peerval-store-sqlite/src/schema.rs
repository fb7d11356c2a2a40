//! SQL schema for the peer-evaluation SQLite store.
//!
//! Executed on every connection open. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 10000;

CREATE TABLE IF NOT EXISTS students (
    student_id  INTEGER PRIMARY KEY,          -- roster-supplied or auto-assigned
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS professors (
    professor_id INTEGER PRIMARY KEY,
    name         TEXT NOT NULL,
    email        TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password     TEXT NOT NULL,                -- plaintext
    department   TEXT
);

CREATE TABLE IF NOT EXISTS courses (
    course_id     INTEGER PRIMARY KEY,
    course_code   TEXT NOT NULL,
    course_name   TEXT NOT NULL,
    professor_id  INTEGER NOT NULL REFERENCES professors(professor_id),
    semester      TEXT,
    year          INTEGER,
    course_time   TEXT,
    eval_due_date TEXT,                        -- YYYY-MM-DD
    UNIQUE (professor_id, course_code)
);

CREATE TABLE IF NOT EXISTS enrollments (
    course_id  INTEGER NOT NULL REFERENCES courses(course_id),
    student_id INTEGER NOT NULL REFERENCES students(student_id),
    PRIMARY KEY (course_id, student_id)
);

CREATE TABLE IF NOT EXISTS student_groups (
    group_id   INTEGER PRIMARY KEY,            -- allocated as MAX + 1
    course_id  INTEGER NOT NULL REFERENCES courses(course_id),
    group_name TEXT NOT NULL,                  -- {CourseCode}-Group{N}
    UNIQUE (course_id, group_name)
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id   INTEGER NOT NULL REFERENCES student_groups(group_id),
    student_id INTEGER NOT NULL REFERENCES students(student_id),
    PRIMARY KEY (group_id, student_id)
);

-- Rows are created ahead of time; submissions only UPDATE them.
CREATE TABLE IF NOT EXISTS peer_evaluations (
    peer_eval_id  INTEGER PRIMARY KEY,
    evaluator_id  INTEGER NOT NULL REFERENCES students(student_id),
    evaluatee_id  INTEGER NOT NULL REFERENCES students(student_id),
    course_id     INTEGER NOT NULL REFERENCES courses(course_id),
    contribution  INTEGER CHECK (contribution  BETWEEN 0 AND 4),
    collaboration INTEGER CHECK (collaboration BETWEEN 0 AND 4),
    communication INTEGER CHECK (communication BETWEEN 0 AND 4),
    planning      INTEGER CHECK (planning      BETWEEN 0 AND 4),
    inclusivity   INTEGER CHECK (inclusivity   BETWEEN 0 AND 4),
    overall       INTEGER CHECK (overall       BETWEEN 0 AND 4),
    eval_due_date TEXT,                        -- YYYY-MM-DD
    submitted_at  TEXT,                        -- RFC 3339 UTC
    UNIQUE (evaluator_id, evaluatee_id, course_id)
);

CREATE INDEX IF NOT EXISTS peer_evaluations_evaluator_idx ON peer_evaluations(evaluator_id);
CREATE INDEX IF NOT EXISTS peer_evaluations_course_idx    ON peer_evaluations(course_id);
CREATE INDEX IF NOT EXISTS courses_professor_idx          ON courses(professor_id);

PRAGMA user_version = 1;
";
