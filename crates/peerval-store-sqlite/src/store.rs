//! [`SqliteStore`], the SQLite implementation of [`PeerEvalStore`].

use std::{path::Path, sync::Arc};

use chrono::{NaiveDate, Utc};
use peerval_core::{
  group::{FIRST_GROUP_ID, GroupFormation, GroupLabel},
  model::{
    Course, CourseOverview, CourseRef, EvaluateeAnalysis, EvaluationContext, EvaluationDetail,
    EvaluationSummary, GroupWithMembers, NewProfessor, NewStudent, Professor, RubricAverages,
    Student, StudentGroup,
  },
  roster::{ImportReport, RosterRow, SkipReason, SkippedRow},
  rubric::RubricScores,
  store::PeerEvalStore,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  connection::ConnectionManager,
  encode::{
    COURSE_COLUMNS, RawCourse, RawEvaluationDetail, SCORE_COLUMNS, decode_dt, decode_opt_date,
    decode_scores, encode_date, encode_dt, encode_scores, score_columns,
  },
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A peer-evaluation store backed by a single SQLite file.
///
/// Cloning is cheap; the connection manager is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conns: Arc<ConnectionManager>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conns = ConnectionManager::open(path.as_ref().to_path_buf()).await?;
    Ok(Self { conns: Arc::new(conns) })
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conns = ConnectionManager::open_in_memory().await?;
    Ok(Self { conns: Arc::new(conns) })
  }

  /// Run `f` on a validated connection.
  async fn call<F, R>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    let conn = self.conns.acquire().await?;
    Ok(conn.call(f).await?)
  }

  async fn load_groups(&self, filter: &'static str, key: i64) -> Result<Vec<GroupWithMembers>> {
    let rows: Vec<RawGroupMember> = self
      .call(move |conn| {
        let sql = format!(
          "SELECT g.group_id, g.course_id, g.group_name, c.course_code,
                  s.student_id, s.name, s.email
           FROM student_groups g
           JOIN courses c            ON c.course_id  = g.course_id
           LEFT JOIN group_members m ON m.group_id   = g.group_id
           LEFT JOIN students s      ON s.student_id = m.student_id
           WHERE {filter}
           ORDER BY c.course_code, g.group_id, s.name, s.student_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![key], |row| {
            Ok(RawGroupMember {
              group_id:    row.get(0)?,
              course_id:   row.get(1)?,
              group_name:  row.get(2)?,
              course_code: row.get(3)?,
              student_id:  row.get(4)?,
              name:        row.get(5)?,
              email:       row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut groups: Vec<GroupWithMembers> = Vec::new();
    for raw in rows {
      if groups.last().is_none_or(|g| g.group.group_id != raw.group_id) {
        groups.push(GroupWithMembers {
          group:       StudentGroup {
            group_id:   raw.group_id,
            course_id:  raw.course_id,
            group_name: raw.group_name,
          },
          course_code: raw.course_code,
          members:     Vec::new(),
        });
      }
      if let (Some(student_id), Some(name), Some(email), Some(group)) =
        (raw.student_id, raw.name, raw.email, groups.last_mut())
      {
        group.members.push(Student { student_id, name, email });
      }
    }
    Ok(groups)
  }
}

struct RawGroupMember {
  group_id:    i64,
  course_id:   i64,
  group_name:  String,
  course_code: String,
  student_id:  Option<i64>,
  name:        Option<String>,
  email:       Option<String>,
}

fn student_from_row(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<Student> {
  Ok(Student {
    student_id: row.get(first)?,
    name:       row.get(first + 1)?,
    email:      row.get(first + 2)?,
  })
}

// ─── PeerEvalStore impl ──────────────────────────────────────────────────────

impl PeerEvalStore for SqliteStore {
  type Error = Error;

  // ── People ────────────────────────────────────────────────────────────────

  async fn add_student(&self, input: NewStudent) -> Result<Student> {
    let name  = input.name.trim().to_owned();
    let email = input.email.trim().to_owned();

    let (name_c, email_c) = (name.clone(), email.clone());
    let inserted: Option<i64> = self
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM students WHERE email = ?1",
            rusqlite::params![email_c],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(None);
        }
        conn.execute(
          "INSERT INTO students (name, email) VALUES (?1, ?2)",
          rusqlite::params![name_c, email_c],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    let student_id = inserted.ok_or_else(|| Error::EmailTaken(email.clone()))?;
    tracing::info!(student_id, "registered student");
    Ok(Student { student_id, name, email })
  }

  async fn student_by_email(&self, email: String) -> Result<Option<Student>> {
    self
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT student_id, name, email FROM students WHERE email = ?1",
            rusqlite::params![email.trim()],
            |row| student_from_row(row, 0),
          )
          .optional()?)
      })
      .await
  }

  async fn add_professor(&self, input: NewProfessor) -> Result<Professor> {
    let email = input.email.trim().to_owned();

    let input_c = input.clone();
    let email_c = email.clone();
    let inserted: Option<i64> = self
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM professors WHERE email = ?1",
            rusqlite::params![email_c],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(None);
        }
        conn.execute(
          "INSERT INTO professors (name, email, password, department) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![input_c.name, email_c, input_c.password, input_c.department],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    let professor_id = inserted.ok_or_else(|| Error::EmailTaken(email.clone()))?;
    Ok(Professor {
      professor_id,
      name: input.name,
      email,
      password: input.password,
      department: input.department,
    })
  }

  async fn professor_by_email(&self, email: String) -> Result<Option<Professor>> {
    self
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT professor_id, name, email, password, department
             FROM professors WHERE email = ?1",
            rusqlite::params![email.trim()],
            |row| {
              Ok(Professor {
                professor_id: row.get(0)?,
                name:         row.get(1)?,
                email:        row.get(2)?,
                password:     row.get(3)?,
                department:   row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn courses_for_professor(&self, professor_id: i64) -> Result<Vec<CourseOverview>> {
    let raws: Vec<(RawCourse, [u32; 3])> = self
      .call(move |conn| {
        let sql = format!(
          "SELECT {COURSE_COLUMNS},
             (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.course_id),
             (SELECT COUNT(*) FROM peer_evaluations p WHERE p.course_id = c.course_id),
             (SELECT COUNT(*) FROM peer_evaluations p
               WHERE p.course_id = c.course_id AND p.submitted_at IS NOT NULL)
           FROM courses c
           WHERE professor_id = ?1
           ORDER BY course_code"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![professor_id], |row| {
            Ok((RawCourse::from_row(row)?, [row.get(8)?, row.get(9)?, row.get(10)?]))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, [enrolled, total, submitted])| {
        Ok(CourseOverview {
          course: raw.into_course()?,
          enrolled,
          evaluations_total: total,
          evaluations_submitted: submitted,
        })
      })
      .collect()
  }

  async fn course(&self, course_id: i64) -> Result<Option<Course>> {
    let raw: Option<RawCourse> = self
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?1"),
            rusqlite::params![course_id],
            RawCourse::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }

  async fn enrolled_students(&self, course_id: i64) -> Result<Vec<Student>> {
    self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.student_id, s.name, s.email
           FROM enrollments e
           JOIN students s ON s.student_id = e.student_id
           WHERE e.course_id = ?1
           ORDER BY s.name, s.student_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![course_id], |row| student_from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
  }

  async fn assign_due_date(
    &self,
    professor_id: i64,
    course_id:    i64,
    due:          NaiveDate,
  ) -> Result<Course> {
    let due_str = encode_date(due);

    let raw: Option<RawCourse> = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE courses SET eval_due_date = ?1 WHERE course_id = ?2 AND professor_id = ?3",
          rusqlite::params![due_str, course_id, professor_id],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        tx.execute(
          "UPDATE peer_evaluations SET eval_due_date = ?1 WHERE course_id = ?2",
          rusqlite::params![due_str, course_id],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?1"),
          rusqlite::params![course_id],
          RawCourse::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    let course = raw.ok_or(Error::CourseNotFound(course_id))?.into_course()?;
    tracing::info!(course_id, due = %due, "assigned evaluation due date");
    Ok(course)
  }

  async fn course_analysis(
    &self,
    professor_id: i64,
    course_id:    i64,
  ) -> Result<Vec<EvaluateeAnalysis>> {
    type Row = (i64, String, Option<i64>, [Option<i64>; 6]);

    let rows: Option<Vec<Row>> = self
      .call(move |conn| {
        let owned = conn
          .query_row(
            "SELECT 1 FROM courses WHERE course_id = ?1 AND professor_id = ?2",
            rusqlite::params![course_id, professor_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !owned {
          return Ok(None);
        }

        let sql = format!(
          "SELECT s.student_id, s.name, p.peer_eval_id, {}
           FROM enrollments e
           JOIN students s              ON s.student_id   = e.student_id
           LEFT JOIN peer_evaluations p ON p.evaluatee_id = s.student_id
                                       AND p.course_id    = e.course_id
           WHERE e.course_id = ?1
           ORDER BY s.name, s.student_id",
          SCORE_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c}"))
            .collect::<Vec<_>>()
            .join(", ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![course_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, score_columns(row, 3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;

    let rows = rows.ok_or(Error::CourseNotFound(course_id))?;

    let mut out: Vec<(EvaluateeAnalysis, Vec<RubricScores>)> = Vec::new();
    for (student_id, name, peer_eval_id, raw_scores) in rows {
      if out.last().is_none_or(|(a, _)| a.student_id != student_id) {
        out.push((
          EvaluateeAnalysis { student_id, name, submitted: 0, pending: 0, averages: None },
          Vec::new(),
        ));
      }
      let Some((analysis, scores)) = out.last_mut() else { continue };
      if peer_eval_id.is_none() {
        continue;
      }
      match decode_scores(raw_scores)? {
        Some(s) => {
          analysis.submitted += 1;
          scores.push(s);
        }
        None => analysis.pending += 1,
      }
    }

    Ok(
      out
        .into_iter()
        .map(|(mut analysis, scores)| {
          analysis.averages = RubricAverages::of(&scores);
          analysis
        })
        .collect(),
    )
  }

  // ── Roster & groups ───────────────────────────────────────────────────────

  async fn import_roster(
    &self,
    professor_id: i64,
    course:       CourseRef,
    rows:         Vec<RosterRow>,
  ) -> Result<ImportReport> {
    let code = course.code.trim().to_owned();
    let name = course
      .name
      .map(|n| n.trim().to_owned())
      .filter(|n| !n.is_empty())
      .unwrap_or_else(|| code.clone());

    let code_c = code.clone();
    let report = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
          .query_row(
            "SELECT course_id FROM courses WHERE professor_id = ?1 AND course_code = ?2",
            rusqlite::params![professor_id, code_c],
            |row| row.get(0),
          )
          .optional()?;
        let (course_id, course_created) = match existing {
          Some(id) => (id, false),
          None => {
            tx.execute(
              "INSERT INTO courses (course_code, course_name, professor_id) VALUES (?1, ?2, ?3)",
              rusqlite::params![code_c, name, professor_id],
            )?;
            (tx.last_insert_rowid(), true)
          }
        };

        let mut students_added = 0;
        let mut enrollments_added = 0;
        let mut skipped = Vec::new();

        for row in rows {
          let entry = match row {
            RosterRow::Accepted(entry) => entry,
            RosterRow::Skipped { line, reason } => {
              skipped.push(SkippedRow { line, reason });
              continue;
            }
          };

          let known = tx
            .query_row(
              "SELECT 1 FROM students WHERE student_id = ?1",
              rusqlite::params![entry.student_id],
              |_| Ok(()),
            )
            .optional()?
            .is_some();

          if !known {
            let owner: Option<i64> = tx
              .query_row(
                "SELECT student_id FROM students WHERE email = ?1",
                rusqlite::params![entry.email],
                |row| row.get(0),
              )
              .optional()?;
            if let Some(owner) = owner {
              skipped.push(SkippedRow {
                line:   entry.line,
                reason: SkipReason::EmailInUse { email: entry.email, owner },
              });
              continue;
            }
            tx.execute(
              "INSERT INTO students (student_id, name, email) VALUES (?1, ?2, ?3)",
              rusqlite::params![entry.student_id, entry.name, entry.email],
            )?;
            students_added += 1;
          }

          enrollments_added += tx.execute(
            "INSERT OR IGNORE INTO enrollments (course_id, student_id) VALUES (?1, ?2)",
            rusqlite::params![course_id, entry.student_id],
          )? as u32;
        }

        tx.commit()?;

        Ok(ImportReport {
          course_id,
          course_code: code_c,
          course_created,
          students_added,
          enrollments_added,
          skipped,
        })
      })
      .await?;

    for row in &report.skipped {
      tracing::warn!(course = %code, line = row.line, reason = %row.reason, "skipped roster row");
    }
    tracing::info!(
      course = %code,
      students_added = report.students_added,
      enrollments_added = report.enrollments_added,
      skipped = report.skipped.len(),
      "imported roster"
    );
    Ok(report)
  }

  async fn form_group(
    &self,
    course_id:       i64,
    label:           GroupLabel,
    mut student_ids: Vec<i64>,
  ) -> Result<GroupFormation> {
    if student_ids.is_empty() {
      return Err(peerval_core::Error::EmptyGroup.into());
    }
    student_ids.sort_unstable();
    student_ids.dedup();

    let formation: Option<GroupFormation> = self
      .call(move |conn| {
        let tx = conn.transaction()?;

        let code: Option<String> = tx
          .query_row(
            "SELECT course_code FROM courses WHERE course_id = ?1",
            rusqlite::params![course_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(code) = code else { return Ok(None) };
        let group_name = label.canonical_name(&code);

        let existing: Option<i64> = tx
          .query_row(
            "SELECT group_id FROM student_groups WHERE course_id = ?1 AND group_name = ?2",
            rusqlite::params![course_id, group_name],
            |row| row.get(0),
          )
          .optional()?;
        let (group_id, created) = match existing {
          Some(id) => (id, false),
          None => {
            let id: i64 = tx.query_row(
              "SELECT COALESCE(MAX(group_id) + 1, ?1) FROM student_groups",
              rusqlite::params![FIRST_GROUP_ID],
              |row| row.get(0),
            )?;
            tx.execute(
              "INSERT INTO student_groups (group_id, course_id, group_name) VALUES (?1, ?2, ?3)",
              rusqlite::params![id, course_id, group_name],
            )?;
            (id, true)
          }
        };

        let mut members_added = 0;
        for student_id in student_ids {
          members_added += tx.execute(
            "INSERT OR IGNORE INTO group_members (group_id, student_id) VALUES (?1, ?2)",
            rusqlite::params![group_id, student_id],
          )? as u32;
        }

        tx.commit()?;
        Ok(Some(GroupFormation { group_id, group_name, created, members_added }))
      })
      .await?;

    let formation = formation.ok_or(Error::CourseNotFound(course_id))?;
    tracing::info!(
      course_id,
      group = %formation.group_name,
      created = formation.created,
      members_added = formation.members_added,
      "formed group"
    );
    Ok(formation)
  }

  async fn groups_for_course(&self, course_id: i64) -> Result<Vec<GroupWithMembers>> {
    self.load_groups("g.course_id = ?1", course_id).await
  }

  async fn groups_for_professor(&self, professor_id: i64) -> Result<Vec<GroupWithMembers>> {
    self.load_groups("c.professor_id = ?1", professor_id).await
  }

  async fn open_group_evaluations(&self, course_id: i64) -> Result<usize> {
    let created: Option<usize> = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let due: Option<Option<String>> = tx
          .query_row(
            "SELECT eval_due_date FROM courses WHERE course_id = ?1",
            rusqlite::params![course_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(due) = due else { return Ok(None) };

        let created = tx.execute(
          "INSERT OR IGNORE INTO peer_evaluations
             (evaluator_id, evaluatee_id, course_id, eval_due_date)
           SELECT a.student_id, b.student_id, g.course_id, ?2
           FROM student_groups g
           JOIN group_members a ON a.group_id = g.group_id
           JOIN group_members b ON b.group_id = g.group_id AND b.student_id != a.student_id
           WHERE g.course_id = ?1",
          rusqlite::params![course_id, due],
        )?;
        tx.commit()?;
        Ok(Some(created))
      })
      .await?;

    let created = created.ok_or(Error::CourseNotFound(course_id))?;
    tracing::info!(course_id, created, "opened group evaluations");
    Ok(created)
  }

  // ── Evaluations ───────────────────────────────────────────────────────────

  async fn evaluations_for_evaluator(&self, student_id: i64) -> Result<Vec<EvaluationSummary>> {
    type Row = (i64, String, String, String, Option<String>, bool);

    let rows: Vec<Row> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT p.peer_eval_id, c.course_code, c.course_name, s.name,
                  p.eval_due_date, p.submitted_at IS NOT NULL
           FROM peer_evaluations p
           JOIN courses  c ON c.course_id  = p.course_id
           JOIN students s ON s.student_id = p.evaluatee_id
           WHERE p.evaluator_id = ?1
           ORDER BY p.eval_due_date IS NULL, p.eval_due_date, p.peer_eval_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![student_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(peer_eval_id, course_code, course_name, evaluatee, due, submitted)| {
        Ok(EvaluationSummary {
          peer_eval_id,
          course_code,
          course_name,
          evaluatee,
          eval_due_date: decode_opt_date(due)?,
          submitted,
        })
      })
      .collect()
  }

  async fn evaluation_for_evaluator(
    &self,
    peer_eval_id: i64,
    student_id:   i64,
  ) -> Result<Option<EvaluationDetail>> {
    let raw: Option<RawEvaluationDetail> = self
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT p.peer_eval_id, s.student_id, s.name, c.course_code, c.course_name,
                    pr.name, c.semester, c.year, c.course_time, p.eval_due_date,
                    p.contribution, p.collaboration, p.communication,
                    p.planning, p.inclusivity, p.overall
             FROM peer_evaluations p
             JOIN students   s  ON s.student_id    = p.evaluatee_id
             JOIN courses    c  ON c.course_id     = p.course_id
             JOIN professors pr ON pr.professor_id = c.professor_id
             WHERE p.peer_eval_id = ?1 AND p.evaluator_id = ?2",
            rusqlite::params![peer_eval_id, student_id],
            |row| {
              Ok(RawEvaluationDetail {
                peer_eval_id:   row.get(0)?,
                evaluatee_id:   row.get(1)?,
                evaluatee_name: row.get(2)?,
                course_code:    row.get(3)?,
                course_name:    row.get(4)?,
                professor_name: row.get(5)?,
                semester:       row.get(6)?,
                year:           row.get(7)?,
                course_time:    row.get(8)?,
                eval_due_date:  row.get(9)?,
                scores:         score_columns(row, 10)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEvaluationDetail::into_detail).transpose()
  }

  async fn submit_scores(
    &self,
    peer_eval_id: i64,
    student_id:   i64,
    scores:       RubricScores,
  ) -> Result<usize> {
    let s      = encode_scores(&scores);
    let at_str = encode_dt(Utc::now());

    let affected = self
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE peer_evaluations
           SET contribution  = ?1,
               collaboration = ?2,
               communication = ?3,
               planning      = ?4,
               inclusivity   = ?5,
               overall       = ?6,
               submitted_at  = ?7
           WHERE peer_eval_id = ?8 AND evaluator_id = ?9",
          rusqlite::params![s[0], s[1], s[2], s[3], s[4], s[5], at_str, peer_eval_id, student_id],
        )?)
      })
      .await?;

    tracing::debug!(peer_eval_id, student_id, affected, "submitted evaluation scores");
    Ok(affected)
  }

  async fn evaluation_context(&self, peer_eval_id: i64) -> Result<Option<EvaluationContext>> {
    type Row = (i64, Student, Student, i64, String, String, Option<String>, [Option<i64>; 6]);

    let row: Option<Row> = self
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT p.peer_eval_id,
                    ev.student_id, ev.name, ev.email,
                    ee.student_id, ee.name, ee.email,
                    c.course_id, c.course_code, c.course_name, p.submitted_at,
                    p.contribution, p.collaboration, p.communication,
                    p.planning, p.inclusivity, p.overall
             FROM peer_evaluations p
             JOIN students ev ON ev.student_id = p.evaluator_id
             JOIN students ee ON ee.student_id = p.evaluatee_id
             JOIN courses  c  ON c.course_id   = p.course_id
             WHERE p.peer_eval_id = ?1",
            rusqlite::params![peer_eval_id],
            |row| {
              Ok((
                row.get(0)?,
                student_from_row(row, 1)?,
                student_from_row(row, 4)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
                score_columns(row, 11)?,
              ))
            },
          )
          .optional()?)
      })
      .await?;

    let Some((peer_eval_id, evaluator, evaluatee, course_id, course_code, course_name, at, raw)) =
      row
    else {
      return Ok(None);
    };

    Ok(Some(EvaluationContext {
      peer_eval_id,
      evaluator,
      evaluatee,
      course_id,
      course_code,
      course_name,
      scores: decode_scores(raw)?,
      submitted_at: at.as_deref().map(decode_dt).transpose()?,
    }))
  }
}
